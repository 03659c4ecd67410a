//! ASCII troop-curve chart for terminal review.
//!
//! Plots both sides' troops from the opening strength through the last
//! simulated day. `A` marks the attacker, `D` the defender and `*` a cell
//! where the curves meet.

use warcalc_core::report::EngagementReport;

/// Chart configuration.
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Maximum number of plotted columns.
    pub width: usize,
    /// Number of rows in the plot area.
    pub height: usize,
    /// Print the legend below the chart.
    pub show_legend: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 16,
            show_legend: true,
        }
    }
}

/// Opening troops followed by the end-of-day curve.
fn series(initial: f64, curve: &[f64]) -> Vec<f64> {
    std::iter::once(initial).chain(curve.iter().copied()).collect()
}

/// Index into a series of `len` points for plot column `col` of `columns`.
fn sample_index(col: usize, columns: usize, len: usize) -> usize {
    if columns <= 1 {
        0
    } else {
        col * (len - 1) / (columns - 1)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn row_for(value: f64, max: f64, height: usize) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    let scaled = (value / max * (height - 1) as f64).round() as usize;
    scaled.min(height - 1)
}

/// Render both troop curves of `report` as ASCII art.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn render_troop_chart(report: &EngagementReport, config: &ChartConfig) -> String {
    let height = config.height.max(2);
    let attacker = series(report.attacker.initial_troops, &report.attacker.troop_curve);
    let defender = series(report.defender.initial_troops, &report.defender.troop_curve);
    let points = attacker.len().max(defender.len());
    let columns = points.min(config.width.max(1));

    let max = attacker
        .iter()
        .chain(defender.iter())
        .copied()
        .fold(0.0f64, f64::max);

    let mut grid = vec![vec![' '; columns]; height];
    for col in 0..columns {
        let idx = sample_index(col, columns, points);
        for (values, glyph) in [(&attacker, 'A'), (&defender, 'D')] {
            let Some(&value) = values.get(idx) else {
                continue;
            };
            let row = row_for(value, max, height);
            let cell = &mut grid[height - 1 - row][col];
            *cell = if *cell == ' ' || *cell == glyph { glyph } else { '*' };
        }
    }

    let mut out = String::new();
    out.push_str(&format!("{}: {}\n", report.outcome, describe_days(report.duration)));
    for (i, row) in grid.iter().enumerate() {
        let label = if i == 0 {
            format!("{max:>9.0}")
        } else if i == height - 1 {
            format!("{:>9}", 0)
        } else {
            " ".repeat(9)
        };
        let line: String = row.iter().collect();
        out.push_str(&format!("{label} |{}\n", line.trim_end()));
    }
    out.push_str(&format!("{} +{}\n", " ".repeat(9), "-".repeat(columns)));
    out.push_str(&format!(
        "{} start{:>width$}\n",
        " ".repeat(10),
        format!("day {}", report.duration),
        width = columns.saturating_sub(5)
    ));
    if config.show_legend {
        out.push_str("Legend: A attacker, D defender, * both\n");
    }
    out
}

fn describe_days(duration: u32) -> String {
    let days = duration + 1;
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warcalc_core::engagement::simulate;
    use warcalc_test_utils::fixtures::{reference_engagement, symmetric_engagement};

    #[test]
    fn test_chart_dimensions() {
        let report = simulate(&reference_engagement()).unwrap();
        let config = ChartConfig::default();
        let chart = render_troop_chart(&report, &config);
        let lines: Vec<&str> = chart.lines().collect();

        // Title, plot rows, axis, day labels, legend
        assert_eq!(lines.len(), config.height + 4);
        assert!(lines[0].starts_with(&report.outcome.to_string()));
        assert!(lines.last().unwrap().starts_with("Legend"));
        assert!(chart.ends_with('\n'));
    }

    #[test]
    fn test_opening_column_marks_leader_at_top() {
        let report = simulate(&reference_engagement()).unwrap();
        let chart = render_troop_chart(
            &report,
            &ChartConfig {
                show_legend: false,
                ..ChartConfig::default()
            },
        );
        // The attacker opens with the most troops, so it sets the scale
        let top = chart.lines().nth(1).unwrap();
        assert!(top.split('|').nth(1).unwrap().starts_with('A'));
        assert!(top.trim_start().starts_with("10000"));
    }

    #[test]
    fn test_symmetric_curves_overlap() {
        let report = simulate(&symmetric_engagement(10000.0, 1.0 / 128.0, 0.5, 4)).unwrap();
        let chart = render_troop_chart(
            &report,
            &ChartConfig {
                show_legend: false,
                ..ChartConfig::default()
            },
        );
        assert!(!chart.contains('A') && !chart.contains('D'));
        assert!(chart.contains('*'));
    }

    #[test]
    fn test_long_engagement_is_compressed() {
        let report = simulate(&symmetric_engagement(50000.0, 0.001, 0.9, 200)).unwrap();
        let config = ChartConfig {
            width: 40,
            ..ChartConfig::default()
        };
        let chart = render_troop_chart(&report, &config);
        let axis = chart.lines().nth(config.height + 1).unwrap();
        assert_eq!(axis.trim_start().len(), 41);
    }

    #[test]
    fn test_sample_index_spans_series() {
        assert_eq!(sample_index(0, 10, 100), 0);
        assert_eq!(sample_index(9, 10, 100), 99);
        assert_eq!(sample_index(0, 1, 5), 0);
    }
}
