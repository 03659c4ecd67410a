//! # Warcalc Tools
//!
//! Command-line tooling around the engagement simulator:
//! - Scenario loading from RON files
//! - Single and batch engagement runs
//! - ASCII troop-curve charts
//! - Scenario directory validation

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod batch;
pub mod chart;
pub mod scenario;
pub mod validate;
