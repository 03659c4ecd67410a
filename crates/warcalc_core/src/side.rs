//! Engagement sides.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two belligerents in an engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The side that initiated the engagement.
    Attacker,
    /// The side holding the ground.
    Defender,
}

impl Side {
    /// Get the opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }

    /// Adjective used in report lines ("attacking", "defense").
    #[must_use]
    pub const fn report_label(self) -> &'static str {
        match self {
            Self::Attacker => "attacking",
            Self::Defender => "defense",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attacker => f.write_str("attacker"),
            Self::Defender => f.write_str("defender"),
        }
    }
}
