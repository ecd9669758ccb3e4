use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a single criteria-level proposal inside a critique.
///
/// Stored and serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CritiqueState {
    /// The critic agrees with the original mark.
    #[default]
    Agreeing,
    /// The critic proposes a different mark and awaits the reviewer.
    Submitted,
    Accepted,
    Rejected,
    /// The reviewer never answered before results were published.
    AutoRejected,
}

impl CritiqueState {
    pub const fn code(self) -> u8 {
        match self {
            CritiqueState::Agreeing => 0,
            CritiqueState::Submitted => 1,
            CritiqueState::Accepted => 2,
            CritiqueState::Rejected => 3,
            CritiqueState::AutoRejected => 4,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(CritiqueState::Agreeing),
            1 => Some(CritiqueState::Submitted),
            2 => Some(CritiqueState::Accepted),
            3 => Some(CritiqueState::Rejected),
            4 => Some(CritiqueState::AutoRejected),
            _ => None,
        }
    }

    /// Only accepted proposals replace the original mark during aggregation.
    #[must_use]
    pub const fn replaces_mark(self) -> bool {
        matches!(self, CritiqueState::Accepted)
    }

    /// True while the reviewer may still accept or reject the proposal.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, CritiqueState::Submitted)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CritiqueState::Agreeing => "agreeing",
            CritiqueState::Submitted => "submitted",
            CritiqueState::Accepted => "accepted",
            CritiqueState::Rejected => "rejected",
            CritiqueState::AutoRejected => "auto_rejected",
        }
    }
}

impl TryFrom<u8> for CritiqueState {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown critique state: {code}"))
    }
}

impl From<CritiqueState> for u8 {
    fn from(state: CritiqueState) -> Self {
        state.code()
    }
}

impl fmt::Display for CritiqueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
