//! Per-author affiliation resolution state.

use crate::browser::BrowserError;
use crate::models::AFFILIATION_NOT_AVAILABLE;

/// Progress of resolving one author's affiliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffiliationState {
    NotStarted,
    /// Attempt `n` (1-based) is in flight
    Attempting(u32),
    Resolved(String),
    Exhausted { attempts: u32 },
    /// The marker appeared but no affiliation section could be parsed
    SectionMissing { attempts: u32 },
}

impl AffiliationState {
    /// Begin the first attempt
    pub fn start(self) -> Self {
        match self {
            AffiliationState::NotStarted => AffiliationState::Attempting(1),
            other => other,
        }
    }

    /// Apply the result of the attempt in flight
    pub fn advance(self, result: Result<String, BrowserError>, max_attempts: u32) -> Self {
        match self {
            AffiliationState::Attempting(attempt) => match result {
                Ok(affiliation) => AffiliationState::Resolved(affiliation),
                Err(_) if attempt < max_attempts => AffiliationState::Attempting(attempt + 1),
                Err(_) => AffiliationState::Exhausted { attempts: attempt },
            },
            other => other,
        }
    }

    /// The attempt in flight loaded a page without a parseable section
    pub fn section_missing(self) -> Self {
        match self {
            AffiliationState::Attempting(attempt) => {
                AffiliationState::SectionMissing { attempts: attempt }
            }
            other => other,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AffiliationState::Resolved(_)
                | AffiliationState::Exhausted { .. }
                | AffiliationState::SectionMissing { .. }
        )
    }
}

/// Final result of resolving an affiliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffiliationOutcome {
    Resolved(String),
    Exhausted { attempts: u32 },
    SectionMissing { attempts: u32 },
}

impl AffiliationOutcome {
    /// The affiliation to record; the sentinel unless resolved
    pub fn into_affiliation(self) -> String {
        match self {
            AffiliationOutcome::Resolved(affiliation) => affiliation,
            AffiliationOutcome::Exhausted { .. } | AffiliationOutcome::SectionMissing { .. } => {
                AFFILIATION_NOT_AVAILABLE.to_string()
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, AffiliationOutcome::Resolved(_))
    }
}

impl From<AffiliationState> for AffiliationOutcome {
    /// A machine stopped before reaching a terminal state counts as exhausted
    fn from(state: AffiliationState) -> Self {
        match state {
            AffiliationState::Resolved(affiliation) => AffiliationOutcome::Resolved(affiliation),
            AffiliationState::Exhausted { attempts } => AffiliationOutcome::Exhausted { attempts },
            AffiliationState::SectionMissing { attempts } => {
                AffiliationOutcome::SectionMissing { attempts }
            }
            AffiliationState::Attempting(attempt) => AffiliationOutcome::Exhausted {
                attempts: attempt.saturating_sub(1),
            },
            AffiliationState::NotStarted => AffiliationOutcome::Exhausted { attempts: 0 },
        }
    }
}
