// ⚠️ Budget Errors - Typed failures of the ledger engine
//
// Everything that can go wrong for a single CF is a `BudgetError`. The
// simulation treats these as per-CF failures: they are reported and the run
// carries on with the other cost centers.

use chrono::NaiveDate;
use thiserror::Error;

use crate::records::Rank;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BudgetError {
    /// Not enough anchor dates to infer the milestones of a CF
    #[error("CF {cf}: insufficient data to infer milestones ({missing})")]
    InsufficientData { cf: String, missing: String },

    /// A yearly budget override is present but is not a usable number
    #[error("CF {cf}: invalid {rank} yearly budget override '{value}'")]
    InvalidBudgetOverride { cf: String, rank: Rank, value: String },

    /// Simulation window whose start is after its end
    #[error("invalid simulation window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    /// A budget constant that would make the schedule meaningless
    #[error("invalid budget setting {setting}: {reason}")]
    InvalidSetting { setting: String, reason: String },

    /// Month arithmetic left the representable date range
    #[error("CF {cf}: date out of range while computing {what}")]
    DateOverflow { cf: String, what: String },
}

impl BudgetError {
    /// CF the error relates to, if any
    pub fn cf(&self) -> Option<&str> {
        match self {
            BudgetError::InsufficientData { cf, .. }
            | BudgetError::InvalidBudgetOverride { cf, .. }
            | BudgetError::DateOverflow { cf, .. } => Some(cf),
            BudgetError::InvalidWindow { .. } | BudgetError::InvalidSetting { .. } => None,
        }
    }
}

pub type BudgetResult<T> = std::result::Result<T, BudgetError>;
