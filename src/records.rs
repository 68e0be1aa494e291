// 🧾 Career Records - One input row per cost center
//
// `CareerRecordRow` is the raw shape read from the parameters table: dates
// already parsed, budget overrides still as text. `CareerRecord` is the
// validated value handed to milestone inference.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BudgetError, BudgetResult};

// ============================================================================
// RANK
// ============================================================================

/// Academic rank stage, each with its own base budget rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    /// Tenure-track assistant professor (PATT)
    Entry,
    /// Associate professor (PA)
    Mid,
    /// Full professor (PO)
    Senior,
}

impl Rank {
    pub fn name(&self) -> &'static str {
        match self {
            Rank::Entry => "entry",
            Rank::Mid => "mid",
            Rank::Senior => "senior",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// CAREER RECORD
// ============================================================================

/// Known facts about one cost-center holder. Every field but `cf` is optional.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CareerRecord {
    pub cf: String,
    pub date_of_birth: Option<NaiveDate>,
    pub retirement: Option<NaiveDate>,
    pub entry_promotion: Option<NaiveDate>,
    pub mid_promotion: Option<NaiveDate>,
    pub senior_promotion: Option<NaiveDate>,
    pub entry_yearly_budget: Option<f64>,
    pub mid_yearly_budget: Option<f64>,
    pub senior_yearly_budget: Option<f64>,
}

impl CareerRecord {
    pub fn new(cf: impl Into<String>) -> Self {
        CareerRecord {
            cf: cf.into(),
            ..Default::default()
        }
    }

    pub fn with_date_of_birth(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }

    pub fn with_retirement(mut self, date: NaiveDate) -> Self {
        self.retirement = Some(date);
        self
    }

    pub fn with_promotion(mut self, rank: Rank, date: NaiveDate) -> Self {
        match rank {
            Rank::Entry => self.entry_promotion = Some(date),
            Rank::Mid => self.mid_promotion = Some(date),
            Rank::Senior => self.senior_promotion = Some(date),
        }
        self
    }

    pub fn with_yearly_budget(mut self, rank: Rank, amount: f64) -> Self {
        match rank {
            Rank::Entry => self.entry_yearly_budget = Some(amount),
            Rank::Mid => self.mid_yearly_budget = Some(amount),
            Rank::Senior => self.senior_yearly_budget = Some(amount),
        }
        self
    }

    pub fn yearly_budget(&self, rank: Rank) -> Option<f64> {
        match rank {
            Rank::Entry => self.entry_yearly_budget,
            Rank::Mid => self.mid_yearly_budget,
            Rank::Senior => self.senior_yearly_budget,
        }
    }

    /// True when at least one promotion date is known
    pub fn has_promotion_anchor(&self) -> bool {
        self.entry_promotion.is_some()
            || self.mid_promotion.is_some()
            || self.senior_promotion.is_some()
    }

    /// True when the birth date or the retirement date is known
    pub fn has_lifetime_anchor(&self) -> bool {
        self.date_of_birth.is_some() || self.retirement.is_some()
    }

    /// Reject overrides that are present but not finite numbers
    pub fn validate_overrides(&self) -> BudgetResult<()> {
        for rank in [Rank::Entry, Rank::Mid, Rank::Senior] {
            if let Some(amount) = self.yearly_budget(rank) {
                if !amount.is_finite() {
                    return Err(BudgetError::InvalidBudgetOverride {
                        cf: self.cf.clone(),
                        rank,
                        value: amount.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// RAW ROW (parameters table)
// ============================================================================

/// Parameters table row as read from disk.
///
/// Headers follow the milestone export so an export can be read back; the
/// legacy PATT/PA/PO headers are accepted as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CareerRecordRow {
    #[serde(rename = "CF")]
    pub cf: String,

    #[serde(rename = "DOB", alias = "DoB", default)]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(rename = "retirement", default)]
    pub retirement: Option<NaiveDate>,

    #[serde(rename = "entry promotion", alias = "PATT promotion", default)]
    pub entry_promotion: Option<NaiveDate>,

    #[serde(rename = "mid promotion", alias = "PA promotion", default)]
    pub mid_promotion: Option<NaiveDate>,

    #[serde(rename = "senior promotion", alias = "PO promotion", default)]
    pub senior_promotion: Option<NaiveDate>,

    #[serde(rename = "entry yearly budget", alias = "PATT yearly budget", default)]
    pub entry_yearly_budget: Option<String>,

    #[serde(rename = "mid yearly budget", alias = "PA yearly budget", default)]
    pub mid_yearly_budget: Option<String>,

    #[serde(rename = "senior yearly budget", alias = "PO yearly budget", default)]
    pub senior_yearly_budget: Option<String>,
}

impl CareerRecordRow {
    /// Parse the budget overrides and build a validated `CareerRecord`
    pub fn into_record(self) -> BudgetResult<CareerRecord> {
        let cf = self.cf.trim().to_string();

        let record = CareerRecord {
            entry_yearly_budget: parse_override(&cf, Rank::Entry, self.entry_yearly_budget)?,
            mid_yearly_budget: parse_override(&cf, Rank::Mid, self.mid_yearly_budget)?,
            senior_yearly_budget: parse_override(&cf, Rank::Senior, self.senior_yearly_budget)?,
            date_of_birth: self.date_of_birth,
            retirement: self.retirement,
            entry_promotion: self.entry_promotion,
            mid_promotion: self.mid_promotion,
            senior_promotion: self.senior_promotion,
            cf,
        };

        record.validate_overrides()?;
        Ok(record)
    }
}

/// Blank cell = no override; anything else must be a finite number
fn parse_override(cf: &str, rank: Rank, raw: Option<String>) -> BudgetResult<Option<f64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(BudgetError::InvalidBudgetOverride {
            cf: cf.to_string(),
            rank,
            value: trimmed.to_string(),
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================
