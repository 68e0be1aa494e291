// ⚙️ Configuration - Budget constants and simulation window
//
// All constants can be overridden from a JSON file; any field left out of
// the file keeps its default value.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{BudgetError, BudgetResult};

// ============================================================================
// BUDGET SETTINGS
// ============================================================================

/// Constants of the career budget model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    /// Yearly budget of an entry-rank holder (PATT)
    pub entry_yearly_budget: f64,

    /// Yearly budget of a senior-rank holder (PO) once fully ramped up
    pub senior_yearly_budget: f64,

    /// Months between the entry-rank and the mid-rank promotions
    pub entry_to_mid_months: i32,

    /// Months between the mid-rank and the senior-rank promotions
    pub mid_to_senior_months: i32,

    /// Months after the entry-rank promotion when the first bump applies
    pub first_step_months: i32,

    /// Yearly increase granted by the first bump
    pub first_step_yearly_increase: f64,

    /// Years needed to go from the mid-rank to the senior-rank budget
    pub years_to_reach_senior_budget: u32,

    /// Age at retirement
    pub retirement_age_years: i32,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        BudgetSettings {
            entry_yearly_budget: 445_000.0,
            senior_yearly_budget: 1_000_000.0,
            entry_to_mid_months: 81,
            mid_to_senior_months: 81,
            first_step_months: 36,
            first_step_yearly_increase: 65_000.0,
            years_to_reach_senior_budget: 4,
            retirement_age_years: 65,
        }
    }
}

impl BudgetSettings {
    /// The ramp-up increment divides by `years_to_reach_senior_budget`
    pub fn validate(&self) -> BudgetResult<()> {
        if self.years_to_reach_senior_budget == 0 {
            return Err(BudgetError::InvalidSetting {
                setting: "years_to_reach_senior_budget".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// SIMULATION WINDOW
// ============================================================================

/// Inclusive date range sampled at every month-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SimulationWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> BudgetResult<Self> {
        if start > end {
            return Err(BudgetError::InvalidWindow { start, end });
        }
        Ok(SimulationWindow { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Month-end sampling points of the window
    pub fn month_ends(&self) -> Vec<NaiveDate> {
        crate::calendar::month_ends(self.start, self.end)
    }
}

impl Default for SimulationWindow {
    fn default() -> Self {
        SimulationWindow {
            start: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2029, 1, 1).unwrap_or(NaiveDate::MAX),
        }
    }
}

// ============================================================================
// SIMULATION CONFIG (file)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub window: SimulationWindow,
    pub budget: BudgetSettings,
}

impl SimulationConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: SimulationConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        // Re-validate what was read from disk
        SimulationWindow::new(config.window.start, config.window.end)?;
        config.budget.validate()?;

        Ok(config)
    }
}

// ============================================================================
// TESTS
// ============================================================================
