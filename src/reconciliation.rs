// ⚖️ Reconciliation Engine - Match negotiated lab budgets
//
// For every CF with a negotiated (fixed) budget and every month of the
// window:
//
//   adjustment = fixed - calculated
//
// so that calculated + adjustment = fixed once the adjustment rows are
// appended to the ledger. Months without a fixed figure on record are left
// alone; CFs with no calculated rows at all are reconciled against zero and
// flagged in the note.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::config::SimulationWindow;
use crate::ledger::{Ledger, LedgerRow, RuleTag};

const ABSENT_CF_NOTE: &str = "CF was not part of the calculated ones.";
const MISSING_MONTH_NOTE: &str = "No calculated budget for this month.";

// ============================================================================
// FIXED BUDGET RULE
// ============================================================================

/// Negotiated budget of a CF over an inclusive date interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedBudgetRule {
    #[serde(rename = "CF")]
    pub cf: String,

    #[serde(rename = "From")]
    pub from: NaiveDate,

    #[serde(rename = "To")]
    pub to: NaiveDate,

    #[serde(rename = "Annual amount")]
    pub annual_amount: f64,
}

impl FixedBudgetRule {
    /// `from <= date <= to`
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    pub fn monthly_amount(&self) -> f64 {
        self.annual_amount / 12.0
    }
}

// ============================================================================
// RECONCILIATION REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Distinct CFs of the fixed-budget table
    pub cf_count: usize,

    /// Number of adjustment rows emitted
    pub adjustment_count: usize,

    /// Sum of the emitted adjustments
    pub total_adjustment: f64,

    /// CFs with a fixed budget but no calculated rows at all
    pub absent_cfs: Vec<String>,

    /// Per CF, months of the window with no fixed figure on record
    pub uncovered_months: Vec<(String, usize)>,
}

impl ReconciliationReport {
    pub fn has_gaps(&self) -> bool {
        !self.absent_cfs.is_empty() || self.uncovered_months.iter().any(|(_, n)| *n > 0)
    }

    pub fn summary(&self) -> String {
        let uncovered: usize = self.uncovered_months.iter().map(|(_, n)| n).sum();
        format!(
            "Reconciliation of {} CFs: {} adjustments totalling {:.2}, {} CFs absent from the calculated budgets, {} months without a negotiated figure",
            self.cf_count,
            self.adjustment_count,
            self.total_adjustment,
            self.absent_cfs.len(),
            uncovered
        )
    }
}

/// Adjustment rows plus what was found while producing them
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub ledger: Ledger,
    pub report: ReconciliationReport,
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine {
    /// Adjustments whose magnitude does not exceed this are not emitted
    pub tolerance: f64,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine { tolerance: 0.0 }
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        ReconciliationEngine { tolerance }
    }

    /// Produce the "lab negotiated budgets" rows for `ledger`.
    ///
    /// Only the "budget" rows of `ledger` inside the window are considered;
    /// the input ledger is never modified.
    pub fn reconcile(
        &self,
        ledger: &Ledger,
        fixed_budgets: &[FixedBudgetRule],
        window: &SimulationWindow,
    ) -> Reconciliation {
        info!("Reconciling against {} fixed budget rules", fixed_budgets.len());

        let calculated = CalculatedBudgets::from_ledger(ledger, window);
        let cfs = distinct_cfs(fixed_budgets);
        let dates = window.month_ends();

        let mut rows = Vec::new();
        let mut report = ReconciliationReport {
            cf_count: cfs.len(),
            ..Default::default()
        };

        for cf in cfs {
            let cf_is_calculated = calculated.has_cf(cf);
            if !cf_is_calculated {
                debug!("CF {} was not part of the calculated ones, using 0", cf);
                report.absent_cfs.push(cf.to_string());
            }

            let mut uncovered = 0;
            for &date in &dates {
                let Some(fixed) = self.fixed_monthly(fixed_budgets, cf, date) else {
                    uncovered += 1;
                    continue;
                };

                let mut notes = Vec::new();
                let calculated_budget = if cf_is_calculated {
                    calculated.get(cf, date).unwrap_or_else(|| {
                        notes.push(MISSING_MONTH_NOTE);
                        0.0
                    })
                } else {
                    notes.push(ABSENT_CF_NOTE);
                    0.0
                };

                let adjustment = fixed - calculated_budget;
                if adjustment.abs() <= self.tolerance {
                    continue;
                }

                let detail = format!(
                    "{:.2} adjustment because of difference between negotiated budget ({:.2}) and calculated budget ({:.2}).",
                    adjustment, fixed, calculated_budget
                );
                let mut note = notes.join(" ");
                if !note.is_empty() {
                    note.push(' ');
                }
                note.push_str(&detail);

                report.adjustment_count += 1;
                report.total_adjustment += adjustment;
                rows.push(LedgerRow::new(
                    cf,
                    date,
                    adjustment,
                    RuleTag::LabNegotiatedBudgets,
                    note,
                ));
            }

            if uncovered > 0 {
                debug!("CF {}: {} months without a fixed budget", cf, uncovered);
            }
            report.uncovered_months.push((cf.to_string(), uncovered));
        }

        info!("{}", report.summary());

        Reconciliation {
            ledger: Ledger::from_rows(rows),
            report,
        }
    }

    /// Monthly amount of the first rule of `cf` covering `date`
    fn fixed_monthly(
        &self,
        fixed_budgets: &[FixedBudgetRule],
        cf: &str,
        date: NaiveDate,
    ) -> Option<f64> {
        fixed_budgets
            .iter()
            .find(|rule| rule.cf == cf && rule.contains(date))
            .map(FixedBudgetRule::monthly_amount)
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// CFs in order of first appearance
fn distinct_cfs(fixed_budgets: &[FixedBudgetRule]) -> Vec<&str> {
    let mut seen = HashSet::new();
    fixed_budgets
        .iter()
        .map(|rule| rule.cf.as_str())
        .filter(|cf| seen.insert(*cf))
        .collect()
}

/// Index of the "budget" rows inside the window; first row wins per CF/date
struct CalculatedBudgets<'a> {
    by_cf: HashMap<&'a str, HashMap<NaiveDate, f64>>,
}

impl<'a> CalculatedBudgets<'a> {
    fn from_ledger(ledger: &'a Ledger, window: &SimulationWindow) -> Self {
        let mut by_cf: HashMap<&'a str, HashMap<NaiveDate, f64>> = HashMap::new();

        for row in ledger.filter_rule(RuleTag::Budget, window) {
            by_cf
                .entry(row.cf.as_str())
                .or_default()
                .entry(row.date)
                .or_insert(row.budget);
        }

        CalculatedBudgets { by_cf }
    }

    fn has_cf(&self, cf: &str) -> bool {
        self.by_cf.contains_key(cf)
    }

    fn get(&self, cf: &str, date: NaiveDate) -> Option<f64> {
        self.by_cf.get(cf).and_then(|months| months.get(&date)).copied()
    }
}

// ============================================================================
// TESTS
// ============================================================================
