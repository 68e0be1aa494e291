// 📒 Ledger - Append-only budget rows
//
// Every rule module produces its own `Ledger`; the simulation concatenates
// them. Rows are never edited once emitted: a correction is a new row with a
// signed amount.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;

use crate::config::SimulationWindow;
use crate::schedule::Schedule;

// ============================================================================
// RULE TAG
// ============================================================================

/// Which rule module produced a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleTag {
    #[serde(rename = "budget")]
    Budget,
    #[serde(rename = "lab negotiated budgets")]
    LabNegotiatedBudgets,
    #[serde(rename = "yearly budget")]
    YearlyBudget,
    #[serde(rename = "adjustments")]
    Adjustments,
}

impl RuleTag {
    pub fn name(&self) -> &'static str {
        match self {
            RuleTag::Budget => "budget",
            RuleTag::LabNegotiatedBudgets => "lab negotiated budgets",
            RuleTag::YearlyBudget => "yearly budget",
            RuleTag::Adjustments => "adjustments",
        }
    }
}

impl fmt::Display for RuleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// LEDGER ROW
// ============================================================================

/// One (CF, month, amount, rule, note) fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(rename = "CF")]
    pub cf: String,

    /// Month-end date
    #[serde(rename = "date")]
    pub date: NaiveDate,

    /// Signed monthly amount
    #[serde(rename = "budget")]
    pub budget: f64,

    #[serde(rename = "rule")]
    pub rule: RuleTag,

    #[serde(rename = "note")]
    pub note: String,
}

impl LedgerRow {
    pub fn new(
        cf: impl Into<String>,
        date: NaiveDate,
        budget: f64,
        rule: RuleTag,
        note: impl Into<String>,
    ) -> Self {
        LedgerRow {
            cf: cf.into(),
            date,
            budget,
            rule,
            note: note.into(),
        }
    }

    /// Digest input of one row (amount compared bit for bit)
    fn digest_line(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}\n",
            self.cf,
            self.date,
            self.budget.to_bits(),
            self.rule,
            self.note
        )
    }
}

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    rows: Vec<LedgerRow>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<LedgerRow>) -> Self {
        Ledger { rows }
    }

    /// Concatenate ledgers in the given order
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Ledger>,
    {
        let mut rows = Vec::new();
        for part in parts {
            rows.extend(part.rows);
        }
        Ledger { rows }
    }

    pub fn push(&mut self, row: LedgerRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LedgerRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one rule whose date lies in the window
    pub fn filter_rule(&self, rule: RuleTag, window: &SimulationWindow) -> Vec<&LedgerRow> {
        self.rows
            .iter()
            .filter(|row| row.rule == rule && window.contains(row.date))
            .collect()
    }

    /// Sum of every row posted to a CF for a month, all rules together
    pub fn total_for(&self, cf: &str, date: NaiveDate) -> f64 {
        self.rows
            .iter()
            .filter(|row| row.cf == cf && row.date == date)
            .map(|row| row.budget)
            .sum()
    }

    /// SHA-256 over every row in order. Equal ledgers have equal digests.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for row in &self.rows {
            hasher.update(row.digest_line());
        }
        format!("{:x}", hasher.finalize())
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a LedgerRow;
    type IntoIter = std::slice::Iter<'a, LedgerRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// ============================================================================
// BUDGET LEDGER GENERATOR
// ============================================================================

/// One "budget" row per month-end of the window, budget taken from the
/// first schedule period containing the date.
pub fn generate_budget_ledger(cf: &str, schedule: &Schedule, window: &SimulationWindow) -> Ledger {
    let rows: Vec<LedgerRow> = window
        .month_ends()
        .into_iter()
        .map(|date| {
            let (budget, note) = schedule.budget_at(date);
            LedgerRow::new(cf, date, budget, RuleTag::Budget, note)
        })
        .collect();

    debug!("CF {}: {} budget rows generated", cf, rows.len());
    Ledger::from_rows(rows)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::milestones::MilestoneEngine;
    use crate::records::{CareerRecord, Rank};
    use crate::schedule::OUTSIDE_NOTE;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn century_ledger() -> Ledger {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("1234")
            .with_date_of_birth(ymd(1970, 3, 15))
            .with_promotion(Rank::Entry, ymd(2000, 1, 1));
        let milestones = engine.infer(&record).unwrap();
        let schedule = Schedule::build(&milestones, &engine.rates(&record), engine.settings());
        let window = SimulationWindow::new(ymd(1995, 1, 1), ymd(2095, 1, 1)).unwrap();

        generate_budget_ledger("1234", &schedule, &window)
    }

    fn budget_on(ledger: &Ledger, date: NaiveDate) -> f64 {
        ledger
            .iter()
            .find(|row| row.date == date)
            .map(|row| row.budget)
            .unwrap()
    }

    #[test]
    fn test_budget_when_simulation_is_larger_than_career() {
        let ledger = century_ledger();

        assert_eq!(ledger.len(), 1200);
        assert!(ledger.iter().all(|row| row.rule == RuleTag::Budget && row.cf == "1234"));

        // Not yet entry rank / already retired
        assert_eq!(ledger.rows()[0].budget, 0.0);
        assert_eq!(ledger.rows()[0].note, OUTSIDE_NOTE);
        assert_eq!(ledger.rows()[ledger.len() - 1].budget, 0.0);

        assert_eq!(budget_on(&ledger, ymd(2000, 1, 31)), 445_000.0 / 12.0);
        assert!((budget_on(&ledger, ymd(2003, 1, 31)) - 42_500.0).abs() < 1e-9);
        assert!(
            (budget_on(&ledger, ymd(2006, 10, 31)) - (445_000.0 + 1_000_000.0) / 2.0 / 12.0).abs()
                < 1e-9
        );
        assert_eq!(budget_on(&ledger, ymd(2017, 7, 31)), 1_000_000.0 / 12.0);
    }

    #[test]
    fn test_zero_before_entry_and_after_retirement() {
        let ledger = century_ledger();

        for row in &ledger {
            if row.date < ymd(2000, 1, 1) || row.date >= ymd(2035, 3, 31) {
                assert_eq!(row.budget, 0.0, "unexpected budget on {}", row.date);
            } else {
                assert!(row.budget > 0.0, "missing budget on {}", row.date);
            }
        }
    }

    #[test]
    fn test_rows_are_chronological() {
        let ledger = century_ledger();
        assert!(ledger.rows().windows(2).all(|pair| pair[0].date < pair[1].date));
    }

    #[test]
    fn test_concat_keeps_order_and_duplicates() {
        let d = ymd(2020, 1, 31);
        let a = Ledger::from_rows(vec![LedgerRow::new("1", d, 10.0, RuleTag::Budget, "")]);
        let b = Ledger::from_rows(vec![
            LedgerRow::new("1", d, -4.0, RuleTag::LabNegotiatedBudgets, "fix"),
            LedgerRow::new("1", d, 1.5, RuleTag::Adjustments, "manual"),
        ]);

        let ledger = Ledger::concat(vec![a, b]);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.rows()[1].rule, RuleTag::LabNegotiatedBudgets);
        assert_eq!(ledger.total_for("1", d), 7.5);
        assert_eq!(ledger.total_for("2", d), 0.0);
    }

    #[test]
    fn test_filter_rule_within_window() {
        let ledger = Ledger::from_rows(vec![
            LedgerRow::new("1", ymd(2019, 12, 31), 1.0, RuleTag::Budget, ""),
            LedgerRow::new("1", ymd(2020, 1, 31), 2.0, RuleTag::Budget, ""),
            LedgerRow::new("1", ymd(2020, 1, 31), 3.0, RuleTag::Adjustments, ""),
        ]);
        let window = SimulationWindow::new(ymd(2020, 1, 1), ymd(2020, 12, 31)).unwrap();

        let rows = ledger.filter_rule(RuleTag::Budget, &window);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].budget, 2.0);
    }

    #[test]
    fn test_digest_is_stable_and_content_sensitive() {
        let first = century_ledger();
        let second = century_ledger();
        assert_eq!(first.digest(), second.digest());

        let mut changed = century_ledger();
        changed.push(LedgerRow::new("1234", ymd(2000, 1, 31), 0.0, RuleTag::Adjustments, ""));
        assert_ne!(first.digest(), changed.digest());

        assert_eq!(first.digest().len(), 64);

        // Same rows, different order
        let a = LedgerRow::new("1", ymd(2020, 1, 31), 1.0, RuleTag::Budget, "");
        let b = LedgerRow::new("1", ymd(2020, 2, 29), 1.0, RuleTag::Budget, "");
        assert_ne!(
            Ledger::from_rows(vec![a.clone(), b.clone()]).digest(),
            Ledger::from_rows(vec![b, a]).digest()
        );
    }

    #[test]
    fn test_rule_tag_names() {
        assert_eq!(RuleTag::Budget.to_string(), "budget");
        assert_eq!(RuleTag::LabNegotiatedBudgets.to_string(), "lab negotiated budgets");
        assert_eq!(
            serde_json::to_string(&RuleTag::YearlyBudget).unwrap(),
            "\"yearly budget\""
        );
    }
}
