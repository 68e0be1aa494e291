// ✍️ Manual Adjustments - Fixed monthly corrections
//
// Each rule posts the same monthly amount to a CF for every month-end of the
// window within [From, To]. Rows are emitted month by month, and within a
// month in rule order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SimulationWindow;
use crate::ledger::{Ledger, LedgerRow, RuleTag};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRule {
    #[serde(rename = "CF")]
    pub cf: String,

    #[serde(rename = "From")]
    pub from: NaiveDate,

    #[serde(rename = "To")]
    pub to: NaiveDate,

    #[serde(rename = "Monthly amount")]
    pub monthly_amount: f64,

    #[serde(rename = "Note", default)]
    pub note: String,
}

impl AdjustmentRule {
    /// `from <= date <= to`
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// "adjustments" rows for every rule and month-end of the window
pub fn generate_adjustments(rules: &[AdjustmentRule], window: &SimulationWindow) -> Ledger {
    info!("Applying {} adjustment rules", rules.len());

    let mut ledger = Ledger::new();
    for date in window.month_ends() {
        for rule in rules.iter().filter(|rule| rule.applies_on(date)) {
            ledger.push(LedgerRow::new(
                rule.cf.as_str(),
                date,
                rule.monthly_amount,
                RuleTag::Adjustments,
                rule.note.as_str(),
            ));
        }
    }

    info!("{} adjustment rows", ledger.len());
    ledger
}
