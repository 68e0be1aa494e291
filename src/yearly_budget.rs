// 📆 Yearly Budgets - Per-year totals spread over twelve months
//
// The table has one row per CF and one column per year. Every CF gets rows
// for every year column of the table; a blank cell counts as zero.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use crate::calendar::month_ends;
use crate::config::SimulationWindow;
use crate::ledger::{Ledger, LedgerRow, RuleTag};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct YearlyBudgetRow {
    pub cf: String,
    pub amounts: BTreeMap<i32, f64>,
}

impl YearlyBudgetRow {
    pub fn new(cf: impl Into<String>) -> Self {
        YearlyBudgetRow {
            cf: cf.into(),
            amounts: BTreeMap::new(),
        }
    }

    pub fn with_amount(mut self, year: i32, amount: f64) -> Self {
        self.amounts.insert(year, amount);
        self
    }

    /// Yearly amount, zero when the cell was blank
    pub fn amount(&self, year: i32) -> f64 {
        self.amounts.get(&year).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct YearlyBudgetTable {
    pub rows: Vec<YearlyBudgetRow>,
    /// Year columns declared by the table header, blank or not
    pub columns: BTreeSet<i32>,
}

impl YearlyBudgetTable {
    pub fn new(rows: Vec<YearlyBudgetRow>) -> Self {
        YearlyBudgetTable {
            rows,
            columns: BTreeSet::new(),
        }
    }

    pub fn with_years<I>(mut self, years: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        self.columns.extend(years);
        self
    }

    /// Every year column of the table, ascending: the declared columns plus
    /// any year a row has an amount for
    pub fn years(&self) -> Vec<i32> {
        let mut years = self.columns.clone();
        for row in &self.rows {
            years.extend(row.amounts.keys().copied());
        }
        years.into_iter().collect()
    }

    /// "yearly budget" rows: amount / 12 at each month-end of the year that
    /// also lies in the window
    pub fn generate(&self, window: &SimulationWindow) -> Ledger {
        info!("Spreading yearly budgets of {} CFs", self.rows.len());

        let years = self.years();
        let mut ledger = Ledger::new();

        for row in &self.rows {
            for &year in &years {
                let (Some(first), Some(last)) = (
                    NaiveDate::from_ymd_opt(year, 1, 1),
                    NaiveDate::from_ymd_opt(year, 12, 31),
                ) else {
                    continue;
                };

                let monthly = row.amount(year) / 12.0;
                for date in month_ends(first, last) {
                    if window.contains(date) {
                        ledger.push(LedgerRow::new(
                            row.cf.as_str(),
                            date,
                            monthly,
                            RuleTag::YearlyBudget,
                            "",
                        ));
                    }
                }
            }
        }

        info!("{} yearly budget rows", ledger.len());
        ledger
    }
}
