// 🗓️ Period Schedule - Monthly budget per career period
//
// A schedule is always eight contiguous half-open periods going from the
// entry-rank promotion to retirement:
//
//   P1 [entry, first bump)       entry rate
//   P2 [first bump, mid)         entry rate + first step increase
//   P3 [mid, senior)             mid rate
//   P4..P7 yearly steps          previous budget + (senior - mid) / years
//   P8 [po full, retirement)     senior rate
//
// Without a known retirement date P8 is empty. Dates outside every period
// have a zero budget.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::BudgetSettings;
use crate::milestones::{MilestoneSet, MonthlyRates};

pub const PERIOD_COUNT: usize = 8;

/// Note used for dates that no period covers
pub const OUTSIDE_NOTE: &str = "outside of calculated values";

// ============================================================================
// PERIOD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    /// First day of the period (inclusive)
    pub from: NaiveDate,
    /// First day after the period (exclusive)
    pub to: NaiveDate,
    /// Monthly budget during the period
    pub budget: f64,
    pub note: String,
}

impl Period {
    fn new(from: NaiveDate, to: NaiveDate, budget: f64, note: &str) -> Self {
        Period {
            from,
            to,
            budget,
            note: note.to_string(),
        }
    }

    /// `from <= date < to`
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date < self.to
    }
}

// ============================================================================
// SCHEDULE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    periods: [Period; PERIOD_COUNT],
}

impl Schedule {
    /// Build the eight periods of a career.
    ///
    /// The senior ramp-up is carried forward period by period (each step adds
    /// the increment to the previous budget), it is never recomputed from the
    /// mid rate.
    pub fn build(milestones: &MilestoneSet, rates: &MonthlyRates, settings: &BudgetSettings) -> Self {
        let m = milestones;

        let p1_budget = rates.entry;
        let p2_budget = p1_budget + settings.first_step_yearly_increase / 12.0;
        let p3_budget = rates.mid;

        let increment = (rates.senior - rates.mid) / f64::from(settings.years_to_reach_senior_budget);
        let p4_budget = p3_budget + increment;
        let p5_budget = p4_budget + increment;
        let p6_budget = p5_budget + increment;
        let p7_budget = p6_budget + increment;

        Schedule {
            periods: [
                Period::new(
                    m.entry_promotion,
                    m.first_bump,
                    p1_budget,
                    "Between the entry-rank promotion and the first bump in the budget",
                ),
                Period::new(
                    m.first_bump,
                    m.mid_promotion,
                    p2_budget,
                    "Between the first bump in the budget and the mid-rank promotion",
                ),
                Period::new(
                    m.mid_promotion,
                    m.senior_promotion,
                    p3_budget,
                    "Between the mid-rank promotion and the senior-rank promotion",
                ),
                Period::new(
                    m.senior_promotion,
                    m.po_step1,
                    p4_budget,
                    "1st year after the senior-rank promotion",
                ),
                Period::new(
                    m.po_step1,
                    m.po_step2,
                    p5_budget,
                    "2nd year after the senior-rank promotion",
                ),
                Period::new(
                    m.po_step2,
                    m.po_step3,
                    p6_budget,
                    "3rd year after the senior-rank promotion",
                ),
                Period::new(
                    m.po_step3,
                    m.po_full,
                    p7_budget,
                    "4th year after the senior-rank promotion",
                ),
                Period::new(
                    m.po_full,
                    m.retirement.unwrap_or(m.po_full),
                    rates.senior,
                    "Full senior-rank budget",
                ),
            ],
        }
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// First period (in P1..P8 order) containing `date`
    pub fn period_at(&self, date: NaiveDate) -> Option<&Period> {
        self.periods.iter().find(|period| period.contains(date))
    }

    /// Budget and note at `date`, zero outside the schedule
    pub fn budget_at(&self, date: NaiveDate) -> (f64, &str) {
        match self.period_at(date) {
            Some(period) => (period.budget, period.note.as_str()),
            None => (0.0, OUTSIDE_NOTE),
        }
    }

    /// True when every period ends where the next one starts
    pub fn is_contiguous(&self) -> bool {
        self.periods.windows(2).all(|pair| pair[0].to == pair[1].from)
    }
}

// ============================================================================
// TESTS
// ============================================================================
