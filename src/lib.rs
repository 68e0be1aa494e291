// Budget Ledger - Core Library
// Career budget simulation and negotiated-budget reconciliation, shared by
// the CLI and the tests

pub mod calendar;
pub mod config;
pub mod error;
pub mod records;
pub mod milestones;      // Milestone inference (ordered rules)
pub mod schedule;        // 8-period monthly budget schedule
pub mod ledger;          // Ledger rows + budget ledger generator
pub mod reconciliation;  // Negotiated lab budgets
pub mod adjustments;     // Manual monthly adjustments
pub mod yearly_budget;   // Yearly budget table
pub mod simulation;
pub mod io;

// Re-export commonly used types
pub use config::{BudgetSettings, SimulationConfig, SimulationWindow};
pub use error::{BudgetError, BudgetResult};
pub use records::{CareerRecord, CareerRecordRow, Rank};
pub use milestones::{
    InferenceRule, Milestone, MilestoneEngine, MilestoneExport, MilestoneSet, MonthlyRates,
};
pub use schedule::{Period, Schedule, OUTSIDE_NOTE, PERIOD_COUNT};
pub use ledger::{generate_budget_ledger, Ledger, LedgerRow, RuleTag};
pub use reconciliation::{
    FixedBudgetRule, Reconciliation, ReconciliationEngine, ReconciliationReport,
};
pub use adjustments::{generate_adjustments, AdjustmentRule};
pub use yearly_budget::{YearlyBudgetRow, YearlyBudgetTable};
pub use simulation::{
    simulate, simulate_cf, CfFailure, CfSimulation, SimulationInputs, SimulationOutput,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
