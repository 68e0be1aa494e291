// 🧮 Simulation - All rule modules over every cost center
//
// 1. budget rule, CF by CF (a failing CF is reported, the others go on)
// 2. negotiated budgets reconciled against the budget rows
// 3. manual adjustments
// 4. yearly budget table
//
// Each step builds its own ledger; the final ledger is their concatenation
// in that order.

use serde::Serialize;
use tracing::{info, warn};

use crate::adjustments::{generate_adjustments, AdjustmentRule};
use crate::config::{SimulationConfig, SimulationWindow};
use crate::error::{BudgetError, BudgetResult};
use crate::ledger::{generate_budget_ledger, Ledger};
use crate::milestones::{MilestoneEngine, MilestoneExport, MilestoneSet};
use crate::reconciliation::{FixedBudgetRule, ReconciliationEngine, ReconciliationReport};
use crate::records::{CareerRecord, CareerRecordRow};
use crate::schedule::Schedule;
use crate::yearly_budget::YearlyBudgetTable;

// ============================================================================
// INPUTS / OUTPUTS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SimulationInputs {
    pub careers: Vec<CareerRecord>,
    pub fixed_budgets: Vec<FixedBudgetRule>,
    pub adjustments: Vec<AdjustmentRule>,
    pub yearly_budgets: Option<YearlyBudgetTable>,

    /// Parameters rows that could not be turned into a career record
    pub rejected: Vec<CfFailure>,
}

impl SimulationInputs {
    pub fn new(careers: Vec<CareerRecord>) -> Self {
        SimulationInputs {
            careers,
            ..Default::default()
        }
    }

    /// Convert raw parameters rows, keeping the invalid ones as failures
    pub fn from_rows(rows: Vec<CareerRecordRow>) -> Self {
        let mut inputs = SimulationInputs::default();
        for row in rows {
            let cf = row.cf.trim().to_string();
            match row.into_record() {
                Ok(record) => inputs.careers.push(record),
                Err(error) => inputs.rejected.push(CfFailure { cf, error }),
            }
        }
        inputs
    }
}

/// A CF whose budget could not be simulated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfFailure {
    pub cf: String,
    #[serde(serialize_with = "serialize_error")]
    pub error: BudgetError,
}

fn serialize_error<S: serde::Serializer>(error: &BudgetError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&error.to_string())
}

/// Budget rule result for one CF
#[derive(Debug, Clone, PartialEq)]
pub struct CfSimulation {
    pub milestones: MilestoneSet,
    pub schedule: Schedule,
    pub ledger: Ledger,
}

#[derive(Debug, Clone, Default)]
pub struct SimulationOutput {
    pub ledger: Ledger,
    pub milestones: Vec<MilestoneExport>,
    pub failures: Vec<CfFailure>,
    pub reconciliation: Option<ReconciliationReport>,
}

impl SimulationOutput {
    pub fn summary(&self) -> String {
        format!(
            "{} ledger rows, {} CFs simulated, {} CFs failed",
            self.ledger.len(),
            self.milestones.len(),
            self.failures.len()
        )
    }
}

// ============================================================================
// SIMULATION
// ============================================================================

/// Milestones, schedule and budget rows of a single CF
pub fn simulate_cf(
    engine: &MilestoneEngine,
    record: &CareerRecord,
    window: &SimulationWindow,
) -> BudgetResult<CfSimulation> {
    record.validate_overrides()?;

    let milestones = engine.infer(record)?;
    let schedule = Schedule::build(&milestones, &engine.rates(record), engine.settings());
    let ledger = generate_budget_ledger(&record.cf, &schedule, window);

    Ok(CfSimulation {
        milestones,
        schedule,
        ledger,
    })
}

/// Run every rule module and assemble the final ledger
pub fn simulate(inputs: &SimulationInputs, config: &SimulationConfig) -> SimulationOutput {
    let window = config.window;
    let engine = MilestoneEngine::new(config.budget.clone());

    info!(
        "Starting simulation of {} CFs from {} to {}",
        inputs.careers.len(),
        window.start,
        window.end
    );

    let mut failures = inputs.rejected.clone();
    let mut milestones = Vec::new();
    let mut budget_parts = Vec::new();

    for record in &inputs.careers {
        match simulate_cf(&engine, record, &window) {
            Ok(result) => {
                milestones.push(MilestoneExport::new(&record.cf, &result.milestones));
                budget_parts.push(result.ledger);
            }
            Err(error) => {
                warn!("Skipping CF {}: {}", record.cf, error);
                failures.push(CfFailure {
                    cf: record.cf.clone(),
                    error,
                });
            }
        }
    }

    let budget_ledger = Ledger::concat(budget_parts);
    info!("Budget rule produced {} rows", budget_ledger.len());

    let reconciliation = if inputs.fixed_budgets.is_empty() {
        None
    } else {
        Some(ReconciliationEngine::new().reconcile(&budget_ledger, &inputs.fixed_budgets, &window))
    };

    let adjustments = if inputs.adjustments.is_empty() {
        Ledger::new()
    } else {
        generate_adjustments(&inputs.adjustments, &window)
    };

    let yearly = match &inputs.yearly_budgets {
        Some(table) => table.generate(&window),
        None => Ledger::new(),
    };

    let (negotiated, report) = match reconciliation {
        Some(result) => (result.ledger, Some(result.report)),
        None => (Ledger::new(), None),
    };

    let output = SimulationOutput {
        ledger: Ledger::concat([budget_ledger, negotiated, adjustments, yearly]),
        milestones,
        failures,
        reconciliation: report,
    };

    info!("Simulation done: {}", output.summary());
    output
}

// ============================================================================
// TESTS
// ============================================================================
