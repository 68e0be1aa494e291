// End-to-end runs: CSV inputs -> simulation -> CSV outputs

use budget_ledger::io::{
    load_career_records, load_fixed_budgets, write_ledger, write_milestones,
};
use budget_ledger::{
    simulate, CareerRecord, FixedBudgetRule, Ledger, LedgerRow, MilestoneEngine, Rank,
    ReconciliationEngine, RuleTag, Schedule, SimulationConfig, SimulationInputs,
    SimulationWindow, PERIOD_COUNT,
};
use chrono::NaiveDate;
use proptest::prelude::*;
use std::fs;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_csv_pipeline_with_negotiated_budgets() {
    let dir = tempfile::tempdir().unwrap();

    let params = dir.path().join("params.csv");
    fs::write(
        &params,
        "CF,DOB,retirement,PATT promotion,PA promotion,PO promotion,PATT yearly budget,PA yearly budget,PO yearly budget\n\
         1001,1970-03-15,,2000-01-01,,,,,\n\
         1002,,2040-06-30,,2015-04-01,,,,\n\
         1003,,,,,,,,\n",
    )
    .unwrap();

    let fixed = dir.path().join("fixed.csv");
    fs::write(
        &fixed,
        "CF,From,To,Annual amount\n\
         1001,2020-01-01,2020-06-30,1200000\n\
         LAB-7,2020-01-01,2020-12-31,240000\n",
    )
    .unwrap();

    let mut inputs = SimulationInputs::from_rows(load_career_records(&params).unwrap());
    inputs.fixed_budgets = load_fixed_budgets(&fixed).unwrap();

    let config = SimulationConfig {
        window: SimulationWindow::new(ymd(2020, 1, 1), ymd(2020, 12, 31)).unwrap(),
        ..Default::default()
    };
    let output = simulate(&inputs, &config);

    // 1003 has no anchor at all
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].cf, "1003");
    assert_eq!(output.milestones.len(), 2);

    let report = output.reconciliation.as_ref().unwrap();
    assert_eq!(report.absent_cfs, vec!["LAB-7".to_string()]);
    // 1001: Jan..Jun, LAB-7: every month
    assert_eq!(report.adjustment_count, 6 + 12);

    for date in SimulationWindow::new(ymd(2020, 1, 1), ymd(2020, 6, 30)).unwrap().month_ends() {
        assert!((output.ledger.total_for("1001", date) - 100_000.0).abs() < 1e-6);
        assert!((output.ledger.total_for("LAB-7", date) - 20_000.0).abs() < 1e-9);
    }
    // No negotiated figure after June: full senior budget is left alone
    assert_eq!(output.ledger.total_for("1001", ymd(2020, 9, 30)), 1_000_000.0 / 12.0);

    let ledger_path = dir.path().join("ledger.csv");
    let milestones_path = dir.path().join("milestones.csv");
    assert_eq!(write_ledger(&ledger_path, &output.ledger).unwrap(), output.ledger.len());
    write_milestones(&milestones_path, &output.milestones).unwrap();

    // The milestone export reads back as fully specified careers
    let replay = SimulationInputs::from_rows(load_career_records(&milestones_path).unwrap());
    assert!(replay.rejected.is_empty());
    let replayed = simulate(&replay, &config);
    assert_eq!(replayed.milestones, output.milestones);
}

#[test]
fn test_reconciliation_is_idempotent_on_simulated_ledger() {
    let engine = MilestoneEngine::default();
    let window = SimulationWindow::new(ymd(1995, 1, 1), ymd(2095, 1, 1)).unwrap();
    let record = CareerRecord::new("1234")
        .with_date_of_birth(ymd(1970, 3, 15))
        .with_promotion(Rank::Entry, ymd(2000, 1, 1));
    let milestones = engine.infer(&record).unwrap();
    let schedule = Schedule::build(&milestones, &engine.rates(&record), engine.settings());
    let ledger = budget_ledger::generate_budget_ledger("1234", &schedule, &window);

    let rules = vec![FixedBudgetRule {
        cf: "1234".to_string(),
        from: ymd(2010, 1, 1),
        to: ymd(2019, 12, 31),
        annual_amount: 700_000.0,
    }];

    let reconciler = ReconciliationEngine::new();
    let first = reconciler.reconcile(&ledger, &rules, &window);
    let second = reconciler.reconcile(&ledger, &rules, &window);

    assert_eq!(first.ledger.digest(), second.ledger.digest());
    assert_eq!(first.report, second.report);
    assert!(first.ledger.iter().all(|row| row.date >= ymd(2010, 1, 1) && row.date <= ymd(2019, 12, 31)));
}

prop_compose! {
    fn arb_date()(year in 1950i32..2050, month in 1u32..=12, day in 1u32..=28) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }
}

proptest! {
    #[test]
    fn prop_schedule_has_eight_contiguous_periods(
        entry in arb_date(),
        birth_offset_years in 25i32..45,
        rank_index in 0usize..3,
    ) {
        let rank = [Rank::Entry, Rank::Mid, Rank::Senior][rank_index];
        let birth = budget_ledger::calendar::add_years(entry, -birth_offset_years).unwrap();
        let record = CareerRecord::new("P")
            .with_date_of_birth(birth)
            .with_promotion(rank, entry);

        let engine = MilestoneEngine::default();
        let milestones = engine.infer(&record).unwrap();
        let schedule = Schedule::build(&milestones, &engine.rates(&record), engine.settings());

        prop_assert_eq!(schedule.periods().len(), PERIOD_COUNT);
        prop_assert!(schedule.is_contiguous());
        prop_assert!(schedule.periods()[..7].iter().all(|p| p.from < p.to));
    }

    #[test]
    fn prop_adjustment_closes_the_gap(
        calculated in proptest::collection::vec(-1.0e6f64..1.0e6, 12),
        annual in -1.0e7f64..1.0e7,
    ) {
        let window = SimulationWindow::new(ymd(2021, 1, 1), ymd(2021, 12, 31)).unwrap();
        let rows: Vec<LedgerRow> = window
            .month_ends()
            .into_iter()
            .zip(calculated.iter())
            .map(|(date, amount)| LedgerRow::new("CF", date, *amount, RuleTag::Budget, ""))
            .collect();
        let ledger = Ledger::from_rows(rows);
        let rules = vec![FixedBudgetRule {
            cf: "CF".to_string(),
            from: ymd(2021, 1, 1),
            to: ymd(2021, 12, 31),
            annual_amount: annual,
        }];

        let result = ReconciliationEngine::new().reconcile(&ledger, &rules, &window);
        let combined = Ledger::concat(vec![ledger, result.ledger]);

        for date in window.month_ends() {
            prop_assert!((combined.total_for("CF", date) - annual / 12.0).abs() < 1e-6);
        }
    }
}
