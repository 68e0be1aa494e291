// 📂 CSV adapters - Input tables in, ledger and milestones out
//
// Dates are ISO (YYYY-MM-DD); an empty cell is a missing value.

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::adjustments::AdjustmentRule;
use crate::ledger::{Ledger, RuleTag};
use crate::milestones::MilestoneExport;
use crate::reconciliation::FixedBudgetRule;
use crate::records::CareerRecordRow;
use crate::yearly_budget::{YearlyBudgetRow, YearlyBudgetTable};

// ============================================================================
// READERS
// ============================================================================

fn load_csv<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {} file: {:?}", what, path))?;

    let mut rows = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let row: T = result.with_context(|| {
            format!("Failed to deserialize {} row {} of {:?}", what, index + 1, path)
        })?;
        rows.push(row);
    }

    info!("Loaded {} {} rows from {:?}", rows.len(), what, path);
    Ok(rows)
}

/// Parameters table: one career per CF
pub fn load_career_records(path: &Path) -> Result<Vec<CareerRecordRow>> {
    load_csv(path, "parameters")
}

/// Negotiated budgets: CF, From, To, Annual amount
pub fn load_fixed_budgets(path: &Path) -> Result<Vec<FixedBudgetRule>> {
    load_csv(path, "fixed budgets")
}

/// Manual adjustments: CF, From, To, Monthly amount, Note
pub fn load_adjustment_rules(path: &Path) -> Result<Vec<AdjustmentRule>> {
    load_csv(path, "adjustments")
}

/// Yearly budgets: a CF column plus one column per 4-digit year.
/// Other columns are ignored, blank cells are left out of the row.
pub fn load_yearly_budgets(path: &Path) -> Result<YearlyBudgetTable> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open yearly budgets file: {:?}", path))?;

    let headers = rdr.headers().context("Failed to read yearly budgets header")?.clone();
    let cf_index = headers
        .iter()
        .position(|h| h.trim() == "CF")
        .ok_or_else(|| anyhow!("Yearly budgets file {:?} has no CF column", path))?;
    let year_columns: Vec<(usize, i32)> = headers
        .iter()
        .enumerate()
        .filter_map(|(index, header)| parse_year_header(header).map(|year| (index, year)))
        .collect();

    let mut rows = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read yearly budgets row {}", line + 1))?;

        let mut row = YearlyBudgetRow::new(record.get(cf_index).unwrap_or_default().trim());
        for &(index, year) in &year_columns {
            let cell = record.get(index).unwrap_or_default().trim();
            if cell.is_empty() {
                continue;
            }
            let amount: f64 = cell.parse().with_context(|| {
                format!("CF {}: invalid {} budget '{}'", row.cf, year, cell)
            })?;
            row.amounts.insert(year, amount);
        }
        rows.push(row);
    }

    info!("Loaded yearly budgets of {} CFs from {:?}", rows.len(), path);
    Ok(YearlyBudgetTable::new(rows).with_years(year_columns.into_iter().map(|(_, year)| year)))
}

fn parse_year_header(header: &str) -> Option<i32> {
    let header = header.trim();
    if header.len() == 4 && header.chars().all(|c| c.is_ascii_digit()) {
        header.parse().ok()
    } else {
        None
    }
}

// ============================================================================
// WRITERS
// ============================================================================

/// Ledger row as written to disk; year and month ease spreadsheet filtering
#[derive(Debug, Serialize)]
struct LedgerExportRow<'a> {
    #[serde(rename = "CF")]
    cf: &'a str,
    date: NaiveDate,
    budget: f64,
    rule: RuleTag,
    note: &'a str,
    year: i32,
    month: u32,
}

fn write_csv<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>, what: &str) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {} file: {:?}", what, path))?;

    let mut count = 0;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("Failed to write {} row {}", what, count + 1))?;
        count += 1;
    }
    wtr.flush().with_context(|| format!("Failed to flush {:?}", path))?;

    info!("Wrote {} {} rows to {:?}", count, what, path);
    Ok(count)
}

pub fn write_ledger(path: &Path, ledger: &Ledger) -> Result<usize> {
    let rows = ledger.iter().map(|row| LedgerExportRow {
        cf: &row.cf,
        date: row.date,
        budget: row.budget,
        rule: row.rule,
        note: &row.note,
        year: row.date.year(),
        month: row.date.month(),
    });
    write_csv(path, rows, "ledger")
}

pub fn write_milestones(path: &Path, milestones: &[MilestoneExport]) -> Result<usize> {
    write_csv(path, milestones, "milestones")
}

// ============================================================================
// TESTS
// ============================================================================
