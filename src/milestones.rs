// 🎓 Milestone Inference - Complete a career from partial dates
//
// Missing dates are derived by an ordered list of inference rules. Each rule
// targets one milestone, has a precondition on the dates already known and a
// derivation. Rules run in list order and a milestone is only ever set by the
// first rule that applies to it, so the list order is the tie-break:
//
//   retirement  <- birth + 65y (end of month)
//   birth       <- retirement - 65y
//   entry       <- mid - e2m          | senior - e2m - m2s
//   mid         <- entry + e2m        | senior - m2s
//   senior      <- mid + m2s          | entry + e2m + m2s
//
// The senior promotion prefers the mid-rank date: it is the closer of the two
// and the one most often known.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{add_months, add_years, end_of_month};
use crate::config::BudgetSettings;
use crate::error::{BudgetError, BudgetResult};
use crate::records::{CareerRecord, CareerRecordRow, Rank};

// ============================================================================
// MILESTONE SET
// ============================================================================

/// Every career date needed to build a budget schedule.
///
/// Birth and retirement stay unknown when the record only has promotion
/// dates; the full senior-rank period is then empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSet {
    pub date_of_birth: Option<NaiveDate>,
    pub retirement: Option<NaiveDate>,
    pub entry_promotion: NaiveDate,
    pub mid_promotion: NaiveDate,
    pub senior_promotion: NaiveDate,

    /// Entry-rank promotion + first step offset
    pub first_bump: NaiveDate,

    /// Senior-rank promotion + 1, 2 and 3 years
    pub po_step1: NaiveDate,
    pub po_step2: NaiveDate,
    pub po_step3: NaiveDate,

    /// Senior-rank promotion + 4 years: full senior budget from here on
    pub po_full: NaiveDate,
}

/// Monthly budget rate of each rank
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyRates {
    pub entry: f64,
    pub mid: f64,
    pub senior: f64,
}

impl MonthlyRates {
    /// Record overrides win over the settings; the mid rate defaults to the
    /// mean of the (possibly overridden) entry and senior rates.
    pub fn resolve(record: &CareerRecord, settings: &BudgetSettings) -> Self {
        let entry = record
            .entry_yearly_budget
            .unwrap_or(settings.entry_yearly_budget)
            / 12.0;
        let senior = record
            .senior_yearly_budget
            .unwrap_or(settings.senior_yearly_budget)
            / 12.0;
        let mid = match record.mid_yearly_budget {
            Some(yearly) => yearly / 12.0,
            None => (entry + senior) / 2.0,
        };

        MonthlyRates { entry, mid, senior }
    }
}

// ============================================================================
// INFERENCE RULES
// ============================================================================

/// Date slot of the transient profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    DateOfBirth,
    Retirement,
    Promotion(Rank),
}

/// Working copy of the known dates of one CF, filled in by the rules
#[derive(Debug, Clone, Default)]
pub struct CareerProfile {
    pub date_of_birth: Option<NaiveDate>,
    pub retirement: Option<NaiveDate>,
    pub entry_promotion: Option<NaiveDate>,
    pub mid_promotion: Option<NaiveDate>,
    pub senior_promotion: Option<NaiveDate>,
}

impl CareerProfile {
    fn from_record(record: &CareerRecord) -> Self {
        CareerProfile {
            date_of_birth: record.date_of_birth,
            retirement: record.retirement,
            entry_promotion: record.entry_promotion,
            mid_promotion: record.mid_promotion,
            senior_promotion: record.senior_promotion,
        }
    }

    pub fn get(&self, milestone: Milestone) -> Option<NaiveDate> {
        match milestone {
            Milestone::DateOfBirth => self.date_of_birth,
            Milestone::Retirement => self.retirement,
            Milestone::Promotion(Rank::Entry) => self.entry_promotion,
            Milestone::Promotion(Rank::Mid) => self.mid_promotion,
            Milestone::Promotion(Rank::Senior) => self.senior_promotion,
        }
    }

    fn set(&mut self, milestone: Milestone, date: NaiveDate) {
        match milestone {
            Milestone::DateOfBirth => self.date_of_birth = Some(date),
            Milestone::Retirement => self.retirement = Some(date),
            Milestone::Promotion(Rank::Entry) => self.entry_promotion = Some(date),
            Milestone::Promotion(Rank::Mid) => self.mid_promotion = Some(date),
            Milestone::Promotion(Rank::Senior) => self.senior_promotion = Some(date),
        }
    }
}

/// One (precondition, derivation) pair.
///
/// `derive` is only called when `applies` holds; a `None` from it means the
/// calendar arithmetic overflowed.
pub struct InferenceRule {
    pub id: &'static str,
    pub target: Milestone,
    applies: fn(&CareerProfile) -> bool,
    derive: fn(&CareerProfile, &BudgetSettings) -> Option<NaiveDate>,
}

fn default_rules() -> Vec<InferenceRule> {
    vec![
        InferenceRule {
            id: "retirement_from_birth",
            target: Milestone::Retirement,
            applies: |p| p.date_of_birth.is_some(),
            derive: |p, s| end_of_month(add_years(p.date_of_birth?, s.retirement_age_years)?),
        },
        InferenceRule {
            id: "birth_from_retirement",
            target: Milestone::DateOfBirth,
            applies: |p| p.retirement.is_some(),
            derive: |p, s| add_years(p.retirement?, -s.retirement_age_years),
        },
        InferenceRule {
            id: "entry_from_mid",
            target: Milestone::Promotion(Rank::Entry),
            applies: |p| p.mid_promotion.is_some(),
            derive: |p, s| add_months(p.mid_promotion?, -s.entry_to_mid_months),
        },
        InferenceRule {
            id: "entry_from_senior",
            target: Milestone::Promotion(Rank::Entry),
            applies: |p| p.senior_promotion.is_some(),
            derive: |p, s| {
                let mid = add_months(p.senior_promotion?, -s.entry_to_mid_months)?;
                add_months(mid, -s.mid_to_senior_months)
            },
        },
        InferenceRule {
            id: "mid_from_entry",
            target: Milestone::Promotion(Rank::Mid),
            applies: |p| p.entry_promotion.is_some(),
            derive: |p, s| add_months(p.entry_promotion?, s.entry_to_mid_months),
        },
        InferenceRule {
            id: "mid_from_senior",
            target: Milestone::Promotion(Rank::Mid),
            applies: |p| p.senior_promotion.is_some(),
            derive: |p, s| add_months(p.senior_promotion?, -s.mid_to_senior_months),
        },
        InferenceRule {
            id: "senior_from_mid",
            target: Milestone::Promotion(Rank::Senior),
            applies: |p| p.mid_promotion.is_some(),
            derive: |p, s| add_months(p.mid_promotion?, s.mid_to_senior_months),
        },
        InferenceRule {
            id: "senior_from_entry",
            target: Milestone::Promotion(Rank::Senior),
            applies: |p| p.entry_promotion.is_some(),
            derive: |p, s| {
                let mid = add_months(p.entry_promotion?, s.entry_to_mid_months)?;
                add_months(mid, s.mid_to_senior_months)
            },
        },
    ]
}

// ============================================================================
// MILESTONE ENGINE
// ============================================================================

pub struct MilestoneEngine {
    settings: BudgetSettings,
    rules: Vec<InferenceRule>,
}

impl MilestoneEngine {
    pub fn new(settings: BudgetSettings) -> Self {
        MilestoneEngine {
            settings,
            rules: default_rules(),
        }
    }

    pub fn settings(&self) -> &BudgetSettings {
        &self.settings
    }

    /// Rule ids in evaluation order
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.id).collect()
    }

    /// Fill every missing date of the record and derive the anniversaries
    pub fn infer(&self, record: &CareerRecord) -> BudgetResult<MilestoneSet> {
        if !record.has_lifetime_anchor() && !record.has_promotion_anchor() {
            return Err(insufficient(record, "no birth, retirement or promotion date"));
        }

        let mut profile = CareerProfile::from_record(record);

        for rule in &self.rules {
            if profile.get(rule.target).is_some() || !(rule.applies)(&profile) {
                continue;
            }

            let date = (rule.derive)(&profile, &self.settings)
                .ok_or_else(|| overflow(record, rule.id))?;
            debug!("CF {}: {} -> {}", record.cf, rule.id, date);
            profile.set(rule.target, date);
        }

        let (Some(entry_promotion), Some(mid_promotion), Some(senior_promotion)) = (
            profile.entry_promotion,
            profile.mid_promotion,
            profile.senior_promotion,
        ) else {
            return Err(insufficient(record, "no promotion date"));
        };

        let first_bump = add_months(entry_promotion, self.settings.first_step_months)
            .ok_or_else(|| overflow(record, "first_bump"))?;
        let anniversary = |years: i32, what: &str| {
            add_years(senior_promotion, years).ok_or_else(|| overflow(record, what))
        };

        let milestones = MilestoneSet {
            date_of_birth: profile.date_of_birth,
            retirement: profile.retirement,
            entry_promotion,
            mid_promotion,
            senior_promotion,
            first_bump,
            po_step1: anniversary(1, "po_step1")?,
            po_step2: anniversary(2, "po_step2")?,
            po_step3: anniversary(3, "po_step3")?,
            po_full: anniversary(4, "po_full")?,
        };

        debug!(
            "CF {}: entry {} / mid {} / senior {} / retirement {:?}",
            record.cf,
            milestones.entry_promotion,
            milestones.mid_promotion,
            milestones.senior_promotion,
            milestones.retirement
        );

        Ok(milestones)
    }

    /// Monthly rates of the record under this engine's settings
    pub fn rates(&self, record: &CareerRecord) -> MonthlyRates {
        MonthlyRates::resolve(record, &self.settings)
    }
}

impl Default for MilestoneEngine {
    fn default() -> Self {
        Self::new(BudgetSettings::default())
    }
}

fn insufficient(record: &CareerRecord, missing: &str) -> BudgetError {
    BudgetError::InsufficientData {
        cf: record.cf.clone(),
        missing: missing.to_string(),
    }
}

fn overflow(record: &CareerRecord, what: &str) -> BudgetError {
    BudgetError::DateOverflow {
        cf: record.cf.clone(),
        what: what.to_string(),
    }
}

// ============================================================================
// MILESTONE EXPORT (audit)
// ============================================================================

/// Audit row for one CF. Serialized with the parameters-table headers so the
/// export can be fed back as a fully specified career record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneExport {
    #[serde(rename = "CF")]
    pub cf: String,

    #[serde(rename = "DOB")]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(rename = "retirement")]
    pub retirement: Option<NaiveDate>,

    #[serde(rename = "entry promotion")]
    pub entry_promotion: NaiveDate,

    #[serde(rename = "mid promotion")]
    pub mid_promotion: NaiveDate,

    #[serde(rename = "senior promotion")]
    pub senior_promotion: NaiveDate,
}

impl MilestoneExport {
    pub fn new(cf: &str, milestones: &MilestoneSet) -> Self {
        MilestoneExport {
            cf: cf.to_string(),
            date_of_birth: milestones.date_of_birth,
            retirement: milestones.retirement,
            entry_promotion: milestones.entry_promotion,
            mid_promotion: milestones.mid_promotion,
            senior_promotion: milestones.senior_promotion,
        }
    }

    /// Career record with every known date set (no budget overrides)
    pub fn to_record(&self) -> CareerRecord {
        CareerRecord {
            date_of_birth: self.date_of_birth,
            retirement: self.retirement,
            ..CareerRecord::new(self.cf.clone())
                .with_promotion(Rank::Entry, self.entry_promotion)
                .with_promotion(Rank::Mid, self.mid_promotion)
                .with_promotion(Rank::Senior, self.senior_promotion)
        }
    }
}

impl From<MilestoneExport> for CareerRecordRow {
    fn from(export: MilestoneExport) -> Self {
        CareerRecordRow {
            cf: export.cf,
            date_of_birth: export.date_of_birth,
            retirement: export.retirement,
            entry_promotion: Some(export.entry_promotion),
            mid_promotion: Some(export.mid_promotion),
            senior_promotion: Some(export.senior_promotion),
            ..Default::default()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_promotions(milestones: &MilestoneSet) {
        assert_eq!(milestones.entry_promotion, ymd(2000, 1, 1));
        assert_eq!(milestones.mid_promotion, ymd(2006, 10, 1));
        assert_eq!(milestones.senior_promotion, ymd(2013, 7, 1));
    }

    #[test]
    fn test_promotions_when_starting_as_entry_rank() {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("1234")
            .with_date_of_birth(ymd(1970, 3, 15))
            .with_promotion(Rank::Entry, ymd(2000, 1, 1));

        let milestones = engine.infer(&record).unwrap();
        assert_promotions(&milestones);
    }

    #[test]
    fn test_promotions_when_starting_as_mid_rank() {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("1234")
            .with_date_of_birth(ymd(1970, 3, 15))
            .with_promotion(Rank::Mid, ymd(2006, 10, 1));

        let milestones = engine.infer(&record).unwrap();
        assert_promotions(&milestones);
    }

    #[test]
    fn test_promotions_when_starting_as_senior_rank() {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("1234")
            .with_date_of_birth(ymd(1970, 3, 15))
            .with_promotion(Rank::Senior, ymd(2013, 7, 1));

        let milestones = engine.infer(&record).unwrap();
        assert_promotions(&milestones);
    }

    #[test]
    fn test_senior_prefers_mid_over_entry() {
        let engine = MilestoneEngine::default();
        // Entry and mid are inconsistent with the offsets on purpose
        let record = CareerRecord::new("1234")
            .with_date_of_birth(ymd(1970, 3, 15))
            .with_promotion(Rank::Entry, ymd(2000, 1, 1))
            .with_promotion(Rank::Mid, ymd(2005, 1, 1));

        let milestones = engine.infer(&record).unwrap();
        assert_eq!(milestones.entry_promotion, ymd(2000, 1, 1));
        assert_eq!(milestones.mid_promotion, ymd(2005, 1, 1));
        assert_eq!(milestones.senior_promotion, ymd(2011, 10, 1));
    }

    #[test]
    fn test_known_dates_are_never_overwritten() {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("1234")
            .with_retirement(ymd(2040, 8, 31))
            .with_promotion(Rank::Entry, ymd(2001, 2, 1))
            .with_promotion(Rank::Mid, ymd(2007, 3, 1))
            .with_promotion(Rank::Senior, ymd(2012, 4, 1));

        let milestones = engine.infer(&record).unwrap();
        assert_eq!(milestones.entry_promotion, ymd(2001, 2, 1));
        assert_eq!(milestones.mid_promotion, ymd(2007, 3, 1));
        assert_eq!(milestones.senior_promotion, ymd(2012, 4, 1));
        assert_eq!(milestones.retirement, Some(ymd(2040, 8, 31)));
        assert_eq!(milestones.date_of_birth, Some(ymd(1975, 8, 31)));
    }

    #[test]
    fn test_retirement_from_birth_is_end_of_month() {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("1234")
            .with_date_of_birth(ymd(1970, 3, 15))
            .with_promotion(Rank::Entry, ymd(2000, 1, 1));

        let milestones = engine.infer(&record).unwrap();
        assert_eq!(milestones.retirement, Some(ymd(2035, 3, 31)));
        assert_eq!(milestones.date_of_birth, Some(ymd(1970, 3, 15)));
    }

    #[test]
    fn test_derived_anniversaries() {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("1234")
            .with_date_of_birth(ymd(1970, 3, 15))
            .with_promotion(Rank::Entry, ymd(2000, 1, 1));

        let milestones = engine.infer(&record).unwrap();
        assert_eq!(milestones.first_bump, ymd(2003, 1, 1));
        assert_eq!(milestones.po_step1, ymd(2014, 7, 1));
        assert_eq!(milestones.po_step2, ymd(2015, 7, 1));
        assert_eq!(milestones.po_step3, ymd(2016, 7, 1));
        assert_eq!(milestones.po_full, ymd(2017, 7, 1));
    }

    #[test]
    fn test_no_anchor_is_insufficient_data() {
        let engine = MilestoneEngine::default();
        let err = engine.infer(&CareerRecord::new("999")).unwrap_err();
        assert!(matches!(err, BudgetError::InsufficientData { ref cf, .. } if cf == "999"));
    }

    #[test]
    fn test_promotions_without_birth_or_retirement() {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("2").with_promotion(Rank::Mid, ymd(2006, 10, 1));

        let milestones = engine.infer(&record).unwrap();
        assert_promotions(&milestones);
        assert_eq!(milestones.date_of_birth, None);
        assert_eq!(milestones.retirement, None);
        assert_eq!(milestones.po_full, ymd(2017, 7, 1));
    }

    #[test]
    fn test_birth_without_promotion_is_insufficient_data() {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("1").with_date_of_birth(ymd(1970, 1, 1));
        assert!(matches!(
            engine.infer(&record),
            Err(BudgetError::InsufficientData { ref missing, .. }) if missing == "no promotion date"
        ));
    }

    #[test]
    fn test_export_round_trip_without_lifetime_dates() {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("2").with_promotion(Rank::Entry, ymd(2000, 1, 1));

        let first = engine.infer(&record).unwrap();
        let export = MilestoneExport::new(&record.cf, &first);
        assert_eq!(export.retirement, None);

        let via_row = CareerRecordRow::from(export).into_record().unwrap();
        assert_eq!(engine.infer(&via_row).unwrap(), first);
    }

    #[test]
    fn test_rates_defaults_and_overrides() {
        let settings = BudgetSettings::default();

        let rates = MonthlyRates::resolve(&CareerRecord::new("1"), &settings);
        assert_eq!(rates.entry, 445_000.0 / 12.0);
        assert_eq!(rates.senior, 1_000_000.0 / 12.0);
        assert!((rates.mid - (445_000.0 + 1_000_000.0) / 2.0 / 12.0).abs() < 1e-9);

        // Mid defaults to the mean of the overridden rates
        let record = CareerRecord::new("2")
            .with_yearly_budget(Rank::Entry, 120_000.0)
            .with_yearly_budget(Rank::Senior, 240_000.0);
        let rates = MonthlyRates::resolve(&record, &settings);
        assert!((rates.mid - 15_000.0).abs() < 1e-9);

        let record = CareerRecord::new("3").with_yearly_budget(Rank::Mid, 600_000.0);
        assert_eq!(MonthlyRates::resolve(&record, &settings).mid, 50_000.0);
    }

    #[test]
    fn test_rule_order() {
        let engine = MilestoneEngine::default();
        assert_eq!(
            engine.rule_ids(),
            vec![
                "retirement_from_birth",
                "birth_from_retirement",
                "entry_from_mid",
                "entry_from_senior",
                "mid_from_entry",
                "mid_from_senior",
                "senior_from_mid",
                "senior_from_entry",
            ]
        );
    }

    #[test]
    fn test_export_round_trip() {
        let engine = MilestoneEngine::default();
        let record = CareerRecord::new("1234")
            .with_date_of_birth(ymd(1968, 2, 29))
            .with_promotion(Rank::Senior, ymd(2013, 7, 31));

        let first = engine.infer(&record).unwrap();
        let export = MilestoneExport::new(&record.cf, &first);

        let replay = export.to_record();
        assert!(replay.date_of_birth.is_some() && replay.retirement.is_some());
        assert_eq!(engine.infer(&replay).unwrap(), first);

        let via_row = CareerRecordRow::from(export).into_record().unwrap();
        assert_eq!(engine.infer(&via_row).unwrap(), first);
    }
}
