//! Risk stratification rules.
//!
//! Each cohort has two independent criterion lists. A record is **High** when at least
//! [`HIGH_RISK_MIN_CRITERIA`] High criteria hold, otherwise **Medium** when any single Medium
//! criterion holds, otherwise **Safe**. High is not a refinement of Medium: once two High
//! criteria fire the Medium list is not consulted at all.
//!
//! The thresholds below are the posyandu screening thresholds and are reproduced literally.
//! High thresholds use strict `<`, Medium thresholds use inclusive `<=`. A criterion whose
//! input is absent never fires.
//!
//! | Cohort          | High (need 2)                                     | Medium (need 1)                                     |
//! |-----------------|---------------------------------------------------|-----------------------------------------------------|
//! | child           | HAZ < -3, Hb < 10, LiLA < 11.5                    | HAZ <= -2.0, Hb <= 10.9, LiLA <= 12.4               |
//! | pregnantWoman   | LiLA < 22, Hb < 10, weight stagnant, no iron      | LiLA <= 23.4, Hb <= 10.9, gain < 1 kg/month, no iron |
//! | adolescentGirl  | LiLA < 22, Hb < 11, BMI < 17, no iron             | LiLA <= 23.4, Hb <= 11.9, BMI <= 18.4, no iron      |

use crate::cohort::{Cohort, CohortCode};
use crate::constants::{HIGH_RISK_MIN_CRITERIA, RISK_HIGH, RISK_MEDIUM, RISK_SAFE};
use crate::record::MeasurementRecord;
use prima_types::PatientId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Risk band assigned to a single record. Derived on demand, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Safe,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => RISK_SAFE,
            RiskLevel::Medium => RISK_MEDIUM,
            RiskLevel::High => RISK_HIGH,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric input read from a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Measure {
    HeightForAgeZ,
    AverageHb,
    Lila,
    Bmi,
    MonthlyWeightGain,
}

impl Measure {
    fn read(self, record: &MeasurementRecord) -> Option<f64> {
        match self {
            Measure::HeightForAgeZ => record.height_for_age_z,
            Measure::AverageHb => record.average_hb(),
            Measure::Lila => record.lila_cm,
            Measure::Bmi => record.bmi,
            Measure::MonthlyWeightGain => record.monthly_weight_gain_kg,
        }
    }
}

/// A yes/no input read from a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    WeightStagnant,
    IronAdherent,
}

impl Flag {
    fn read(self, record: &MeasurementRecord) -> Option<bool> {
        match self {
            Flag::WeightStagnant => record.weight_stagnant,
            Flag::IronAdherent => record.iron_adherent,
        }
    }
}

/// A single screening predicate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Criterion {
    /// Fires when the measure is present and strictly below the threshold.
    Below(Measure, f64),
    /// Fires when the measure is present and at or below the threshold.
    AtOrBelow(Measure, f64),
    /// Fires when the flag is present and equal to the expected value.
    FlagIs(Flag, bool),
}

impl Criterion {
    pub fn is_met(&self, record: &MeasurementRecord) -> bool {
        match *self {
            Criterion::Below(measure, threshold) => {
                measure.read(record).is_some_and(|v| v < threshold)
            }
            Criterion::AtOrBelow(measure, threshold) => {
                measure.read(record).is_some_and(|v| v <= threshold)
            }
            Criterion::FlagIs(flag, expected) => flag.read(record) == Some(expected),
        }
    }
}

/// The High and Medium criteria for one cohort.
#[derive(Debug)]
pub struct CriteriaSet {
    pub high: &'static [Criterion],
    pub medium: &'static [Criterion],
}

const CHILD: CriteriaSet = CriteriaSet {
    high: &[
        Criterion::Below(Measure::HeightForAgeZ, -3.0),
        Criterion::Below(Measure::AverageHb, 10.0),
        Criterion::Below(Measure::Lila, 11.5),
    ],
    medium: &[
        Criterion::AtOrBelow(Measure::HeightForAgeZ, -2.0),
        Criterion::AtOrBelow(Measure::AverageHb, 10.9),
        Criterion::AtOrBelow(Measure::Lila, 12.4),
    ],
};

const PREGNANT_WOMAN: CriteriaSet = CriteriaSet {
    high: &[
        Criterion::Below(Measure::Lila, 22.0),
        Criterion::Below(Measure::AverageHb, 10.0),
        Criterion::FlagIs(Flag::WeightStagnant, true),
        Criterion::FlagIs(Flag::IronAdherent, false),
    ],
    medium: &[
        Criterion::AtOrBelow(Measure::Lila, 23.4),
        Criterion::AtOrBelow(Measure::AverageHb, 10.9),
        Criterion::Below(Measure::MonthlyWeightGain, 1.0),
        Criterion::FlagIs(Flag::IronAdherent, false),
    ],
};

const ADOLESCENT_GIRL: CriteriaSet = CriteriaSet {
    high: &[
        Criterion::Below(Measure::Lila, 22.0),
        Criterion::Below(Measure::AverageHb, 11.0),
        Criterion::Below(Measure::Bmi, 17.0),
        Criterion::FlagIs(Flag::IronAdherent, false),
    ],
    medium: &[
        Criterion::AtOrBelow(Measure::Lila, 23.4),
        Criterion::AtOrBelow(Measure::AverageHb, 11.9),
        Criterion::AtOrBelow(Measure::Bmi, 18.4),
        Criterion::FlagIs(Flag::IronAdherent, false),
    ],
};

/// The criteria applied to `cohort`, for audit and display.
pub fn criteria(cohort: Cohort) -> &'static CriteriaSet {
    match cohort {
        Cohort::Child => &CHILD,
        Cohort::PregnantWoman => &PREGNANT_WOMAN,
        Cohort::AdolescentGirl => &ADOLESCENT_GIRL,
    }
}

fn count_met(criteria: &[Criterion], record: &MeasurementRecord) -> usize {
    criteria.iter().filter(|c| c.is_met(record)).count()
}

/// Classifies `record` under the rules of `cohort`.
///
/// Total and deterministic: missing inputs leave their criteria untriggered, and an
/// unrecognised cohort always yields [`RiskLevel::Safe`].
pub fn classify(cohort: &CohortCode, record: &MeasurementRecord) -> RiskLevel {
    let Some(cohort) = cohort.cohort() else {
        tracing::debug!(
            record_id = %record.id,
            cohort = %cohort,
            "unrecognised cohort, classifying as Safe"
        );
        return RiskLevel::Safe;
    };

    let rules = criteria(cohort);
    if count_met(rules.high, record) >= HIGH_RISK_MIN_CRITERIA {
        return RiskLevel::High;
    }
    if rules.medium.iter().any(|c| c.is_met(record)) {
        return RiskLevel::Medium;
    }
    RiskLevel::Safe
}

/// Classifies `record` under the cohort supplied alongside it.
pub fn classify_record(record: &MeasurementRecord) -> RiskLevel {
    classify(&record.cohort, record)
}

/// A classification together with the criteria counts behind it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub record_id: Uuid,
    pub patient_id: PatientId,
    pub cohort: CohortCode,
    pub level: RiskLevel,
    pub high_criteria_met: usize,
    pub medium_criteria_met: usize,
}

/// Classifies `record` and reports how many criteria of each list fired.
pub fn assess(record: &MeasurementRecord) -> Assessment {
    let (high_criteria_met, medium_criteria_met) = match record.cohort.cohort() {
        Some(cohort) => {
            let rules = criteria(cohort);
            (count_met(rules.high, record), count_met(rules.medium, record))
        }
        None => (0, 0),
    };

    Assessment {
        record_id: record.id,
        patient_id: record.patient_id.clone(),
        cohort: record.cohort.clone(),
        level: classify_record(record),
        high_criteria_met,
        medium_criteria_met,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::OpaqueJson;
    use chrono::{TimeZone, Utc};

    fn blank(cohort: impl Into<CohortCode>) -> MeasurementRecord {
        MeasurementRecord::new(
            PatientId::new("P001").unwrap(),
            cohort,
            Utc.with_ymd_and_hms(2025, 5, 10, 8, 0, 0).unwrap(),
        )
    }

    fn hb(value: f64) -> Option<OpaqueJson> {
        Some(OpaqueJson::from_text(format!(r#"{{"averageHb": {value}}}"#)).unwrap())
    }

    #[test]
    fn missing_fields_are_safe_for_every_cohort() {
        for cohort in Cohort::ALL {
            assert_eq!(classify_record(&blank(cohort)), RiskLevel::Safe, "{cohort}");
        }
    }

    #[test]
    fn child_height_for_age_boundary_is_inclusive_for_medium() {
        let mut record = blank(Cohort::Child);

        record.height_for_age_z = Some(-2.0);
        assert_eq!(classify_record(&record), RiskLevel::Medium);

        // -2.01 <= -2.0 still holds, so Medium still fires.
        record.height_for_age_z = Some(-2.01);
        assert_eq!(classify_record(&record), RiskLevel::Medium);

        record.height_for_age_z = Some(-1.99);
        assert_eq!(classify_record(&record), RiskLevel::Safe);
    }

    #[test]
    fn child_high_boundaries_are_strict() {
        let mut record = blank(Cohort::Child);
        record.height_for_age_z = Some(-3.0);
        record.hemoglobin_result = hb(10.0);
        record.lila_cm = Some(11.5);
        // None of the High thresholds are crossed, but all Medium ones are.
        assert_eq!(classify_record(&record), RiskLevel::Medium);

        record.height_for_age_z = Some(-3.1);
        record.lila_cm = Some(11.4);
        assert_eq!(classify_record(&record), RiskLevel::High);
    }

    #[test]
    fn single_high_criterion_falls_through_to_medium() {
        let mut record = blank(Cohort::PregnantWoman);
        record.lila_cm = Some(21.0);
        record.hemoglobin_result = hb(12.0);
        record.weight_stagnant = Some(false);
        record.iron_adherent = Some(true);

        let assessment = assess(&record);
        assert_eq!(assessment.high_criteria_met, 1);
        assert_eq!(assessment.level, RiskLevel::Medium);
    }

    #[test]
    fn pregnant_woman_two_high_criteria_is_high() {
        let mut record = blank(Cohort::PregnantWoman);
        record.weight_stagnant = Some(true);
        record.iron_adherent = Some(false);
        assert_eq!(classify_record(&record), RiskLevel::High);
    }

    #[test]
    fn pregnant_woman_low_weight_gain_is_medium_only() {
        let mut record = blank(Cohort::PregnantWoman);
        record.monthly_weight_gain_kg = Some(0.99);
        assert_eq!(classify_record(&record), RiskLevel::Medium);

        record.monthly_weight_gain_kg = Some(1.0);
        assert_eq!(classify_record(&record), RiskLevel::Safe);
    }

    #[test]
    fn missing_iron_flag_does_not_count_as_non_adherent() {
        let mut record = blank(Cohort::AdolescentGirl);
        record.iron_adherent = None;
        record.bmi = Some(16.5);
        // Only BMI fires on the High list.
        assert_eq!(classify_record(&record), RiskLevel::Medium);

        record.iron_adherent = Some(false);
        assert_eq!(classify_record(&record), RiskLevel::High);
    }

    #[test]
    fn adolescent_girl_hb_thresholds() {
        let mut record = blank(Cohort::AdolescentGirl);
        record.hemoglobin_result = hb(11.9);
        assert_eq!(classify_record(&record), RiskLevel::Medium);

        record.hemoglobin_result = hb(12.0);
        assert_eq!(classify_record(&record), RiskLevel::Safe);

        record.hemoglobin_result = hb(10.8);
        record.lila_cm = Some(21.9);
        assert_eq!(classify_record(&record), RiskLevel::High);
    }

    #[test]
    fn zero_or_malformed_hb_never_fires() {
        let mut record = blank(Cohort::Child);
        record.hemoglobin_result = hb(0.0);
        record.lila_cm = Some(11.0);
        // LiLA alone is one High criterion; zero Hb must not be the second.
        assert_eq!(classify_record(&record), RiskLevel::Medium);

        record.hemoglobin_result = Some(OpaqueJson::from_text(r#"{"averageHb":"9"}"#).unwrap());
        assert_eq!(classify_record(&record), RiskLevel::Medium);
    }

    #[test]
    fn unrecognised_cohort_is_safe() {
        let mut record = blank(CohortCode::parse("elderly"));
        record.lila_cm = Some(10.0);
        record.iron_adherent = Some(false);
        record.bmi = Some(12.0);

        let assessment = assess(&record);
        assert_eq!(assessment.level, RiskLevel::Safe);
        assert_eq!(assessment.high_criteria_met, 0);
    }

    #[test]
    fn classify_uses_the_supplied_cohort() {
        let mut record = blank(Cohort::Child);
        record.lila_cm = Some(21.0);
        record.iron_adherent = Some(false);

        // Child rules read neither an adult LiLA range nor the iron flag.
        assert_eq!(classify(&Cohort::Child.into(), &record), RiskLevel::Safe);
        assert_eq!(
            classify(&Cohort::AdolescentGirl.into(), &record),
            RiskLevel::High
        );
    }

    #[test]
    fn risk_levels_order_and_labels() {
        assert!(RiskLevel::Safe < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"High\"");
        assert_eq!(RiskLevel::Medium.to_string(), "Medium");
    }

    #[test]
    fn criteria_tables_have_expected_shape() {
        assert_eq!(criteria(Cohort::Child).high.len(), 3);
        assert_eq!(criteria(Cohort::PregnantWoman).high.len(), 4);
        assert_eq!(criteria(Cohort::AdolescentGirl).medium.len(), 4);
        assert!(criteria(Cohort::AdolescentGirl)
            .medium
            .contains(&Criterion::AtOrBelow(Measure::Bmi, 18.4)));
    }
}
