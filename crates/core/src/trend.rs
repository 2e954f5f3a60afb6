//! Monthly risk trend series.
//!
//! Unlike the current-state views, trends classify **every** record in the trailing window, not
//! just each patient's latest one. A patient examined three times in a window contributes three
//! points, one per examination month.
//!
//! Series are oldest first. Point `x` is `window - months_ago`, so the oldest month in the
//! window has `x = 1` and the current month has `x = window`. Months are compared on their UTC
//! `(year, month)` only; records dated after the current month are ignored.

use crate::cohort::Cohort;
use crate::record::MeasurementRecord;
use crate::risk::{classify, RiskLevel};
use chrono::{DateTime, Utc};
use prima_types::YearMonth;
use serde::Serialize;
use std::collections::BTreeMap;

/// One chart point: relative month index and record count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub x: u32,
    pub y: u32,
}

/// Three dense series for one cohort, one per risk band.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortTrend {
    pub high_risk: Vec<TrendPoint>,
    pub medium_risk: Vec<TrendPoint>,
    /// Records classified Safe.
    pub low_risk: Vec<TrendPoint>,
}

impl CohortTrend {
    fn zeroed(window: u32) -> Self {
        let series: Vec<TrendPoint> = (1..=window).map(|x| TrendPoint { x, y: 0 }).collect();
        Self {
            high_risk: series.clone(),
            medium_risk: series.clone(),
            low_risk: series,
        }
    }

    pub fn series(&self, level: RiskLevel) -> &[TrendPoint] {
        match level {
            RiskLevel::High => &self.high_risk,
            RiskLevel::Medium => &self.medium_risk,
            RiskLevel::Safe => &self.low_risk,
        }
    }

    fn series_mut(&mut self, level: RiskLevel) -> &mut Vec<TrendPoint> {
        match level {
            RiskLevel::High => &mut self.high_risk,
            RiskLevel::Medium => &mut self.medium_risk,
            RiskLevel::Safe => &mut self.low_risk,
        }
    }
}

/// Builds per-cohort risk series over the `window` months ending with the month of `now`.
///
/// Every cohort is present in the result and every series has exactly `window` points, even
/// when no record falls into the window. Records with an unrecognised cohort are skipped.
pub fn build_trend<'a, I>(
    records: I,
    window: u32,
    now: DateTime<Utc>,
) -> BTreeMap<Cohort, CohortTrend>
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    let current = YearMonth::from_datetime(&now);
    let first = current.months_before(window.saturating_sub(1));
    let mut trends: BTreeMap<Cohort, CohortTrend> = Cohort::ALL
        .into_iter()
        .map(|cohort| (cohort, CohortTrend::zeroed(window)))
        .collect();

    let mut counted = 0usize;
    let mut unrecognised = 0usize;

    for record in records {
        let Some(cohort) = record.cohort.cohort() else {
            unrecognised += 1;
            continue;
        };

        let month = YearMonth::from_datetime(&record.examination_date);
        if window == 0 || month < first || month > current {
            continue;
        }

        // In 0..window after the check above.
        let slot = month.months_since(first) as usize;
        let level = classify(&record.cohort, record);

        if let Some(point) = trends
            .get_mut(&cohort)
            .and_then(|trend| trend.series_mut(level).get_mut(slot))
        {
            point.y += 1;
            counted += 1;
        }
    }

    tracing::debug!(
        window,
        first = %first,
        current = %current,
        counted,
        unrecognised,
        "built risk trend"
    );

    trends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::CohortCode;
    use chrono::TimeZone;
    use prima_types::PatientId;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 8, 0, 0).unwrap()
    }

    fn record(cohort: impl Into<CohortCode>, when: DateTime<Utc>) -> MeasurementRecord {
        MeasurementRecord::new(PatientId::new("NS001").unwrap(), cohort, when)
    }

    fn high_risk_child(when: DateTime<Utc>) -> MeasurementRecord {
        let mut r = record(Cohort::Child, when);
        r.height_for_age_z = Some(-3.5);
        r.lila_cm = Some(11.0);
        r
    }

    fn ys(series: &[TrendPoint]) -> Vec<u32> {
        series.iter().map(|p| p.y).collect()
    }

    #[test]
    fn empty_input_yields_dense_zero_series_for_every_cohort() {
        let trends = build_trend(std::iter::empty::<&MeasurementRecord>(), 12, at(2025, 6, 15));

        assert_eq!(trends.len(), 3);
        for cohort in Cohort::ALL {
            let trend = &trends[&cohort];
            for level in [RiskLevel::High, RiskLevel::Medium, RiskLevel::Safe] {
                let series = trend.series(level);
                assert_eq!(series.len(), 12);
                assert!(series.iter().all(|p| p.y == 0));
                let xs: Vec<u32> = series.iter().map(|p| p.x).collect();
                assert_eq!(xs, (1..=12).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn buckets_every_record_by_month_and_band() {
        let now = at(2025, 6, 15);
        let mut medium_child = record(Cohort::Child, at(2025, 1, 20));
        medium_child.height_for_age_z = Some(-2.0);

        let records = vec![
            high_risk_child(at(2025, 6, 1)),
            high_risk_child(at(2025, 6, 30)),
            medium_child,
            record(Cohort::PregnantWoman, at(2024, 7, 3)),
        ];

        let trends = build_trend(&records, 12, now);
        let child = &trends[&Cohort::Child];

        let mut expected_high = vec![0; 12];
        expected_high[11] = 2;
        assert_eq!(ys(&child.high_risk), expected_high);
        assert_eq!(child.high_risk[11].x, 12);

        let mut expected_medium = vec![0; 12];
        expected_medium[6] = 1;
        assert_eq!(ys(&child.medium_risk), expected_medium);
        assert_eq!(child.medium_risk[6].x, 7);

        let pregnant = &trends[&Cohort::PregnantWoman];
        assert_eq!(pregnant.low_risk[0], TrendPoint { x: 1, y: 1 });
        assert_eq!(pregnant.low_risk.iter().map(|p| p.y).sum::<u32>(), 1);
    }

    #[test]
    fn ignores_records_outside_the_window() {
        let now = at(2025, 6, 15);
        let records = vec![
            high_risk_child(at(2024, 6, 30)),
            high_risk_child(at(2025, 7, 1)),
            record(CohortCode::parse("elderly"), at(2025, 6, 1)),
        ];

        let trends = build_trend(&records, 12, now);
        for cohort in Cohort::ALL {
            for level in [RiskLevel::High, RiskLevel::Medium, RiskLevel::Safe] {
                assert!(trends[&cohort].series(level).iter().all(|p| p.y == 0));
            }
        }
    }

    #[test]
    fn window_spans_year_boundary() {
        let now = at(2025, 2, 10);
        let late_december = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let records = vec![
            high_risk_child(late_december),
            high_risk_child(at(2025, 1, 1)),
            high_risk_child(at(2024, 11, 30)),
        ];

        let trends = build_trend(&records, 3, now);
        assert_eq!(ys(&trends[&Cohort::Child].high_risk), vec![1, 1, 0]);
    }

    #[test]
    fn serialises_with_chart_keys() {
        let trends = build_trend(std::iter::empty::<&MeasurementRecord>(), 2, at(2025, 6, 15));
        let json = serde_json::to_value(&trends).unwrap();

        assert_eq!(json["child"]["highRisk"][0]["x"], 1);
        assert_eq!(json["adolescentGirl"]["lowRisk"][1]["y"], 0);
        assert!(json["pregnantWoman"]["mediumRisk"].is_array());
    }
}
