//! Dashboard views combining the current-state and historical paths.
//!
//! The risk summary and vulnerable-patient lists work on each patient's latest record; the chart
//! data covers every record in the trend window. Sentence templating ("3 children at risk...")
//! is left to the presentation layer, which only receives counts here.

use crate::aggregate::aggregate;
use crate::cohort::Cohort;
use crate::config::CoreConfig;
use crate::record::MeasurementRecord;
use crate::resolver::{latest_per_patient, RecordFilter};
use crate::risk::{classify_record, RiskLevel};
use crate::trend::{build_trend, CohortTrend};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// High-risk patient counts per cohort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub child: usize,
    pub pregnant_woman: usize,
    pub adolescent_girl: usize,
}

impl RiskSummary {
    pub fn count(&self, cohort: Cohort) -> usize {
        match cohort {
            Cohort::Child => self.child,
            Cohort::PregnantWoman => self.pregnant_woman,
            Cohort::AdolescentGirl => self.adolescent_girl,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub risk_summary: RiskSummary,
    pub chart_data: BTreeMap<Cohort, CohortTrend>,
}

/// Counts the High-risk patients of each cohort among resolved latest records.
pub fn risk_summary<'a, I>(latest: I) -> RiskSummary
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    let summary = aggregate(latest);
    let high = |cohort: Cohort| {
        summary
            .bucket(cohort)
            .records
            .iter()
            .filter(|record| classify_record(record) == RiskLevel::High)
            .count()
    };

    RiskSummary {
        child: high(Cohort::Child),
        pregnant_woman: high(Cohort::PregnantWoman),
        adolescent_girl: high(Cohort::AdolescentGirl),
    }
}

/// Builds the dashboard from a snapshot of every stored record.
pub fn build_dashboard(
    records: &[MeasurementRecord],
    config: &CoreConfig,
    now: DateTime<Utc>,
) -> Dashboard {
    let latest = latest_per_patient(records, &RecordFilter::all());
    let risk_summary = risk_summary(latest.into_values());
    let chart_data = build_trend(records, config.trend_window(), now);

    tracing::info!(
        records = records.len(),
        high_risk_children = risk_summary.child,
        high_risk_pregnant_women = risk_summary.pregnant_woman,
        high_risk_adolescent_girls = risk_summary.adolescent_girl,
        "built dashboard"
    );

    Dashboard {
        risk_summary,
        chart_data,
    }
}

/// Latest records of `cohort` that classify as High, ordered by patient id.
pub fn vulnerable_patients<'a, I>(latest: I, cohort: Cohort) -> Vec<&'a MeasurementRecord>
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    let mut vulnerable: Vec<&'a MeasurementRecord> = latest
        .into_iter()
        .filter(|record| record.cohort.cohort() == Some(cohort))
        .filter(|record| classify_record(record) == RiskLevel::High)
        .collect();

    vulnerable.sort_by(|a, b| a.patient_id.cmp(&b.patient_id));
    vulnerable
}
