//! Cohort aggregation of resolved latest records.
//!
//! Feeds the examination history view and, together with the classifier, the dashboard's
//! high-risk counts.

use crate::cohort::Cohort;
use crate::record::MeasurementRecord;
use serde::Serialize;

/// The latest records of one cohort.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortBucket<'a> {
    pub summary_count: usize,
    /// Most recently examined first; ties ordered by patient id.
    pub records: Vec<&'a MeasurementRecord>,
}

impl<'a> CohortBucket<'a> {
    fn push(&mut self, record: &'a MeasurementRecord) {
        self.records.push(record);
        self.summary_count = self.records.len();
    }

    fn sort(&mut self) {
        self.records.sort_by(|a, b| {
            b.examination_date
                .cmp(&a.examination_date)
                .then_with(|| a.patient_id.cmp(&b.patient_id))
        });
    }
}

/// Latest records partitioned into the three fixed cohorts.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortSummary<'a> {
    pub child: CohortBucket<'a>,
    pub pregnant_woman: CohortBucket<'a>,
    pub adolescent_girl: CohortBucket<'a>,
    /// Records dropped because their cohort code was not recognised.
    pub unrecognised: usize,
}

impl<'a> CohortSummary<'a> {
    pub fn bucket(&self, cohort: Cohort) -> &CohortBucket<'a> {
        match cohort {
            Cohort::Child => &self.child,
            Cohort::PregnantWoman => &self.pregnant_woman,
            Cohort::AdolescentGirl => &self.adolescent_girl,
        }
    }

    fn bucket_mut(&mut self, cohort: Cohort) -> &mut CohortBucket<'a> {
        match cohort {
            Cohort::Child => &mut self.child,
            Cohort::PregnantWoman => &mut self.pregnant_woman,
            Cohort::AdolescentGirl => &mut self.adolescent_girl,
        }
    }

    pub fn count(&self, cohort: Cohort) -> usize {
        self.bucket(cohort).summary_count
    }
}

/// Partitions resolved latest records by cohort.
///
/// Records with an unrecognised cohort are dropped rather than bucketed. Each drop is logged
/// as a warning since it points at an upstream data-integrity problem.
pub fn aggregate<'a, I>(latest: I) -> CohortSummary<'a>
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    let mut summary = CohortSummary::default();

    for record in latest {
        match record.cohort.cohort() {
            Some(cohort) => summary.bucket_mut(cohort).push(record),
            None => {
                tracing::warn!(
                    patient_id = %record.patient_id,
                    record_id = %record.id,
                    cohort = %record.cohort,
                    "dropping record with unrecognised cohort from aggregation"
                );
                summary.unrecognised += 1;
            }
        }
    }

    for cohort in Cohort::ALL {
        summary.bucket_mut(cohort).sort();
    }

    summary
}
