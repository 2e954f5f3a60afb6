//! Latest-record resolution.
//!
//! A patient accumulates one record per examination, sampled irregularly. Current-state views
//! (dashboard counts, history, patient details) need exactly one record per patient: the one
//! with the greatest examination timestamp.
//!
//! Ties on identical timestamps go to the record that appears **later** in the input order
//! ("last inserted wins"). Storage order is insertion order, so the most recently captured of
//! two same-instant examinations is treated as current. The rule is the same for reads and for
//! [`merge_into_latest`].

use crate::record::{MeasurementPatch, MeasurementRecord};
use crate::validation::validate_patch;
use crate::{CoreError, CoreResult};
use prima_types::{PatientId, YearMonth};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Restricts which records take part in resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilter {
    patient: Option<PatientId>,
    month: Option<YearMonth>,
}

impl RecordFilter {
    /// A filter that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only records of `patient`.
    pub fn for_patient(mut self, patient: PatientId) -> Self {
        self.patient = Some(patient);
        self
    }

    /// Only records examined during `month` (UTC calendar month).
    pub fn in_month(mut self, month: YearMonth) -> Self {
        self.month = Some(month);
        self
    }

    pub fn matches(&self, record: &MeasurementRecord) -> bool {
        if let Some(patient) = &self.patient {
            if &record.patient_id != patient {
                return false;
            }
        }
        if let Some(month) = self.month {
            if YearMonth::from_datetime(&record.examination_date) != month {
                return false;
            }
        }
        true
    }
}

/// Selects the most recent record per patient among the records matching `filter`.
///
/// Patients without a matching record are omitted, never synthesised. The map is ordered by
/// patient id.
pub fn latest_per_patient<'a, I>(
    records: I,
    filter: &RecordFilter,
) -> BTreeMap<PatientId, &'a MeasurementRecord>
where
    I: IntoIterator<Item = &'a MeasurementRecord>,
{
    let mut latest: BTreeMap<PatientId, &'a MeasurementRecord> = BTreeMap::new();

    for record in records.into_iter().filter(|r| filter.matches(r)) {
        match latest.entry(record.patient_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if record.examination_date >= slot.get().examination_date {
                    slot.insert(record);
                }
            }
        }
    }

    latest
}

/// The most recent record of one patient, if they have any.
pub fn latest_for_patient<'a>(
    records: &'a [MeasurementRecord],
    patient: &PatientId,
) -> Option<&'a MeasurementRecord> {
    latest_index(records, patient, None).map(|i| &records[i])
}

/// The most recent record of one patient examined during `month`.
pub fn latest_for_month<'a>(
    records: &'a [MeasurementRecord],
    patient: &PatientId,
    month: YearMonth,
) -> Option<&'a MeasurementRecord> {
    latest_index(records, patient, Some(month)).map(|i| &records[i])
}

fn latest_index(
    records: &[MeasurementRecord],
    patient: &PatientId,
    month: Option<YearMonth>,
) -> Option<usize> {
    let mut filter = RecordFilter::all().for_patient(patient.clone());
    if let Some(month) = month {
        filter = filter.in_month(month);
    }

    let mut best: Option<usize> = None;
    for (index, record) in records.iter().enumerate() {
        if !filter.matches(record) {
            continue;
        }
        match best {
            Some(current) if record.examination_date < records[current].examination_date => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Applies a clinical correction to the patient's latest record.
///
/// Only the fields supplied in `patch` are overwritten. Older records and the untouched fields
/// of the latest record stay exactly as they were.
///
/// # Errors
///
/// Returns [`CoreError::PatientNotFound`] if the patient has no records at all, checked before
/// the patch itself, or [`CoreError::InvalidInput`] if the patch carries an impossible
/// measurement.
pub fn merge_into_latest<'a>(
    records: &'a mut [MeasurementRecord],
    patient: &PatientId,
    patch: &MeasurementPatch,
) -> CoreResult<&'a MeasurementRecord> {
    let index = latest_index(records, patient, None)
        .ok_or_else(|| CoreError::PatientNotFound(patient.clone()))?;

    validate_patch(patch)?;

    let record = &mut records[index];
    patch.apply_to(record);

    tracing::info!(
        patient_id = %patient,
        record_id = %record.id,
        "merged correction into latest examination record"
    );

    Ok(&*record)
}
