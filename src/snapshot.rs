//! JSON snapshot of the posyandu store.
//!
//! The snapshot stands in for the persistence layer: `{"patients": [...], "records": [...]}`.
//! Loading performs the patient join the store would otherwise do, so every record leaves here
//! carrying its patient's cohort.

use anyhow::Context;
use prima_core::{CohortCode, MeasurementRecord, Patient, PatientId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub records: Vec<MeasurementRecord>,
}

impl Snapshot {
    /// Reads a snapshot and joins each record to its patient's cohort.
    ///
    /// Records whose patient is not registered are dropped with a warning.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        let mut snapshot: Snapshot = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))?;

        snapshot.join_cohorts();

        tracing::info!(
            patients = snapshot.patients.len(),
            records = snapshot.records.len(),
            "loaded snapshot from {}",
            path.display()
        );

        Ok(snapshot)
    }

    /// Writes the snapshot back, pretty-printed.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self).context("failed to serialise snapshot")?;
        fs::write(path, text)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        Ok(())
    }

    fn join_cohorts(&mut self) {
        let cohorts: HashMap<PatientId, CohortCode> = self
            .patients
            .iter()
            .map(|patient| (patient.id.clone(), patient.cohort.clone()))
            .collect();

        self.records.retain_mut(|record| match cohorts.get(&record.patient_id) {
            Some(cohort) => {
                record.cohort = cohort.clone();
                true
            }
            None => {
                tracing::warn!(
                    patient_id = %record.patient_id,
                    record_id = %record.id,
                    "skipping record for unregistered patient"
                );
                false
            }
        });
    }
}
