//! Patient and examination record types.
//!
//! Wire names follow the posyandu service's JSON (`tb`, `bb`, `lila`, `tbU_zscore`, ...) so
//! records can be handed over from the persistence layer without a mapping step. Rust field
//! names say what each value measures.
//!
//! Every measurement is optional. An absent value means "not measured at this visit" and never
//! stands in for zero.

use crate::cohort::CohortCode;
use crate::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, Utc};
use prima_types::PatientId;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use uuid::Uuid;

/// A JSON document the core stores and forwards without interpreting.
///
/// The text is kept exactly as received, so forwarding a record never reorders keys or
/// re-formats numbers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueJson(Box<RawValue>);

impl OpaqueJson {
    /// Wraps JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `text` is not syntactically valid JSON.
    pub fn from_text(text: impl Into<String>) -> CoreResult<Self> {
        RawValue::from_string(text.into())
            .map(Self)
            .map_err(|e| CoreError::InvalidInput(format!("invalid JSON payload: {e}")))
    }

    /// The JSON text exactly as received.
    pub fn as_str(&self) -> &str {
        self.0.get()
    }
}

impl PartialEq for OpaqueJson {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Registered patient, owned by the persistence layer and only read here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    #[serde(rename = "motherName", default)]
    pub guardian_name: Option<String>,
    #[serde(rename = "motherPhone", default)]
    pub guardian_phone: Option<String>,
    /// Assigned once at registration and never changed afterwards.
    #[serde(rename = "patientType")]
    pub cohort: CohortCode,
}

/// One examination event for one patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub id: Uuid,
    pub patient_id: PatientId,
    /// Supplied by the caller from the patient registration; the core never infers it.
    #[serde(rename = "patientType", default)]
    pub cohort: CohortCode,
    /// Sole ordering and bucketing key.
    pub examination_date: DateTime<Utc>,
    /// Age label as captured at the visit, e.g. "14 bulan".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,

    #[serde(rename = "tb", default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(rename = "bb", default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// Mid-upper-arm circumference (LiLA).
    #[serde(rename = "lila", default, skip_serializing_if = "Option::is_none")]
    pub lila_cm: Option<f64>,
    #[serde(rename = "tbU_zscore", default, skip_serializing_if = "Option::is_none")]
    pub height_for_age_z: Option<f64>,
    #[serde(rename = "bbU_zscore", default, skip_serializing_if = "Option::is_none")]
    pub weight_for_age_z: Option<f64>,
    #[serde(rename = "imt", default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(rename = "bbGainPerMonth", default, skip_serializing_if = "Option::is_none")]
    pub monthly_weight_gain_kg: Option<f64>,
    /// Takes iron (TTD) tablets routinely.
    #[serde(rename = "isTtdRutin", default, skip_serializing_if = "Option::is_none")]
    pub iron_adherent: Option<bool>,
    #[serde(rename = "isBbStagnan", default, skip_serializing_if = "Option::is_none")]
    pub weight_stagnant: Option<bool>,

    /// Structured hemoglobin screening result; only `averageHb` is ever read.
    #[serde(default)]
    pub hemoglobin_result: Option<OpaqueJson>,
    #[serde(default)]
    pub weight_history: Option<OpaqueJson>,
    #[serde(default)]
    pub height_history: Option<OpaqueJson>,
    #[serde(default)]
    pub nutrient_history: Option<OpaqueJson>,
    #[serde(default)]
    pub denver_milestones: Option<OpaqueJson>,
    #[serde(default)]
    pub pmt_history: Option<OpaqueJson>,
}

impl MeasurementRecord {
    /// Creates a record with a fresh id and no measurements.
    pub fn new(
        patient_id: PatientId,
        cohort: impl Into<CohortCode>,
        examination_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            cohort: cohort.into(),
            examination_date,
            age: None,
            height_cm: None,
            weight_kg: None,
            lila_cm: None,
            height_for_age_z: None,
            weight_for_age_z: None,
            bmi: None,
            monthly_weight_gain_kg: None,
            iron_adherent: None,
            weight_stagnant: None,
            hemoglobin_result: None,
            weight_history: None,
            height_history: None,
            nutrient_history: None,
            denver_milestones: None,
            pmt_history: None,
        }
    }

    /// Average hemoglobin (g/dL) from the screening payload.
    ///
    /// Returns `None` when the payload is absent, malformed, lacks `averageHb`, or reports
    /// zero. A malformed payload is not an error: the hemoglobin criteria simply do not fire.
    pub fn average_hb(&self) -> Option<f64> {
        let payload = self.hemoglobin_result.as_ref()?;
        let parsed = match serde_json::from_str::<serde_json::Value>(payload.as_str()) {
            Ok(serde_json::Value::Object(fields)) => fields,
            Ok(serde_json::Value::Null) => return None,
            Ok(_) | Err(_) => {
                tracing::debug!(
                    record_id = %self.id,
                    patient_id = %self.patient_id,
                    "ignoring hemoglobin payload that is not a JSON object"
                );
                return None;
            }
        };

        match parsed.get("averageHb") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::Number(n)) => n.as_f64().filter(|hb| *hb != 0.0),
            Some(other) => {
                tracing::debug!(
                    record_id = %self.id,
                    patient_id = %self.patient_id,
                    "ignoring non-numeric averageHb: {other}"
                );
                None
            }
        }
    }
}

/// A targeted clinical correction to a patient's latest record.
///
/// Only the fields that are `Some` are written; everything else on the record is left as is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPatch {
    #[serde(rename = "hemoglobinResult", default)]
    pub hemoglobin_result: Option<OpaqueJson>,
    #[serde(rename = "bb", default)]
    pub weight_kg: Option<f64>,
    #[serde(rename = "tb", default)]
    pub height_cm: Option<f64>,
    #[serde(rename = "lila", default)]
    pub lila_cm: Option<f64>,
}

impl MeasurementPatch {
    pub fn is_empty(&self) -> bool {
        self.hemoglobin_result.is_none()
            && self.weight_kg.is_none()
            && self.height_cm.is_none()
            && self.lila_cm.is_none()
    }

    pub(crate) fn apply_to(&self, record: &mut MeasurementRecord) {
        if let Some(hb) = &self.hemoglobin_result {
            record.hemoglobin_result = Some(hb.clone());
        }
        if let Some(weight) = self.weight_kg {
            record.weight_kg = Some(weight);
        }
        if let Some(height) = self.height_cm {
            record.height_cm = Some(height);
        }
        if let Some(lila) = self.lila_cm {
            record.lila_cm = Some(lila);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::Cohort;
    use chrono::TimeZone;

    fn record_with_hb(payload: Option<&str>) -> MeasurementRecord {
        let mut record = MeasurementRecord::new(
            PatientId::new("NS001").unwrap(),
            Cohort::Child,
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        );
        record.hemoglobin_result = payload.map(|p| OpaqueJson::from_text(p).unwrap());
        record
    }

    #[test]
    fn reads_average_hb_from_payload() {
        let record = record_with_hb(Some(r#"{"averageHb": 9.8, "nailBedResults": []}"#));
        assert_eq!(record.average_hb(), Some(9.8));
    }

    #[test]
    fn missing_or_zero_hb_is_absent() {
        assert_eq!(record_with_hb(None).average_hb(), None);
        assert_eq!(record_with_hb(Some("{}")).average_hb(), None);
        assert_eq!(record_with_hb(Some(r#"{"averageHb": 0}"#)).average_hb(), None);
        assert_eq!(record_with_hb(Some(r#"{"averageHb": null}"#)).average_hb(), None);
    }

    #[test]
    fn malformed_hb_payload_degrades_to_absent() {
        assert_eq!(record_with_hb(Some(r#"{"averageHb": "low"}"#)).average_hb(), None);
        assert_eq!(record_with_hb(Some("[10.2, 11.0]")).average_hb(), None);
        assert_eq!(record_with_hb(Some("\"11.0\"")).average_hb(), None);
    }

    #[test]
    fn deserialises_wire_record_and_keeps_side_channels_verbatim() {
        let json = r#"{
            "id": "2c1f7f0e-5a8e-4a43-9d53-3f1f6d6b8a10",
            "patientId": "SA004",
            "patientType": "pregnantWoman",
            "examinationDate": "2025-04-12T08:30:00Z",
            "lila": 22.5,
            "isTtdRutin": false,
            "hemoglobinResult": null,
            "weightHistory": [ {"month":1, "kg": 51.0} ]
        }"#;

        let record: MeasurementRecord = serde_json::from_str(json).expect("should parse record");
        assert_eq!(record.patient_id.as_str(), "SA004");
        assert_eq!(record.cohort.cohort(), Some(Cohort::PregnantWoman));
        assert_eq!(record.lila_cm, Some(22.5));
        assert_eq!(record.iron_adherent, Some(false));
        assert_eq!(record.bmi, None);
        assert!(record.hemoglobin_result.is_none());
        assert_eq!(
            record.weight_history.as_ref().map(OpaqueJson::as_str),
            Some(r#"[ {"month":1, "kg": 51.0} ]"#)
        );
    }

    #[test]
    fn record_without_cohort_is_unrecognised() {
        let json = r#"{
            "id": "8d0c5f4a-1b7e-4e55-8f0e-2a9d1c3b4e5f",
            "patientId": "NS001",
            "examinationDate": "2025-04-12T08:30:00Z"
        }"#;

        let record: MeasurementRecord = serde_json::from_str(json).expect("should parse record");
        assert_eq!(record.cohort, CohortCode::default());
        assert_eq!(record.cohort.cohort(), None);
    }

    #[test]
    fn record_with_null_cohort_is_unrecognised() {
        let json = r#"{
            "id": "8d0c5f4a-1b7e-4e55-8f0e-2a9d1c3b4e5f",
            "patientId": "NS001",
            "patientType": null,
            "examinationDate": "2025-04-12T08:30:00Z"
        }"#;

        let record: MeasurementRecord =
            serde_json::from_str(json).expect("null cohort should parse");
        assert_eq!(record.cohort, CohortCode::default());
        assert_eq!(record.cohort.cohort(), None);
    }

    #[test]
    fn patch_only_writes_supplied_fields() {
        let mut record = record_with_hb(Some(r#"{"averageHb": 10.5}"#));
        record.height_cm = Some(80.0);
        record.weight_kg = Some(9.1);

        let patch = MeasurementPatch {
            weight_kg: Some(9.4),
            ..MeasurementPatch::default()
        };
        patch.apply_to(&mut record);

        assert_eq!(record.weight_kg, Some(9.4));
        assert_eq!(record.height_cm, Some(80.0));
        assert_eq!(record.average_hb(), Some(10.5));
        assert!(!patch.is_empty());
        assert!(MeasurementPatch::default().is_empty());
    }

    #[test]
    fn opaque_json_rejects_invalid_text() {
        assert!(matches!(
            OpaqueJson::from_text("{not json"),
            Err(CoreError::InvalidInput(_))
        ));
    }
}
