//! # PRIMA Core
//!
//! Risk stratification for posyandu (community health post) patients.
//!
//! This crate holds the pure logic behind the PRIMA dashboard:
//! - Risk classification of single examination records per cohort
//! - Resolution of each patient's latest record
//! - Cohort aggregation of latest records
//! - Monthly High/Medium/Safe trend series
//!
//! Every operation takes an immutable snapshot of records and returns owned or borrowed
//! results. There is no global state and no I/O; storage and HTTP belong to the caller.

pub mod aggregate;
pub mod cohort;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod record;
pub mod resolver;
pub mod risk;
pub mod trend;
pub mod validation;

pub use aggregate::{aggregate, CohortBucket, CohortSummary};
pub use cohort::{Cohort, CohortCode};
pub use config::{trend_window_from_env_value, CoreConfig};
pub use dashboard::{build_dashboard, risk_summary, vulnerable_patients, Dashboard, RiskSummary};
pub use error::{CoreError, CoreResult};
pub use record::{MeasurementPatch, MeasurementRecord, OpaqueJson, Patient};
pub use resolver::{
    latest_for_month, latest_for_patient, latest_per_patient, merge_into_latest, RecordFilter,
};
pub use risk::{assess, classify, classify_record, Assessment, RiskLevel};
pub use trend::{build_trend, CohortTrend, TrendPoint};

pub use prima_types::{PatientId, YearMonth};
