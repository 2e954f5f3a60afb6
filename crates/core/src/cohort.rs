//! Patient cohorts.
//!
//! Every patient belongs to exactly one of three fixed cohorts, and each cohort has its own risk
//! rules. Cohort codes arrive from upstream as free strings, so records carry a [`CohortCode`]
//! that can still hold an unrecognised value; the classifier and aggregator decide what to do
//! with it instead of the deserialiser rejecting the whole snapshot.

use crate::constants::{COHORT_ADOLESCENT_GIRL, COHORT_CHILD, COHORT_PREGNANT_WOMAN};
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three fixed patient categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cohort {
    /// Children under five, screened for stunting and anaemia.
    Child,
    /// Pregnant women, screened for chronic energy deficiency and anaemia.
    PregnantWoman,
    /// Adolescent girls, screened for thinness and anaemia.
    AdolescentGirl,
}

impl Cohort {
    /// All cohorts in their canonical reporting order.
    pub const ALL: [Cohort; 3] = [Cohort::Child, Cohort::PregnantWoman, Cohort::AdolescentGirl];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cohort::Child => COHORT_CHILD,
            Cohort::PregnantWoman => COHORT_PREGNANT_WOMAN,
            Cohort::AdolescentGirl => COHORT_ADOLESCENT_GIRL,
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cohort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            COHORT_CHILD => Ok(Cohort::Child),
            COHORT_PREGNANT_WOMAN => Ok(Cohort::PregnantWoman),
            COHORT_ADOLESCENT_GIRL => Ok(Cohort::AdolescentGirl),
            other => Err(CoreError::InvalidInput(format!(
                "unrecognised cohort '{other}' (expected {COHORT_CHILD}, {COHORT_PREGNANT_WOMAN} or {COHORT_ADOLESCENT_GIRL})"
            ))),
        }
    }
}

/// A cohort code as supplied alongside a record.
///
/// Codes are expected to be closed and validated upstream. An unrecognised code usually points
/// at a data-integrity defect at the boundary; it is preserved verbatim so it can be logged.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CohortCode {
    Known(Cohort),
    Unrecognised(String),
}

impl CohortCode {
    /// Interprets a raw cohort code. Never fails.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<Cohort>() {
            Ok(cohort) => CohortCode::Known(cohort),
            Err(_) => CohortCode::Unrecognised(raw.to_owned()),
        }
    }

    /// The recognised cohort, if any.
    pub fn cohort(&self) -> Option<Cohort> {
        match self {
            CohortCode::Known(cohort) => Some(*cohort),
            CohortCode::Unrecognised(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CohortCode::Known(cohort) => cohort.as_str(),
            CohortCode::Unrecognised(raw) => raw,
        }
    }
}

/// The empty code, used when a record arrives without its patient's cohort joined on.
impl Default for CohortCode {
    fn default() -> Self {
        CohortCode::Unrecognised(String::new())
    }
}

impl From<Cohort> for CohortCode {
    fn from(cohort: Cohort) -> Self {
        CohortCode::Known(cohort)
    }
}

impl fmt::Display for CohortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CohortCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CohortCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map_or_else(CohortCode::default, |raw| CohortCode::parse(&raw)))
    }
}
