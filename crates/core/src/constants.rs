//! Constants used throughout the PRIMA core crate.
//!
//! Clinical thresholds live next to the criteria tables in [`crate::risk`]; this module holds
//! the labels and defaults shared by several modules.

/// Default length of the trailing trend window, in calendar months.
pub const DEFAULT_TREND_WINDOW_MONTHS: u32 = 12;

/// Upper bound accepted for a configured trend window (ten years).
pub const MAX_TREND_WINDOW_MONTHS: u32 = 120;

/// Number of High criteria that must hold before a record is classified High.
pub const HIGH_RISK_MIN_CRITERIA: usize = 2;

/// Cohort code for children under five.
pub const COHORT_CHILD: &str = "child";

/// Cohort code for pregnant women.
pub const COHORT_PREGNANT_WOMAN: &str = "pregnantWoman";

/// Cohort code for adolescent girls.
pub const COHORT_ADOLESCENT_GIRL: &str = "adolescentGirl";

/// Risk label for records with no triggered criterion.
pub const RISK_SAFE: &str = "Safe";

/// Risk label for records with at least one Medium criterion.
pub const RISK_MEDIUM: &str = "Medium";

/// Risk label for records with at least two High criteria.
pub const RISK_HIGH: &str = "High";
