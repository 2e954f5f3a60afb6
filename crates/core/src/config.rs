//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core operations. Nothing in the core reads environment variables on its own, so
//! the same snapshot always produces the same dashboard regardless of the calling thread.

use crate::constants::{DEFAULT_TREND_WINDOW_MONTHS, MAX_TREND_WINDOW_MONTHS};
use crate::{CoreError, CoreResult};

/// Core configuration resolved at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    trend_window: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `trend_window` is zero or larger than
    /// [`MAX_TREND_WINDOW_MONTHS`].
    pub fn new(trend_window: u32) -> CoreResult<Self> {
        if trend_window == 0 || trend_window > MAX_TREND_WINDOW_MONTHS {
            return Err(CoreError::InvalidInput(format!(
                "trend window must be between 1 and {MAX_TREND_WINDOW_MONTHS} months, got {trend_window}"
            )));
        }

        Ok(Self { trend_window })
    }

    /// Number of calendar months covered by trend series, current month included.
    pub fn trend_window(&self) -> u32 {
        self.trend_window
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            trend_window: DEFAULT_TREND_WINDOW_MONTHS,
        }
    }
}

/// Parse the trend window from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_TREND_WINDOW_MONTHS`].
///
/// # Errors
///
/// Returns [`CoreError::InvalidInput`] if the value is not a whole number of months.
pub fn trend_window_from_env_value(value: Option<String>) -> CoreResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let parsed = value
        .map(|v| {
            v.parse::<u32>().map_err(|_| {
                CoreError::InvalidInput(format!("trend window must be a whole number, got '{v}'"))
            })
        })
        .transpose()?;

    Ok(parsed.unwrap_or(DEFAULT_TREND_WINDOW_MONTHS))
}
