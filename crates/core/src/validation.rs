//! Input validation utilities.
//!
//! Classification never rejects a record: absent or odd values simply leave criteria
//! untriggered. Corrections written back into a record are different, since a bad value would
//! persist and skew every later classification, so they are checked here first.

use crate::record::MeasurementPatch;
use crate::{CoreError, CoreResult};

/// Validates the anthropometric values of a correction patch.
///
/// Weight, height, and LiLA must be finite and non-negative when supplied. The hemoglobin
/// payload is opaque and is not inspected.
///
/// # Errors
///
/// Returns a `CoreError::InvalidInput` naming the first offending field.
pub fn validate_patch(patch: &MeasurementPatch) -> CoreResult<()> {
    let fields = [
        ("bb", patch.weight_kg),
        ("tb", patch.height_cm),
        ("lila", patch.lila_cm),
    ];

    for (name, value) in fields {
        let Some(value) = value else { continue };

        if !value.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "{name} must be a finite number"
            )));
        }
        if value < 0.0 {
            return Err(CoreError::InvalidInput(format!(
                "{name} cannot be negative, got {value}"
            )));
        }
    }

    Ok(())
}
