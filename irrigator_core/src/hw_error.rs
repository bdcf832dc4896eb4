//! Maps `Box<dyn Error>` from trait boundaries to typed `ControllerError`.
//!
//! The traits in `irrigator_traits` use `Box<dyn Error + Send + Sync>` for
//! maximum flexibility; this module converts those to our typed error enum,
//! with an optional feature-gated path for `irrigator_hardware::HwError`
//! downcasting.

use crate::error::ControllerError;

/// Map a trait-boundary error to a typed `ControllerError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to a generic driver fault.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ControllerError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<irrigator_hardware::error::HwError>() {
            return match hw {
                irrigator_hardware::error::HwError::InvalidTime { .. } => {
                    ControllerError::ClockUnavailable
                }
                other => ControllerError::DriverFault(other.to_string()),
            };
        }
    }

    ControllerError::DriverFault(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_errors_map_to_driver_fault() {
        let e = std::io::Error::other("bus hiccup");
        match map_hw_error(&e) {
            ControllerError::DriverFault(msg) => assert!(msg.contains("bus hiccup")),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn invalid_rtc_time_maps_to_clock_unavailable() {
        let e = irrigator_hardware::error::HwError::InvalidTime {
            hour: 31,
            minute: 0,
        };
        assert!(matches!(
            map_hw_error(&e),
            ControllerError::ClockUnavailable
        ));
    }
}
