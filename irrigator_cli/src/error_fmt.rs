//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use irrigator_core::error::{BuildError, ControllerError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingRelay => {
                "What happened: No relay was provided to the controller.\nLikely causes: The relay driver failed to initialize or was not wired into the builder.\nHow to fix: Ensure the relay opens successfully and is passed via with_relay(...).".to_string()
            }
            BuildError::MissingStore => {
                "What happened: No schedule store was provided to the controller.\nLikely causes: The schedule file path was not configured.\nHow to fix: Set controller.schedule_file in the config, or pass a store via with_store(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ControllerError>() {
        return match ce {
            ControllerError::ClockUnavailable => {
                "What happened: The RTC produced no usable reading.\nLikely causes: RTC not wired, wrong I2C address, or a dead backup battery.\nHow to fix: Check rtc.i2c_bus/i2c_addr in the config and the module wiring; scheduled runs resume when readings return.".to_string()
            }
            ControllerError::DriverFault(msg) => format!(
                "What happened: A relay command failed ({msg}).\nLikely causes: Relay unit unpowered, wrong I2C address, or bus contention.\nHow to fix: Check relay.i2c_bus/i2c_addr in the config and the wiring, then rerun."
            ),
            ControllerError::QueueBusy => {
                "What happened: A command of the same kind is already queued.\nLikely causes: Rapid duplicate submissions before the controller ticked.\nHow to fix: Wait one tick and resubmit.".to_string()
            }
            ControllerError::Store(msg) => format!(
                "What happened: Schedule persistence failed ({msg}).\nLikely causes: Full or read-only filesystem at the schedule file path.\nHow to fix: Check controller.schedule_file and the filesystem, then rerun."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("i2c") {
        return "What happened: Failed to talk to an I2C device.\nLikely causes: I2C disabled on the host, wrong bus number, or insufficient permissions.\nHow to fix: Enable the I2C bus, verify relay/rtc addresses in the config, and ensure the process may access /dev/i2c-*.".to_string();
    }

    if lower.contains("parsing config") || lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid.\nLikely causes: A typo or out-of-range value in the TOML.\nHow to fix: Edit the config file and try again. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use irrigator_core::error::{BuildError, ControllerError};
    use serde_json::json;

    let reason = if let Some(ce) = err.downcast_ref::<ControllerError>() {
        match ce {
            ControllerError::ClockUnavailable => "ClockUnavailable",
            ControllerError::DriverFault(_) => "DriverFault",
            ControllerError::QueueBusy => "QueueBusy",
            ControllerError::Store(_) => "Store",
        }
    } else if err.downcast_ref::<BuildError>().is_some() {
        "BuildError"
    } else {
        "Error"
    };

    json!({ "reason": reason, "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use irrigator_core::error::{BuildError, ControllerError};

    #[test]
    fn typed_errors_get_specific_hints() {
        let err = eyre::Report::new(BuildError::MissingRelay);
        assert!(humanize(&err).contains("with_relay"));

        let err = eyre::Report::new(ControllerError::DriverFault("bus timeout".into()));
        assert!(humanize(&err).contains("bus timeout"));
    }

    #[test]
    fn json_error_carries_a_stable_reason() {
        let err = eyre::Report::new(ControllerError::QueueBusy);
        let body: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(body["reason"], "QueueBusy");
    }

    #[test]
    fn unknown_errors_fall_back_to_generic_advice() {
        let err = eyre::eyre!("something odd");
        assert!(humanize(&err).contains("--log-level=debug"));
    }
}
