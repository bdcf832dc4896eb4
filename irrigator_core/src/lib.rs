#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core scheduling logic (hardware-agnostic).
//!
//! This crate decides when the pump relay is energized. All hardware
//! interactions go through `irrigator_traits::Relay` and
//! `irrigator_traits::Rtc`; persistence goes through `ScheduleStore`.
//!
//! ## Architecture
//!
//! - **Controller**: the run-state machine, one evaluation per tick
//!   (`controller` module)
//! - **Intake**: non-blocking command queue with per-kind duplicate
//!   collapse (`intake` module)
//! - **Runner**: the periodic driver loop with fail-safe shutdown
//!   (`runner` module)
//! - **Status**: transition-debounced device status notifications
//!   (`status` module)
//!
//! ## Threading
//!
//! Exactly two threads touch this crate in production: the periodic driver
//! thread owning the controller, relay, and RTC, and the request-handling
//! side holding a `CommandIntake` clone. The command queue is the only
//! synchronized hand-off between them.

pub mod command;
pub mod controller;
pub mod error;
pub mod hw_error;
pub mod intake;
pub mod mocks;
pub mod runner;
pub mod status;
pub mod store;
pub mod util;

pub use command::{Command, CommandKind, EnqueueOutcome};
pub use controller::{Controller, ControllerBuilder};
pub use error::{BuildError, ControllerError};
pub use intake::{CommandDrain, CommandIntake, command_channel};
pub use status::{
    ClockHealth, Component, DeviceStatus, NullSink, RunSnapshot, RunSource, RunState, Snapshot,
    StatusSink,
};
pub use store::{FileScheduleStore, ScheduleStore};

// The persisted schedule type is defined next to its serde form.
pub use irrigator_config::Schedule;
