//! Override commands crossing from the request-handling side into the
//! controller. Commands are idempotent by kind, which is what makes the
//! duplicate-collapse policy in `intake` safe.

use irrigator_config::Schedule;

/// A discrete override request. Produced by the request-handling side,
/// exclusively consumed by the controller on its next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Replace the persisted schedule. Does not affect a run in progress.
    SetSchedule(Schedule),
    /// Disable the schedule and cancel any run in progress.
    TurnOff,
    /// Start a fixed-duration manual run if the controller is idle.
    RunTest,
}

/// Discriminant used for duplicate collapse. Array index into the
/// pending-kind flags; keep contiguous from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum CommandKind {
    SetSchedule = 0,
    TurnOff = 1,
    RunTest = 2,
}

/// Number of command kinds; sizes the pending-flag array.
pub(crate) const KIND_COUNT: usize = 3;

impl Command {
    #[inline]
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::SetSchedule(_) => CommandKind::SetSchedule,
            Command::TurnOff => CommandKind::TurnOff,
            Command::RunTest => CommandKind::RunTest,
        }
    }
}

/// Result of `CommandIntake::enqueue`, reported back to the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Accepted,
    /// An unapplied command of the same kind is already queued; this one
    /// was dropped.
    Busy,
}
