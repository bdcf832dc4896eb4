//! Command intake: the sole synchronized hand-off between the
//! request-handling thread(s) and the controller thread.
//!
//! The queue never blocks the sender. A newly enqueued command is rejected
//! with `Busy` when an unapplied command of the same kind is already queued,
//! collapsing rapid duplicate submissions (a double-clicked "turn off") into
//! one effective action.

use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::command::{Command, CommandKind, EnqueueOutcome, KIND_COUNT};

/// One flag per command kind, set while a command of that kind sits in the
/// queue. Lock-free so the request thread never waits on the controller.
#[derive(Default)]
struct PendingKinds([AtomicBool; KIND_COUNT]);

impl PendingKinds {
    /// Claim the kind slot; false if already claimed.
    fn try_claim(&self, kind: CommandKind) -> bool {
        !self.0[kind as usize].swap(true, Ordering::AcqRel)
    }

    fn release(&self, kind: CommandKind) {
        self.0[kind as usize].store(false, Ordering::Release);
    }
}

/// Create the intake/drain pair. `capacity` is clamped so one command of
/// every kind always fits; with duplicate collapse that means `try_send`
/// cannot observe a full queue in practice.
pub fn command_channel(capacity: usize) -> (CommandIntake, CommandDrain) {
    let (tx, rx) = xch::bounded(capacity.max(KIND_COUNT));
    let pending = Arc::new(PendingKinds::default());
    (
        CommandIntake {
            tx,
            pending: pending.clone(),
        },
        CommandDrain { rx, pending },
    )
}

/// Producer half, handed to the request-handling side. Cheap to clone.
#[derive(Clone)]
pub struct CommandIntake {
    tx: xch::Sender<Command>,
    pending: Arc<PendingKinds>,
}

impl CommandIntake {
    /// Enqueue a command without blocking. Returns `Busy` when a command of
    /// the same kind is already queued, or if the queue is somehow full.
    pub fn enqueue(&self, cmd: Command) -> EnqueueOutcome {
        let kind = cmd.kind();
        if !self.pending.try_claim(kind) {
            tracing::debug!(?kind, "duplicate command dropped");
            return EnqueueOutcome::Busy;
        }
        match self.tx.try_send(cmd) {
            Ok(()) => EnqueueOutcome::Accepted,
            Err(_) => {
                self.pending.release(kind);
                tracing::warn!(?kind, "command queue full; command dropped");
                EnqueueOutcome::Busy
            }
        }
    }
}

/// Consumer half, owned by the controller.
pub struct CommandDrain {
    rx: xch::Receiver<Command>,
    pending: Arc<PendingKinds>,
}

impl CommandDrain {
    /// Pop the next queued command in arrival order, clearing its kind flag
    /// so the kind can be resubmitted.
    pub fn try_next(&self) -> Option<Command> {
        let cmd = self.rx.try_recv().ok()?;
        self.pending.release(cmd.kind());
        Some(cmd)
    }
}
