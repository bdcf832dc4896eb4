use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ControllerError {
    /// Transient: the RTC produced no usable reading this tick. Suppressed
    /// after the first notification; never fatal.
    #[error("clock unavailable")]
    ClockUnavailable,
    /// Transient relay fault. "on" is retried while the start minute still
    /// matches; "off" is retried on every tick until it succeeds.
    #[error("relay fault: {0}")]
    DriverFault(String),
    /// Caller-visible: a duplicate command of the same kind was dropped.
    #[error("command queue busy")]
    QueueBusy,
    #[error("schedule store: {0}")]
    Store(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing relay")]
    MissingRelay,
    #[error("missing schedule store")]
    MissingStore,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
