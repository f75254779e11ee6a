//! Error types for the simulated kernel
//!
//! Uses Rust's Result pattern; every startup error is fatal to the caller,
//! there is no degraded mode.

use core::fmt;

/// Kernel error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// Hardware timer could not be acquired (zero tick resolution)
    NoClock,
    /// Kernel already started
    Running,
    /// Kernel not started yet
    NotStarted,
    /// No application task registered before start
    NoAppTask,
    /// Priority outside the configured range
    PrioInvalid,
    /// A task with this priority already exists
    PrioExist,
    /// Timer period is zero or not a whole number of hardware ticks
    TmrInvalidPeriod,
}

/// Result type alias for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::NoClock => write!(f, "no system clock available"),
            KernelError::Running => write!(f, "kernel is already running"),
            KernelError::NotStarted => write!(f, "kernel has not been started"),
            KernelError::NoAppTask => write!(f, "no application task registered"),
            KernelError::PrioInvalid => write!(f, "priority outside configured range"),
            KernelError::PrioExist => write!(f, "priority already in use"),
            KernelError::TmrInvalidPeriod => {
                write!(f, "timer period must be a positive multiple of the tick resolution")
            }
        }
    }
}

impl std::error::Error for KernelError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_descriptive() {
        assert_eq!(KernelError::NoClock.to_string(), "no system clock available");
        assert!(KernelError::TmrInvalidPeriod.to_string().contains("tick resolution"));
    }
}
