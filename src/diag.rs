//! Overload diagnostics emitted by the watchdog

/// One watchdog verdict per supervision period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diag {
    /// The lowest-priority task got processor time this period.
    Ok,
    /// No heartbeat arrived in time: the system is saturated. The
    /// headroom is derived from the last requested synthetic load.
    Overloaded { headroom_pct: u8 },
    /// A consumer found its input mailbox empty and reused stale data.
    MissedUpdate { channel: &'static str },
}

/// Receives diagnostics; the production build drives an operator
/// console, tests record the verdicts.
pub trait DiagSink {
    fn report(&mut self, diag: Diag);
}
