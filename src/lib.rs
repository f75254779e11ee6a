//! Simulated cruise-control system on a fixed-priority multitasking kernel
//!
//! A set of periodic tasks cooperates through single-slot mailboxes and
//! timer-driven release semaphores to model:
//! - Vehicle dynamics over a closed 2400-unit loop with terrain zones
//! - Driver-input sampling and the cruise-control engagement state machine
//! - An overload watchdog fed by a liveness heartbeat, with a configurable
//!   synthetic competing workload
//!
//! The kernel substrate is a deterministic single-threaded executor over
//! virtual time: one 100 ms hardware tick drives soft timers, each of which
//! signals exactly one task's release semaphore. Task work units are
//! instantaneous in virtual time except for explicit processor-occupancy
//! windows, which is what makes the priority-scheduling demonstration exact
//! and the whole system replayable in tests.

#![deny(unsafe_op_in_unsafe_fn)]

// ============ Modules ============

pub mod log;

pub mod app;
pub mod config;
pub mod control;
pub mod diag;
pub mod io;
pub mod kernel;
pub mod types;
pub mod vehicle;
pub mod watchdog;

// ============ Re-exports ============

pub use config::*;
pub use kernel::error::{KernelError, KernelResult};
pub use kernel::task::{Step, Task, TaskCtx};
pub use kernel::types::{MboxId, Millis, Prio, TaskId, Tick, TimerId};
pub use kernel::Kernel;
pub use types::*;
