//! Core type definitions for the simulated kernel
//!
//! These types provide strong typing for kernel primitives.

/// Task priority (0 = highest priority)
pub type Prio = u8;

/// Hardware tick counter type
pub type Tick = u64;

/// Virtual time in milliseconds
pub type Millis = u64;

/// Release semaphore counter type
pub type SemCtr = u32;

/// Handle for a registered task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(pub(crate) usize);

/// Handle for a single-slot mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MboxId(pub(crate) usize);

/// Handle for a periodic soft timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(pub(crate) usize);
