//! Compile-time configuration for the cruise-control system
//!
//! All task periods, the hardware tick resolution and the priority map are
//! fixed at startup and not runtime-reconfigurable.

use crate::kernel::types::{Millis, Prio};

/// Maximum number of priority levels
pub const CFG_PRIO_MAX: usize = 32;

/// Hardware timer resolution; the single clock source for all soft timers
pub const CFG_TICK_RESOLUTION_MS: Millis = 100;

// ============ Task periods ============

/// Button publisher period; gives good enough input responsivity
pub const CFG_BUTTON_PERIOD_MS: Millis = 100;
/// Switch publisher period
pub const CFG_SWITCH_PERIOD_MS: Millis = 100;
/// Vehicle dynamics period
pub const CFG_VEHICLE_PERIOD_MS: Millis = 300;
/// Control evaluation period
pub const CFG_CONTROL_PERIOD_MS: Millis = 300;
/// Liveness heartbeat period
pub const CFG_DETECTION_PERIOD_MS: Millis = 300;
/// Watchdog evaluation period; also the heartbeat wait bound
pub const CFG_WATCHDOG_PERIOD_MS: Millis = 300;
/// Synthetic load period
pub const CFG_EXTRA_LOAD_PERIOD_MS: Millis = 300;

// ============ Task priorities (0 = highest) ============
//
// This ordering is load-bearing: sensor publishers and the watchdog stay
// runnable above the synthetic load, while the liveness detector below it
// is the task that starves under overload.

pub const CFG_PRIO_BUTTON_IO: Prio = 8;
pub const CFG_PRIO_SWITCH_IO: Prio = 9;
pub const CFG_PRIO_WATCHDOG: Prio = 10;
pub const CFG_PRIO_VEHICLE: Prio = 11;
pub const CFG_PRIO_CONTROL: Prio = 12;
pub const CFG_PRIO_EXTRA_LOAD: Prio = 13;
pub const CFG_PRIO_DETECTION: Prio = 14;

// ============ Vehicle and regulator tuning ============

/// Circumference of the circular track, in tenths
pub const CFG_LOOP_LENGTH: u32 = 24_000;

/// Length of each of the six track zones, in tenths
pub const CFG_ZONE_LENGTH: u32 = 4_000;

/// Per-zone slope contribution to the retardation, in tenths/s^2.
/// Positive is uphill (slows the vehicle down).
pub const CFG_ZONE_RETARDATION: [i32; 6] = [0, 15, 25, 0, -10, -5];

/// Deceleration applied while the brake is pressed, in tenths/s^2
pub const CFG_BRAKE_RETARDATION: i32 = 200;

/// Full throttle, in tenths of a volt
pub const CFG_MAX_THROTTLE: u8 = 80;

/// Minimum velocity for cruise engagement (exclusive), in tenths
pub const CFG_ENGAGE_MIN_VELOCITY: i16 = 200;
