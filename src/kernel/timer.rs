//! Soft timers driven by the single hardware tick
//!
//! Each timer is periodic and bound to exactly one task: firing signals
//! that task's release semaphore and nothing else. Timer callbacks never
//! compute.

use super::error::{KernelError, KernelResult};
use super::types::{Millis, TaskId, Tick, TimerId};

struct SoftTimer {
    period_ticks: Tick,
    countdown: Tick,
    target: TaskId,
}

/// All soft timers of one kernel instance
pub(crate) struct TimerSet {
    timers: Vec<SoftTimer>,
}

impl TimerSet {
    pub(crate) fn new() -> Self {
        TimerSet { timers: Vec::new() }
    }

    /// Create and start a periodic timer releasing `target` every
    /// `period_ms`. The first release comes one full period after start.
    pub(crate) fn create(
        &mut self,
        period_ms: Millis,
        tick_resolution: Millis,
        target: TaskId,
    ) -> KernelResult<TimerId> {
        if period_ms == 0 || period_ms % tick_resolution != 0 {
            return Err(KernelError::TmrInvalidPeriod);
        }
        let period_ticks = period_ms / tick_resolution;
        self.timers.push(SoftTimer {
            period_ticks,
            countdown: period_ticks,
            target,
        });
        Ok(TimerId(self.timers.len() - 1))
    }

    /// Advance all timers by one hardware tick, collecting the tasks whose
    /// release semaphores must be signalled.
    pub(crate) fn tick(&mut self, fired: &mut Vec<TaskId>) {
        for timer in self.timers.iter_mut() {
            timer.countdown -= 1;
            if timer.countdown == 0 {
                timer.countdown = timer.period_ticks;
                fired.push(timer.target);
            }
        }
    }
}
