//! Overload detection and synthetic load
//!
//! Three tasks cooperate. The detection task sits at the lowest priority
//! and posts a heartbeat whenever it gets processor time; the watchdog
//! waits for that heartbeat with a one-period bound and reports either
//! verdict; the synthetic load task turns the operator dial into real
//! processor occupancy so the overload path can be demonstrated on
//! demand.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{CFG_EXTRA_LOAD_PERIOD_MS, CFG_WATCHDOG_PERIOD_MS};
use crate::diag::{Diag, DiagSink};
use crate::io::{InputPins, SW_LOAD_MASK, SW_LOAD_SHIFT};
use crate::kernel::task::{Step, Task, TaskCtx};
use crate::kernel::types::{MboxId, Millis};
use crate::types::Msg;

/// Liveness producer: one heartbeat per release, nothing else. Its
/// priority is the whole point; when it starves, the system is full.
pub struct DetectionTask {
    mb_heartbeat: MboxId,
}

impl DetectionTask {
    pub fn new(mb_heartbeat: MboxId) -> Self {
        DetectionTask { mb_heartbeat }
    }
}

impl Task<Msg> for DetectionTask {
    fn name(&self) -> &'static str {
        "detection"
    }

    fn run(&mut self, ctx: &mut TaskCtx<'_, Msg>) -> Step {
        ctx.post(self.mb_heartbeat, Msg::Heartbeat);
        Step::Done
    }
}

/// Supervises the heartbeat with a bounded wait, one verdict per period
pub struct WatchDogTask<G: DiagSink> {
    mb_heartbeat: MboxId,
    mb_load: MboxId,
    load_pct: u8,
    diag: Rc<RefCell<G>>,
}

impl<G: DiagSink> WatchDogTask<G> {
    pub fn new(mb_heartbeat: MboxId, mb_load: MboxId, diag: Rc<RefCell<G>>) -> Self {
        WatchDogTask { mb_heartbeat, mb_load, load_pct: 0, diag }
    }
}

impl<G: DiagSink> Task<Msg> for WatchDogTask<G> {
    fn name(&self) -> &'static str {
        "watchdog"
    }

    fn run(&mut self, ctx: &mut TaskCtx<'_, Msg>) -> Step {
        if let Some(pct) = ctx.try_take(self.mb_load).and_then(Msg::as_load_percent) {
            self.load_pct = pct;
        }
        Step::Pend { mbox: self.mb_heartbeat, timeout: Some(CFG_WATCHDOG_PERIOD_MS) }
    }

    fn resumed(&mut self, _ctx: &mut TaskCtx<'_, Msg>, taken: Option<Msg>) -> Step {
        let verdict = match taken {
            Some(_) => Diag::Ok,
            None => {
                let headroom_pct = 100 - self.load_pct;
                crate::warn!("watchdog: no heartbeat, headroom {}%", headroom_pct);
                Diag::Overloaded { headroom_pct }
            }
        };
        self.diag.borrow_mut().report(verdict);
        Step::Done
    }
}

/// Quantized load percentage for a raw switch word, `0..=100`
fn load_percent(switches: u32) -> u8 {
    ((switches & SW_LOAD_MASK) >> SW_LOAD_SHIFT).min(100) as u8
}

/// Occupancy span for a load percentage
fn load_span(pct: u8) -> Millis {
    CFG_EXTRA_LOAD_PERIOD_MS * pct as Millis / 100
}

/// Burns processor time proportional to the operator dial and publishes
/// both the raw dial bits (bar graph) and the quantized percentage.
pub struct ExtraLoadTask<I: InputPins> {
    pins: Rc<RefCell<I>>,
    mb_load_bar: MboxId,
    mb_load_pct: MboxId,
}

impl<I: InputPins> ExtraLoadTask<I> {
    pub fn new(pins: Rc<RefCell<I>>, mb_load_bar: MboxId, mb_load_pct: MboxId) -> Self {
        ExtraLoadTask { pins, mb_load_bar, mb_load_pct }
    }
}

impl<I: InputPins> Task<Msg> for ExtraLoadTask<I> {
    fn name(&self) -> &'static str {
        "extra-load"
    }

    fn run(&mut self, ctx: &mut TaskCtx<'_, Msg>) -> Step {
        let switches = self.pins.borrow_mut().switches();
        let pct = load_percent(switches);
        ctx.post(self.mb_load_bar, Msg::LoadBar(switches & SW_LOAD_MASK));
        ctx.post(self.mb_load_pct, Msg::LoadPercent(pct));
        Step::Occupy(load_span(pct))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_quantization() {
        assert_eq!(load_percent(0), 0);
        assert_eq!(load_percent(0x3F0), 100, "full dial caps at 100");
        assert_eq!(load_percent(0x100), 32);
        // bits outside the dial field are ignored
        assert_eq!(load_percent(!SW_LOAD_MASK), 0);
    }

    #[test]
    fn load_span_scales_with_the_period() {
        assert_eq!(load_span(0), 0);
        assert_eq!(load_span(50), CFG_EXTRA_LOAD_PERIOD_MS / 2);
        assert_eq!(load_span(100), CFG_EXTRA_LOAD_PERIOD_MS);
    }
}
