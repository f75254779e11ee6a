//! Cruise-control regulator
//!
//! Evaluates the driver inputs in a fixed six-step order once per period:
//! gas, brake, gear, engine, cruise toggle, throttle selection. Every
//! input channel is read exactly once at period start; an empty channel
//! keeps the previous sample. All driver-facing state lives in
//! [`ControlState`], owned by this task alone.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{CFG_ENGAGE_MIN_VELOCITY, CFG_MAX_THROTTLE};
use crate::diag::{Diag, DiagSink};
use crate::io::{
    DisplaySink, LED_GREEN_BRAKE, LED_GREEN_CRUISE_REQ, LED_GREEN_CRUISING, LED_GREEN_GAS,
    LED_RED_ENGINE, LED_RED_TOP_GEAR, LED_RED_ZONE0,
};
use crate::kernel::task::{Step, Task, TaskCtx};
use crate::kernel::types::MboxId;
use crate::types::{CruiseState, Msg, OnOff, Pedal, Position, ThrottleCmd, Throttle, Velocity};
use crate::vehicle::zone;

/// One period's worth of channel reads; `None` keeps the last sample
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodInputs {
    pub gas: Option<Pedal>,
    pub brake: Option<Pedal>,
    pub cruise: Option<OnOff>,
    pub gear: Option<OnOff>,
    pub engine: Option<OnOff>,
    pub velocity: Option<Velocity>,
}

/// Regulator state, single-writer
#[derive(Debug, Clone, Copy)]
pub struct ControlState {
    pub cruise: CruiseState,
    pub engine: OnOff,
    pub gear: OnOff,
    pub gas: Pedal,
    pub brake: Pedal,
    pub cruise_sw: OnOff,
    pub velocity: Velocity,
    pub throttle: Throttle,
}

impl ControlState {
    pub fn new() -> Self {
        ControlState {
            cruise: CruiseState::Disabled,
            engine: OnOff::Off,
            gear: OnOff::Off,
            gas: Pedal::Released,
            brake: Pedal::Released,
            cruise_sw: OnOff::Off,
            velocity: 0,
            throttle: 0,
        }
    }

    fn may_engage(&self) -> bool {
        self.velocity > CFG_ENGAGE_MIN_VELOCITY
            && self.gear.is_on()
            && !self.brake.is_pressed()
            && !self.gas.is_pressed()
    }

    /// Run the six evaluation steps and produce this period's actuation.
    pub fn evaluate(&mut self, inputs: PeriodInputs) -> ThrottleCmd {
        if let Some(v) = inputs.velocity {
            self.velocity = v;
        }

        // 1. gas pedal: pressing hands the throttle back to the driver
        if let Some(gas) = inputs.gas {
            self.gas = gas;
        }
        if self.gas.is_pressed() {
            self.cruise = CruiseState::Disabled;
        }

        // 2. brake pedal: disengages and forces the throttle shut
        if let Some(brake) = inputs.brake {
            self.brake = brake;
        }
        if self.brake.is_pressed() {
            self.cruise = CruiseState::Disabled;
            self.throttle = 0;
        }

        // 3. top gear: cruising requires it
        if let Some(gear) = inputs.gear {
            self.gear = gear;
        }
        if !self.gear.is_on() {
            self.cruise = CruiseState::Disabled;
        }

        // 4. engine: switching off only takes effect at standstill
        match inputs.engine {
            Some(OnOff::On) => self.engine = OnOff::On,
            Some(OnOff::Off) if self.velocity == 0 => {
                self.engine = OnOff::Off;
                self.cruise = CruiseState::Disabled;
            }
            _ => {}
        }

        // 5. cruise toggle: off disables unconditionally; on engages as
        // soon as the conditions hold, capturing the target exactly at
        // the transition
        if let Some(sw) = inputs.cruise {
            self.cruise_sw = sw;
        }
        if !self.cruise_sw.is_on() {
            self.cruise = CruiseState::Disabled;
        } else if !matches!(self.cruise, CruiseState::Engaged { .. }) {
            self.cruise = if self.may_engage() {
                crate::info!("cruise engaged at {} tenths", self.velocity);
                CruiseState::Engaged { target: self.velocity }
            } else {
                CruiseState::RequestedOn
            };
        }

        // 6. throttle selection. With the engine off the throttle keeps
        // its last value and the vehicle coasts on it.
        if self.engine.is_on() && !self.brake.is_pressed() {
            self.throttle = match self.cruise {
                CruiseState::Engaged { target } => {
                    if self.velocity < target {
                        CFG_MAX_THROTTLE
                    } else if self.velocity > target {
                        0
                    } else {
                        self.throttle
                    }
                }
                _ => {
                    if self.gas.is_pressed() {
                        CFG_MAX_THROTTLE
                    } else {
                        0
                    }
                }
            };
        }

        ThrottleCmd { throttle: self.throttle, brake: self.brake }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        ControlState::new()
    }
}

/// Periodic regulator task: drain the input channels, evaluate, post the
/// actuation command, refresh the operator displays.
pub struct ControlTask<D: DisplaySink, G: DiagSink> {
    state: ControlState,
    position: Position,
    load_bar: u32,
    mb_velocity: MboxId,
    mb_position: MboxId,
    mb_gas: MboxId,
    mb_brake: MboxId,
    mb_cruise: MboxId,
    mb_gear: MboxId,
    mb_engine: MboxId,
    mb_load_bar: MboxId,
    mb_throttle: MboxId,
    display: Rc<RefCell<D>>,
    diag: Rc<RefCell<G>>,
}

/// Mailboxes drained and fed by the regulator
pub struct ControlChannels {
    pub velocity: MboxId,
    pub position: MboxId,
    pub gas: MboxId,
    pub brake: MboxId,
    pub cruise: MboxId,
    pub gear: MboxId,
    pub engine: MboxId,
    pub load_bar: MboxId,
    pub throttle: MboxId,
}

impl<D: DisplaySink, G: DiagSink> ControlTask<D, G> {
    pub fn new(channels: ControlChannels, display: Rc<RefCell<D>>, diag: Rc<RefCell<G>>) -> Self {
        ControlTask {
            state: ControlState::new(),
            position: 0,
            load_bar: 0,
            mb_velocity: channels.velocity,
            mb_position: channels.position,
            mb_gas: channels.gas,
            mb_brake: channels.brake,
            mb_cruise: channels.cruise,
            mb_gear: channels.gear,
            mb_engine: channels.engine,
            mb_load_bar: channels.load_bar,
            mb_throttle: channels.throttle,
            display,
            diag,
        }
    }

    fn draw(&self) {
        let mut red = self.load_bar;
        if self.state.engine.is_on() {
            red |= LED_RED_ENGINE;
        }
        if self.state.gear.is_on() {
            red |= LED_RED_TOP_GEAR;
        }
        red |= LED_RED_ZONE0 >> zone(self.position);

        let mut green = 0;
        match self.state.cruise {
            CruiseState::Engaged { .. } => green |= LED_GREEN_CRUISING,
            CruiseState::RequestedOn => green |= LED_GREEN_CRUISE_REQ,
            CruiseState::Disabled => {}
        }
        if self.state.brake.is_pressed() {
            green |= LED_GREEN_BRAKE;
        }
        if self.state.gas.is_pressed() {
            green |= LED_GREEN_GAS;
        }

        let target = match self.state.cruise {
            CruiseState::Engaged { target } => target / 10,
            _ => 0,
        };

        let mut display = self.display.borrow_mut();
        display.leds_red(red);
        display.leds_green(green);
        display.show_target_velocity(target);
    }
}

impl<D: DisplaySink, G: DiagSink> Task<Msg> for ControlTask<D, G> {
    fn name(&self) -> &'static str {
        "control"
    }

    fn run(&mut self, ctx: &mut TaskCtx<'_, Msg>) -> Step {
        let velocity = ctx.try_take(self.mb_velocity).and_then(Msg::as_velocity);
        if velocity.is_none() {
            // the plant runs at higher priority in the same period, so an
            // empty slot means it was not scheduled: a genuine overrun
            crate::warn!("control: velocity update missed, reusing last sample");
            self.diag.borrow_mut().report(Diag::MissedUpdate { channel: "velocity" });
        }
        if let Some(p) = ctx.try_take(self.mb_position).and_then(Msg::as_position) {
            self.position = p;
        }
        if let Some(bits) = ctx.try_take(self.mb_load_bar).and_then(Msg::as_load_bar) {
            self.load_bar = bits;
        }

        let inputs = PeriodInputs {
            gas: ctx.try_take(self.mb_gas).and_then(Msg::as_pedal),
            brake: ctx.try_take(self.mb_brake).and_then(Msg::as_pedal),
            cruise: ctx.try_take(self.mb_cruise).and_then(Msg::as_switch),
            gear: ctx.try_take(self.mb_gear).and_then(Msg::as_switch),
            engine: ctx.try_take(self.mb_engine).and_then(Msg::as_switch),
            velocity,
        };
        let cmd = self.state.evaluate(inputs);
        ctx.post(self.mb_throttle, Msg::Throttle(cmd));
        self.draw();
        Step::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> PeriodInputs {
        PeriodInputs::default()
    }

    fn cruising(velocity: Velocity) -> ControlState {
        let mut s = ControlState::new();
        s.engine = OnOff::On;
        s.gear = OnOff::On;
        s.cruise_sw = OnOff::On;
        s.velocity = velocity;
        s.cruise = CruiseState::Engaged { target: velocity };
        s
    }

    #[test]
    fn engagement_threshold_is_exclusive() {
        let mut s = ControlState::new();
        s.engine = OnOff::On;
        s.gear = OnOff::On;

        s.evaluate(PeriodInputs {
            cruise: Some(OnOff::On),
            velocity: Some(199),
            ..inputs()
        });
        assert_eq!(s.cruise, CruiseState::RequestedOn);

        s.evaluate(PeriodInputs { velocity: Some(201), ..inputs() });
        assert_eq!(s.cruise, CruiseState::Engaged { target: 201 });
    }

    #[test]
    fn target_is_captured_only_at_the_transition() {
        let mut s = cruising(250);
        s.evaluate(PeriodInputs { velocity: Some(300), ..inputs() });
        assert_eq!(s.cruise, CruiseState::Engaged { target: 250 });
    }

    #[test]
    fn gas_press_disengages() {
        let mut s = cruising(250);
        s.evaluate(PeriodInputs { gas: Some(Pedal::Pressed), ..inputs() });
        assert!(!matches!(s.cruise, CruiseState::Engaged { .. }));
        // toggle still on, so the request stays armed
        assert_eq!(s.cruise, CruiseState::RequestedOn);
    }

    #[test]
    fn gas_release_reengages_at_the_current_velocity() {
        let mut s = cruising(250);
        s.evaluate(PeriodInputs { gas: Some(Pedal::Pressed), velocity: Some(300), ..inputs() });
        let cmd = s.evaluate(PeriodInputs {
            gas: Some(Pedal::Released),
            velocity: Some(320),
            ..inputs()
        });
        assert_eq!(s.cruise, CruiseState::Engaged { target: 320 });
        assert_eq!(cmd.brake, Pedal::Released);
    }

    #[test]
    fn brake_press_disengages_and_shuts_the_throttle() {
        let mut s = cruising(250);
        s.throttle = CFG_MAX_THROTTLE;
        let cmd = s.evaluate(PeriodInputs { brake: Some(Pedal::Pressed), ..inputs() });
        assert!(!matches!(s.cruise, CruiseState::Engaged { .. }));
        assert_eq!(cmd.throttle, 0);
        assert_eq!(cmd.brake, Pedal::Pressed);
    }

    #[test]
    fn leaving_top_gear_disengages() {
        let mut s = cruising(250);
        s.evaluate(PeriodInputs { gear: Some(OnOff::Off), ..inputs() });
        assert!(!matches!(s.cruise, CruiseState::Engaged { .. }));
    }

    #[test]
    fn cruise_toggle_off_disables_unconditionally() {
        let mut s = cruising(250);
        s.evaluate(PeriodInputs { cruise: Some(OnOff::Off), ..inputs() });
        assert_eq!(s.cruise, CruiseState::Disabled);
    }

    #[test]
    fn engine_switch_is_ignored_while_moving() {
        let mut s = cruising(250);
        s.evaluate(PeriodInputs { engine: Some(OnOff::Off), ..inputs() });
        assert_eq!(s.engine, OnOff::On);
        assert!(matches!(s.cruise, CruiseState::Engaged { .. }));
    }

    #[test]
    fn engine_switch_takes_effect_at_standstill() {
        let mut s = cruising(250);
        s.evaluate(PeriodInputs { engine: Some(OnOff::Off), velocity: Some(0), ..inputs() });
        assert_eq!(s.engine, OnOff::Off);
        // the toggle is still held on, so the request re-arms; it must
        // not be engaged anymore
        assert!(!matches!(s.cruise, CruiseState::Engaged { .. }));
    }

    #[test]
    fn bang_bang_regulation_around_the_target() {
        let mut s = cruising(250);
        let cmd = s.evaluate(PeriodInputs { velocity: Some(240), ..inputs() });
        assert_eq!(cmd.throttle, CFG_MAX_THROTTLE);

        let cmd = s.evaluate(PeriodInputs { velocity: Some(260), ..inputs() });
        assert_eq!(cmd.throttle, 0);
    }

    #[test]
    fn equality_with_the_target_keeps_the_throttle() {
        let mut s = cruising(250);
        s.throttle = CFG_MAX_THROTTLE;
        let cmd = s.evaluate(PeriodInputs { velocity: Some(250), ..inputs() });
        assert_eq!(cmd.throttle, CFG_MAX_THROTTLE);

        s.throttle = 0;
        let cmd = s.evaluate(PeriodInputs { velocity: Some(250), ..inputs() });
        assert_eq!(cmd.throttle, 0);
    }

    #[test]
    fn manual_throttle_follows_the_gas_pedal() {
        let mut s = ControlState::new();
        s.engine = OnOff::On;
        let cmd = s.evaluate(PeriodInputs { gas: Some(Pedal::Pressed), ..inputs() });
        assert_eq!(cmd.throttle, CFG_MAX_THROTTLE);
        let cmd = s.evaluate(PeriodInputs { gas: Some(Pedal::Released), ..inputs() });
        assert_eq!(cmd.throttle, 0);
    }

    #[test]
    fn engine_off_preserves_the_throttle() {
        let mut s = ControlState::new();
        s.throttle = CFG_MAX_THROTTLE;
        let cmd = s.evaluate(PeriodInputs { gas: Some(Pedal::Released), ..inputs() });
        assert_eq!(cmd.throttle, CFG_MAX_THROTTLE, "coasting keeps the last throttle");
    }

    #[test]
    fn empty_channels_keep_the_previous_samples() {
        let mut s = cruising(250);
        let cmd = s.evaluate(inputs());
        assert!(matches!(s.cruise, CruiseState::Engaged { target: 250 }));
        assert_eq!(cmd.brake, Pedal::Released);
    }
}
