//! Sensor and display boundary
//!
//! The polled input devices and the LED/numeric displays sit behind two
//! traits so tests can script inputs and record outputs. The bit layout
//! of the raw button and switch words is fixed here; the publisher tasks
//! sample the pins every 100 ms and post normalized values into the
//! control task's mailboxes.

pub mod harness;

use std::cell::RefCell;
use std::rc::Rc;

use crate::kernel::task::{Step, Task, TaskCtx};
use crate::kernel::types::MboxId;
use crate::types::{Msg, OnOff, Pedal};

// ============ Raw bit layout ============

/// Gas pedal button
pub const BTN_GAS: u32 = 0x08;
/// Brake pedal button
pub const BTN_BRAKE: u32 = 0x04;
/// Cruise toggle button
pub const BTN_CRUISE: u32 = 0x02;

/// Engine switch
pub const SW_ENGINE: u32 = 0x01;
/// Top gear switch
pub const SW_TOP_GEAR: u32 = 0x02;
/// Synthetic load dial, six switches wide
pub const SW_LOAD_MASK: u32 = 0x3F0;
/// Shift turning the masked dial bits into twice the load percentage
pub const SW_LOAD_SHIFT: u32 = 3;

/// Engine indicator on the red LED bank
pub const LED_RED_ENGINE: u32 = 0x1;
/// Top gear indicator on the red LED bank
pub const LED_RED_TOP_GEAR: u32 = 0x2;
/// Track zone 0 indicator; zone `z` lights `LED_RED_ZONE0 >> z`
pub const LED_RED_ZONE0: u32 = 0x2_0000;

/// Cruise engaged indicator on the green LED bank
pub const LED_GREEN_CRUISING: u32 = 0x01;
/// Cruise requested but not engaged
pub const LED_GREEN_CRUISE_REQ: u32 = 0x04;
/// Brake pedal indicator
pub const LED_GREEN_BRAKE: u32 = 0x10;
/// Gas pedal indicator
pub const LED_GREEN_GAS: u32 = 0x40;

// ============ Boundary traits ============

/// Polled input pins, already normalized to active-high
pub trait InputPins {
    /// Current button word (`BTN_*` bits)
    fn buttons(&mut self) -> u32;
    /// Current switch word (`SW_*` bits)
    fn switches(&mut self) -> u32;
}

/// LED banks and numeric displays. Velocities arrive in whole units;
/// the encoding into segments is the sink's business.
pub trait DisplaySink {
    fn leds_red(&mut self, bits: u32);
    fn leds_green(&mut self, bits: u32);
    fn show_velocity(&mut self, velocity: i16);
    fn show_target_velocity(&mut self, target: i16);
}

fn pedal_from(word: u32, mask: u32) -> Pedal {
    if word & mask != 0 {
        Pedal::Pressed
    } else {
        Pedal::Released
    }
}

fn switch_from(word: u32, mask: u32) -> OnOff {
    if word & mask != 0 {
        OnOff::On
    } else {
        OnOff::Off
    }
}

// ============ Publisher tasks ============

/// Samples the button word and publishes the pedal and cruise channels
pub struct ButtonIo<I: InputPins> {
    pins: Rc<RefCell<I>>,
    mb_gas: MboxId,
    mb_brake: MboxId,
    mb_cruise: MboxId,
}

impl<I: InputPins> ButtonIo<I> {
    pub fn new(pins: Rc<RefCell<I>>, mb_gas: MboxId, mb_brake: MboxId, mb_cruise: MboxId) -> Self {
        ButtonIo { pins, mb_gas, mb_brake, mb_cruise }
    }
}

impl<I: InputPins> Task<Msg> for ButtonIo<I> {
    fn name(&self) -> &'static str {
        "button-io"
    }

    fn run(&mut self, ctx: &mut TaskCtx<'_, Msg>) -> Step {
        let word = self.pins.borrow_mut().buttons();
        ctx.post(self.mb_gas, Msg::Gas(pedal_from(word, BTN_GAS)));
        ctx.post(self.mb_brake, Msg::Brake(pedal_from(word, BTN_BRAKE)));
        ctx.post(self.mb_cruise, Msg::CruiseSwitch(switch_from(word, BTN_CRUISE)));
        Step::Done
    }
}

/// Samples the switch word and publishes the engine and gear channels.
/// The load dial is sampled by the synthetic load task itself.
pub struct SwitchIo<I: InputPins> {
    pins: Rc<RefCell<I>>,
    mb_engine: MboxId,
    mb_gear: MboxId,
}

impl<I: InputPins> SwitchIo<I> {
    pub fn new(pins: Rc<RefCell<I>>, mb_engine: MboxId, mb_gear: MboxId) -> Self {
        SwitchIo { pins, mb_engine, mb_gear }
    }
}

impl<I: InputPins> Task<Msg> for SwitchIo<I> {
    fn name(&self) -> &'static str {
        "switch-io"
    }

    fn run(&mut self, ctx: &mut TaskCtx<'_, Msg>) -> Step {
        let word = self.pins.borrow_mut().switches();
        ctx.post(self.mb_engine, Msg::Engine(switch_from(word, SW_ENGINE)));
        ctx.post(self.mb_gear, Msg::Gear(switch_from(word, SW_TOP_GEAR)));
        Step::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pedal_and_switch_decode() {
        assert_eq!(pedal_from(BTN_GAS | BTN_CRUISE, BTN_GAS), Pedal::Pressed);
        assert_eq!(pedal_from(BTN_CRUISE, BTN_BRAKE), Pedal::Released);
        assert_eq!(switch_from(SW_ENGINE, SW_ENGINE), OnOff::On);
        assert_eq!(switch_from(SW_LOAD_MASK, SW_TOP_GEAR), OnOff::Off);
    }

    #[test]
    fn zone_leds_span_the_red_bank() {
        // six one-of-N zone bits, none colliding with the status bits
        for z in 0..6 {
            let bit = LED_RED_ZONE0 >> z;
            assert_eq!(bit & (LED_RED_ENGINE | LED_RED_TOP_GEAR), 0);
            assert_eq!(bit & SW_LOAD_MASK, 0);
        }
    }
}
