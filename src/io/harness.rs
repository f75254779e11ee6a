//! Scripted input and recording output doubles
//!
//! Used by the integration tests and the demo. `ScriptedInput` holds the
//! current raw button/switch words and exposes setters named after the
//! physical controls; mutate it between `run_for` calls to script a
//! drive. The recording sinks keep both the last value and the full
//! write history so tests can assert on trends.

use super::{DisplaySink, InputPins, BTN_BRAKE, BTN_CRUISE, BTN_GAS, SW_ENGINE, SW_LOAD_MASK, SW_LOAD_SHIFT, SW_TOP_GEAR};
use crate::diag::{Diag, DiagSink};

/// Drivable input pins
#[derive(Debug, Default)]
pub struct ScriptedInput {
    buttons: u32,
    switches: u32,
}

impl ScriptedInput {
    pub fn new() -> Self {
        ScriptedInput::default()
    }

    fn set(word: &mut u32, mask: u32, active: bool) {
        if active {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    pub fn set_gas(&mut self, pressed: bool) {
        Self::set(&mut self.buttons, BTN_GAS, pressed);
    }

    pub fn set_brake(&mut self, pressed: bool) {
        Self::set(&mut self.buttons, BTN_BRAKE, pressed);
    }

    pub fn set_cruise(&mut self, on: bool) {
        Self::set(&mut self.buttons, BTN_CRUISE, on);
    }

    pub fn set_engine(&mut self, on: bool) {
        Self::set(&mut self.switches, SW_ENGINE, on);
    }

    pub fn set_top_gear(&mut self, on: bool) {
        Self::set(&mut self.switches, SW_TOP_GEAR, on);
    }

    /// Set the load dial to roughly `pct` percent (the dial has a two
    /// percent granularity).
    pub fn set_load_percent(&mut self, pct: u8) {
        self.switches &= !SW_LOAD_MASK;
        self.switches |= ((pct as u32) << SW_LOAD_SHIFT) & SW_LOAD_MASK;
    }
}

impl InputPins for ScriptedInput {
    fn buttons(&mut self) -> u32 {
        self.buttons
    }

    fn switches(&mut self) -> u32 {
        self.switches
    }
}

/// Display sink that remembers everything written to it
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub red: u32,
    pub green: u32,
    pub velocity: i16,
    pub target: i16,
    pub velocity_history: Vec<i16>,
    pub green_history: Vec<u32>,
    pub target_history: Vec<i16>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        RecordingDisplay::default()
    }
}

impl DisplaySink for RecordingDisplay {
    fn leds_red(&mut self, bits: u32) {
        self.red = bits;
    }

    fn leds_green(&mut self, bits: u32) {
        self.green = bits;
        self.green_history.push(bits);
    }

    fn show_velocity(&mut self, velocity: i16) {
        self.velocity = velocity;
        self.velocity_history.push(velocity);
    }

    fn show_target_velocity(&mut self, target: i16) {
        self.target = target;
        self.target_history.push(target);
    }
}

/// Diagnostic sink that collects every verdict
#[derive(Debug, Default)]
pub struct RecordingDiag {
    pub reports: Vec<Diag>,
}

impl RecordingDiag {
    pub fn new() -> Self {
        RecordingDiag::default()
    }

    pub fn overload_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|d| matches!(d, Diag::Overloaded { .. }))
            .count()
    }

    pub fn ok_count(&self) -> usize {
        self.reports.iter().filter(|d| matches!(d, Diag::Ok)).count()
    }
}

impl DiagSink for RecordingDiag {
    fn report(&mut self, diag: Diag) {
        self.reports.push(diag);
    }
}
