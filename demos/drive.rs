//! Scripted demonstration drive
//!
//! Accelerates out of standstill, engages cruise control, sweeps the
//! load dial up to provoke the watchdog, then brakes to a stop. Run with
//! `RUST_LOG=debug cargo run --example drive` for the full trace.

use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

use cruise_control::app;
use cruise_control::diag::{Diag, DiagSink};
use cruise_control::io::harness::ScriptedInput;
use cruise_control::io::{DisplaySink, LED_GREEN_CRUISING};

/// Prints display writes, but only when something changed
#[derive(Default)]
struct ConsoleDisplay {
    red: u32,
    green: u32,
    velocity: i16,
    target: i16,
}

impl DisplaySink for ConsoleDisplay {
    fn leds_red(&mut self, bits: u32) {
        if bits != self.red {
            log::info!("red leds   {bits:#07x}");
            self.red = bits;
        }
    }

    fn leds_green(&mut self, bits: u32) {
        if bits != self.green {
            let cruising = if bits & LED_GREEN_CRUISING != 0 { " [cruising]" } else { "" };
            log::info!("green leds {bits:#04x}{cruising}");
            self.green = bits;
        }
    }

    fn show_velocity(&mut self, velocity: i16) {
        if velocity != self.velocity {
            log::info!("velocity   {velocity}");
            self.velocity = velocity;
        }
    }

    fn show_target_velocity(&mut self, target: i16) {
        if target != self.target {
            log::info!("target     {target}");
            self.target = target;
        }
    }
}

#[derive(Default)]
struct ConsoleDiag {
    last: Option<Diag>,
}

impl DiagSink for ConsoleDiag {
    fn report(&mut self, diag: Diag) {
        if self.last != Some(diag) {
            match diag {
                Diag::Ok => log::info!("watchdog: ok"),
                Diag::Overloaded { headroom_pct } => {
                    log::warn!("watchdog: OVERLOADED, headroom {headroom_pct}%")
                }
                Diag::MissedUpdate { channel } => log::warn!("stale input on '{channel}'"),
            }
            self.last = Some(diag);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let pins = Rc::new(RefCell::new(ScriptedInput::new()));
    let display = Rc::new(RefCell::new(ConsoleDisplay::default()));
    let diag = Rc::new(RefCell::new(ConsoleDiag::default()));
    let mut kernel = app::build(pins.clone(), display, diag)?;

    log::info!("-- engine on, full gas --");
    {
        let mut pins = pins.borrow_mut();
        pins.set_engine(true);
        pins.set_top_gear(true);
        pins.set_gas(true);
    }
    kernel.run_for(7_000)?;

    log::info!("-- engaging cruise control --");
    {
        let mut pins = pins.borrow_mut();
        pins.set_gas(false);
        pins.set_cruise(true);
    }
    kernel.run_for(5_000)?;

    log::info!("-- load dial to 60% --");
    pins.borrow_mut().set_load_percent(60);
    kernel.run_for(3_000)?;

    log::info!("-- load dial to 100%, expect overload --");
    pins.borrow_mut().set_load_percent(100);
    kernel.run_for(3_000)?;

    log::info!("-- load off, brake to a stop --");
    {
        let mut pins = pins.borrow_mut();
        pins.set_load_percent(0);
        pins.set_cruise(false);
        pins.set_brake(true);
    }
    kernel.run_for(5_000)?;

    log::info!("done at t={} ms", kernel.time());
    Ok(())
}
