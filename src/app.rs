//! System wiring
//!
//! Creates every mailbox, registers the seven tasks exactly once at
//! their fixed priorities, hooks one periodic soft timer to each task's
//! release semaphore and starts the kernel. Any failure here is fatal
//! and propagates to the caller; there is no degraded mode.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{
    CFG_BUTTON_PERIOD_MS, CFG_CONTROL_PERIOD_MS, CFG_DETECTION_PERIOD_MS,
    CFG_EXTRA_LOAD_PERIOD_MS, CFG_PRIO_BUTTON_IO, CFG_PRIO_CONTROL, CFG_PRIO_DETECTION,
    CFG_PRIO_EXTRA_LOAD, CFG_PRIO_SWITCH_IO, CFG_PRIO_VEHICLE, CFG_PRIO_WATCHDOG,
    CFG_SWITCH_PERIOD_MS, CFG_TICK_RESOLUTION_MS, CFG_VEHICLE_PERIOD_MS, CFG_WATCHDOG_PERIOD_MS,
};
use crate::control::{ControlChannels, ControlTask};
use crate::diag::DiagSink;
use crate::io::{ButtonIo, DisplaySink, InputPins, SwitchIo};
use crate::kernel::error::KernelResult;
use crate::kernel::Kernel;
use crate::types::Msg;
use crate::vehicle::VehicleTask;
use crate::watchdog::{DetectionTask, ExtraLoadTask, WatchDogTask};

/// Build and start the complete system around the given boundary
/// collaborators. Returns the running kernel; drive it with `run_for`.
pub fn build<I, D, G>(
    pins: Rc<RefCell<I>>,
    display: Rc<RefCell<D>>,
    diag: Rc<RefCell<G>>,
) -> KernelResult<Kernel<Msg>>
where
    I: InputPins + 'static,
    D: DisplaySink + 'static,
    G: DiagSink + 'static,
{
    let mut kernel = Kernel::new(CFG_TICK_RESOLUTION_MS)?;

    let mb_throttle = kernel.create_mailbox("throttle");
    let mb_velocity = kernel.create_mailbox("velocity");
    let mb_position = kernel.create_mailbox("position");
    let mb_gas = kernel.create_mailbox("gas");
    let mb_brake = kernel.create_mailbox("brake");
    let mb_cruise = kernel.create_mailbox("cruise");
    let mb_gear = kernel.create_mailbox("gear");
    let mb_engine = kernel.create_mailbox("engine");
    let mb_heartbeat = kernel.create_mailbox("heartbeat");
    let mb_load_bar = kernel.create_mailbox("load-bar");
    let mb_load_pct = kernel.create_mailbox("load-pct");

    let button_io = kernel.register_task(
        CFG_PRIO_BUTTON_IO,
        Box::new(ButtonIo::new(pins.clone(), mb_gas, mb_brake, mb_cruise)),
    )?;
    let switch_io = kernel.register_task(
        CFG_PRIO_SWITCH_IO,
        Box::new(SwitchIo::new(pins.clone(), mb_engine, mb_gear)),
    )?;
    let watchdog = kernel.register_task(
        CFG_PRIO_WATCHDOG,
        Box::new(WatchDogTask::new(mb_heartbeat, mb_load_pct, diag.clone())),
    )?;
    let vehicle = kernel.register_task(
        CFG_PRIO_VEHICLE,
        Box::new(VehicleTask::new(mb_throttle, mb_velocity, mb_position, display.clone())),
    )?;
    let control = kernel.register_task(
        CFG_PRIO_CONTROL,
        Box::new(ControlTask::new(
            ControlChannels {
                velocity: mb_velocity,
                position: mb_position,
                gas: mb_gas,
                brake: mb_brake,
                cruise: mb_cruise,
                gear: mb_gear,
                engine: mb_engine,
                load_bar: mb_load_bar,
                throttle: mb_throttle,
            },
            display,
            diag,
        )),
    )?;
    let extra_load = kernel.register_task(
        CFG_PRIO_EXTRA_LOAD,
        Box::new(ExtraLoadTask::new(pins, mb_load_bar, mb_load_pct)),
    )?;
    let detection =
        kernel.register_task(CFG_PRIO_DETECTION, Box::new(DetectionTask::new(mb_heartbeat)))?;

    kernel.start_periodic_timer(CFG_BUTTON_PERIOD_MS, button_io)?;
    kernel.start_periodic_timer(CFG_SWITCH_PERIOD_MS, switch_io)?;
    kernel.start_periodic_timer(CFG_WATCHDOG_PERIOD_MS, watchdog)?;
    kernel.start_periodic_timer(CFG_VEHICLE_PERIOD_MS, vehicle)?;
    kernel.start_periodic_timer(CFG_CONTROL_PERIOD_MS, control)?;
    kernel.start_periodic_timer(CFG_EXTRA_LOAD_PERIOD_MS, extra_load)?;
    kernel.start_periodic_timer(CFG_DETECTION_PERIOD_MS, detection)?;

    kernel.start()?;
    Ok(kernel)
}
