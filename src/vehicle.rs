//! Vehicle dynamics
//!
//! The plant model: a point mass on a closed 2400.0-unit track divided
//! into six zones with different slopes. All arithmetic is integer
//! fixed-point in tenths. The velocity update keeps sub-tenth remainders
//! by scaling through a factor of 1000 before dividing back down, so a
//! small steady drag still bleeds speed off every period instead of
//! vanishing in truncation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{
    CFG_BRAKE_RETARDATION, CFG_LOOP_LENGTH, CFG_VEHICLE_PERIOD_MS, CFG_ZONE_LENGTH,
    CFG_ZONE_RETARDATION,
};
use crate::io::DisplaySink;
use crate::kernel::task::{Step, Task, TaskCtx};
use crate::kernel::types::{MboxId, Millis};
use crate::types::{Msg, Pedal, Position, ThrottleCmd, Velocity};

/// Track zone for a wrapped position, `0..6`
pub fn zone(position: Position) -> usize {
    ((position % CFG_LOOP_LENGTH) / CFG_ZONE_LENGTH) as usize
}

/// Natural retardation in tenths/s^2: quadratic air drag opposing the
/// direction of travel, constant rolling resistance, plus the slope of
/// the current zone.
fn retardation(velocity: Velocity, zone: usize) -> i32 {
    let v = velocity as i32;
    v.signum() * (v * v) / 10_000 + 1 + CFG_ZONE_RETARDATION[zone]
}

/// Plant state advanced once per vehicle period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleState {
    pub position: Position,
    pub velocity: Velocity,
    /// Last received actuation; reused when the mailbox is empty
    pub cmd: ThrottleCmd,
}

impl VehicleState {
    pub fn at_rest() -> Self {
        VehicleState {
            position: 0,
            velocity: 0,
            cmd: ThrottleCmd { throttle: 0, brake: Pedal::Released },
        }
    }

    /// Advance position and velocity by `dt_ms`.
    ///
    /// Position integrates the old velocity and acceleration and wraps
    /// Euclidean in both directions. A pressed brake overrides the
    /// throttle: velocity moves toward zero at the fixed braking rate
    /// and is clamped so braking never reverses the direction of travel.
    pub fn step(&mut self, dt_ms: Millis) {
        let dt = dt_ms as i32;
        let v = self.velocity as i32;
        let accel = (self.cmd.throttle as i32) / 2 - retardation(self.velocity, zone(self.position));

        let pos = self.position as i32 + v * dt / 1000 + accel * dt * dt / 2_000_000;
        self.position = pos.rem_euclid(CFG_LOOP_LENGTH as i32) as Position;

        self.velocity = if self.cmd.brake.is_pressed() {
            let dv = CFG_BRAKE_RETARDATION * dt / 1000;
            if v > 0 {
                (v - dv).max(0) as Velocity
            } else {
                (v + dv).min(0) as Velocity
            }
        } else {
            ((v * 1000 + accel * dt) / 1000) as Velocity
        };
    }
}

/// Periodic plant task: consume the actuation command, advance the
/// model, publish velocity and position, show the speed.
pub struct VehicleTask<D: DisplaySink> {
    state: VehicleState,
    mb_throttle: MboxId,
    mb_velocity: MboxId,
    mb_position: MboxId,
    display: Rc<RefCell<D>>,
}

impl<D: DisplaySink> VehicleTask<D> {
    pub fn new(
        mb_throttle: MboxId,
        mb_velocity: MboxId,
        mb_position: MboxId,
        display: Rc<RefCell<D>>,
    ) -> Self {
        VehicleTask { state: VehicleState::at_rest(), mb_throttle, mb_velocity, mb_position, display }
    }
}

impl<D: DisplaySink> Task<Msg> for VehicleTask<D> {
    fn name(&self) -> &'static str {
        "vehicle"
    }

    fn run(&mut self, ctx: &mut TaskCtx<'_, Msg>) -> Step {
        // an empty slot here is the expected phase relation with the
        // regulator, not an overrun: keep actuating with the last command
        if let Some(cmd) = ctx.try_take(self.mb_throttle).and_then(Msg::as_throttle) {
            self.state.cmd = cmd;
        }
        self.state.step(CFG_VEHICLE_PERIOD_MS);
        crate::trace!(
            "vehicle: pos {} vel {} throttle {}",
            self.state.position,
            self.state.velocity,
            self.state.cmd.throttle
        );
        ctx.post(self.mb_velocity, Msg::Velocity(self.state.velocity));
        ctx.post(self.mb_position, Msg::Position(self.state.position));
        self.display.borrow_mut().show_velocity(self.state.velocity / 10);
        Step::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CFG_MAX_THROTTLE;

    fn state(position: Position, velocity: Velocity, throttle: u8, brake: Pedal) -> VehicleState {
        VehicleState { position, velocity, cmd: ThrottleCmd { throttle, brake } }
    }

    #[test]
    fn zone_is_total_over_the_track() {
        for pos in 0..CFG_LOOP_LENGTH {
            assert!(zone(pos) < 6);
        }
    }

    #[test]
    fn zone_boundaries() {
        assert_eq!(zone(0), 0);
        assert_eq!(zone(3_999), 0);
        assert_eq!(zone(4_000), 1);
        assert_eq!(zone(8_000), 2);
        assert_eq!(zone(12_000), 3);
        assert_eq!(zone(16_000), 4);
        assert_eq!(zone(20_000), 5);
        assert_eq!(zone(23_999), 5);
    }

    #[test]
    fn rest_on_flat_ground_is_a_fixed_point() {
        let mut s = state(100, 0, 0, Pedal::Released);
        for _ in 0..10 {
            s.step(300);
            assert_eq!(s.position, 100);
            assert_eq!(s.velocity, 0);
        }
    }

    #[test]
    fn position_wraps_in_both_directions() {
        let mut s = state(23_990, 250, 0, Pedal::Released);
        s.step(300);
        assert!(s.position < CFG_LOOP_LENGTH);
        assert!(s.position < 23_990);

        let mut s = state(5, -250, 0, Pedal::Released);
        s.step(300);
        assert!(s.position < CFG_LOOP_LENGTH);
        assert!(s.position > 20_000);
    }

    #[test]
    fn full_throttle_accelerates_from_rest() {
        let mut s = state(0, 0, CFG_MAX_THROTTLE, Pedal::Released);
        let mut last = 0;
        for _ in 0..5 {
            s.step(300);
            assert!(s.velocity > last);
            last = s.velocity;
        }
    }

    #[test]
    fn released_gas_bleeds_speed_every_period() {
        // at low speed the drag rounds to under one tenth per period;
        // the scaled update must still make each period strictly slower
        let mut s = state(0, 30, 0, Pedal::Released);
        let mut last = s.velocity;
        while last > 0 {
            s.step(300);
            assert!(s.velocity < last, "stuck at {}", s.velocity);
            last = s.velocity;
        }
        assert_eq!(s.velocity, 0);
    }

    #[test]
    fn brake_overrides_throttle_and_clamps_at_zero() {
        let mut s = state(0, 100, CFG_MAX_THROTTLE, Pedal::Pressed);
        s.step(300);
        assert_eq!(s.velocity, 40);
        s.step(300);
        assert_eq!(s.velocity, 0);
        s.step(300);
        assert_eq!(s.velocity, 0, "braking must not reverse the vehicle");
    }

    #[test]
    fn brake_clamps_reverse_travel_at_zero() {
        let mut s = state(0, -50, 0, Pedal::Pressed);
        s.step(300);
        assert_eq!(s.velocity, 0);
    }

    #[test]
    fn downhill_zone_pulls_a_coasting_vehicle_forward() {
        let mut s = state(16_000, 0, 0, Pedal::Released);
        for _ in 0..10 {
            s.step(300);
        }
        assert!(s.velocity > 0);
    }
}
