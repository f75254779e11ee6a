//! Shared application data model
//!
//! All vehicle quantities are integer fixed-point in tenths: velocity in
//! tenths of a unit per second (250 means 25.0), position in tenths of a
//! distance unit along the 2400.0-unit circular track, throttle in tenths
//! of a volt. All message payloads are small `Copy` values; a mailbox
//! overwrite never needs a destructor.

/// Vehicle speed in tenths, signed (a vehicle can roll backwards)
pub type Velocity = i16;

/// Position along the circular track in tenths, always in `0..24000`
pub type Position = u32;

/// Throttle actuation in tenths of a volt, `0..=80`
pub type Throttle = u8;

/// Sampled state of a momentary pedal or button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pedal {
    Released,
    Pressed,
}

impl Pedal {
    pub fn is_pressed(self) -> bool {
        self == Pedal::Pressed
    }
}

/// Sampled state of a two-position switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnOff {
    Off,
    On,
}

impl OnOff {
    pub fn is_on(self) -> bool {
        self == OnOff::On
    }
}

/// Cruise control regulator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CruiseState {
    /// Toggle off, or a disengage condition fired
    Disabled,
    /// Toggle on but the engagement conditions do not hold yet
    RequestedOn,
    /// Holding the target velocity captured at engagement
    Engaged { target: Velocity },
}

/// Actuation command from the regulator to the plant: the throttle
/// setting together with the brake state sampled the same period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleCmd {
    pub throttle: Throttle,
    pub brake: Pedal,
}

/// Payload carried by the application mailboxes, one variant per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    /// Actuation command for the vehicle plant
    Throttle(ThrottleCmd),
    /// Measured vehicle speed (tenths)
    Velocity(Velocity),
    /// Vehicle position along the track (tenths)
    Position(Position),
    /// Gas pedal sample
    Gas(Pedal),
    /// Brake pedal sample
    Brake(Pedal),
    /// Cruise toggle sample
    CruiseSwitch(OnOff),
    /// Top gear switch sample
    Gear(OnOff),
    /// Engine switch sample
    Engine(OnOff),
    /// Liveness proof from the detection task
    Heartbeat,
    /// Raw load-dial bits for the red-LED bar graph
    LoadBar(u32),
    /// Quantized synthetic load, `0..=100`
    LoadPercent(u8),
}

impl Msg {
    pub fn as_throttle(self) -> Option<ThrottleCmd> {
        match self {
            Msg::Throttle(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_velocity(self) -> Option<Velocity> {
        match self {
            Msg::Velocity(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_position(self) -> Option<Position> {
        match self {
            Msg::Position(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_pedal(self) -> Option<Pedal> {
        match self {
            Msg::Gas(p) | Msg::Brake(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_switch(self) -> Option<OnOff> {
        match self {
            Msg::CruiseSwitch(s) | Msg::Gear(s) | Msg::Engine(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_load_bar(self) -> Option<u32> {
        match self {
            Msg::LoadBar(bits) => Some(bits),
            _ => None,
        }
    }

    pub fn as_load_percent(self) -> Option<u8> {
        match self {
            Msg::LoadPercent(p) => Some(p),
            _ => None,
        }
    }
}
