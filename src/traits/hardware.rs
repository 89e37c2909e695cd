//! Hardware abstraction traits for the door stepper and the RFID readers.
//!
//! This module defines the hardware interfaces that allow barn-gate to run
//! on the ESP32 board as well as on a desktop with mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`StepperDriver`] | Ramped stepper actuator moving toward a target position |
//! | [`StepOutput`] | Single STEP pulse on a STEP/DIR driver chip |
//! | [`TagReader`] | RFID reader returning the tag currently in the field |
//! | [`Clock`] | Time source for `no_std` environments |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use barn_gate::traits::StepperDriver;
//! use barn_gate::hal::MockStepper;
//!
//! let mut stepper = MockStepper::new().with_steps_per_run(100);
//! stepper.move_to(250).unwrap();
//!
//! while stepper.run().unwrap() {}
//! assert_eq!(stepper.current_position(), 250);
//! ```

use core::fmt;

/// Direction of a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepDirection {
    /// Toward positive positions (opening).
    Forward,
    /// Toward negative positions (closing).
    Backward,
}

impl StepDirection {
    /// Position delta produced by one step in this direction.
    #[inline]
    pub const fn delta(self) -> i32 {
        match self {
            StepDirection::Forward => 1,
            StepDirection::Backward => -1,
        }
    }

    /// Direction that reduces the given distance-to-go, if any.
    #[inline]
    pub const fn toward(distance: i32) -> Option<Self> {
        if distance > 0 {
            Some(StepDirection::Forward)
        } else if distance < 0 {
            Some(StepDirection::Backward)
        } else {
            None
        }
    }
}

/// Stepper actuator with its own ramped speed profile.
///
/// The door controller only sets targets and calls [`run`](Self::run) every
/// tick; how many steps a single call emits is up to the driver's
/// acceleration profile, bounded by the configured max speed and
/// acceleration.
///
/// # Implementation Notes
///
/// - `run()` must never block; it emits at most the steps due right now
/// - `run()` returns `false` once the motion is complete and the motor is
///   at rest
/// - A driver that lost steps may report a `current_position()` that differs
///   from the target once `run()` returns `false`
pub trait StepperDriver {
    /// Error type for driver operations.
    type Error;

    /// Set the maximum speed in steps per second.
    fn set_max_speed(&mut self, steps_per_sec: f32) -> Result<(), Self::Error>;

    /// Set the acceleration (and deceleration) in steps per second squared.
    fn set_acceleration(&mut self, steps_per_sec2: f32) -> Result<(), Self::Error>;

    /// Set the absolute target position in steps.
    fn move_to(&mut self, target: i32) -> Result<(), Self::Error>;

    /// Advance the motion by whatever the ramp allows right now.
    ///
    /// Returns `true` while the motor is still moving.
    fn run(&mut self) -> Result<bool, Self::Error>;

    /// Decelerate to a stop as quickly as the acceleration allows.
    fn stop(&mut self) -> Result<(), Self::Error>;

    /// Current absolute position in steps.
    fn current_position(&self) -> i32;

    /// Commanded absolute target in steps.
    fn target_position(&self) -> i32;

    /// Steps remaining to the target (signed).
    fn distance_to_go(&self) -> i32 {
        self.target_position() - self.current_position()
    }
}

/// One STEP pulse on a STEP/DIR stepper driver chip (A4988, DRV8825, TMC2208).
///
/// Used by [`RampedStepper`](crate::stepper::RampedStepper) to turn a
/// software ramp into pulses.
pub trait StepOutput {
    /// Error type for pin operations.
    type Error;

    /// Set DIR for `direction` and emit a single STEP pulse.
    fn step(&mut self, direction: StepDirection) -> Result<(), Self::Error>;

    /// Enable or disable the driver outputs (coil current).
    fn set_enabled(&mut self, enabled: bool) -> Result<(), Self::Error>;
}

/// Four-byte RFID tag identifier (MIFARE single-size UID).
///
/// Displays as upper-case hex bytes separated by spaces.
///
/// # Examples
///
/// ```
/// use barn_gate::traits::TagId;
///
/// let id = TagId::new([0xDE, 0xAD, 0xBE, 0xEF]);
/// assert_eq!(id.to_string(), "DE AD BE EF");
/// assert_eq!(TagId::from_hex("de:ad:be:ef"), Some(id));
/// assert_eq!(TagId::from_hex("DEADBEEF"), Some(id));
/// assert_eq!(TagId::from_hex("DE AD BE"), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TagId(pub [u8; 4]);

impl TagId {
    /// Creates an identifier from raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Raw identifier bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Parse an identifier from hex text.
    ///
    /// Accepts eight hex digits with optional `:`, `-` or whitespace
    /// separators. Input is case-insensitive.
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut bytes = [0u8; 4];
        let mut nibbles = 0usize;
        for c in s.chars() {
            if c == ':' || c == '-' || c.is_whitespace() {
                continue;
            }
            let value = c.to_digit(16)? as u8;
            if nibbles >= 8 {
                return None;
            }
            let byte = &mut bytes[nibbles / 2];
            *byte = (*byte << 4) | value;
            nibbles += 1;
        }
        (nibbles == 8).then_some(Self(bytes))
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{:02X} {:02X} {:02X} {:02X}", a, b, c, d)
    }
}

impl From<[u8; 4]> for TagId {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

/// RFID reader trait.
///
/// Abstracts an MFRC522-style reader on one side of the gate.
///
/// # Implementation Notes
///
/// - `read_tag()` must not block waiting for a card; return `Ok(None)` when
///   nothing is in the field
/// - `acknowledge()` completes the driver handshake (HALT for MIFARE) so a
///   card that stays in the field is not read again as a fresh card
pub trait TagReader {
    /// Error type for reader operations.
    type Error;

    /// Returns the identifier of the tag currently in the field, if any.
    fn read_tag(&mut self) -> Result<Option<TagId>, Self::Error>;

    /// Acknowledge the last read card.
    fn acknowledge(&mut self) -> Result<(), Self::Error>;
}

/// Time source trait for `no_std` compatibility.
///
/// Provides monotonic time for move timing and step scheduling.
/// On desktop, this wraps `std::time::Instant`. On embedded,
/// use a hardware timer.
///
/// # Example
///
/// ```rust
/// use barn_gate::traits::Clock;
/// use barn_gate::hal::MockClock;
///
/// let clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// assert_eq!(clock.now_us(), 100_000);
/// ```
pub trait Clock {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;

    /// Returns current time in microseconds since the same epoch.
    ///
    /// Step scheduling needs sub-millisecond resolution; the default only
    /// has millisecond granularity.
    fn now_us(&self) -> u64 {
        self.now_ms() * 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    // =========================================================================
    // StepDirection Tests
    // =========================================================================

    #[test]
    fn step_direction_delta() {
        assert_eq!(StepDirection::Forward.delta(), 1);
        assert_eq!(StepDirection::Backward.delta(), -1);
    }

    #[test]
    fn step_direction_toward() {
        assert_eq!(StepDirection::toward(10), Some(StepDirection::Forward));
        assert_eq!(StepDirection::toward(-3), Some(StepDirection::Backward));
        assert_eq!(StepDirection::toward(0), None);
    }

    // =========================================================================
    // TagId Tests
    // =========================================================================

    #[test]
    fn tag_id_display() {
        let id = TagId::new([0x03, 0xA1, 0x00, 0xFF]);
        assert_eq!(id.to_string(), "03 A1 00 FF");
    }

    #[test]
    fn tag_id_from_hex_separators() {
        let expected = Some(TagId::new([0x12, 0x34, 0xAB, 0xCD]));
        assert_eq!(TagId::from_hex("12 34 AB CD"), expected);
        assert_eq!(TagId::from_hex("12:34:ab:cd"), expected);
        assert_eq!(TagId::from_hex("12-34-AB-CD"), expected);
        assert_eq!(TagId::from_hex("  1234abcd\n"), expected);
    }

    #[test]
    fn tag_id_from_hex_invalid() {
        assert_eq!(TagId::from_hex(""), None);
        assert_eq!(TagId::from_hex("12 34 AB"), None);
        assert_eq!(TagId::from_hex("12 34 AB CD EF"), None);
        assert_eq!(TagId::from_hex("12 34 AB CG"), None);
    }

    #[test]
    fn tag_id_display_round_trips_through_from_hex() {
        let id = TagId::new([0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(TagId::from_hex(&id.to_string()), Some(id));
    }

    // =========================================================================
    // StepperDriver Default Methods Tests
    // =========================================================================

    struct FixedStepper {
        position: i32,
        target: i32,
    }

    impl StepperDriver for FixedStepper {
        type Error = ();

        fn set_max_speed(&mut self, _steps_per_sec: f32) -> Result<(), ()> {
            Ok(())
        }

        fn set_acceleration(&mut self, _steps_per_sec2: f32) -> Result<(), ()> {
            Ok(())
        }

        fn move_to(&mut self, target: i32) -> Result<(), ()> {
            self.target = target;
            Ok(())
        }

        fn run(&mut self) -> Result<bool, ()> {
            Ok(false)
        }

        fn stop(&mut self) -> Result<(), ()> {
            self.target = self.position;
            Ok(())
        }

        fn current_position(&self) -> i32 {
            self.position
        }

        fn target_position(&self) -> i32 {
            self.target
        }
    }

    #[test]
    fn stepper_distance_to_go_default_impl() {
        let mut stepper = FixedStepper {
            position: 40,
            target: 0,
        };
        stepper.move_to(100).unwrap();
        assert_eq!(stepper.distance_to_go(), 60);

        stepper.move_to(-10).unwrap();
        assert_eq!(stepper.distance_to_go(), -50);
    }

    // =========================================================================
    // Clock Default Methods Tests
    // =========================================================================

    struct MillisClock(u64);

    impl Clock for MillisClock {
        fn now_ms(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn clock_now_us_default_impl() {
        let clock = MillisClock(42);
        assert_eq!(clock.now_us(), 42_000);
    }
}
