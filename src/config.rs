//! Compile-time tuning constants and configuration structs.
//!
//! The constants in this module are part of the deployed behaviour contract:
//! travel distance, speeds, hold time and capacity are fixed at build time.
//! The config structs carry them as defaults and use `heapless::String` for
//! `no_std` compatibility.
//!
//! # Example
//!
//! ```rust
//! use barn_gate::config::{Config, DoorConfig, WebConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.door.hold_ms, barn_gate::config::HOLD_OPEN_MS);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_door(DoorConfig::default().with_hold_ms(5000))
//!     .with_web(WebConfig::default().with_port(3000));
//! ```

use heapless::String as HString;

// ============================================================================
// Door constants
// ============================================================================

/// Stepper position of the fully closed door (reference zero).
pub const CLOSED_POSITION: i32 = 0;

/// Stepper position of the fully open door.
pub const OPEN_POSITION: i32 = 2000;

/// Maximum door speed in steps per second.
pub const MAX_SPEED_STEPS_PER_SEC: f32 = 1000.0;

/// Door acceleration in steps per second squared.
pub const ACCELERATION_STEPS_PER_SEC2: f32 = 500.0;

/// Time the door stays open after an automatic open.
pub const HOLD_OPEN_MS: u64 = 3000;

/// A move that has not completed after this long faults the door.
pub const MOVE_TIMEOUT_MS: u64 = 15_000;

// ============================================================================
// Occupancy / registry constants
// ============================================================================

/// Maximum number of animals tracked inside at once.
pub const OCCUPANCY_CAPACITY: usize = 10;

/// Maximum length of a display name in bytes.
pub const MAX_NAME_LEN: usize = 24;

// ============================================================================
// Scheduling constants
// ============================================================================

/// Sleep between motor loop ticks in microseconds.
pub const MOTOR_TICK_US: u64 = 250;

/// Tick gaps longer than this are counted as overruns.
pub const MAX_TICK_GAP_US: u64 = 5000;

/// Maximum length for short config strings (SSIDs, passwords)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Longest SSID in bytes.
pub const MAX_SSID_LEN: usize = 32;

/// Type alias for display names
pub type NameString = HString<MAX_NAME_LEN>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Copy `s` into a fixed-capacity string, truncating on a char boundary.
pub fn truncated<const N: usize>(s: &str) -> HString<N> {
    let mut hs = HString::new();
    let take = s.len().min(N);
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= take)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    truncated(s)
}

/// Create a NameString from a &str, truncating if too long
pub fn name_string(s: &str) -> NameString {
    truncated(s)
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// WiFi access point configuration
    pub wifi: WifiConfig,
    /// Web server configuration
    pub web: WebConfig,
    /// Door motor configuration
    pub door: DoorConfig,
    /// Task cadence configuration
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set door configuration
    pub fn with_door(mut self, door: DoorConfig) -> Self {
        self.door = door;
        self
    }

    /// Set scheduler configuration
    pub fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }
}

// ============================================================================
// Door Config
// ============================================================================

/// Door motor configuration
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DoorConfig {
    /// Closed position in steps
    pub closed_position: i32,
    /// Open position in steps
    pub open_position: i32,
    /// Maximum speed in steps per second
    pub max_speed: f32,
    /// Acceleration in steps per second squared
    pub acceleration: f32,
    /// Automatic hold-open duration in milliseconds
    pub hold_ms: u64,
    /// Move timeout in milliseconds
    pub move_timeout_ms: u64,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            closed_position: CLOSED_POSITION,
            open_position: OPEN_POSITION,
            max_speed: MAX_SPEED_STEPS_PER_SEC,
            acceleration: ACCELERATION_STEPS_PER_SEC2,
            hold_ms: HOLD_OPEN_MS,
            move_timeout_ms: MOVE_TIMEOUT_MS,
        }
    }
}

impl DoorConfig {
    /// Set the open position (travel distance from closed)
    pub fn with_open_position(mut self, steps: i32) -> Self {
        self.open_position = steps;
        self
    }

    /// Set max speed and acceleration
    pub fn with_motion(mut self, max_speed: f32, acceleration: f32) -> Self {
        self.max_speed = max_speed;
        self.acceleration = acceleration;
        self
    }

    /// Set the hold-open duration
    pub fn with_hold_ms(mut self, ms: u64) -> Self {
        self.hold_ms = ms;
        self
    }

    /// Set the move timeout
    pub fn with_move_timeout_ms(mut self, ms: u64) -> Self {
        self.move_timeout_ms = ms;
        self
    }
}

// ============================================================================
// Scheduler Config
// ============================================================================

/// Motor loop cadence
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchedulerConfig {
    /// Sleep between motor loop ticks in microseconds
    pub motor_tick_us: u64,
    /// Gap between ticks that counts as an overrun, in microseconds
    pub max_tick_gap_us: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            motor_tick_us: MOTOR_TICK_US,
            max_tick_gap_us: MAX_TICK_GAP_US,
        }
    }
}

impl SchedulerConfig {
    /// Set the motor tick sleep
    pub fn with_motor_tick_us(mut self, us: u64) -> Self {
        self.motor_tick_us = us;
        self
    }

    /// Set the overrun threshold
    pub fn with_max_tick_gap_us(mut self, us: u64) -> Self {
        self.max_tick_gap_us = us;
        self
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
    /// Whether web server is enabled
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Enable or disable web server
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi access point configuration.
///
/// The gate runs its own access point; phones in the barn connect to it
/// directly.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WifiConfig {
    /// Access point SSID
    pub ssid: ShortString,
    /// WPA2 password (empty = open network)
    pub password: ShortString,
    /// Radio channel (1-13)
    pub channel: u8,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: short_string("barn-gate"),
            password: ShortString::new(),
            channel: 1,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the radio channel, clamped to 1-13
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel.clamp(1, 13);
        self
    }

    /// Check if the access point is secured with a password
    pub fn is_secured(&self) -> bool {
        !self.password.is_empty()
    }

    /// SSID cut to the 32 bytes 802.11 allows.
    pub fn ap_ssid(&self) -> HString<MAX_SSID_LEN> {
        truncated(self.ssid.as_str())
    }

    /// Password in the driver's 64-byte buffer.
    pub fn ap_password(&self) -> HString<MAX_SHORT_STRING> {
        truncated(self.password.as_str())
    }
}
