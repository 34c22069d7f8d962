//! # Supervisor configuration.
//!
//! [`Config`] fixes the policy knobs of a [`Kennel`](crate::Kennel) at
//! build time: default timeout, close behavior, wire dialect, corrective
//! action, and registry capacity.
//!
//! ## Rules
//!
//! - Timeouts live in `[TIMEOUT_MIN_SECS, TIMEOUT_MAX_SECS]` seconds.
//! - A zero `default_timeout_secs` is replaced with
//!   [`TIMEOUT_DEFAULT_SECS`] when the kennel is built, and the fallback
//!   is reported on the event bus.
//! - `close_policy` decides what a channel close does to a still-armed
//!   dog: nothing ([`ClosePolicy::Never`]), destroy only after magic-close
//!   confirmation ([`ClosePolicy::RequireMagic`]), or always destroy
//!   ([`ClosePolicy::Always`]).

use crate::error::WdtError;

/// Smallest accepted timeout, in seconds.
pub const TIMEOUT_MIN_SECS: u16 = 1;

/// Largest accepted timeout, in seconds.
pub const TIMEOUT_MAX_SECS: u16 = 65_535;

/// Timeout used when a dog is created without an explicit value.
pub const TIMEOUT_DEFAULT_SECS: u16 = 5;

/// Default registry capacity (concurrent dogs).
pub const DEFAULT_MAX_DOGS: usize = 65_536;

/// Default event bus queue size.
pub const DEFAULT_BUS_CAPACITY: usize = 1024;

/// What closing a session does to a dog that is still armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosePolicy {
    /// Close never disarms. The dog keeps running as an orphan and its
    /// expiry still triggers corrective action ("nowayout").
    Never,
    /// Close disarms only after the session has seen the magic-close
    /// confirmation; otherwise the dog is orphaned.
    RequireMagic,
    /// Close always disarms and destroys the dog.
    Always,
}

/// Wire dialect spoken by [`Session::write`](crate::Session::write).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireProtocol {
    /// Any payload feeds the dog; bytes are scanned for the magic-close
    /// sentinel character.
    Sentinel,
    /// Any payload feeds the dog; payloads are additionally parsed as
    /// `<field>value</field>` directives (name, timeout, close flag,
    /// restart override, stop).
    Tagged,
}

/// Watchdog supervisor configuration.
///
/// All fields are public; [`Config::default`] gives the stock policy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Timeout assigned to dogs created without an explicit value.
    ///
    /// `0` is not a valid timeout and falls back to
    /// [`TIMEOUT_DEFAULT_SECS`] at build time. Default: `5`.
    pub default_timeout_secs: u16,

    /// Close behavior for sessions. Default: [`ClosePolicy::RequireMagic`].
    pub close_policy: ClosePolicy,

    /// Wire dialect for session payloads. Default: [`WireProtocol::Sentinel`].
    pub wire_protocol: WireProtocol,

    /// Suppress the system restart on expiry, for every dog.
    ///
    /// Individual dogs may override this through the tagged wire
    /// protocol. Default: `false`.
    pub no_reboot: bool,

    /// Send the abort signal to the owning process when its dog expires,
    /// so the owner leaves a core dump behind. Orphaned dogs never
    /// receive it. Default: `true`.
    pub abort_owner_on_expire: bool,

    /// Maximum number of concurrently registered dogs.
    ///
    /// Values below `1` are treated as `1`. Default: `65 536`.
    pub max_dogs: usize,

    /// Event bus queue size. Values below `1` are treated as `1`.
    /// Default: `1024`.
    pub bus_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timeout_secs: TIMEOUT_DEFAULT_SECS,
            close_policy: ClosePolicy::RequireMagic,
            wire_protocol: WireProtocol::Sentinel,
            no_reboot: false,
            abort_owner_on_expire: true,
            max_dogs: DEFAULT_MAX_DOGS,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

impl Config {
    /// True when the close policy forbids disarming on close.
    ///
    /// ```rust
    /// use softwdt::{ClosePolicy, Config};
    ///
    /// let mut cfg = Config::default();
    /// assert!(!cfg.nowayout());
    /// cfg.close_policy = ClosePolicy::Never;
    /// assert!(cfg.nowayout());
    /// ```
    pub fn nowayout(&self) -> bool {
        matches!(self.close_policy, ClosePolicy::Never)
    }

    /// Registry capacity with the lower bound applied.
    pub fn max_dogs_effective(&self) -> usize {
        self.max_dogs.max(1)
    }

    /// Bus queue size with the lower bound applied.
    pub fn bus_capacity_effective(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

/// Checks a caller-supplied timeout against the accepted range.
///
/// The argument is signed because control channels hand over raw integers;
/// negative values must be rejected, not wrapped.
pub fn validate_timeout(seconds: i64) -> Result<u16, WdtError> {
    if seconds < i64::from(TIMEOUT_MIN_SECS) || seconds > i64::from(TIMEOUT_MAX_SECS) {
        return Err(WdtError::InvalidArgument { seconds });
    }
    // Range check above guarantees the cast is lossless.
    Ok(seconds as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.default_timeout_secs, 5);
        assert_eq!(cfg.close_policy, ClosePolicy::RequireMagic);
        assert_eq!(cfg.wire_protocol, WireProtocol::Sentinel);
        assert!(!cfg.no_reboot);
        assert!(cfg.abort_owner_on_expire);
        assert_eq!(cfg.max_dogs, DEFAULT_MAX_DOGS);
        assert_eq!(cfg.bus_capacity, DEFAULT_BUS_CAPACITY);
    }

    #[test]
    fn test_validate_timeout_accepts_full_range() {
        assert_eq!(validate_timeout(1).unwrap(), 1);
        assert_eq!(validate_timeout(30).unwrap(), 30);
        assert_eq!(validate_timeout(65_535).unwrap(), 65_535);
    }

    #[test]
    fn test_validate_timeout_rejects_out_of_range() {
        for bad in [0_i64, -1, 65_536, 65_537, i64::MIN, i64::MAX] {
            let err = validate_timeout(bad).expect_err("value must be rejected");
            match err {
                WdtError::InvalidArgument { seconds } => assert_eq!(seconds, bad),
                other => panic!("expected InvalidArgument, got {other}"),
            }
        }
    }

    #[test]
    fn test_effective_accessors_clamp_zero() {
        let cfg = Config {
            max_dogs: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.max_dogs_effective(), 1);
        assert_eq!(cfg.bus_capacity_effective(), 1);
    }

    #[test]
    fn test_nowayout_tracks_close_policy() {
        for (policy, expected) in [
            (ClosePolicy::Never, true),
            (ClosePolicy::RequireMagic, false),
            (ClosePolicy::Always, false),
        ] {
            let cfg = Config {
                close_policy: policy,
                ..Config::default()
            };
            assert_eq!(cfg.nowayout(), expected, "policy {policy:?}");
        }
    }
}
