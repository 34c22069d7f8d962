//! # Corrective-action platform seam.
//!
//! When a dog expires the kennel punishes the failure through a [`Platform`]:
//! first the abort signal to the owning process (so it leaves a core dump),
//! then the system restart. Keeping both behind a trait lets tests observe
//! corrective action without signalling or rebooting anything, and lets
//! embedders substitute their own notion of "restart" (container exit,
//! orchestrator hook, relay toggle).
//!
//! ## Rules
//! - [`Platform::restart_system`] does not return on success; the `Ok` arm
//!   is uninhabited and only errors come back.
//! - The default platform is [`InertPlatform`]: it performs nothing, so a
//!   kennel built without an explicit platform can never reboot the host.
//! - The real thing is [`SystemPlatform`] (feature `system`): SIGABRT via
//!   `nix::sys::signal::kill`, restart via `nix::sys::reboot`.

use std::convert::Infallible;
use std::fmt;
use std::io;

/// Identifies the process that owns a dog.
///
/// On the platforms this crate targets that is a PID; the value is kept
/// opaque so fakes can use arbitrary numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerRef(i32);

impl OwnerRef {
    /// Wraps a raw process id.
    pub fn new(pid: i32) -> Self {
        Self(pid)
    }

    /// The calling process.
    pub fn current() -> Self {
        Self(std::process::id() as i32)
    }

    /// Raw process id.
    pub fn pid(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid {}", self.0)
    }
}

/// Host-facing side effects of an expiry.
pub trait Platform: Send + Sync + 'static {
    /// Delivers the abort signal to the owner of an expired dog.
    fn abort_owner(&self, owner: OwnerRef) -> io::Result<()>;

    /// Restarts the system. Does not return on success.
    fn restart_system(&self) -> io::Result<Infallible>;
}

/// Platform that performs nothing.
///
/// `abort_owner` succeeds silently; `restart_system` reports
/// [`io::ErrorKind::Unsupported`] so the suppressed restart still shows up
/// on the event bus as `RestartFailed`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InertPlatform;

impl Platform for InertPlatform {
    fn abort_owner(&self, _owner: OwnerRef) -> io::Result<()> {
        Ok(())
    }

    fn restart_system(&self) -> io::Result<Infallible> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "inert platform does not restart",
        ))
    }
}

/// Platform backed by real syscalls (feature `system`).
#[cfg(feature = "system")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPlatform;

#[cfg(feature = "system")]
impl Platform for SystemPlatform {
    fn abort_owner(&self, owner: OwnerRef) -> io::Result<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        kill(Pid::from_raw(owner.pid()), Signal::SIGABRT).map_err(io::Error::from)
    }

    fn restart_system(&self) -> io::Result<Infallible> {
        use nix::sys::reboot::{RebootMode, reboot};

        reboot(RebootMode::RB_AUTOBOOT).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_ref_round_trip() {
        let owner = OwnerRef::new(4242);
        assert_eq!(owner.pid(), 4242);
        assert_eq!(owner.to_string(), "pid 4242");
    }

    #[test]
    fn test_inert_platform_never_restarts() {
        let platform = InertPlatform;
        assert!(platform.abort_owner(OwnerRef::new(1)).is_ok());
        let err = platform.restart_system().expect_err("inert restart must fail");
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
