//! # Dog: one supervised countdown.
//!
//! A [`Dog`] is the unit of supervision: an identity, an owning process,
//! and a guarded [`DogState`] holding the countdown parameters. The actual
//! countdown runs in a dedicated timer task (see `core::timer`); the dog
//! only stores the program the timer follows.
//!
//! ## Rules
//! - All mutable state sits behind one async mutex; there is no per-field
//!   locking and no lock nesting below this level.
//! - Timer reprogramming happens **under** the state lock, so the timer's
//!   view of the deadline can never race a concurrent feed or stop.
//! - [`DogStatus::Expired`] is terminal. Stopping reuses it: a stopped dog
//!   and an expired dog are both simply "no longer alive"; only the event
//!   trail distinguishes them.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::core::timer::{TimerHandle, TimerProgram};
use crate::platform::OwnerRef;

/// Identifier of a registered dog. Recycled after release.
pub type DogId = u32;

/// Shared handle to a dog.
pub type DogRef = Arc<Dog>;

/// Longest accepted dog name, in bytes. Longer names are truncated.
pub const DOG_NAME_MAX: usize = 32;

/// Liveness of a dog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DogStatus {
    /// Counting down; feeds are accepted.
    Alive,
    /// Terminal: the deadline fired or the dog was stopped.
    Expired,
}

impl DogStatus {
    /// Numeric status for the control channel: `0` alive, `1` not.
    pub fn code(&self) -> u32 {
        match self {
            DogStatus::Alive => 0,
            DogStatus::Expired => 1,
        }
    }
}

/// Close-confirmation state of a dog.
///
/// The initial value is the projection of the kennel's
/// [`ClosePolicy`](crate::ClosePolicy): `Never` locks the sequence shut,
/// `RequireMagic` starts unarmed, `Always` starts confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectClose {
    /// No confirmation seen; closing the session orphans the dog.
    Unarmed,
    /// Confirmation seen (sticky); the next close disarms and destroys.
    Confirmed,
    /// Confirmation can never be given ("nowayout").
    Locked,
}

/// Mutable state of a dog, guarded by [`Dog::state`].
#[derive(Debug)]
pub struct DogState {
    /// Liveness; `Expired` is terminal.
    pub status: DogStatus,
    /// Current timeout in seconds.
    pub timeout_secs: u16,
    /// Display name, `wdt<id>` until renamed.
    pub name: String,
    /// The tagged protocol allows exactly one rename.
    pub renamed: bool,
    /// Close-confirmation state.
    pub expect_close: ExpectClose,
    /// Set when the owning session went away while the dog kept running.
    pub orphan: bool,
    /// Per-dog override of the kennel-wide restart suppression.
    pub no_reboot_override: Option<bool>,
}

impl DogState {
    /// Whether expiry of this dog may restart the system.
    pub fn no_reboot(&self, kennel_default: bool) -> bool {
        self.no_reboot_override.unwrap_or(kennel_default)
    }
}

/// One supervised countdown timer.
#[derive(Debug)]
pub struct Dog {
    id: DogId,
    owner: OwnerRef,
    pub(crate) state: Mutex<DogState>,
    pub(crate) timer: TimerHandle,
}

impl Dog {
    /// Creates a dog armed at `deadline` with the given parameters.
    pub(crate) fn new(
        id: DogId,
        owner: OwnerRef,
        timeout_secs: u16,
        expect_close: ExpectClose,
        deadline: Instant,
    ) -> DogRef {
        Arc::new(Self {
            id,
            owner,
            state: Mutex::new(DogState {
                status: DogStatus::Alive,
                timeout_secs,
                name: format!("wdt{id}"),
                renamed: false,
                expect_close,
                orphan: false,
                no_reboot_override: None,
            }),
            timer: TimerHandle::new(TimerProgram::Armed(deadline)),
        })
    }

    /// Registry identifier.
    pub fn id(&self) -> DogId {
        self.id
    }

    /// Owning process.
    pub fn owner(&self) -> OwnerRef {
        self.owner
    }

    /// Current display name.
    pub async fn name(&self) -> String {
        self.state.lock().await.name.clone()
    }

    /// Current liveness.
    pub async fn status(&self) -> DogStatus {
        self.state.lock().await.status
    }

    /// Current timeout in seconds.
    pub async fn timeout_secs(&self) -> u16 {
        self.state.lock().await.timeout_secs
    }

    /// Close-confirmation state.
    pub async fn expect_close(&self) -> ExpectClose {
        self.state.lock().await.expect_close
    }

    /// True when the owning session is gone but the dog keeps counting.
    pub async fn is_orphan(&self) -> bool {
        self.state.lock().await.orphan
    }
}

/// Truncates a requested name to [`DOG_NAME_MAX`] bytes on a char boundary.
pub(crate) fn clamp_name(requested: &str) -> String {
    if requested.len() <= DOG_NAME_MAX {
        return requested.to_string();
    }
    let mut end = DOG_NAME_MAX;
    while !requested.is_char_boundary(end) {
        end -= 1;
    }
    requested[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_wire_values() {
        assert_eq!(DogStatus::Alive.code(), 0);
        assert_eq!(DogStatus::Expired.code(), 1);
    }

    #[tokio::test]
    async fn test_new_dog_starts_alive_with_default_name() {
        let dog = Dog::new(
            3,
            OwnerRef::new(100),
            5,
            ExpectClose::Unarmed,
            Instant::now() + std::time::Duration::from_secs(5),
        );
        assert_eq!(dog.id(), 3);
        assert_eq!(dog.owner().pid(), 100);
        assert_eq!(dog.status().await, DogStatus::Alive);
        assert_eq!(dog.name().await, "wdt3");
        assert_eq!(dog.timeout_secs().await, 5);
        assert!(!dog.is_orphan().await);
    }

    #[test]
    fn test_no_reboot_override_wins_over_default() {
        let mut st = DogState {
            status: DogStatus::Alive,
            timeout_secs: 5,
            name: "wdt0".to_string(),
            renamed: false,
            expect_close: ExpectClose::Unarmed,
            orphan: false,
            no_reboot_override: None,
        };
        assert!(!st.no_reboot(false));
        assert!(st.no_reboot(true));
        st.no_reboot_override = Some(true);
        assert!(st.no_reboot(false));
        st.no_reboot_override = Some(false);
        assert!(!st.no_reboot(true));
    }

    #[test]
    fn test_clamp_name_respects_char_boundaries() {
        assert_eq!(clamp_name("pump"), "pump");
        let long = "x".repeat(40);
        assert_eq!(clamp_name(&long).len(), DOG_NAME_MAX);
        // Multi-byte char straddling the limit is dropped whole.
        let tricky = format!("{}é", "x".repeat(31));
        let clamped = clamp_name(&tricky);
        assert!(clamped.len() <= DOG_NAME_MAX);
        assert!(clamped.is_char_boundary(clamped.len()));
    }
}
