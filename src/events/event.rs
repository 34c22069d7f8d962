//! # Runtime events emitted by the kennel and its sessions.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: dog creation, feeding faults, stop, release
//! - **Reprogramming events**: timeout changes, renames, close confirmation
//! - **Expiry events**: deadline hits and the corrective action that follows
//! - **Teardown events**: coordinator sweeps and configuration fallbacks
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! the dog id and name, timeout values, and failure reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use softwdt::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::Expired)
//!     .with_dog(3)
//!     .with_name("wdt3")
//!     .with_seconds(5);
//!
//! assert_eq!(ev.kind, EventKind::Expired);
//! assert_eq!(ev.dog, Some(3));
//! assert_eq!(ev.name.as_deref(), Some("wdt3"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::DogId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `name`: subscriber name
    /// - `reason`: panic info/message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `name`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberOverflow,

    // === Dog lifecycle events ===
    /// Dog registered and armed.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `seconds`: initial timeout
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Created,

    /// Feed attempted on a dog that is no longer alive.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    InvalidFeed,

    /// Dog stopped deliberately (graceful disarm, never corrective).
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Stopped,

    /// Session closed without a confirmed disarm; the dog keeps running
    /// unattended.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Orphaned,

    /// Dog destroyed and its id returned to the registry.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Released,

    // === Reprogramming events ===
    /// Timeout reprogrammed; the running countdown was restarted.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `seconds`: new timeout
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TimeoutChanged,

    /// Timeout change refused (out of range, or the dog is dead).
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `reason`: rejected value or state
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    TimeoutRejected,

    /// Dog renamed through the tagged wire protocol.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: new dog name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Renamed,

    /// Magic-close confirmation observed; the next session close will
    /// disarm the dog.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ExpectClose,

    // === Expiry and corrective action ===
    /// Deadline passed without a feed; the dog left the alive state.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `seconds`: timeout that ran out
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Expired,

    /// Abort signal delivered to the owner of an expired dog.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    OwnerAborted,

    /// Abort signal could not be delivered.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `reason`: platform error
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    AbortFailed,

    /// System restart invoked in response to an expiry.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RestartTriggered,

    /// System restart reported an error instead of restarting.
    ///
    /// Sets:
    /// - `dog`: dog id
    /// - `name`: dog name
    /// - `reason`: platform error
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RestartFailed,

    // === Teardown and configuration ===
    /// Coordinated stop of every registered dog has begun.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    StopAll,

    /// An invalid configuration value was replaced with its default.
    ///
    /// Sets:
    /// - `reason`: what was adjusted
    /// - `seconds`: value now in effect, when it is a timeout
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    ConfigAdjusted,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Dog identifier, if the event concerns one dog.
    pub dog: Option<DogId>,
    /// Dog name (or subscriber name for subscriber events).
    pub name: Option<Arc<str>>,
    /// Timeout value in seconds, where applicable.
    pub seconds: Option<u16>,
    /// Human-readable reason (errors, rejected values, etc.).
    pub reason: Option<Arc<str>>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind,
            at: SystemTime::now(),
            dog: None,
            name: None,
            seconds: None,
            reason: None,
        }
    }

    /// Attaches a dog identifier.
    #[inline]
    pub fn with_dog(mut self, id: DogId) -> Self {
        self.dog = Some(id);
        self
    }

    /// Attaches a dog (or subscriber) name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a timeout value in seconds.
    #[inline]
    pub fn with_seconds(mut self, seconds: u16) -> Self {
        self.seconds = Some(seconds);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
