//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the kennel, expiry timers,
//! sessions and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Kennel` operations (create/feed/stop/release), expiry
//!   timers, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the kennel's subscriber listener (fans out to
//!   `SubscriberSet`), plus any receiver obtained from [`Bus::subscribe`].
//!
//! See `core/mod.rs` for the system-level wiring diagram.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
