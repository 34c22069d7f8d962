//! # Event subscribers for the watchdog runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! machinery, and a built-in stdout logger for handling runtime events
//! broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Kennel ── publish(Event) ──► Bus ──► subscriber_listener
//!                                             │
//!                                             ▼
//!                                       SubscriberSet
//!                                   ┌────────┼────────┐
//!                                   ▼        ▼        ▼
//!                               LogWriter  Metrics  Custom...
//! ```
//!
//! ## Contents
//! - [`Subscribe`]: contract for event handlers (bounded queue, own worker)
//! - [`SubscriberSet`]: per-subscriber queues with panic isolation
//! - [`LogWriter`]: stdout printer (feature `logging`)

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
