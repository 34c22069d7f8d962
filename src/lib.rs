//! # softwdt
//!
//! **Softwdt** is a software watchdog supervisor for Rust.
//!
//! It keeps one countdown timer ("dog") per client; clients must feed
//! their dog before the countdown runs out or the kennel takes corrective
//! action. The crate is designed as a building block for device
//! emulators, supervision daemons, and embedded control planes.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Session    │   │   Session    │   │   Session    │
//!     │ (client #1)  │   │ (client #2)  │   │ (client #3)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Kennel (watchdog supervisor)                                     │
//! │  - Config (timeouts, close policy, corrective action)             │
//! │  - Registry (id allocation, capacity, lookup)                     │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! │  - Platform (abort signal, system restart)                        │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │ expiry timer │   │ expiry timer │   │ expiry timer │   │
//!     │ (one per dog)│   │ (one per dog)│   │ (one per dog)│   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │                  │                  │                 │
//!      │ Publishes        │ Publishes        │ Publishes       │
//!      │ Events:          │ Events:          │ Events:         │
//!      │ - Expired        │ - Expired        │ - Expired       │
//!      │ - OwnerAborted   │ - RestartTrig.   │ - ...           │
//!      │                  │                  │                 │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                   (capacity: Config::bus_capacity)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       │      (in Kennel)       │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                         worker1  worker2  workerN
//!                         ▼         ▼         ▼
//!                    sub1.on   sub2.on   subN.on
//!                     _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! open_session ──► Kennel::create ──► Registry ──► run_expiry_timer()
//!
//! loop {
//!   ├─► read timer program (watch channel)
//!   │     ├─ Disarmed ──► exit
//!   │     └─ Armed(deadline):
//!   │
//!   ├─► select! {
//!   │     sleep_until(deadline) ──► expire_if_due(deadline)
//!   │     │       ├─ feed moved the deadline ─► re-read program, continue
//!   │     │       └─ still due ─► Alive → Expired (terminal)
//!   │     │             ├─► publish Expired
//!   │     │             ├─► abort owner    (skipped for orphans)
//!   │     │             └─► restart system (skipped when no_reboot)
//!   │     │
//!   │     program changed (feed / set_timeout / stop) ─► continue
//!   │     runtime token cancelled ─► exit
//!   │   }
//!   │
//!   └─ exit conditions:
//!        - dog expired or stopped (program Disarmed)
//!        - kennel dropped or shut down
//! }
//!
//! On release: dog is destroyed if close was confirmed (or it is already
//! dead); otherwise it becomes an orphan and keeps counting down.
//! ```
//!
//! ## Features
//! | Area                  | Description                                                           | Key types / traits                   |
//! |-----------------------|-----------------------------------------------------------------------|--------------------------------------|
//! | **Sessions**          | Per-client handle: writes feed the dog, control requests query it.    | [`Session`], [`ControlRequest`]      |
//! | **Supervision**       | Create, feed, reprogram, stop, and release dogs.                      | [`Kennel`], [`KennelBuilder`]        |
//! | **Subscriber API**    | Hook into watchdog lifecycle events (logging, metrics, custom).       | [`Subscribe`]                        |
//! | **Corrective action** | Pluggable seam for the abort signal and the system restart.           | [`Platform`], [`InertPlatform`]      |
//! | **Errors**            | Typed errors for validation and lifecycle.                            | [`WdtError`]                         |
//! | **Configuration**     | Centralize timeouts, close policy, and capacity.                      | [`Config`], [`ClosePolicy`]          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//! - `system`: exports [`SystemPlatform`], which sends a real abort signal
//!   and issues a real system restart. Off by default for obvious reasons.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use softwdt::{Config, Kennel, OwnerRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn softwdt::Subscribe>> = {
//!         use softwdt::LogWriter;
//!         vec![Arc::new(LogWriter::default())]
//!     };
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn softwdt::Subscribe>> = Vec::new();
//!
//!     // Create the kennel
//!     let kennel = Kennel::builder(cfg)
//!         .with_subscribers(subs)
//!         // .with_platform(Arc::new(SystemPlatform))  // if feature = "system"
//!         .build();
//!
//!     // One client: open a session, prove liveness, close cleanly.
//!     let session = kennel.open_session(OwnerRef::current()).await?;
//!     session.write(b"still alive").await?; // any write feeds the dog
//!     session.write(b"V").await?;           // magic byte confirms the close
//!     assert!(session.close().await);       // confirmed -> dog destroyed
//!
//!     kennel.shutdown().await;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod platform;
mod session;
mod subscribers;

// ---- Public re-exports ----

pub use config::{
    ClosePolicy, Config, WireProtocol, TIMEOUT_DEFAULT_SECS, TIMEOUT_MAX_SECS, TIMEOUT_MIN_SECS,
    validate_timeout,
};
pub use core::{DOG_NAME_MAX, Dog, DogId, DogRef, DogStatus, ExpectClose, Kennel, KennelBuilder};
pub use error::WdtError;
pub use events::{Bus, Event, EventKind};
pub use platform::{InertPlatform, OwnerRef, Platform};
pub use session::{ControlReply, ControlRequest, Session, SupportInfo, proto};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose the real corrective-action platform.
// Enable with: `--features system`
#[cfg(feature = "system")]
pub use platform::SystemPlatform;

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
