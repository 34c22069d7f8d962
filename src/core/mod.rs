//! Runtime core: supervision and lifecycle.
//!
//! This module contains the embedded implementation of the watchdog
//! runtime. The public API from this module is the [`Kennel`] (with its
//! builder) and the dog types; the registry and timer plumbing stay
//! internal.
//!
//! Internal modules:
//! - [`kennel`]: orchestrates dogs, corrective action, and teardown;
//! - [`builder`]: wires bus, subscribers, registry, platform together;
//! - [`dog`]: the supervised entity and its guarded state;
//! - [`timer`]: one expiry timer task per dog, reprogrammed via a watch
//!   channel;
//! - [`registry`]: bounded id-keyed table with rolling-cursor allocation;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod dog;
mod kennel;
mod registry;
mod shutdown;
mod timer;

pub use builder::KennelBuilder;
pub use dog::{DOG_NAME_MAX, Dog, DogId, DogRef, DogStatus, ExpectClose};
pub use kennel::Kennel;
