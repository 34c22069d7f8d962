//! Client-facing surface: sessions and the wire protocol.
//!
//! A [`Session`] is the crate's rendition of an open watchdog device:
//! writing feeds the bound dog, control requests mirror the classic ioctl
//! surface, and closing decides between destroy and orphan. The [`proto`]
//! module holds the wire-level vocabulary (request codes, capability bits,
//! the magic-close sentinel, tagged directives).

pub mod proto;
mod session;

pub use proto::{ControlReply, ControlRequest, SupportInfo};
pub use session::Session;
