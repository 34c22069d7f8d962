//! # LogWriter — simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [created] dog=Some(0) name=Some("wdt0") timeout=Some(5)
//! [expired] dog=Some(0) name=Some("wdt0") timeout=Some(5)
//! [owner-aborted] dog=Some(0) name=Some("wdt0")
//! [restart-triggered] dog=Some(0) name=Some("wdt0")
//! [released] dog=Some(0) name=Some("wdt0")
//! [stop-all]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::Created => {
                println!(
                    "[created] dog={:?} name={:?} timeout={:?}",
                    e.dog, e.name, e.seconds
                );
            }
            EventKind::InvalidFeed => {
                println!("[invalid-feed] dog={:?} name={:?}", e.dog, e.name);
            }
            EventKind::Stopped => {
                println!("[stopped] dog={:?} name={:?}", e.dog, e.name);
            }
            EventKind::Orphaned => {
                println!("[orphaned] dog={:?} name={:?}", e.dog, e.name);
            }
            EventKind::Released => {
                println!("[released] dog={:?} name={:?}", e.dog, e.name);
            }
            EventKind::TimeoutChanged => {
                println!(
                    "[timeout-set] dog={:?} name={:?} timeout={:?}",
                    e.dog, e.name, e.seconds
                );
            }
            EventKind::TimeoutRejected => {
                println!(
                    "[timeout-rejected] dog={:?} name={:?} reason={:?}",
                    e.dog, e.name, e.reason
                );
            }
            EventKind::Renamed => {
                println!("[renamed] dog={:?} name={:?}", e.dog, e.name);
            }
            EventKind::ExpectClose => {
                println!("[expect-close] dog={:?} name={:?}", e.dog, e.name);
            }
            EventKind::Expired => {
                println!(
                    "[expired] dog={:?} name={:?} timeout={:?}",
                    e.dog, e.name, e.seconds
                );
            }
            EventKind::OwnerAborted => {
                println!("[owner-aborted] dog={:?} name={:?}", e.dog, e.name);
            }
            EventKind::AbortFailed => {
                println!(
                    "[abort-failed] dog={:?} name={:?} err={:?}",
                    e.dog, e.name, e.reason
                );
            }
            EventKind::RestartTriggered => {
                println!("[restart-triggered] dog={:?} name={:?}", e.dog, e.name);
            }
            EventKind::RestartFailed => {
                println!(
                    "[restart-failed] dog={:?} name={:?} err={:?}",
                    e.dog, e.name, e.reason
                );
            }
            EventKind::StopAll => {
                println!("[stop-all]");
            }
            EventKind::ConfigAdjusted => {
                println!(
                    "[config-adjusted] reason={:?} timeout={:?}",
                    e.reason, e.seconds
                );
            }
            EventKind::SubscriberOverflow => {
                println!(
                    "[subscriber-overflow] subscriber={:?} reason={:?}",
                    e.name, e.reason
                );
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={} info={}",
                    e.name.as_deref().unwrap_or("unknown"),
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
