//! # Kennel construction and wiring.
//!
//! [`KennelBuilder`] assembles the runtime pieces in dependency order:
//! bus first, then the subscriber fan-out and its listener, then the
//! sanitized configuration and the registry. Construction must happen
//! inside a tokio runtime because subscriber workers and the bus listener
//! are spawned here.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, TIMEOUT_DEFAULT_SECS, TIMEOUT_MIN_SECS};
use crate::core::kennel::Kennel;
use crate::core::registry::Registry;
use crate::events::{Bus, Event, EventKind};
use crate::platform::{InertPlatform, Platform};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Kennel`] with optional features.
pub struct KennelBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    platform: Option<Arc<dyn Platform>>,
}

impl KennelBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            platform: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (dog lifecycle, expiry,
    /// corrective action) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the platform used for corrective action.
    ///
    /// Without one the kennel uses [`InertPlatform`], which never signals
    /// or restarts anything.
    pub fn with_platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Builds and returns the kennel.
    ///
    /// This consumes the builder and initializes all runtime components:
    /// - Event bus for broadcasting
    /// - Subscriber workers plus the bus → subscriber listener
    /// - Registry for dog lifecycle management
    #[must_use]
    pub fn build(self) -> Arc<Kennel> {
        let mut cfg = self.cfg;
        let bus = Bus::new(cfg.bus_capacity_effective());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let runtime_token = CancellationToken::new();

        // Listener first, so the configuration fallback below is observed.
        spawn_subscriber_listener(&bus, Arc::clone(&subs), runtime_token.clone());

        if cfg.default_timeout_secs < TIMEOUT_MIN_SECS {
            cfg.default_timeout_secs = TIMEOUT_DEFAULT_SECS;
            bus.publish(
                Event::new(EventKind::ConfigAdjusted)
                    .with_reason("default timeout out of range, using fallback")
                    .with_seconds(TIMEOUT_DEFAULT_SECS),
            );
        }

        let registry = Registry::new(cfg.max_dogs_effective());
        let platform = self
            .platform
            .unwrap_or_else(|| Arc::new(InertPlatform) as Arc<dyn Platform>);

        Arc::new_cyclic(|weak| {
            Kennel::new_internal(
                weak.clone(),
                cfg,
                bus,
                subs,
                registry,
                platform,
                runtime_token,
            )
        })
    }
}

/// Forwards bus events to the subscriber set until the runtime stops.
///
/// Lagged receivers skip ahead instead of exiting; only channel closure or
/// runtime cancellation ends the loop.
fn spawn_subscriber_listener(bus: &Bus, subs: Arc<SubscriberSet>, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit(&ev),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_applies_timeout_fallback() {
        let cfg = Config {
            default_timeout_secs: 0,
            ..Config::default()
        };
        let kennel = Kennel::builder(cfg).build();
        assert_eq!(
            kennel.config().default_timeout_secs,
            TIMEOUT_DEFAULT_SECS,
            "zero default must fall back"
        );
    }

    #[tokio::test]
    async fn test_build_clamps_capacity() {
        let cfg = Config {
            max_dogs: 0,
            ..Config::default()
        };
        let kennel = Kennel::builder(cfg).build();
        assert_eq!(kennel.capacity(), 1);
    }
}
