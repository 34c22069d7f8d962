//! # Kennel: orchestrates dogs, corrective action, and teardown.
//!
//! The [`Kennel`] owns the event bus, the dog registry, and the
//! [`Platform`] used for corrective action. Every lifecycle operation goes
//! through it: creation, feeding, reprogramming, stopping, releasing, and
//! the expiry path driven by the per-dog timer tasks.
//!
//! ## High-level architecture
//! ```text
//! Sessions / embedders
//!   │ create / feed / set_timeout / stop / release
//!   ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │ Kennel                                                    │
//! │  - Config (timeouts, close policy, corrective action)     │
//! │  - Registry (id allocation, capacity, lookup)             │
//! │  - Bus (broadcast events) + SubscriberSet (fan-out)       │
//! │  - Platform (abort signal, system restart)                │
//! └──────┬────────────────────────────────────────────────────┘
//!        │ spawns one per dog
//!        ▼
//!   run_expiry_timer ── deadline fires ──► expire_if_due()
//!                                            ├─ publish Expired
//!                                            ├─ abort owner   (unless orphan)
//!                                            └─ restart system (unless no_reboot)
//! ```
//!
//! ## Rules
//! - **Expiry is terminal.** `expire_if_due` transitions Alive → Expired
//!   exactly once; every later feed or reprogram fails.
//! - **Feeds always win races.** The expiry path re-validates the armed
//!   deadline under the dog lock before transitioning; a feed that got
//!   there first reprograms the timer and the stale wakeup is discarded.
//! - **No nested locks.** Registry work and dog work never overlap; sweeps
//!   snapshot the registry first and take dog locks afterwards.
//! - **Events are published outside locks.**

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{ClosePolicy, Config, validate_timeout};
use crate::core::dog::{Dog, DogId, DogRef, DogStatus, ExpectClose, clamp_name};
use crate::core::registry::Registry;
use crate::core::timer::{self, TimerProgram};
use crate::core::{builder::KennelBuilder, shutdown};
use crate::error::WdtError;
use crate::events::{Bus, Event, EventKind};
use crate::platform::{OwnerRef, Platform};
use crate::subscribers::SubscriberSet;

/// Multi-dog watchdog supervisor.
///
/// Build one with [`Kennel::builder`]; it is always handed out as an
/// `Arc<Kennel>` because timer tasks and sessions share it.
pub struct Kennel {
    cfg: Config,
    bus: Bus,
    /// Keeps subscriber workers alive for the kennel's lifetime.
    #[allow(dead_code)]
    subs: Arc<SubscriberSet>,
    registry: Registry,
    platform: Arc<dyn Platform>,
    runtime_token: CancellationToken,
    /// Handed to timer tasks so they never keep a dropped kennel alive.
    weak_self: Weak<Kennel>,
}

impl Kennel {
    /// Starts building a kennel from the given configuration.
    pub fn builder(cfg: Config) -> KennelBuilder {
        KennelBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        weak_self: Weak<Kennel>,
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        registry: Registry,
        platform: Arc<dyn Platform>,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            registry,
            platform,
            runtime_token,
            weak_self,
        }
    }

    /// Event bus; subscribe to observe the kennel.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Registry capacity.
    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    /// Number of registered dogs (alive or expired-but-unreleased).
    pub async fn dog_count(&self) -> usize {
        self.registry.len().await
    }

    /// Looks up a registered dog by id.
    pub async fn find(&self, id: DogId) -> Option<DogRef> {
        self.registry.find(id).await
    }

    /// The `Result` form of [`Kennel::find`], for control planes that
    /// address dogs by id and treat a missing one as an error.
    pub async fn get(&self, id: DogId) -> Result<DogRef, WdtError> {
        self.registry
            .find(id)
            .await
            .ok_or(WdtError::NotFound { id })
    }

    /// Creates a dog owned by `owner` and starts its countdown.
    ///
    /// `timeout` is validated against the accepted range; `None` uses the
    /// configured default. The countdown is armed before this returns, so
    /// a caller that never feeds will see expiry one timeout later.
    pub async fn create(&self, timeout: Option<i64>, owner: OwnerRef) -> Result<DogRef, WdtError> {
        let secs = match timeout {
            Some(requested) => validate_timeout(requested)?,
            None => self.cfg.default_timeout_secs,
        };
        let expect_close = match self.cfg.close_policy {
            ClosePolicy::Never => ExpectClose::Locked,
            ClosePolicy::RequireMagic => ExpectClose::Unarmed,
            ClosePolicy::Always => ExpectClose::Confirmed,
        };
        let deadline = Instant::now() + Duration::from_secs(u64::from(secs));

        let dog = self
            .registry
            .register(|id| Dog::new(id, owner, secs, expect_close, deadline))
            .await?;

        let rx = dog.timer.subscribe();
        tokio::spawn(timer::run_expiry_timer(
            self.weak_self.clone(),
            dog.clone(),
            rx,
            self.runtime_token.child_token(),
        ));

        let name = dog.name().await;
        self.bus.publish(
            Event::new(EventKind::Created)
                .with_dog(dog.id())
                .with_name(name)
                .with_seconds(secs),
        );
        Ok(dog)
    }

    /// Feeds a dog: restarts its countdown from now.
    ///
    /// Fails with [`WdtError::AlreadyExpired`] once the dog has left the
    /// alive state; a dead dog can never be fed back to life.
    pub async fn feed(&self, dog: &DogRef) -> Result<(), WdtError> {
        let mut st = dog.state.lock().await;
        if st.status != DogStatus::Alive {
            let name = st.name.clone();
            drop(st);
            self.bus.publish(
                Event::new(EventKind::InvalidFeed)
                    .with_dog(dog.id())
                    .with_name(name),
            );
            return Err(WdtError::AlreadyExpired { id: dog.id() });
        }
        let deadline = Instant::now() + Duration::from_secs(u64::from(st.timeout_secs));
        dog.timer.arm(deadline);
        Ok(())
    }

    /// Reprograms a dog's timeout and restarts the countdown.
    ///
    /// Returns the value now in effect. Rejected values leave the running
    /// countdown untouched.
    pub async fn set_timeout(&self, dog: &DogRef, seconds: i64) -> Result<u16, WdtError> {
        let secs = match validate_timeout(seconds) {
            Ok(secs) => secs,
            Err(err) => {
                let name = dog.name().await;
                self.bus.publish(
                    Event::new(EventKind::TimeoutRejected)
                        .with_dog(dog.id())
                        .with_name(name)
                        .with_reason(format!("requested {seconds}s")),
                );
                return Err(err);
            }
        };

        let mut st = dog.state.lock().await;
        if st.status != DogStatus::Alive {
            let name = st.name.clone();
            drop(st);
            self.bus.publish(
                Event::new(EventKind::TimeoutRejected)
                    .with_dog(dog.id())
                    .with_name(name)
                    .with_reason("dog is no longer alive"),
            );
            return Err(WdtError::AlreadyExpired { id: dog.id() });
        }
        st.timeout_secs = secs;
        let name = st.name.clone();
        let deadline = Instant::now() + Duration::from_secs(u64::from(secs));
        dog.timer.arm(deadline);
        drop(st);

        self.bus.publish(
            Event::new(EventKind::TimeoutChanged)
                .with_dog(dog.id())
                .with_name(name)
                .with_seconds(secs),
        );
        Ok(secs)
    }

    /// Renames a dog. Only the first rename sticks; returns whether it
    /// was applied. Names are truncated to [`DOG_NAME_MAX`](crate::DOG_NAME_MAX)
    /// bytes.
    pub async fn rename(&self, dog: &DogRef, requested: &str) -> bool {
        let applied = {
            let mut st = dog.state.lock().await;
            if st.renamed {
                None
            } else {
                st.name = clamp_name(requested);
                st.renamed = true;
                Some(st.name.clone())
            }
        };
        match applied {
            Some(name) => {
                self.bus.publish(
                    Event::new(EventKind::Renamed)
                        .with_dog(dog.id())
                        .with_name(name),
                );
                true
            }
            None => false,
        }
    }

    /// Overrides the kennel-wide restart suppression for one dog.
    pub async fn set_no_reboot(&self, dog: &DogRef, value: bool) {
        dog.state.lock().await.no_reboot_override = Some(value);
    }

    /// Records the magic-close confirmation for a dog.
    ///
    /// Sticky: once confirmed it stays confirmed until explicitly
    /// retracted. Dogs under a `Never` close policy ignore this.
    pub async fn confirm_close(&self, dog: &DogRef) {
        let armed = {
            let mut st = dog.state.lock().await;
            match st.expect_close {
                ExpectClose::Unarmed => {
                    st.expect_close = ExpectClose::Confirmed;
                    Some(st.name.clone())
                }
                ExpectClose::Confirmed | ExpectClose::Locked => None,
            }
        };
        if let Some(name) = armed {
            self.bus.publish(
                Event::new(EventKind::ExpectClose)
                    .with_dog(dog.id())
                    .with_name(name),
            );
        }
    }

    /// Withdraws a previously given close confirmation.
    pub async fn retract_close(&self, dog: &DogRef) {
        let mut st = dog.state.lock().await;
        if st.expect_close == ExpectClose::Confirmed {
            st.expect_close = ExpectClose::Unarmed;
        }
    }

    /// Stops a dog: disarms the countdown without corrective action.
    ///
    /// Reuses the terminal expired state, so a stopped dog rejects feeds
    /// exactly like an expired one. Idempotent.
    pub async fn stop(&self, dog: &DogRef) {
        let stopped = {
            let mut st = dog.state.lock().await;
            if st.status != DogStatus::Alive {
                None
            } else {
                st.status = DogStatus::Expired;
                dog.timer.disarm();
                Some(st.name.clone())
            }
        };
        if let Some(name) = stopped {
            self.bus.publish(
                Event::new(EventKind::Stopped)
                    .with_dog(dog.id())
                    .with_name(name),
            );
        }
    }

    /// Handles a session going away.
    ///
    /// The dog is destroyed (stopped if needed, then unregistered) when
    /// close was confirmed or the dog is already dead; otherwise it is
    /// marked orphan and keeps counting down unattended. Returns `true`
    /// when the dog was destroyed.
    pub async fn release(&self, dog: &DogRef) -> bool {
        let (destroy, stopped, first_orphan, name) = {
            let mut st = dog.state.lock().await;
            let first_orphan = !st.orphan;
            // Marked before the destroy decision: an orphan that survives
            // here must already read as orphaned if it expires right after.
            st.orphan = true;
            let destroy =
                st.expect_close == ExpectClose::Confirmed || st.status != DogStatus::Alive;
            let stopped = if destroy && st.status == DogStatus::Alive {
                st.status = DogStatus::Expired;
                dog.timer.disarm();
                true
            } else {
                false
            };
            (destroy, stopped, first_orphan, st.name.clone())
        };

        if stopped {
            self.bus.publish(
                Event::new(EventKind::Stopped)
                    .with_dog(dog.id())
                    .with_name(name.clone()),
            );
        }
        if destroy {
            if self.registry.unregister(dog.id()).await.is_some() {
                self.bus.publish(
                    Event::new(EventKind::Released)
                        .with_dog(dog.id())
                        .with_name(name),
                );
            }
            true
        } else {
            if first_orphan {
                self.bus.publish(
                    Event::new(EventKind::Orphaned)
                        .with_dog(dog.id())
                        .with_name(name),
                );
            }
            false
        }
    }

    /// Stops every registered dog (system is going down; nothing may bite
    /// during teardown). Dogs stay registered so sessions can still
    /// release them.
    pub async fn stop_all(&self) {
        self.bus.publish(Event::new(EventKind::StopAll));
        for dog in self.registry.snapshot().await {
            self.stop(&dog).await;
        }
    }

    /// Full teardown: stop every dog, drain the registry, cancel the
    /// runtime token so timer tasks and listeners exit.
    pub async fn shutdown(&self) {
        self.stop_all().await;
        for dog in self.registry.drain().await {
            let name = dog.name().await;
            self.bus.publish(
                Event::new(EventKind::Released)
                    .with_dog(dog.id())
                    .with_name(name),
            );
        }
        self.runtime_token.cancel();
    }

    /// Spawns a watcher that calls [`Kennel::stop_all`] when the process
    /// receives a termination signal (SIGINT/SIGTERM/SIGQUIT, Ctrl-C).
    pub fn stop_on_signal(self: &Arc<Self>) -> JoinHandle<()> {
        let me = Arc::clone(self);
        let token = self.runtime_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                res = shutdown::wait_for_shutdown_signal() => {
                    if res.is_ok() {
                        me.stop_all().await;
                    }
                }
            }
        })
    }

    /// Expires a dog if its armed deadline is still the one that fired.
    ///
    /// Returns `true` when the timer task should exit (the dog fired or is
    /// already dead) and `false` when a concurrent feed moved the deadline
    /// and the task must re-read its program.
    pub(crate) async fn expire_if_due(&self, dog: &DogRef, fired: Instant) -> bool {
        struct Firing {
            name: String,
            seconds: u16,
            orphan: bool,
            no_reboot: bool,
        }

        let firing = {
            let mut st = dog.state.lock().await;
            if st.status != DogStatus::Alive {
                return true;
            }
            if dog.timer.program() != TimerProgram::Armed(fired) {
                // A feed won the race while we were waking up.
                return false;
            }
            st.status = DogStatus::Expired;
            dog.timer.disarm();
            Firing {
                name: st.name.clone(),
                seconds: st.timeout_secs,
                orphan: st.orphan,
                no_reboot: st.no_reboot(self.cfg.no_reboot),
            }
        };

        self.bus.publish(
            Event::new(EventKind::Expired)
                .with_dog(dog.id())
                .with_name(firing.name.clone())
                .with_seconds(firing.seconds),
        );

        if self.cfg.abort_owner_on_expire && !firing.orphan {
            match self.platform.abort_owner(dog.owner()) {
                Ok(()) => self.bus.publish(
                    Event::new(EventKind::OwnerAborted)
                        .with_dog(dog.id())
                        .with_name(firing.name.clone()),
                ),
                Err(err) => self.bus.publish(
                    Event::new(EventKind::AbortFailed)
                        .with_dog(dog.id())
                        .with_name(firing.name.clone())
                        .with_reason(err.to_string()),
                ),
            }
        }

        if !firing.no_reboot {
            self.bus.publish(
                Event::new(EventKind::RestartTriggered)
                    .with_dog(dog.id())
                    .with_name(firing.name.clone()),
            );
            match self.platform.restart_system() {
                Ok(never) => match never {},
                Err(err) => self.bus.publish(
                    Event::new(EventKind::RestartFailed)
                        .with_dog(dog.id())
                        .with_name(firing.name)
                        .with_reason(err.to_string()),
                ),
            }
        }
        true
    }
}
