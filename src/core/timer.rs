//! # Expiry timer: one task per dog.
//!
//! Every dog gets a dedicated timer task that sleeps until the armed
//! deadline and asks the kennel to expire the dog when it fires. Feeds and
//! timeout changes do not touch the task directly; they publish a new
//! [`TimerProgram`] through the dog's [`TimerHandle`] (a watch channel),
//! and the sleeping task re-reads it.
//!
//! ## Architecture
//! ```text
//! feed()/set_timeout()          stop()/release()
//!        │                             │
//!        ▼                             ▼
//!   arm(deadline)                   disarm()
//!        └────────► watch channel ◄────┘
//!                        │
//!                        ▼
//!              run_expiry_timer(dog)
//!                loop {
//!                  ├─ Disarmed        → exit
//!                  └─ Armed(deadline) → select! {
//!                        sleep_until(deadline) → kennel.expire_if_due()
//!                        channel changed       → re-read program
//!                        runtime cancelled     → exit
//!                     }
//!                }
//! ```
//!
//! ## Rules
//! - The watch value is the **only** authority on the deadline; the task
//!   never trusts a deadline it went to sleep with once the channel moved.
//! - `expire_if_due` re-validates under the dog lock, so a feed that wins
//!   the race cancels the expiry even if the sleep already returned.
//! - The task exits after the dog fires, is disarmed, or the runtime
//!   token is cancelled. It holds the kennel only weakly, so dangling
//!   timers never keep a dropped kennel alive.

use std::sync::Weak;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::core::dog::DogRef;
use crate::core::kennel::Kennel;

/// What the timer task should currently be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerProgram {
    /// Sleep until the deadline, then expire the dog.
    Armed(Instant),
    /// Stand down and exit.
    Disarmed,
}

/// Writer side of a dog's timer program.
///
/// Held inside [`Dog`](crate::core::dog::Dog); all writes happen under the
/// dog's state lock.
#[derive(Debug)]
pub(crate) struct TimerHandle {
    tx: watch::Sender<TimerProgram>,
}

impl TimerHandle {
    pub(crate) fn new(initial: TimerProgram) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Restarts the countdown towards `deadline`.
    pub(crate) fn arm(&self, deadline: Instant) {
        // send_replace delivers even when the timer task has not
        // subscribed yet or has already exited.
        self.tx.send_replace(TimerProgram::Armed(deadline));
    }

    /// Tells the timer task to stand down.
    pub(crate) fn disarm(&self) {
        self.tx.send_replace(TimerProgram::Disarmed);
    }

    /// Current program.
    pub(crate) fn program(&self) -> TimerProgram {
        *self.tx.borrow()
    }

    /// New receiver observing the current program and all later ones.
    pub(crate) fn subscribe(&self) -> watch::Receiver<TimerProgram> {
        self.tx.subscribe()
    }
}

/// Drives one dog's countdown until it fires, is disarmed, or the runtime
/// shuts down.
pub(crate) async fn run_expiry_timer(
    kennel: Weak<Kennel>,
    dog: DogRef,
    mut rx: watch::Receiver<TimerProgram>,
    token: CancellationToken,
) {
    loop {
        let program = *rx.borrow_and_update();
        match program {
            TimerProgram::Disarmed => break,
            TimerProgram::Armed(deadline) => {
                tokio::select! {
                    _ = sleep_until(deadline) => {
                        let Some(kennel) = kennel.upgrade() else {
                            break;
                        };
                        if kennel.expire_if_due(&dog, deadline).await {
                            break;
                        }
                        // Lost the race against a feed: loop and pick up
                        // the fresh program.
                    }
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = token.cancelled() => break,
                }
            }
        }
    }
}
