//! # Session: one client's channel to its dog.
//!
//! A [`Session`] binds a dog to a client connection the way a device node
//! binds a watchdog to an open file descriptor: opening creates the dog,
//! writes feed it, control requests query and reprogram it, and closing
//! decides between destroy and orphan.
//!
//! ## Lifecycle
//! ```text
//! Kennel::open_session(owner)
//!   └─► create dog (default timeout), armed immediately
//!
//! session.write(payload)
//!   ├─► empty payload → no-op
//!   ├─► feed the dog (errors swallowed: a dead dog still accepts bytes)
//!   └─► dialect handling:
//!         Sentinel → scan for 'V'   → confirm close
//!         Tagged   → parse directives → rename / timeout / flags / stop
//!
//! session.close()  (or drop)
//!   └─► Kennel::release
//!         ├─ confirmed or dead → destroy (id freed)
//!         └─ otherwise         → orphan (keeps counting down)
//! ```
//!
//! ## Rules
//! - `write` mirrors the lax device contract: it succeeds and reports the
//!   full payload length even when the dog already expired; only transport
//!   problems would fail it. The rejected feed still shows up on the bus.
//! - `close` consumes the session, so nothing can race it afterwards. A
//!   dropped session releases its dog best-effort from the drop hook.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::WireProtocol;
use crate::core::{DogId, DogRef, ExpectClose, Kennel};
use crate::error::WdtError;
use crate::platform::OwnerRef;
use crate::session::proto::{self, ControlReply, ControlRequest, SupportInfo, Tag};

/// One client's bound channel to a dog.
pub struct Session {
    kennel: Arc<Kennel>,
    dog: DogRef,
    released: AtomicBool,
}

impl Kennel {
    /// Opens a session for `owner`: creates a dog with the default timeout
    /// and binds it to the returned handle.
    pub async fn open_session(self: &Arc<Self>, owner: OwnerRef) -> Result<Session, WdtError> {
        let dog = self.create(None, owner).await?;
        Ok(Session {
            kennel: Arc::clone(self),
            dog,
            released: AtomicBool::new(false),
        })
    }
}

impl Session {
    /// The bound dog.
    pub fn dog(&self) -> &DogRef {
        &self.dog
    }

    /// Identifier of the bound dog.
    pub fn id(&self) -> DogId {
        self.dog.id()
    }

    /// Writes a payload: feeds the dog and interprets the configured
    /// dialect. Returns the number of bytes accepted (always the full
    /// payload).
    pub async fn write(&self, data: &[u8]) -> Result<usize, WdtError> {
        if data.is_empty() {
            return Ok(0);
        }

        // Feeding failures are reported on the bus, not to the writer.
        let _ = self.kennel.feed(&self.dog).await;

        match self.kennel.config().wire_protocol {
            WireProtocol::Sentinel => self.scan_sentinel(data).await,
            WireProtocol::Tagged => self.apply_tags(data).await,
        }
        Ok(data.len())
    }

    /// Handles an out-of-band control request.
    pub async fn control(&self, request: ControlRequest) -> Result<ControlReply, WdtError> {
        match request {
            ControlRequest::GetSupport => {
                let identity = self.dog.name().await;
                Ok(ControlReply::Support(SupportInfo::for_dog(identity)))
            }
            ControlRequest::GetStatus | ControlRequest::GetBootStatus => {
                Ok(ControlReply::Status(self.dog.status().await.code()))
            }
            ControlRequest::KeepAlive => {
                // Same lax contract as write: the ping is acknowledged
                // even when the dog is already dead.
                let _ = self.kennel.feed(&self.dog).await;
                Ok(ControlReply::Ack)
            }
            ControlRequest::SetTimeout(seconds) => {
                let effective = self.kennel.set_timeout(&self.dog, seconds).await?;
                Ok(ControlReply::Timeout(effective))
            }
            ControlRequest::GetTimeout => {
                Ok(ControlReply::Timeout(self.dog.timeout_secs().await))
            }
        }
    }

    /// Decodes a raw control request and handles it.
    pub async fn control_raw(&self, code: u32, arg: Option<i64>) -> Result<ControlReply, WdtError> {
        let request = ControlRequest::from_raw(code, arg)?;
        self.control(request).await
    }

    /// Closes the session and releases the dog.
    ///
    /// Returns `true` when the dog was destroyed, `false` when it was
    /// orphaned and keeps counting down.
    pub async fn close(self) -> bool {
        self.released.store(true, Ordering::SeqCst);
        self.kennel.release(&self.dog).await
    }

    async fn scan_sentinel(&self, data: &[u8]) {
        // Mirrors the nowayout short-circuit: a locked dog never scans.
        match self.dog.expect_close().await {
            ExpectClose::Locked | ExpectClose::Confirmed => return,
            ExpectClose::Unarmed => {}
        }
        if data.contains(&proto::MAGIC_CHAR) {
            self.kennel.confirm_close(&self.dog).await;
        }
    }

    async fn apply_tags(&self, data: &[u8]) {
        for tag in proto::parse_tags(data) {
            match tag {
                Tag::Name(name) => {
                    self.kennel.rename(&self.dog, &name).await;
                }
                Tag::Timeout(seconds) => {
                    // Rejections surface on the bus only.
                    let _ = self.kennel.set_timeout(&self.dog, seconds).await;
                }
                Tag::StopOnClose(true) => self.kennel.confirm_close(&self.dog).await,
                Tag::StopOnClose(false) => self.kennel.retract_close(&self.dog).await,
                Tag::NoReboot(value) => self.kennel.set_no_reboot(&self.dog, value).await,
                Tag::StopDog => self.kennel.stop(&self.dog).await,
            }
        }
    }
}

impl Drop for Session {
    /// Best-effort release for sessions dropped without [`Session::close`].
    ///
    /// Runs on a runtime task because release takes async locks; outside a
    /// runtime the dog simply stays registered (and unfed, so it expires).
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let kennel = Arc::clone(&self.kennel);
            let dog = self.dog.clone();
            handle.spawn(async move {
                kennel.release(&dog).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{ClosePolicy, Config};
    use crate::events::EventKind;
    use crate::session::proto::cmd;

    fn kennel_with(cfg: Config) -> Arc<Kennel> {
        Kennel::builder(cfg).build()
    }

    fn owner() -> OwnerRef {
        OwnerRef::new(4321)
    }

    #[tokio::test]
    async fn test_open_session_creates_dog_with_default_timeout() {
        let kennel = kennel_with(Config::default());
        let session = kennel.open_session(owner()).await.expect("open");
        assert_eq!(session.dog().timeout_secs().await, 5);
        assert_eq!(kennel.dog_count().await, 1);
        assert_eq!(session.id(), session.dog().id());
    }

    #[tokio::test]
    async fn test_empty_write_is_a_no_op() {
        let kennel = kennel_with(Config::default());
        let session = kennel.open_session(owner()).await.expect("open");
        assert_eq!(session.write(b"").await.expect("write"), 0);
        // No sentinel seen: close orphans the dog.
        assert!(!session.close().await);
    }

    #[tokio::test]
    async fn test_close_without_sentinel_orphans_the_dog() {
        let kennel = kennel_with(Config::default());
        let session = kennel.open_session(owner()).await.expect("open");
        session.write(b"still alive").await.expect("write");

        let dog = session.dog().clone();
        assert!(!session.close().await, "no confirmation, must orphan");
        assert!(dog.is_orphan().await);
        assert_eq!(kennel.dog_count().await, 1, "orphan stays registered");
    }

    #[tokio::test]
    async fn test_close_after_sentinel_destroys_the_dog() {
        let kennel = kennel_with(Config::default());
        let mut rx = kennel.bus().subscribe();
        let session = kennel.open_session(owner()).await.expect("open");
        session.write(b"heartbeat V").await.expect("write");

        assert!(session.close().await, "confirmed close must destroy");
        assert_eq!(kennel.dog_count().await, 0);

        let mut saw_expect_close = false;
        let mut saw_released = false;
        while let Ok(ev) = rx.try_recv() {
            saw_expect_close |= ev.kind == EventKind::ExpectClose;
            saw_released |= ev.kind == EventKind::Released;
        }
        assert!(saw_expect_close, "sentinel must arm the confirmation");
        assert!(saw_released, "destroy must publish Released");
    }

    #[tokio::test]
    async fn test_sentinel_confirmation_is_sticky_across_writes() {
        let kennel = kennel_with(Config::default());
        let session = kennel.open_session(owner()).await.expect("open");
        session.write(b"V").await.expect("write");
        session.write(b"plain feed afterwards").await.expect("write");
        assert!(session.close().await, "confirmation survives later writes");
    }

    #[tokio::test]
    async fn test_nowayout_never_destroys_on_close() {
        let cfg = Config {
            close_policy: ClosePolicy::Never,
            ..Config::default()
        };
        let kennel = kennel_with(cfg);
        let session = kennel.open_session(owner()).await.expect("open");
        session.write(b"VVVV").await.expect("write");

        let dog = session.dog().clone();
        assert!(!session.close().await, "nowayout must ignore the sentinel");
        assert!(dog.is_orphan().await);
        assert_eq!(kennel.dog_count().await, 1);
    }

    #[tokio::test]
    async fn test_always_policy_destroys_without_sentinel() {
        let cfg = Config {
            close_policy: ClosePolicy::Always,
            ..Config::default()
        };
        let kennel = kennel_with(cfg);
        let session = kennel.open_session(owner()).await.expect("open");
        session.write(b"no sentinel here").await.expect("write");
        assert!(session.close().await);
        assert_eq!(kennel.dog_count().await, 0);
    }

    #[tokio::test]
    async fn test_write_succeeds_on_expired_dog_but_reports_invalid_feed() {
        let kennel = kennel_with(Config::default());
        let mut rx = kennel.bus().subscribe();
        let session = kennel.open_session(owner()).await.expect("open");

        kennel.stop(session.dog()).await;
        let n = session.write(b"too late").await.expect("lax write");
        assert_eq!(n, 8);

        let mut saw_invalid_feed = false;
        while let Ok(ev) = rx.try_recv() {
            saw_invalid_feed |= ev.kind == EventKind::InvalidFeed;
        }
        assert!(saw_invalid_feed, "rejected feed must surface on the bus");
    }

    fn tagged_cfg() -> Config {
        Config {
            wire_protocol: WireProtocol::Tagged,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_tagged_rename_applies_once() {
        let cfg = tagged_cfg();
        let kennel = kennel_with(cfg);
        let session = kennel.open_session(owner()).await.expect("open");

        session.write(b"<name>pump-main</name>").await.expect("write");
        assert_eq!(session.dog().name().await, "pump-main");

        session.write(b"<name>other</name>").await.expect("write");
        assert_eq!(
            session.dog().name().await,
            "pump-main",
            "second rename must not stick"
        );
    }

    #[tokio::test]
    async fn test_tagged_timeout_and_stop() {
        let kennel = kennel_with(tagged_cfg());
        let session = kennel.open_session(owner()).await.expect("open");

        session.write(b"<timeout>30</timeout>").await.expect("write");
        assert_eq!(session.dog().timeout_secs().await, 30);

        session.write(b"<stop_dog>1</stop_dog>").await.expect("write");
        assert_eq!(
            session.dog().status().await,
            crate::core::DogStatus::Expired,
            "stop directive must stop the dog"
        );
    }

    #[tokio::test]
    async fn test_tagged_close_flag_controls_release() {
        let kennel = kennel_with(tagged_cfg());
        let session = kennel.open_session(owner()).await.expect("open");

        session
            .write(b"<stop_on_fd_close>1</stop_on_fd_close>")
            .await
            .expect("write");
        assert_eq!(session.dog().expect_close().await, ExpectClose::Confirmed);

        // Flag can be withdrawn again before close.
        session
            .write(b"<stop_on_fd_close>0</stop_on_fd_close>")
            .await
            .expect("write");
        assert_eq!(session.dog().expect_close().await, ExpectClose::Unarmed);

        let dog = session.dog().clone();
        assert!(!session.close().await);
        assert!(dog.is_orphan().await);
    }

    #[tokio::test]
    async fn test_tagged_invalid_timeout_keeps_old_value() {
        let kennel = kennel_with(tagged_cfg());
        let session = kennel.open_session(owner()).await.expect("open");

        session.write(b"<timeout>0</timeout>").await.expect("write");
        assert_eq!(session.dog().timeout_secs().await, 5);
        session
            .write(b"<timeout>65536</timeout>")
            .await
            .expect("write");
        assert_eq!(session.dog().timeout_secs().await, 5);
    }

    #[tokio::test]
    async fn test_control_status_and_timeout_round_trip() {
        let kennel = kennel_with(Config::default());
        let session = kennel.open_session(owner()).await.expect("open");

        assert_eq!(
            session.control(ControlRequest::GetStatus).await.expect("status"),
            ControlReply::Status(0)
        );
        assert_eq!(
            session
                .control(ControlRequest::GetBootStatus)
                .await
                .expect("boot status"),
            ControlReply::Status(0)
        );
        assert_eq!(
            session
                .control(ControlRequest::SetTimeout(120))
                .await
                .expect("set"),
            ControlReply::Timeout(120)
        );
        assert_eq!(
            session.control(ControlRequest::GetTimeout).await.expect("get"),
            ControlReply::Timeout(120)
        );

        kennel.stop(session.dog()).await;
        assert_eq!(
            session.control(ControlRequest::GetStatus).await.expect("status"),
            ControlReply::Status(1),
            "stopped dog must report non-alive"
        );
    }

    #[tokio::test]
    async fn test_control_set_timeout_validates() {
        let kennel = kennel_with(Config::default());
        let session = kennel.open_session(owner()).await.expect("open");

        for bad in [0_i64, -1, 65_536] {
            let err = session
                .control(ControlRequest::SetTimeout(bad))
                .await
                .expect_err("invalid timeout");
            assert!(matches!(err, WdtError::InvalidArgument { .. }), "{bad}");
        }
        assert_eq!(session.dog().timeout_secs().await, 5, "state unchanged");
    }

    #[tokio::test]
    async fn test_control_get_support_reports_identity() {
        let kennel = kennel_with(Config::default());
        let session = kennel.open_session(owner()).await.expect("open");
        let reply = session.control(ControlRequest::GetSupport).await.expect("support");
        match reply {
            ControlReply::Support(info) => {
                assert_eq!(info.identity, format!("wdt{}", session.id()));
                assert_ne!(info.options, 0);
            }
            other => panic!("expected Support reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_control_keepalive_acks_even_when_dead() {
        let kennel = kennel_with(Config::default());
        let session = kennel.open_session(owner()).await.expect("open");
        kennel.stop(session.dog()).await;
        assert_eq!(
            session.control(ControlRequest::KeepAlive).await.expect("ping"),
            ControlReply::Ack
        );
    }

    #[tokio::test]
    async fn test_control_raw_decodes_and_applies() {
        let kennel = kennel_with(Config::default());
        let session = kennel.open_session(owner()).await.expect("open");
        assert_eq!(
            session
                .control_raw(cmd::SET_TIMEOUT, Some(15))
                .await
                .expect("raw set"),
            ControlReply::Timeout(15)
        );

        let err = session.control_raw(0x42, None).await.expect_err("unknown");
        match err {
            WdtError::NotSupported { cmd } => assert_eq!(cmd, 0x42),
            other => panic!("expected NotSupported, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_session_releases_dog() {
        let kennel = kennel_with(Config::default());
        let session = kennel.open_session(owner()).await.expect("open");
        let dog = session.dog().clone();
        drop(session);

        // The drop hook spawns the release; give it a turn to run.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(dog.is_orphan().await, "dropped session must release its dog");
    }
}
