//! # Example: tags
//!
//! The legacy tag wire protocol: configuration rides inside the write
//! payload as `<field>value</field>` pairs instead of control requests.
//!
//! Demonstrates how to:
//! - Select [`WireProtocol::Tagged`] in the [`Config`].
//! - Rename a dog and reprogram its countdown from the payload.
//! - Confirm close with `stop_on_fd_close` instead of the magic byte.
//! - Stop a dog outright with the `stop_dog` tag.
//!
//! ## Flow
//! ```text
//! Session A ──► "<name>pump-ctl</name><timeout>3</timeout>"
//!     ├─► [renamed] [timeout-set]
//!     ├─► write("ping") x3                (plain writes still feed)
//!     └─► "<stop_on_fd_close>1</stop_on_fd_close>" ──► close() destroys
//!
//! Session B ──► "<stop_dog>1</stop_dog>" ──► [stopped]
//!     └─► close() destroys (already dead)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example tags --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use softwdt::{Config, ControlRequest, Kennel, LogWriter, OwnerRef, Subscribe, WireProtocol};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Legacy protocol: tags in the payload, no magic byte
    let cfg = Config {
        wire_protocol: WireProtocol::Tagged,
        ..Config::default()
    };

    // 2. Log every kennel event to stdout
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];

    // 3. Create the kennel
    let kennel = Kennel::builder(cfg).with_subscribers(subs).build();

    // 4. Configure a dog entirely through its payload
    let session = kennel.open_session(OwnerRef::current()).await?;
    session.write(b"<name>pump-ctl</name><timeout>3</timeout>").await?;
    println!("[tags] dog {} is now {:?}", session.id(), session.dog().name().await);
    println!("[tags] support: {:?}", session.control(ControlRequest::GetSupport).await?);

    // 5. Plain writes still feed
    for i in 1..=3 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        session.write(b"ping").await?;
        println!("[tags] fed #{i}");
    }

    // 6. The tag equivalent of the magic byte
    session.write(b"<stop_on_fd_close>1</stop_on_fd_close>").await?;
    let destroyed = session.close().await;
    println!("[tags] clean close, destroyed={destroyed}");

    // 7. stop_dog disarms without closing
    let second = kennel.open_session(OwnerRef::current()).await?;
    second.write(b"<stop_dog>1</stop_dog>").await?;
    second.close().await;

    // 8. Tear down; give the log workers a moment to drain
    kennel.shutdown().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
