//! # Example: feeder
//!
//! Two clients against one kennel: a well-behaved one that feeds on time
//! and closes with the magic byte, and a stuck one that stops feeding and
//! gets bitten.
//!
//! Demonstrates how to:
//! - Build a [`Kennel`] with the built-in [`LogWriter`] subscriber.
//! - Feed a dog through [`Session::write`] and confirm close with `b'V'`.
//! - Reprogram a countdown with [`ControlRequest::SetTimeout`].
//! - Watch expiry and corrective action on the event log.
//!
//! ## Flow
//! ```text
//! Session A ──► write("feed") x3 ──► write("V") ──► close()
//!     └─► [created] [expect-close] [stopped] [released]
//!
//! Session B ──► SetTimeout(2) ──► (silence) ──► countdown runs out
//!     └─► [created] [timeout-set] [expired] [owner-aborted] [restart-failed]
//! ```
//!
//! The default platform is inert: the abort and the restart are reported
//! on the bus but nothing is signalled or rebooted.
//!
//! ## Run
//! ```bash
//! cargo run --example feeder --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use softwdt::{Config, ControlRequest, Kennel, LogWriter, OwnerRef, Subscribe};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Defaults: 5s countdown, magic close required, restart enabled
    let cfg = Config::default();

    // 2. Log every kennel event to stdout
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];

    // 3. Create the kennel
    let kennel = Kennel::builder(cfg).with_subscribers(subs).build();

    // 4. A well-behaved client: feeds on time, closes with the magic byte
    let good = kennel.open_session(OwnerRef::current()).await?;
    println!("[feeder] dog {} armed", good.id());
    for i in 1..=3 {
        tokio::time::sleep(Duration::from_secs(2)).await;
        good.write(b"feed").await?;
        println!("[feeder] fed #{i}");
    }
    good.write(b"V").await?;
    let destroyed = good.close().await;
    println!("[feeder] clean close, destroyed={destroyed}");

    // 5. A stuck client: shorten the countdown, then go silent
    let stuck = kennel.open_session(OwnerRef::current()).await?;
    let reply = stuck.control(ControlRequest::SetTimeout(2)).await?;
    println!("[feeder] stuck dog {} reprogrammed: {reply:?}", stuck.id());
    tokio::time::sleep(Duration::from_secs(3)).await;
    println!("[feeder] stuck dog bitten, closing");
    stuck.close().await;

    // 6. Tear down; give the log workers a moment to drain
    kennel.shutdown().await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
