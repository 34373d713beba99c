// src/bin/notify_probe.rs
//! Sends one test message through the configured channel, then a digest, to check credentials.

use inventory_watch::notify::deliver;
use inventory_watch::{notifier_from_env, WatchConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = WatchConfig::load_default()?;
    let notifier = notifier_from_env(&cfg);

    let ok = deliver(notifier.as_ref(), "🔧 inventory-watch probe: channel works").await;
    let digest = inventory_watch::notify::format::digest_message(&cfg, &[]);
    let ok = ok && deliver(notifier.as_ref(), &digest).await;

    if ok {
        println!("notify-probe done");
    } else {
        anyhow::bail!("notify-probe: at least one message failed, see log");
    }
    Ok(())
}
