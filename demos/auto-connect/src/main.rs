//! Two visits to a dapp: the first connects by hand, the second
//! reconnects silently. Then the wallet locks and the session goes away.
//!
//! ```text
//! cargo run -p auto-connect [-- path/to/sessions.json]
//! RUST_LOG=debug cargo run -p auto-connect
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use freo::prelude::*;

type Sessions = WalletSessions<FileStore, ProviderConnector<MemoryProvider>>;

// ---------------------------------------------------------------------------
// Page visits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    /// The stored session was restored without a prompt.
    Reconnected,
    /// The user had to approve a fresh connection.
    Prompted,
}

async fn open(path: &Path, wallet: &MemoryProvider) -> Sessions {
    WalletSessions::builder()
        .build(FileStore::new(path), ProviderConnector::new(wallet.clone()))
        .await
}

/// What a dapp does on every page load.
async fn visit(sessions: &Sessions, origin: &Origin) -> Result<Visit, FreoError> {
    if sessions.on_page_load(origin).await {
        return Ok(Visit::Reconnected);
    }

    let options = SessionOptions::default()
        .permission("eth_accounts", true)
        .name("Example Dapp");
    sessions.authorize(origin.clone(), "0x1", options).await?;
    sessions
        .manager()
        .await
        .set_network_preference("0x1", "0x89")
        .await;
    Ok(Visit::Prompted)
}

#[tokio::main]
async fn main() -> Result<(), FreoError> {
    freo::telemetry::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("freo-demo-sessions.json"));
    let origin = Origin::from("dapp.example");
    let account = Address::from("0xAbC0000000000000000000000000000000000001");
    let wallet = MemoryProvider::new(vec![account], "0x1");

    let first = open(&path, &wallet).await;
    println!("first visit:  {:?}", visit(&first, &origin).await?);
    drop(first);

    let second = Arc::new(open(&path, &wallet).await);
    let outcome = visit(&second, &origin).await?;
    println!("second visit: {outcome:?} (wallet on {})", wallet.chain_id());

    let watcher = tokio::spawn({
        let sessions = Arc::clone(&second);
        let subscription = wallet.events().subscribe();
        let origin = origin.clone();
        async move { sessions.watch(origin, subscription).await }
    });

    wallet.lock();
    wallet.events().close();
    if let Err(e) = watcher.await {
        tracing::error!(error = %e, "event watcher failed");
    }

    let status = second.manager().await.status(&origin);
    println!("after lock:   {status}");

    second.manager().await.clear_all_sessions().await;
    Ok(())
}
