//! Integration tests for `WalletSessions`: manual connect, silent
//! reconnect across restarts, and keeping sessions in step with wallet
//! events.

use std::sync::Arc;
use std::time::Duration;

use freo::prelude::*;
use tempfile::TempDir;
use tokio::sync::Notify;

const START: u64 = 1_700_000_000_000;

type Sessions = WalletSessions<MemoryStore, ProviderConnector<MemoryProvider>, ManualClock>;

// =========================================================================
// Helpers
// =========================================================================

fn dapp() -> Origin {
    Origin::from("dapp.example")
}

fn wallet_on(account: &str) -> MemoryProvider {
    MemoryProvider::new(vec![Address::from(account)], "0x1")
}

async fn sessions(store: MemoryStore, wallet: &MemoryProvider, clock: &ManualClock) -> Sessions {
    WalletSessions::builder()
        .clock(clock.clone())
        .build(store, ProviderConnector::new(wallet.clone()))
        .await
}

/// A wallet on `0xABC` whose `connect` waits until the test releases it.
#[derive(Default)]
struct GatedWallet {
    entered: Notify,
    release: Notify,
}

impl WalletConnector for GatedWallet {
    async fn connect(&self) -> Result<(), ConnectorError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }

    async fn get_address(&self) -> Result<Address, ConnectorError> {
        Ok(Address::from("0xABC"))
    }

    async fn switch_network(&self, _chain_id: &ChainId) -> Result<(), ConnectorError> {
        Ok(())
    }
}

// =========================================================================
// authorize() / on_page_load()
// =========================================================================

#[tokio::test]
async fn test_authorize_records_wallet_account() {
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);
    let s = sessions(MemoryStore::new(), &wallet, &clock).await;

    let session = s
        .authorize("dapp.example", "0x1", SessionOptions::default().name("Example"))
        .await
        .unwrap();

    assert_eq!(session.address, Address::from("0xABC"));
    assert_eq!(session.name.as_deref(), Some("Example"));
    assert_eq!(s.manager().await.status(&dapp()), SessionStatus::Active);
}

#[tokio::test]
async fn test_authorize_rejected_surfaces_error_and_stores_nothing() {
    let wallet = wallet_on("0xABC");
    wallet.reject_requests(true);
    let clock = ManualClock::new(START);
    let store = MemoryStore::new();
    let s = sessions(store.clone(), &wallet, &clock).await;

    let result = s.authorize("dapp.example", "0x1", SessionOptions::default()).await;

    assert!(matches!(
        result,
        Err(FreoError::Connector(ConnectorError::UserRejected))
    ));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_authorize_without_wallet_is_no_provider() {
    let s = WalletSessions::builder()
        .build(MemoryStore::new(), OptionalProvider::<MemoryProvider>::absent())
        .await;

    let result = s.authorize("dapp.example", "0x1", SessionOptions::default()).await;

    assert!(matches!(result, Err(FreoError::Connector(ConnectorError::NoProvider))));
}

#[tokio::test]
async fn test_page_reload_reconnects_silently() {
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);
    let store = MemoryStore::new();
    sessions(store.clone(), &wallet, &clock)
        .await
        .authorize("dapp.example", "0x1", SessionOptions::default())
        .await
        .unwrap();

    clock.advance(Duration::from_secs(600));
    let reloaded = sessions(store, &wallet, &clock).await;

    assert!(reloaded.on_page_load(&dapp()).await);
}

#[tokio::test]
async fn test_page_load_after_ttl_needs_manual_connect() {
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);
    let store = MemoryStore::new();
    sessions(store.clone(), &wallet, &clock)
        .await
        .authorize("dapp.example", "0x1", SessionOptions::default())
        .await
        .unwrap();

    clock.advance(DEFAULT_SESSION_TTL);
    let reloaded = sessions(store, &wallet, &clock).await;

    assert!(!reloaded.on_page_load(&dapp()).await);
}

#[tokio::test]
async fn test_page_load_applies_network_preference() {
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);
    let s = sessions(MemoryStore::new(), &wallet, &clock).await;
    s.authorize("dapp.example", "0x1", SessionOptions::default())
        .await
        .unwrap();
    s.manager().await.set_network_preference("0x1", "0xa").await;

    assert!(s.on_page_load(&dapp()).await);
    assert_eq!(wallet.chain_id(), ChainId::from("0xa"));
}

#[tokio::test]
async fn test_disconnect_then_page_load_is_false() {
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);
    let s = sessions(MemoryStore::new(), &wallet, &clock).await;
    s.authorize("dapp.example", "0x1", SessionOptions::default())
        .await
        .unwrap();

    s.disconnect(&dapp()).await;
    s.disconnect(&dapp()).await;

    assert!(!s.on_page_load(&dapp()).await);
}

#[tokio::test]
async fn test_disconnect_during_page_load_is_not_blocked() {
    let s = WalletSessions::builder()
        .clock(ManualClock::new(START))
        .build(MemoryStore::new(), GatedWallet::default())
        .await;
    let s = Arc::new(s);
    s.manager()
        .await
        .create_or_update_session("dapp.example", "0xABC", "0x1", SessionOptions::default())
        .await;

    let page_load = tokio::spawn({
        let s = Arc::clone(&s);
        async move { s.on_page_load(&dapp()).await }
    });
    s.connector().entered.notified().await;

    let disconnect = tokio::time::timeout(Duration::from_secs(1), s.disconnect(&dapp())).await;
    assert!(disconnect.is_ok(), "disconnect waited for the wallet");

    s.connector().release.notify_one();
    assert!(!page_load.await.unwrap());
    assert_eq!(s.manager().await.status(&dapp()), SessionStatus::Unauthorized);
}

// =========================================================================
// apply_event() / watch()
// =========================================================================

#[tokio::test]
async fn test_apply_chain_changed_updates_session() {
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);
    let s = sessions(MemoryStore::new(), &wallet, &clock).await;
    s.authorize("dapp.example", "0x1", SessionOptions::default())
        .await
        .unwrap();

    s.apply_event(&dapp(), &ProviderEvent::ChainChanged("0x89".into()))
        .await;

    let manager = s.manager().await;
    assert_eq!(manager.get_session(&dapp()).unwrap().chain_id, ChainId::from("0x89"));
}

#[tokio::test]
async fn test_apply_account_switch_is_ignored() {
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);
    let s = sessions(MemoryStore::new(), &wallet, &clock).await;
    s.authorize("dapp.example", "0x1", SessionOptions::default())
        .await
        .unwrap();

    s.apply_event(
        &dapp(),
        &ProviderEvent::AccountsChanged(vec![Address::from("0xDEF")]),
    )
    .await;

    assert!(s.manager().await.is_session_valid(&dapp()));
}

#[tokio::test]
async fn test_watch_follows_wallet_until_bus_closes() {
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);
    let s = Arc::new(sessions(MemoryStore::new(), &wallet, &clock).await);
    s.authorize("dapp.example", "0x1", SessionOptions::default())
        .await
        .unwrap();

    let subscription = wallet.events().subscribe();
    let watcher = tokio::spawn({
        let s = Arc::clone(&s);
        async move { s.watch(dapp(), subscription).await }
    });
    assert_eq!(wallet.events().listener_count(), 1);

    s.connector()
        .switch_network(&ChainId::from("0x89"))
        .await
        .unwrap();
    wallet.events().close();
    watcher.await.unwrap();

    let manager = s.manager().await;
    assert_eq!(manager.get_session(&dapp()).unwrap().chain_id, ChainId::from("0x89"));
}

#[tokio::test]
async fn test_watch_removes_session_when_wallet_locks() {
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);
    let s = Arc::new(sessions(MemoryStore::new(), &wallet, &clock).await);
    s.authorize("dapp.example", "0x1", SessionOptions::default())
        .await
        .unwrap();

    let subscription = wallet.events().subscribe();
    let watcher = tokio::spawn({
        let s = Arc::clone(&s);
        async move { s.watch(dapp(), subscription).await }
    });

    wallet.lock();
    wallet.events().close();
    watcher.await.unwrap();

    assert_eq!(s.manager().await.status(&dapp()), SessionStatus::Unauthorized);
    assert!(!s.on_page_load(&dapp()).await);
}

#[tokio::test]
async fn test_aborted_watch_unsubscribes() {
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);
    let s = Arc::new(sessions(MemoryStore::new(), &wallet, &clock).await);

    let subscription = wallet.events().subscribe();
    let watcher = tokio::spawn({
        let s = Arc::clone(&s);
        async move { s.watch(dapp(), subscription).await }
    });

    watcher.abort();
    let _ = watcher.await;

    assert_eq!(wallet.events().listener_count(), 0);
}

// =========================================================================
// FileStore
// =========================================================================

#[tokio::test]
async fn test_sessions_survive_process_restart_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("freo.json");
    let wallet = wallet_on("0xABC");
    let clock = ManualClock::new(START);

    {
        let s = WalletSessions::builder()
            .clock(clock.clone())
            .build(FileStore::new(&path), ProviderConnector::new(wallet.clone()))
            .await;
        s.authorize("dapp.example", "0x1", SessionOptions::default())
            .await
            .unwrap();
    }

    let s = WalletSessions::builder()
        .clock(clock)
        .build(FileStore::new(&path), ProviderConnector::new(wallet))
        .await;
    assert!(s.on_page_load(&dapp()).await);
}
