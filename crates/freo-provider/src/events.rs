//! Event side of an injected wallet provider.
//!
//! Wallets notify the page when the selected account or chain changes, or
//! when they connect or disconnect. [`EventBus`] fans those notifications
//! out to any number of [`Subscription`]s. A subscription removes itself
//! from the bus when dropped, so listeners never outlive their owner.
//!
//! ```text
//! wallet ──emit()──→ EventBus ──┬──→ Subscription (session watcher)
//!                               └──→ Subscription (UI)
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use freo_protocol::{Address, ChainId};
use serde_json::Value;
use tokio::sync::mpsc;

/// A notification from the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The exposed accounts changed. Empty means the page lost access.
    AccountsChanged(Vec<Address>),
    /// The wallet switched to another chain.
    ChainChanged(ChainId),
    /// The provider can now serve requests on `chain_id`.
    Connect { chain_id: ChainId },
    /// The provider lost connection to every chain.
    Disconnect { code: i64, message: String },
}

impl ProviderEvent {
    /// The name the provider emits this event under.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::AccountsChanged(_) => "accountsChanged",
            Self::ChainChanged(_) => "chainChanged",
            Self::Connect { .. } => "connect",
            Self::Disconnect { .. } => "disconnect",
        }
    }

    /// Builds an event from a provider callback's name and payload.
    ///
    /// Returns `None` for unknown event names or payloads of the wrong
    /// shape.
    pub fn from_payload(name: &str, payload: Value) -> Option<Self> {
        match name {
            "accountsChanged" => serde_json::from_value(payload).ok().map(Self::AccountsChanged),
            "chainChanged" => serde_json::from_value(payload).ok().map(Self::ChainChanged),
            "connect" => {
                let chain_id = payload.get("chainId")?.as_str()?;
                Some(Self::Connect {
                    chain_id: ChainId::from(chain_id),
                })
            }
            "disconnect" => Some(Self::Disconnect {
                code: payload.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Listeners {
    next_id: u64,
    senders: HashMap<u64, mpsc::UnboundedSender<ProviderEvent>>,
}

fn lock(listeners: &Mutex<Listeners>) -> MutexGuard<'_, Listeners> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fans provider events out to subscribers.
///
/// Cloning the bus clones the handle; every clone emits to the same
/// subscribers.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<Listeners>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new listener.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.senders.insert(id, tx);
        tracing::debug!(id, "provider listener added");

        Subscription {
            id,
            receiver: rx,
            bus: Arc::downgrade(&self.listeners),
        }
    }

    /// Delivers `event` to every live subscriber. Returns how many
    /// received it.
    pub fn emit(&self, event: ProviderEvent) -> usize {
        let mut listeners = lock(&self.listeners);
        listeners
            .senders
            .retain(|_, tx| tx.send(event.clone()).is_ok());
        let delivered = listeners.senders.len();
        tracing::debug!(event = event.event_name(), delivered, "provider event emitted");
        delivered
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).senders.len()
    }

    /// Disconnects every subscriber. Their `recv()` returns `None` once
    /// queued events are drained.
    pub fn close(&self) {
        lock(&self.listeners).senders.clear();
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// A registered listener. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<ProviderEvent>,
    bus: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Waits for the next event. Returns `None` once the bus is closed or
    /// dropped.
    pub async fn recv(&mut self) -> Option<ProviderEvent> {
        self.receiver.recv().await
    }

    /// Returns the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ProviderEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.bus.upgrade() {
            lock(&listeners).senders.remove(&self.id);
            tracing::debug!(id = self.id, "provider listener removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_event_names_match_provider_api() {
        assert_eq!(ProviderEvent::AccountsChanged(vec![]).event_name(), "accountsChanged");
        assert_eq!(ProviderEvent::ChainChanged("0x1".into()).event_name(), "chainChanged");
        assert_eq!(
            ProviderEvent::Connect { chain_id: "0x1".into() }.event_name(),
            "connect"
        );
        assert_eq!(
            ProviderEvent::Disconnect { code: 4900, message: String::new() }.event_name(),
            "disconnect"
        );
    }

    #[test]
    fn test_from_payload_parses_known_events() {
        assert_eq!(
            ProviderEvent::from_payload("accountsChanged", json!(["0xABC"])),
            Some(ProviderEvent::AccountsChanged(vec![Address::from("0xABC")]))
        );
        assert_eq!(
            ProviderEvent::from_payload("chainChanged", json!("0x89")),
            Some(ProviderEvent::ChainChanged(ChainId::from("0x89")))
        );
        assert_eq!(
            ProviderEvent::from_payload("connect", json!({ "chainId": "0x1" })),
            Some(ProviderEvent::Connect { chain_id: ChainId::from("0x1") })
        );
        assert_eq!(
            ProviderEvent::from_payload("disconnect", json!({ "code": 4900, "message": "gone" })),
            Some(ProviderEvent::Disconnect { code: 4900, message: "gone".into() })
        );
    }

    #[test]
    fn test_from_payload_rejects_unknown_or_malformed() {
        assert_eq!(ProviderEvent::from_payload("message", json!({})), None);
        assert_eq!(ProviderEvent::from_payload("chainChanged", json!(1)), None);
        assert_eq!(ProviderEvent::from_payload("connect", json!({})), None);
    }

    #[tokio::test]
    async fn test_emit_reaches_every_subscriber() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        let delivered = bus.emit(ProviderEvent::ChainChanged("0x89".into()));

        assert_eq!(delivered, 2);
        assert_eq!(a.recv().await, Some(ProviderEvent::ChainChanged("0x89".into())));
        assert_eq!(b.recv().await, Some(ProviderEvent::ChainChanged("0x89".into())));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        let _other = bus.subscribe();
        assert_eq!(bus.listener_count(), 2);

        drop(sub);

        assert_eq!(bus.listener_count(), 1);
        assert_eq!(bus.emit(ProviderEvent::AccountsChanged(vec![])), 1);
    }

    #[tokio::test]
    async fn test_close_ends_subscriptions_after_queued_events() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        bus.emit(ProviderEvent::ChainChanged("0x1".into()));

        bus.close();

        assert_eq!(sub.recv().await, Some(ProviderEvent::ChainChanged("0x1".into())));
        assert_eq!(sub.recv().await, None);
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_outliving_bus_ends() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();

        drop(bus);

        assert_eq!(sub.recv().await, None);
        drop(sub);
    }

    #[test]
    fn test_try_recv_empty_is_none() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        assert_eq!(sub.try_recv(), None);
        bus.emit(ProviderEvent::Connect { chain_id: "0x1".into() });
        assert!(sub.try_recv().is_some());
    }
}
