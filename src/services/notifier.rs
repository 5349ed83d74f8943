use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RideEvent {
    #[serde(rename = "new-ride")]
    NewRide,
    #[serde(rename = "ride-confirmed")]
    RideConfirmed,
    #[serde(rename = "ride-started")]
    RideStarted,
    #[serde(rename = "ride-ended")]
    RideEnded,
    #[serde(rename = "ride-cancelled")]
    RideCancelled,
}

impl RideEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            RideEvent::NewRide => "new-ride",
            RideEvent::RideConfirmed => "ride-confirmed",
            RideEvent::RideStarted => "ride-started",
            RideEvent::RideEnded => "ride-ended",
            RideEvent::RideCancelled => "ride-cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub event: RideEvent,
    pub data: serde_json::Value,
}

/// Pushes lifecycle events to an actor's live connection. Fire-and-forget:
/// delivery failures are logged, never returned.
pub trait Notifier: Send + Sync {
    fn send(&self, actor_id: Uuid, event: RideEvent, payload: serde_json::Value);
}

/// Records events in the log only; used when no push transport is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, actor_id: Uuid, event: RideEvent, _payload: serde_json::Value) {
        tracing::info!(actor_id = %actor_id, event = event.as_str(), "Ride event");
    }
}

/// In-process fan-out to subscribers registered per actor.
#[derive(Debug, Default)]
pub struct ChannelNotifier {
    subscribers: RwLock<HashMap<Uuid, mpsc::UnboundedSender<Notification>>>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous subscription for the actor.
    pub fn subscribe(&self, actor_id: Uuid) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.subscribers.write() {
            subscribers.insert(actor_id, tx);
        }
        rx
    }

    pub fn unsubscribe(&self, actor_id: Uuid) {
        if let Ok(mut subscribers) = self.subscribers.write() {
            subscribers.remove(&actor_id);
        }
    }

    /// Drops the actor's entry only while it still holds `stale`, so a
    /// subscription made in the meantime survives.
    fn remove_closed(&self, actor_id: Uuid, stale: &mpsc::UnboundedSender<Notification>) {
        if let Ok(mut subscribers) = self.subscribers.write() {
            if subscribers
                .get(&actor_id)
                .is_some_and(|current| current.same_channel(stale))
            {
                subscribers.remove(&actor_id);
            }
        }
    }
}

impl Notifier for ChannelNotifier {
    fn send(&self, actor_id: Uuid, event: RideEvent, payload: serde_json::Value) {
        let sender = match self.subscribers.read() {
            Ok(subscribers) => subscribers.get(&actor_id).cloned(),
            Err(_) => None,
        };

        match sender {
            Some(tx) => {
                if tx.send(Notification { event, data: payload }).is_err() {
                    tracing::debug!(actor_id = %actor_id, event = event.as_str(), "Subscriber gone, dropping event");
                    self.remove_closed(actor_id, &tx);
                }
            }
            None => {
                tracing::debug!(actor_id = %actor_id, event = event.as_str(), "No live connection for actor");
            }
        }
    }
}
