//! Event bus for the user change feed

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::types::{EventMessage, UserEvent};

const DEFAULT_CAPACITY: usize = 256;

/// Broadcasts user events to every live subscriber. Independent of storage:
/// services publish after a successful write.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn publish(&self, event: UserEvent) {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let user_id = message.event.user_id().map(String::from);

        match self.sender.send(message) {
            Ok(count) => debug!(event_type, ?user_id, subscribers = count, "Event published"),
            Err(_) => debug!(event_type, ?user_id, "Event published (no subscribers)"),
        }
    }

    pub fn subscribe(&self) -> EventSubscriber {
        let receiver = self.sender.subscribe();
        let total = self.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(total, "New change feed subscriber");

        EventSubscriber {
            receiver,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventSubscriber {
    /// Next event; skips over lag gaps. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Change feed subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        let prev = self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        info!(remaining = prev.saturating_sub(1), "Change feed subscriber disconnected");
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserRole};

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(UserEvent::deleted("u-1"));
        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.event.user_id(), Some("u-1"));

        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_latest() {
        let bus = EventBus::with_capacity(2);
        let mut sub = bus.subscribe();
        let user = User::new("s@campus.edu", "S", UserRole::Student);
        for _ in 0..5 {
            bus.publish(UserEvent::updated(&user));
        }
        bus.publish(UserEvent::deleted(&user.id));

        let mut last = None;
        while let Ok(Some(msg)) =
            tokio::time::timeout(std::time::Duration::from_millis(50), sub.recv()).await
        {
            last = Some(msg);
        }
        assert_eq!(last.unwrap().event.event_type(), "user_deleted");
    }
}
