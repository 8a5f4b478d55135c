use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Topic based broadcast bus. Pages register against it when they mount and
/// deregister when they go away; producers never see who is listening.
pub struct EventBus<T> {
    subscribers: Mutex<HashMap<String, Vec<(Uuid, UnboundedSender<T>)>>>,
}

/// Receiving half of a registration on an [`EventBus`].
#[derive(Debug)]
pub struct Subscription<T> {
    id: Uuid,
    topic: String,
    receiver: UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next payload. Returns `None` once the registration has
    /// been removed from the bus.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to a topic, returning a receiver for events.
    pub fn subscribe(&self, topic: &str) -> Subscription<T> {
        let (tx, rx) = unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers
            .lock()
            .entry(topic.to_string())
            .or_default()
            .push((id, tx));
        Subscription {
            id,
            topic: topic.to_string(),
            receiver: rx,
        }
    }

    /// Drop a registration. Returns false if it was already gone.
    pub fn unsubscribe(&self, topic: &str, id: Uuid) -> bool {
        let mut subscribers = self.subscribers.lock();
        let Some(list) = subscribers.get_mut(topic) else {
            return false;
        };
        let before = list.len();
        list.retain(|(sub, _)| *sub != id);
        let removed = list.len() != before;
        if list.is_empty() {
            subscribers.remove(topic);
        }
        removed
    }

    /// Publish a payload on a topic. Returns how many subscribers received it.
    pub fn publish(&self, topic: &str, payload: T) -> usize {
        let mut subscribers = self.subscribers.lock();
        match subscribers.get_mut(topic) {
            Some(list) => {
                list.retain(|(_, tx)| tx.send(payload.clone()).is_ok());
                list.len()
            }
            None => 0,
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.lock().get(topic).map_or(0, Vec::len)
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
