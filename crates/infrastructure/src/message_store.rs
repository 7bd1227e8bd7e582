use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use application::{ChannelEvent, MessageStore, MessageSubscription};
use async_trait::async_trait;
use domain::{Channel, Message, MessageId, NewMessage, RepositoryError};
use tokio::sync::broadcast;
use uuid::Uuid;

/// 内存文档存储，实时事件通过 tokio broadcast 扇出给订阅者。
///
/// 写入与订阅在同一把锁内完成，订阅者不会错过或重复收到快照之后的消息。
#[derive(Clone)]
pub struct InMemoryMessageStore {
    channels: Arc<RwLock<HashMap<Channel, Vec<Message>>>>,
    sender: broadcast::Sender<ChannelEvent>,
}

impl InMemoryMessageStore {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            sender,
        }
    }

    fn publish(&self, event: ChannelEvent) {
        if self.sender.receiver_count() == 0 {
            return;
        }
        // 只有在所有接收端都已退订时才会失败，可以忽略
        let _ = self.sender.send(event);
    }

    fn lock_poisoned() -> RepositoryError {
        RepositoryError::storage("message store lock poisoned")
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: NewMessage) -> Result<MessageId, RepositoryError> {
        let mut channels = self.channels.write().map_err(|_| Self::lock_poisoned())?;
        let id = MessageId::from(Uuid::new_v4());
        let stored = message.into_message(id);

        let log = channels.entry(stored.channel).or_default();
        let at = log.partition_point(|m| m.created_at <= stored.created_at);
        log.insert(at, stored.clone());

        self.publish(ChannelEvent::Appended(stored));
        Ok(id)
    }

    async fn subscribe(
        &self,
        channel: Channel,
        limit: usize,
    ) -> Result<MessageSubscription, RepositoryError> {
        let channels = self.channels.read().map_err(|_| Self::lock_poisoned())?;
        let receiver = self.sender.subscribe();
        let backlog = channels
            .get(&channel)
            .map(|log| log[log.len().saturating_sub(limit)..].to_vec())
            .unwrap_or_default();
        Ok(MessageSubscription::new(channel, backlog, receiver))
    }

    async fn remove(&self, channel: Channel, id: MessageId) -> Result<(), RepositoryError> {
        let mut channels = self.channels.write().map_err(|_| Self::lock_poisoned())?;
        let log = channels.get_mut(&channel).ok_or(RepositoryError::NotFound)?;
        let position = log
            .iter()
            .position(|m| m.id == id)
            .ok_or(RepositoryError::NotFound)?;
        log.remove(position);

        self.publish(ChannelEvent::Removed { channel, id });
        Ok(())
    }
}
