//! 频道订阅与客户端消息视图
//!
//! 订阅先回放历史，再转发实时事件；`ChatFeed` 把事件折叠成按时间升序的消息列表。

use std::collections::VecDeque;

use domain::{Channel, Message, MessageId};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    Appended(Message),
    Removed { channel: Channel, id: MessageId },
}

impl ChannelEvent {
    pub fn channel(&self) -> Channel {
        match self {
            ChannelEvent::Appended(message) => message.channel,
            ChannelEvent::Removed { channel, .. } => *channel,
        }
    }
}

/// 可取消的有序订阅。丢弃或调用 `unsubscribe` 即退订。
pub struct MessageSubscription {
    channel: Channel,
    backlog: VecDeque<Message>,
    receiver: Option<broadcast::Receiver<ChannelEvent>>,
}

impl MessageSubscription {
    pub fn new(
        channel: Channel,
        mut backlog: Vec<Message>,
        receiver: broadcast::Receiver<ChannelEvent>,
    ) -> Self {
        backlog.sort_by_key(|message| message.created_at);
        Self {
            channel,
            backlog: backlog.into(),
            receiver: Some(receiver),
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some() || !self.backlog.is_empty()
    }

    /// 下一条属于本频道的事件；存储关闭或已退订时返回 `None`
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        if let Some(message) = self.backlog.pop_front() {
            return Some(ChannelEvent::Appended(message));
        }

        let channel = self.channel;
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) if event.channel() == channel => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %channel, skipped, "订阅落后，跳过部分实时事件");
                }
                Err(RecvError::Closed) => break,
            }
        }
        self.receiver = None;
        None
    }

    /// 非阻塞版本：当前没有可读事件时返回 `None`
    pub fn try_next_event(&mut self) -> Option<ChannelEvent> {
        if let Some(message) = self.backlog.pop_front() {
            return Some(ChannelEvent::Appended(message));
        }

        let channel = self.channel;
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.try_recv() {
                Ok(event) if event.channel() == channel => return Some(event),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %channel, skipped, "订阅落后，跳过部分实时事件");
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => break,
            }
        }
        self.receiver = None;
        None
    }

    /// 显式退订：丢弃未读历史并断开实时接收端，之后不再产生事件
    pub fn unsubscribe(&mut self) {
        self.backlog.clear();
        if self.receiver.take().is_some() {
            tracing::debug!(channel = %self.channel, "退订频道");
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = ChannelEvent> {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .next_event()
                .await
                .map(|event| (event, subscription))
        })
    }
}

/// 客户端渲染用的消息列表，始终按时间戳非递减排列
#[derive(Debug, Clone, Default)]
pub struct ChatFeed {
    messages: Vec<Message>,
    capacity: Option<usize>,
}

impl ChatFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// 超出容量时丢弃最旧的消息
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Vec::new(),
            capacity: Some(capacity),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// 应用一条事件，返回视图是否发生变化
    pub fn apply(&mut self, event: ChannelEvent) -> bool {
        match event {
            ChannelEvent::Appended(message) => {
                if self.messages.iter().any(|m| m.id == message.id) {
                    return false;
                }
                let at = self
                    .messages
                    .partition_point(|m| m.created_at <= message.created_at);
                self.messages.insert(at, message);
                if let Some(capacity) = self.capacity {
                    let overflow = self.messages.len().saturating_sub(capacity);
                    self.messages.drain(..overflow);
                }
                true
            }
            ChannelEvent::Removed { id, .. } => {
                let before = self.messages.len();
                self.messages.retain(|m| m.id != id);
                before != self.messages.len()
            }
        }
    }
}
