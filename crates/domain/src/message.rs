use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::user::{SubscriptionTier, User, UserRole};
use crate::value_objects::{MessageContent, MessageId, Timestamp, UserId};

/// 尚未写入存储的消息草稿；写入后由存储分配 `MessageId`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub channel: Channel,
    pub text: MessageContent,
    pub sender_id: UserId,
    pub sender_name: String,
    pub sender_role: UserRole,
    /// 发送时的订阅等级，仅用于气泡样式
    pub sender_plan: SubscriptionTier,
    pub created_at: Timestamp,
}

impl NewMessage {
    pub fn compose(sender: &User, channel: Channel, text: MessageContent, now: Timestamp) -> Self {
        Self {
            channel,
            text,
            sender_id: sender.id,
            sender_name: sender.name.clone(),
            sender_role: sender.role,
            sender_plan: sender.subscription,
            created_at: now,
        }
    }

    pub fn into_message(self, id: MessageId) -> Message {
        Message {
            id,
            channel: self.channel,
            text: self.text,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            sender_role: self.sender_role,
            sender_plan: self.sender_plan,
            created_at: self.created_at,
        }
    }
}

/// 已持久化的聊天消息。创建后不可变，按时间戳升序排列。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub channel: Channel,
    pub text: MessageContent,
    pub sender_id: UserId,
    pub sender_name: String,
    pub sender_role: UserRole,
    pub sender_plan: SubscriptionTier,
    pub created_at: Timestamp,
}
