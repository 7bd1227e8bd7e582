//! 消息气泡样式
//!
//! 由发送者角色与订阅等级决定的纯映射，不参与发送判定。

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::user::{SubscriptionTier, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BubbleTier {
    Gold,
    Purple,
    Cyan,
    Slate,
    Plain,
}

/// 气泡角标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    /// 非学生显示角色名
    Role(UserRole),
    /// 付费学生显示订阅等级
    Plan(SubscriptionTier),
}

pub fn bubble_tier(role: UserRole, plan: SubscriptionTier) -> BubbleTier {
    match (role, plan) {
        (UserRole::Admin, _) => BubbleTier::Gold,
        (UserRole::SubAdmin, _) => BubbleTier::Purple,
        (_, SubscriptionTier::Ultra) => BubbleTier::Cyan,
        (_, SubscriptionTier::Basic) => BubbleTier::Slate,
        _ => BubbleTier::Plain,
    }
}

pub fn badge(role: UserRole, plan: SubscriptionTier) -> Option<Badge> {
    match (role, plan) {
        (UserRole::Student, SubscriptionTier::Free) => None,
        (UserRole::Student, plan) => Some(Badge::Plan(plan)),
        (role, _) => Some(Badge::Role(role)),
    }
}

impl Message {
    pub fn bubble_tier(&self) -> BubbleTier {
        bubble_tier(self.sender_role, self.sender_plan)
    }

    pub fn badge(&self) -> Option<Badge> {
        badge(self.sender_role, self.sender_plan)
    }
}
