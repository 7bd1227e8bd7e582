//! 用户实体定义
//!
//! 聊天策略只关心角色、会员状态、积分余额和禁言标记；
//! 学业档案（年级、考试局、分科）供课程搜索使用。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::UserId;

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Student,
    SubAdmin,
    Admin,
}

impl UserRole {
    /// 管理人员（子管理员或管理员）
    pub fn is_staff(self) -> bool {
        matches!(self, UserRole::SubAdmin | UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "STUDENT"),
            UserRole::SubAdmin => write!(f, "SUB_ADMIN"),
            UserRole::Admin => write!(f, "ADMIN"),
        }
    }
}

/// 订阅等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Basic,
    Ultra,
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionTier::Free => write!(f, "FREE"),
            SubscriptionTier::Basic => write!(f, "BASIC"),
            SubscriptionTier::Ultra => write!(f, "ULTRA"),
        }
    }
}

/// 学业档案，字段缺失时由搜索服务套用默认值
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AcademicProfile {
    pub class_level: Option<String>,
    pub board: Option<String>,
    pub stream: Option<String>,
}

/// 用户实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
    pub is_premium: bool,
    pub subscription: SubscriptionTier,
    /// 积分余额，永不为负
    pub credits: u32,
    pub is_chat_banned: bool,
    #[serde(default)]
    pub profile: AcademicProfile,
}

impl User {
    /// 创建免费学生账号
    pub fn student(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: UserRole::Student,
            is_premium: false,
            subscription: SubscriptionTier::Free,
            credits: 0,
            is_chat_banned: false,
            profile: AcademicProfile::default(),
        }
    }

    /// 创建管理人员账号
    pub fn staff(id: UserId, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            role,
            ..Self::student(id, name)
        }
    }

    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = credits;
        self
    }

    pub fn with_subscription(mut self, tier: SubscriptionTier, is_premium: bool) -> Self {
        self.subscription = tier;
        self.is_premium = is_premium;
        self
    }

    pub fn with_profile(mut self, profile: AcademicProfile) -> Self {
        self.profile = profile;
        self
    }

    /// 受冷却与消息计费约束的用户：非会员学生
    pub fn is_metered(&self) -> bool {
        self.role == UserRole::Student && !self.is_premium
    }

    /// 按增量调整积分；扣减超过余额时返回 `InsufficientFunds` 且不修改余额
    pub fn apply_credit_delta(&mut self, delta: i64) -> DomainResult<u32> {
        let next = i64::from(self.credits) + delta;
        if next < 0 {
            let required = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
            return Err(DomainError::InsufficientFunds {
                required,
                available: self.credits,
            });
        }
        self.credits = u32::try_from(next)
            .map_err(|_| DomainError::validation_error("credits", "balance overflow"))?;
        Ok(self.credits)
    }
}
