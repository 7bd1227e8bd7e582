//! 学习应用聊天核心领域模型
//!
//! 包含用户、频道、消息等实体，发送权限与计费策略，
//! 气泡样式映射以及课程搜索的结果类型。

pub mod bubble;
pub mod channel;
pub mod errors;
pub mod message;
pub mod policy;
pub mod syllabus;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use bubble::{badge, bubble_tier, Badge, BubbleTier};
pub use channel::Channel;
pub use errors::{DomainError, DomainResult, RepositoryError};
pub use message::{Message, NewMessage};
pub use policy::{ChannelSettings, Charge, ChatAccessPolicy, Decision, Denial, SendContext};
pub use syllabus::{Chapter, ContentKind, LessonRef, Subject};
pub use user::{AcademicProfile, SubscriptionTier, User, UserRole};
pub use value_objects::{MessageContent, MessageId, Timestamp, UserId};
