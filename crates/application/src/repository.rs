use async_trait::async_trait;
use domain::{
    Channel, Chapter, MessageId, NewMessage, RepositoryError, Subject, Timestamp, User, UserId,
};

use crate::subscription::MessageSubscription;

/// 外部文档存储：追加写入、按时间升序订阅、删除
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// 写入消息草稿（频道取自草稿本身），返回存储分配的 ID
    async fn append(&self, message: NewMessage) -> Result<MessageId, RepositoryError>;

    /// 订阅频道：先回放最近 `limit` 条历史，再推送实时事件
    async fn subscribe(
        &self,
        channel: Channel,
        limit: usize,
    ) -> Result<MessageSubscription, RepositoryError>;

    async fn remove(&self, channel: Channel, id: MessageId) -> Result<(), RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn save(&self, user: User) -> Result<User, RepositoryError>;

    /// 原子地调整积分（读-改-写在一次调用内完成）；余额不足时返回
    /// `RepositoryError::InsufficientFunds` 且不修改记录
    async fn update_credits(&self, id: UserId, delta: i64) -> Result<User, RepositoryError>;
}

/// 每个用户上次公共发言时间的本地存储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SendStampStore: Send + Sync {
    async fn last_public_send(&self, user_id: UserId) -> Result<Option<Timestamp>, RepositoryError>;

    async fn record_public_send(&self, user_id: UserId, at: Timestamp)
        -> Result<(), RepositoryError>;
}

/// 按年级与分科列出科目
pub trait SubjectCatalog: Send + Sync {
    fn subjects(&self, class_level: &str, stream: &str) -> Vec<Subject>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterQuery {
    pub board: String,
    pub class_level: String,
    pub stream: String,
    pub subject: Subject,
    pub language: String,
}

/// 章节目录来源（内容生成服务或其缓存）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChapterSource: Send + Sync {
    async fn fetch_chapters(&self, query: ChapterQuery) -> Result<Vec<Chapter>, RepositoryError>;
}
