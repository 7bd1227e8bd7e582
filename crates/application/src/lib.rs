//! 应用层实现。
//!
//! 围绕领域策略的用例服务：发送校验与扣费、频道订阅、冷却倒计时、
//! 跨科目课程搜索，以及对外部协作者（文档存储、用户存储、时钟、章节来源）的抽象。

pub mod clock;
pub mod cooldown;
pub mod error;
pub mod repository;
pub mod services;
pub mod subscription;

pub use clock::{Clock, ManualClock, SystemClock};
pub use cooldown::CooldownTicker;
pub use error::ApplicationError;
pub use repository::{
    ChapterQuery, ChapterSource, MessageStore, SendStampStore, SubjectCatalog, UserStore,
};
pub use services::{
    ChatService, ChatServiceDependencies, SearchDefaults, SearchOutcome, SearchStatus,
    SendMessageRequest, SendReceipt, SyllabusSearchDependencies, SyllabusSearchService,
    DEFAULT_HISTORY_LIMIT,
};
pub use subscription::{ChannelEvent, ChatFeed, MessageSubscription};
