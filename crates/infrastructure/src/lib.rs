//! 基础设施层实现。
//!
//! 提供内存文档存储、用户积分存储、发送时间戳存储以及课程目录等适配器，
//! 实现应用层定义的接口。

pub mod catalog;
pub mod chapters;
pub mod message_store;
pub mod send_stamps;
pub mod user_store;

pub use catalog::StaticSubjectCatalog;
pub use chapters::InMemoryChapterSource;
pub use message_store::InMemoryMessageStore;
pub use send_stamps::{InMemorySendStampStore, JsonFileSendStampStore};
pub use user_store::InMemoryUserStore;
