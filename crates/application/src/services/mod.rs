mod chat_service;
mod search_service;

pub use chat_service::{
    ChatService, ChatServiceDependencies, SendMessageRequest, SendReceipt, DEFAULT_HISTORY_LIMIT,
};
pub use search_service::{
    SearchDefaults, SearchOutcome, SearchStatus, SyllabusSearchDependencies,
    SyllabusSearchService,
};
