use domain::{Denial, DomainError, RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("you are banned from chat")]
    Banned,
    #[error("cooldown active, wait {remaining_seconds}s")]
    CooldownActive {
        remaining_seconds: u64,
        offer_skip: bool,
    },
    #[error("insufficient credits: need {required}, have {available}")]
    InsufficientCredits { required: u32, available: u32 },
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("search failed: {0}")]
    SearchFailed(String),
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
}

impl ApplicationError {
    /// 直接展示给用户、无需重试的拒绝
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ApplicationError::Banned
                | ApplicationError::CooldownActive { .. }
                | ApplicationError::InsufficientCredits { .. }
                | ApplicationError::Domain(_)
        )
    }

    /// 用户重新点击发送即可重试的临时失败
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApplicationError::SendFailed(_) | ApplicationError::SearchFailed(_)
        )
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        match value {
            // 并发扣费时余额已被其他请求花掉
            RepositoryError::InsufficientFunds {
                required,
                available,
            } => ApplicationError::InsufficientCredits {
                required,
                available,
            },
            other => ApplicationError::Repository(other),
        }
    }
}

impl From<Denial> for ApplicationError {
    fn from(value: Denial) -> Self {
        match value {
            Denial::Banned => ApplicationError::Banned,
            Denial::InsufficientCredits {
                required,
                available,
            } => ApplicationError::InsufficientCredits {
                required,
                available,
            },
        }
    }
}
