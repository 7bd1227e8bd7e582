//! 领域模型错误定义
//!
//! 定义了领域层与仓储层可能出现的错误类型。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 权限错误
    #[error("permission denied: {action}")]
    PermissionDenied { action: String },

    /// 资源不存在错误
    #[error("{resource_type} not found: {resource_id}")]
    ResourceNotFound {
        resource_type: String,
        resource_id: String,
    },

    /// 验证错误
    #[error("invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    /// 余额不足
    #[error("insufficient credits: need {required}, have {available}")]
    InsufficientFunds { required: u32, available: u32 },
}

impl DomainError {
    /// 创建验证错误
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建权限错误
    pub fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
        }
    }

    /// 创建资源不存在错误
    pub fn resource_not_found(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 仓储（外部文档存储/用户存储）错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    Conflict,

    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u32, available: u32 },

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<DomainError> for RepositoryError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InsufficientFunds {
                required,
                available,
            } => RepositoryError::InsufficientFunds {
                required,
                available,
            },
            DomainError::ResourceNotFound { .. } => RepositoryError::NotFound,
            other => RepositoryError::storage(other.to_string()),
        }
    }
}
