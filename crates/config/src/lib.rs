//! 统一配置中心
//!
//! 加载顺序：内置默认值 -> 可选配置文件（`EDU_CHAT_CONFIG`）-> 环境变量（`EDU_CHAT_*`，
//! 嵌套字段用 `__` 分隔，例如 `EDU_CHAT_CHAT__COOLDOWN_SECONDS=10`）。

use std::path::PathBuf;

use domain::ChannelSettings;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const CONFIG_FILE_ENV: &str = "EDU_CHAT_CONFIG";
pub const ENV_PREFIX: &str = "EDU_CHAT_";

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub chat: ChatConfig,
    #[serde(default)]
    #[validate(nested)]
    pub search: SearchConfig,
    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// 聊天频道配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatConfig {
    pub cooldown_seconds: u32,
    pub message_cost: u32,
    pub skip_cost: u32,
    pub offer_paid_skip: bool,
    /// 订阅时回放的历史条数
    #[validate(range(min = 1))]
    pub history_limit: usize,
    /// 实时事件广播缓冲区
    #[validate(range(min = 1))]
    pub broadcast_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let settings = ChannelSettings::default();
        Self {
            cooldown_seconds: settings.cooldown_seconds,
            message_cost: settings.message_cost,
            skip_cost: settings.skip_cost,
            offer_paid_skip: settings.offer_paid_skip,
            history_limit: 50,
            broadcast_capacity: 256,
        }
    }
}

impl ChatConfig {
    pub fn channel_settings(&self) -> ChannelSettings {
        ChannelSettings {
            cooldown_seconds: self.cooldown_seconds,
            message_cost: self.message_cost,
            skip_cost: self.skip_cost,
            offer_paid_skip: self.offer_paid_skip,
        }
    }
}

/// 课程搜索配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchConfig {
    #[validate(length(min = 1))]
    pub supported_classes: Vec<String>,
    #[validate(length(min = 1))]
    pub default_board: String,
    #[validate(length(min = 1))]
    pub default_stream: String,
    #[validate(length(min = 1))]
    pub language: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            supported_classes: ["9", "10", "11", "12"].map(String::from).to_vec(),
            default_board: "CBSE".into(),
            default_stream: "Science".into(),
            language: "English".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` 语法，`RUST_LOG` 优先
    #[validate(length(min = 1))]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 上次发送时间的 JSON 文件；为空时只保存在内存中
    pub send_stamp_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            send_stamp_path: Some(PathBuf::from(".edu-chat/send_stamps.json")),
        }
    }
}

impl AppConfig {
    /// 按 默认值 -> 配置文件 -> 环境变量 的优先级加载并校验
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        let mut fig = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
    }

    pub fn from_figment(fig: Figment) -> Result<Self, ConfigError> {
        let cfg: AppConfig = fig.extract().map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}
