use std::fmt;

use serde::{Deserialize, Serialize};

use crate::user::User;
use crate::value_objects::UserId;

/// 聊天频道：公共广播频道，或学生与管理员之间的私有客服线程。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Channel {
    Public,
    Support { thread: UserId },
}

impl Channel {
    /// 学生自己的客服线程
    pub fn support_for(user_id: UserId) -> Self {
        Channel::Support { thread: user_id }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Channel::Public)
    }

    /// 文档存储中的集合名
    pub fn collection(&self) -> &'static str {
        match self {
            Channel::Public => "universal_chat",
            Channel::Support { .. } => "support_messages",
        }
    }

    /// 客服线程只对线程所属学生和管理人员开放
    pub fn is_accessible_by(&self, user: &User) -> bool {
        match self {
            Channel::Public => true,
            Channel::Support { thread } => *thread == user.id || user.role.is_staff(),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Public => write!(f, "universal_chat"),
            Channel::Support { thread } => write!(f, "support_messages/{thread}"),
        }
    }
}
