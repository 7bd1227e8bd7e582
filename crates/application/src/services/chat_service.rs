use std::sync::Arc;

use domain::{
    Channel, Charge, ChatAccessPolicy, Decision, DomainError, Message, MessageContent, MessageId,
    NewMessage, SendContext, Timestamp, User, UserId, UserRole,
};

use crate::{
    clock::Clock,
    cooldown::CooldownTicker,
    error::ApplicationError,
    repository::{MessageStore, SendStampStore, UserStore},
    subscription::MessageSubscription,
};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub sender_id: UserId,
    pub channel: Channel,
    pub text: String,
    /// 用户已确认付费跳过冷却
    pub accept_skip: bool,
}

#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message: Message,
    pub charge: Charge,
    pub credits_remaining: u32,
    /// 公共频道发送成功后界面冷却显示重置为该秒数
    pub cooldown_reset: Option<u32>,
}

pub struct ChatServiceDependencies {
    pub message_store: Arc<dyn MessageStore>,
    pub user_store: Arc<dyn UserStore>,
    pub send_stamps: Arc<dyn SendStampStore>,
    pub clock: Arc<dyn Clock>,
    pub policy: ChatAccessPolicy,
    pub history_limit: usize,
}

pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    pub fn policy(&self) -> &ChatAccessPolicy {
        &self.deps.policy
    }

    async fn load_user(&self, user_id: UserId) -> Result<User, ApplicationError> {
        self.deps
            .user_store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::resource_not_found("user", user_id.to_string()).into())
    }

    fn check_channel_access(user: &User, channel: Channel) -> Result<(), ApplicationError> {
        if channel.is_accessible_by(user) {
            Ok(())
        } else {
            Err(DomainError::permission_denied(format!("access {channel}")).into())
        }
    }

    /// 只有受冷却约束的发送才读取上次发送时间；读取失败按发送失败处理
    async fn last_public_send(
        &self,
        user: &User,
        channel: Channel,
    ) -> Result<Option<Timestamp>, ApplicationError> {
        if !(channel.is_public() && user.is_metered()) {
            return Ok(None);
        }
        self.deps
            .send_stamps
            .last_public_send(user.id)
            .await
            .map_err(|err| {
                tracing::error!(user_id = %user.id, error = %err, "读取上次发送时间失败");
                ApplicationError::SendFailed(err.to_string())
            })
    }

    /// 不产生副作用地预判一次发送，用于驱动冷却显示与付费跳过提示
    pub async fn preview(
        &self,
        sender_id: UserId,
        channel: Channel,
    ) -> Result<Decision, ApplicationError> {
        let user = self.load_user(sender_id).await?;
        let last_public_send = self.last_public_send(&user, channel).await?;
        let ctx = SendContext {
            user: &user,
            channel,
            now: self.deps.clock.now(),
            last_public_send,
        };
        Ok(self.deps.policy.evaluate(&ctx))
    }

    pub async fn send_message(
        &self,
        request: SendMessageRequest,
    ) -> Result<SendReceipt, ApplicationError> {
        let content = MessageContent::new(request.text)?;
        let user = self.load_user(request.sender_id).await?;
        // 禁言优先于频道权限，任何发送尝试都得到同一个拒绝原因
        if user.is_chat_banned {
            tracing::debug!(user_id = %user.id, channel = %request.channel, "禁言用户尝试发送");
            return Err(ApplicationError::Banned);
        }
        Self::check_channel_access(&user, request.channel)?;

        let last_public_send = self.last_public_send(&user, request.channel).await?;
        // 发送时重新读取时钟，不依赖界面上可能过期的倒计时
        let now = self.deps.clock.now();
        let ctx = SendContext {
            user: &user,
            channel: request.channel,
            now,
            last_public_send,
        };
        let decision = if request.accept_skip {
            self.deps.policy.confirm_skip(&ctx)
        } else {
            self.deps.policy.evaluate(&ctx)
        };

        let charge = match decision {
            Decision::Allowed(charge) => charge,
            Decision::CooldownActive {
                remaining_seconds,
                offer_skip,
            } => {
                tracing::debug!(user_id = %user.id, remaining_seconds, "冷却中，拒绝发送");
                return Err(ApplicationError::CooldownActive {
                    remaining_seconds,
                    offer_skip,
                });
            }
            Decision::Denied(denial) => {
                tracing::debug!(user_id = %user.id, ?denial, "发送被策略拒绝");
                return Err(denial.into());
            }
        };

        let mut credits_remaining = user.credits;
        if !charge.is_free() {
            // 单次原子扣款，连续快速点击不会重复消费
            let updated = self
                .deps
                .user_store
                .update_credits(user.id, -i64::from(charge.total()))
                .await?;
            credits_remaining = updated.credits;
        }

        let draft = NewMessage::compose(&user, request.channel, content, now);
        let message_id = match self.deps.message_store.append(draft.clone()).await {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(
                    user_id = %user.id,
                    channel = %request.channel,
                    error = %err,
                    "消息写入失败"
                );
                self.refund(user.id, charge).await;
                return Err(ApplicationError::SendFailed(err.to_string()));
            }
        };

        let cooldown_reset = if request.channel.is_public() {
            // 消息已写入，时间戳记录失败只影响下一次冷却计算
            if let Err(err) = self
                .deps
                .send_stamps
                .record_public_send(user.id, now)
                .await
            {
                tracing::warn!(user_id = %user.id, error = %err, "记录发送时间失败");
            }
            Some(self.deps.policy.settings().cooldown_seconds)
        } else {
            None
        };

        tracing::info!(
            user_id = %user.id,
            channel = %request.channel,
            message_id = %message_id,
            charged = charge.total(),
            "消息已发送"
        );

        Ok(SendReceipt {
            message: draft.into_message(message_id),
            charge,
            credits_remaining,
            cooldown_reset,
        })
    }

    async fn refund(&self, user_id: UserId, charge: Charge) {
        if charge.is_free() {
            return;
        }
        if let Err(err) = self
            .deps
            .user_store
            .update_credits(user_id, i64::from(charge.total()))
            .await
        {
            tracing::error!(
                user_id = %user_id,
                amount = charge.total(),
                error = %err,
                "退还积分失败"
            );
        }
    }

    /// 公共频道冷却剩余秒数
    pub async fn cooldown_remaining(&self, user_id: UserId) -> Result<u64, ApplicationError> {
        let user = self.load_user(user_id).await?;
        let last_public_send = self.last_public_send(&user, Channel::Public).await?;
        let ctx = SendContext {
            user: &user,
            channel: Channel::Public,
            now: self.deps.clock.now(),
            last_public_send,
        };
        Ok(self.deps.policy.cooldown_remaining(&ctx))
    }

    /// 公共频道冷却倒计时；不受冷却约束的用户得到一个立即结束的计时器
    pub async fn cooldown_ticker(&self, user_id: UserId) -> Result<CooldownTicker, ApplicationError> {
        let remaining = self.cooldown_remaining(user_id).await?;
        let seconds = i64::try_from(remaining).unwrap_or(i64::MAX);
        let deadline = self.deps.clock.now() + chrono::Duration::seconds(seconds);
        Ok(CooldownTicker::new(self.deps.clock.clone(), deadline))
    }

    /// 订阅频道；`limit` 为空时回放配置的历史条数
    pub async fn subscribe(
        &self,
        viewer_id: UserId,
        channel: Channel,
        limit: Option<usize>,
    ) -> Result<MessageSubscription, ApplicationError> {
        let viewer = self.load_user(viewer_id).await?;
        Self::check_channel_access(&viewer, channel)?;
        let limit = limit.unwrap_or(self.deps.history_limit);
        tracing::debug!(user_id = %viewer.id, channel = %channel, limit, "订阅频道");
        let subscription = self.deps.message_store.subscribe(channel, limit).await?;
        Ok(subscription)
    }

    /// 删除消息，仅管理员可用
    pub async fn delete_message(
        &self,
        operator_id: UserId,
        channel: Channel,
        message_id: MessageId,
    ) -> Result<(), ApplicationError> {
        let operator = self.load_user(operator_id).await?;
        if operator.role != UserRole::Admin {
            return Err(DomainError::permission_denied("delete message").into());
        }
        self.deps.message_store.remove(channel, message_id).await?;
        tracing::info!(
            operator_id = %operator.id,
            channel = %channel,
            message_id = %message_id,
            "管理员删除消息"
        );
        Ok(())
    }
}
