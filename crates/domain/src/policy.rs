//! 聊天发送权限与计费策略
//!
//! 对每一次发送尝试给出裁决：是否允许、需要扣多少积分。策略本身是纯函数，
//! 时间、上次发送时间和频道设置都由调用方显式传入；扣费与持久化由应用层完成。
//!
//! 规则按顺序判定：
//! 1. 被禁言的用户一律拒绝；
//! 2. 公共频道的非会员学生受冷却约束，冷却期内可以付费跳过；
//! 3. 公共频道的非会员学生按条计费；
//! 4. 其余情况免费放行。

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::user::User;
use crate::value_objects::Timestamp;

pub const DEFAULT_COOLDOWN_SECONDS: u32 = 30;
pub const DEFAULT_SKIP_COST: u32 = 1;

/// 频道级设置，对策略只读
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// 非会员学生两条公共消息之间的最小间隔（秒）
    pub cooldown_seconds: u32,
    /// 每条公共消息的积分费用
    pub message_cost: u32,
    /// 付费跳过冷却的费用
    pub skip_cost: u32,
    /// 冷却期内是否提供付费跳过
    pub offer_paid_skip: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            message_cost: 0,
            skip_cost: DEFAULT_SKIP_COST,
            offer_paid_skip: true,
        }
    }
}

/// 一次发送尝试的输入
#[derive(Debug, Clone, Copy)]
pub struct SendContext<'a> {
    pub user: &'a User,
    pub channel: Channel,
    pub now: Timestamp,
    pub last_public_send: Option<Timestamp>,
}

/// 一次放行需要扣除的积分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Charge {
    pub skip_fee: u32,
    pub message_cost: u32,
}

impl Charge {
    pub fn total(&self) -> u32 {
        self.skip_fee.saturating_add(self.message_cost)
    }

    pub fn is_free(&self) -> bool {
        self.total() == 0
    }
}

/// 无需重试的拒绝原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Banned,
    InsufficientCredits { required: u32, available: u32 },
}

/// 策略裁决
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// 放行，并按 `Charge` 扣费
    Allowed(Charge),
    /// 冷却中。`offer_skip` 为真时调用方可以询问用户，再调用 `confirm_skip`
    CooldownActive { remaining_seconds: u64, offer_skip: bool },
    Denied(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatAccessPolicy {
    settings: ChannelSettings,
}

impl ChatAccessPolicy {
    pub fn new(settings: ChannelSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }

    /// 第一步：不接受付费跳过的裁决
    pub fn evaluate(&self, ctx: &SendContext<'_>) -> Decision {
        self.decide(ctx, false)
    }

    /// 第二步：用户确认付费跳过冷却后的裁决
    pub fn confirm_skip(&self, ctx: &SendContext<'_>) -> Decision {
        self.decide(ctx, true)
    }

    /// 冷却剩余秒数（向上取整）；不受冷却约束的用户和频道恒为 0
    pub fn cooldown_remaining(&self, ctx: &SendContext<'_>) -> u64 {
        if !Self::is_metered(ctx) {
            return 0;
        }
        self.remaining_seconds(ctx.now, ctx.last_public_send)
    }

    fn is_metered(ctx: &SendContext<'_>) -> bool {
        ctx.channel.is_public() && ctx.user.is_metered()
    }

    fn decide(&self, ctx: &SendContext<'_>, skip_accepted: bool) -> Decision {
        if ctx.user.is_chat_banned {
            return Decision::Denied(Denial::Banned);
        }
        if !Self::is_metered(ctx) {
            return Decision::Allowed(Charge::default());
        }

        let mut charge = Charge::default();

        let remaining = self.remaining_seconds(ctx.now, ctx.last_public_send);
        if remaining > 0 {
            if !(skip_accepted && self.settings.offer_paid_skip) {
                return Decision::CooldownActive {
                    remaining_seconds: remaining,
                    offer_skip: self.settings.offer_paid_skip,
                };
            }
            charge.skip_fee = self.settings.skip_cost;
        }

        charge.message_cost = self.settings.message_cost;

        // 跳过费与消息费合并为一次扣款
        let required = charge.total();
        if required > ctx.user.credits {
            return Decision::Denied(Denial::InsufficientCredits {
                required,
                available: ctx.user.credits,
            });
        }

        Decision::Allowed(charge)
    }

    fn remaining_seconds(&self, now: Timestamp, last: Option<Timestamp>) -> u64 {
        let Some(last) = last else {
            return 0;
        };
        // 上次发送时间晚于当前时间（时钟回拨）时按刚刚发送处理
        let elapsed_ms = (now - last).num_milliseconds().max(0);
        let cooldown_ms = i64::from(self.settings.cooldown_seconds) * 1000;
        let remaining_ms = cooldown_ms - elapsed_ms;
        if remaining_ms <= 0 {
            return 0;
        }
        u64::try_from((remaining_ms + 999) / 1000).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{SubscriptionTier, UserRole};
    use crate::value_objects::UserId;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn student(credits: u32) -> User {
        User::student(UserId::from(Uuid::new_v4()), "ravi").with_credits(credits)
    }

    fn ctx(user: &User, channel: Channel, elapsed: Option<i64>) -> SendContext<'_> {
        SendContext {
            user,
            channel,
            now: t0(),
            last_public_send: elapsed.map(|secs| t0() - Duration::seconds(secs)),
        }
    }

    fn settings(cooldown_seconds: u32, message_cost: u32) -> ChannelSettings {
        ChannelSettings {
            cooldown_seconds,
            message_cost,
            ..ChannelSettings::default()
        }
    }

    #[test]
    fn banned_users_are_always_denied() {
        let policy = ChatAccessPolicy::new(settings(30, 0));
        for credits in [0, 1, 100] {
            let mut user = student(credits);
            user.is_chat_banned = true;
            for elapsed in [None, Some(1), Some(1000)] {
                for channel in [Channel::Public, Channel::support_for(user.id)] {
                    let c = ctx(&user, channel, elapsed);
                    assert_eq!(policy.evaluate(&c), Decision::Denied(Denial::Banned));
                    assert_eq!(policy.confirm_skip(&c), Decision::Denied(Denial::Banned));
                }
            }
        }

        let mut admin = User::staff(UserId::from(Uuid::new_v4()), "root", UserRole::Admin);
        admin.is_chat_banned = true;
        let c = ctx(&admin, Channel::Public, None);
        assert_eq!(policy.evaluate(&c), Decision::Denied(Denial::Banned));
    }

    #[test]
    fn cooldown_reports_remaining_seconds() {
        let policy = ChatAccessPolicy::new(settings(30, 0));
        let user = student(5);
        let c = ctx(&user, Channel::Public, Some(10));
        assert_eq!(
            policy.evaluate(&c),
            Decision::CooldownActive {
                remaining_seconds: 20,
                offer_skip: true
            }
        );
        assert_eq!(policy.cooldown_remaining(&c), 20);
    }

    #[test]
    fn partial_seconds_round_up() {
        let policy = ChatAccessPolicy::new(settings(30, 0));
        let user = student(0);
        let c = SendContext {
            user: &user,
            channel: Channel::Public,
            now: t0(),
            last_public_send: Some(t0() - Duration::milliseconds(10_500)),
        };
        assert_eq!(policy.cooldown_remaining(&c), 20);
    }

    #[test]
    fn elapsed_cooldown_allows_free_send() {
        let policy = ChatAccessPolicy::new(settings(30, 0));
        let user = student(0);
        for elapsed in [None, Some(30), Some(31), Some(3600)] {
            let c = ctx(&user, Channel::Public, elapsed);
            assert_eq!(policy.evaluate(&c), Decision::Allowed(Charge::default()));
        }
    }

    #[test]
    fn future_stamp_counts_as_just_sent() {
        let policy = ChatAccessPolicy::new(settings(30, 0));
        let user = student(0);
        let c = SendContext {
            user: &user,
            channel: Channel::Public,
            now: t0(),
            last_public_send: Some(t0() + Duration::seconds(90)),
        };
        assert_eq!(policy.cooldown_remaining(&c), 30);
    }

    #[test]
    fn paid_skip_requires_a_credit() {
        let policy = ChatAccessPolicy::new(settings(30, 0));

        let broke = student(0);
        let c = ctx(&broke, Channel::Public, Some(10));
        assert_eq!(
            policy.confirm_skip(&c),
            Decision::Denied(Denial::InsufficientCredits {
                required: 1,
                available: 0
            })
        );

        let one = student(1);
        let c = ctx(&one, Channel::Public, Some(10));
        assert_eq!(
            policy.confirm_skip(&c),
            Decision::Allowed(Charge {
                skip_fee: 1,
                message_cost: 0
            })
        );
    }

    #[test]
    fn skip_is_not_charged_outside_cooldown() {
        let policy = ChatAccessPolicy::new(settings(30, 0));
        let user = student(3);
        let c = ctx(&user, Channel::Public, Some(45));
        assert_eq!(policy.confirm_skip(&c), Decision::Allowed(Charge::default()));
    }

    #[test]
    fn disabled_skip_keeps_cooldown() {
        let policy = ChatAccessPolicy::new(ChannelSettings {
            offer_paid_skip: false,
            ..settings(30, 0)
        });
        let user = student(10);
        let c = ctx(&user, Channel::Public, Some(5));
        let expected = Decision::CooldownActive {
            remaining_seconds: 25,
            offer_skip: false,
        };
        assert_eq!(policy.evaluate(&c), expected);
        assert_eq!(policy.confirm_skip(&c), expected);
    }

    #[test]
    fn message_cost_is_enforced() {
        let policy = ChatAccessPolicy::new(settings(30, 2));

        let poor = student(1);
        assert_eq!(
            policy.evaluate(&ctx(&poor, Channel::Public, None)),
            Decision::Denied(Denial::InsufficientCredits {
                required: 2,
                available: 1
            })
        );

        let rich = student(3);
        assert_eq!(
            policy.evaluate(&ctx(&rich, Channel::Public, None)),
            Decision::Allowed(Charge {
                skip_fee: 0,
                message_cost: 2
            })
        );
    }

    #[test]
    fn skip_and_cost_are_charged_together() {
        let policy = ChatAccessPolicy::new(settings(30, 2));

        let short = student(2);
        assert_eq!(
            policy.confirm_skip(&ctx(&short, Channel::Public, Some(1))),
            Decision::Denied(Denial::InsufficientCredits {
                required: 3,
                available: 2
            })
        );

        let enough = student(3);
        let decision = policy.confirm_skip(&ctx(&enough, Channel::Public, Some(1)));
        assert_eq!(
            decision,
            Decision::Allowed(Charge {
                skip_fee: 1,
                message_cost: 2
            })
        );
    }

    #[test]
    fn premium_and_staff_never_wait_or_pay() {
        let premium = student(0).with_subscription(SubscriptionTier::Ultra, true);
        let sub_admin = User::staff(UserId::from(Uuid::new_v4()), "mod", UserRole::SubAdmin);
        let admin = User::staff(UserId::from(Uuid::new_v4()), "root", UserRole::Admin);

        for cooldown in [0, 1, 30, 86_400] {
            for cost in [0, 1, 5, 1_000] {
                let policy = ChatAccessPolicy::new(settings(cooldown, cost));
                for user in [&premium, &sub_admin, &admin] {
                    let c = ctx(user, Channel::Public, Some(0));
                    assert_eq!(policy.evaluate(&c), Decision::Allowed(Charge::default()));
                    assert_eq!(policy.cooldown_remaining(&c), 0);
                }
            }
        }
    }

    #[test]
    fn support_threads_are_free() {
        let policy = ChatAccessPolicy::new(settings(30, 5));
        let user = student(0);
        let c = ctx(&user, Channel::support_for(user.id), Some(1));
        assert_eq!(policy.evaluate(&c), Decision::Allowed(Charge::default()));
    }
}
