use std::sync::Arc;
use std::time::Duration;

use domain::Timestamp;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::clock::Clock;

/// 冷却倒计时，仅驱动界面显示。
///
/// 每次 tick 都重新读取时钟；真正的放行判定在发送时由策略重新计算。
pub struct CooldownTicker {
    clock: Arc<dyn Clock>,
    deadline: Timestamp,
    interval: Interval,
    finished: bool,
}

impl CooldownTicker {
    pub fn new(clock: Arc<dyn Clock>, deadline: Timestamp) -> Self {
        let mut interval = interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            clock,
            deadline,
            interval,
            finished: false,
        }
    }

    /// 当前剩余秒数（向上取整）
    pub fn remaining(&self) -> u64 {
        let remaining_ms = (self.deadline - self.clock.now()).num_milliseconds();
        if remaining_ms <= 0 {
            return 0;
        }
        u64::try_from((remaining_ms + 999) / 1000).unwrap_or(0)
    }

    /// 等到下一秒并返回剩余秒数；归零后再调用返回 `None`
    pub async fn tick(&mut self) -> Option<u64> {
        if self.finished {
            return None;
        }
        self.interval.tick().await;
        let remaining = self.remaining();
        if remaining == 0 {
            self.finished = true;
        }
        Some(remaining)
    }
}
