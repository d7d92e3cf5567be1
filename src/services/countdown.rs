//! 倒计时 - 业务能力层
//!
//! 剩余秒数每次变化都立即写入会话存储，重启后从存储中恢复。
//! 归零只触发一次 `Expired`，之后的 tick 都是空操作。

use crate::error::StoreError;
use crate::infrastructure::SessionStore;
use tracing::{debug, error, info, warn};

/// 一次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// 仍在计时，附带剩余秒数
    Running(u64),
    /// 本次 tick 刚好归零
    Expired,
    /// 计时器未运行（没有时长或已经归零）
    Idle,
}

/// 考试倒计时
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
    running: bool,
}

impl Countdown {
    /// 初始化计时器
    ///
    /// - 存储中有大于 0 的剩余时间：直接恢复，不重新计算
    /// - 否则用 `duration_minutes * 60` 开始，并立即写入存储
    /// - 两者都没有：计时器不运行
    pub fn resume_or_start(
        store: &SessionStore,
        duration_minutes: Option<u64>,
    ) -> Result<Self, StoreError> {
        if let Some(saved) = store.remaining_time().filter(|s| *s > 0) {
            info!("⏳ 恢复计时: 剩余 {} 秒", saved);
            return Ok(Self::running(saved));
        }

        match duration_minutes.filter(|d| *d > 0) {
            Some(minutes) => match minutes.checked_mul(60) {
                Some(total) => {
                    store.set_remaining_time(total)?;
                    info!("⏳ 开始计时: {} 分钟 ({} 秒)", minutes, total);
                    Ok(Self::running(total))
                }
                None => {
                    warn!("考试时长 {} 分钟无效，计时器不启动", minutes);
                    Ok(Self::idle())
                }
            },
            None => {
                warn!("没有考试时长，计时器不启动");
                Ok(Self::idle())
            }
        }
    }

    fn idle() -> Self {
        Self {
            remaining: 0,
            running: false,
        }
    }

    fn running(remaining: u64) -> Self {
        Self {
            remaining,
            running: true,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 减一秒并落盘
    pub fn tick(&mut self, store: &SessionStore) -> Tick {
        if !self.running || self.remaining == 0 {
            return Tick::Idle;
        }

        self.remaining -= 1;
        if let Err(e) = store.set_remaining_time(self.remaining) {
            error!("保存剩余时间失败: {}", e);
        }

        if self.remaining == 0 {
            self.running = false;
            info!("⏰ 时间到");
            Tick::Expired
        } else {
            debug!("剩余 {} 秒", self.remaining);
            Tick::Running(self.remaining)
        }
    }

    /// 停止计时并清除存储中的剩余时间
    pub fn stop(&mut self, store: &SessionStore) -> Result<(), StoreError> {
        self.running = false;
        store.clear_remaining_time()
    }
}
