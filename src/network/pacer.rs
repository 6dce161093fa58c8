//! 请求节流 (Request Pacing)
//!
//! 每个出站请求之前的阻塞式等待。首个请求立即发出，其后每个请求前
//! 固定等待 `max(调用方节流, 适配器下限)`。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

/// 可注入的休眠实现
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// 基于 tokio 定时器的休眠
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 只记录不等待的休眠，用于观测节流
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().push(duration);
    }
}

/// 计算实际节流：下限为硬约束，非法请求值按 0 处理
///
/// 结果不超过 `MAX_DELAY`，超出 `Duration` 表示范围的值同样截断。
pub fn effective_delay(requested: Option<f64>, floor: f64) -> Duration {
    let requested = requested.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(0.0);
    let floor = if floor.is_finite() { floor.max(0.0) } else { 0.0 };
    Duration::try_from_secs_f64(requested.max(floor)).map_or(MAX_DELAY, |d| d.min(MAX_DELAY))
}

/// 单次等待的上限 (一天)
pub const MAX_DELAY: Duration = Duration::from_secs(24 * 60 * 60);

/// 单任务节流器
pub struct Pacer {
    delay: Duration,
    sleeper: Arc<dyn Sleeper>,
    primed: AtomicBool,
}

impl Pacer {
    pub fn new(delay: Duration, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            delay,
            sleeper,
            primed: AtomicBool::new(false),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 在发出请求前调用
    pub async fn wait(&self) {
        if self.primed.swap(true, Ordering::SeqCst) && !self.delay.is_zero() {
            trace!(delay_ms = self.delay.as_millis() as u64, "节流等待");
            self.sleeper.sleep(self.delay).await;
        }
    }
}
