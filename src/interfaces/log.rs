//! 导入日志边界 (Import Log Sink)
//!
//! 单参数消息接收端，在任务构造时注入一次。

use tracing::info;

/// 导入进度日志接收端，仅保证按序投递
pub trait ImportLog: Send + Sync {
    fn log(&self, message: &str);
}

impl<F> ImportLog for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

/// 转发至 tracing 的日志接收端
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl ImportLog for TracingLog {
    fn log(&self, message: &str) {
        info!(target: "import", "{}", message);
    }
}

/// 丢弃所有消息
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl ImportLog for NullLog {
    fn log(&self, _message: &str) {}
}
