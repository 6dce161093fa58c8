//! 事件系统定义
//!
//! 用于导入引擎与 UI 之间的解耦通信

use flume::{Receiver, Sender};

use crate::interfaces::log::ImportLog;

/// 导入事件类型
#[derive(Debug, Clone)]
pub enum ImportEvent {
    /// 任务开始
    TaskStarted { source: String, url: String },

    /// 小说主页解析完成
    NovelParsed { title: String },

    /// 发现章节总数
    ChaptersDiscovered { total: usize },

    /// 导入区间确定
    RangeResolved { count: usize },

    /// 章节写入完成
    ChapterSaved {
        done: usize,
        order_index: i64,
        title: String,
    },

    /// 任务完成
    TaskCompleted { novel_id: i64, chapters: usize },

    /// 任务失败
    TaskFailed { error: String },

    /// 导入日志行 (用于 UI 显示)
    Log { message: String },
}

/// 事件发送器
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<ImportEvent>,
}

impl EventSender {
    pub fn new(tx: Sender<ImportEvent>) -> Self {
        Self { tx }
    }

    /// 发送事件
    pub fn emit(&self, event: ImportEvent) {
        let _ = self.tx.send(event);
    }

    pub fn chapter_saved(&self, done: usize, order_index: i64, title: &str) {
        self.emit(ImportEvent::ChapterSaved {
            done,
            order_index,
            title: title.to_string(),
        });
    }
}

impl ImportLog for EventSender {
    fn log(&self, message: &str) {
        self.emit(ImportEvent::Log {
            message: message.to_string(),
        });
    }
}

/// 事件接收器
pub struct EventReceiver {
    rx: Receiver<ImportEvent>,
}

impl EventReceiver {
    pub fn new(rx: Receiver<ImportEvent>) -> Self {
        Self { rx }
    }

    /// 非阻塞接收事件
    pub fn try_recv(&self) -> Option<ImportEvent> {
        self.rx.try_recv().ok()
    }

    /// 异步接收事件
    pub async fn recv_async(&self) -> Option<ImportEvent> {
        self.rx.recv_async().await.ok()
    }
}

/// 创建事件通道
pub fn create_event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = flume::unbounded();
    (EventSender::new(tx), EventReceiver::new(rx))
}
