//! 任务运行时上下文 (Job Context)
//!
//! 单个导入任务独占的状态：选中的适配器、站点上下文 (传输层 + 节流器)
//! 以及日志与事件出口。任务之间不共享。

use std::sync::Arc;

use crate::core::event::{EventSender, ImportEvent};
use crate::interfaces::log::ImportLog;
use crate::interfaces::site::{SiteAdapter, SiteContext, SiteProfile};

pub struct JobContext {
    /// 按主机名选中的适配器
    pub adapter: Arc<dyn SiteAdapter>,
    /// 适配器使用的网络上下文
    pub site: SiteContext,
    log: Arc<dyn ImportLog>,
    events: Option<EventSender>,
}

impl JobContext {
    pub fn new(
        adapter: Arc<dyn SiteAdapter>,
        site: SiteContext,
        log: Arc<dyn ImportLog>,
        events: Option<EventSender>,
    ) -> Self {
        Self {
            adapter,
            site,
            log,
            events,
        }
    }

    pub fn profile(&self) -> &SiteProfile {
        self.adapter.profile()
    }

    /// 向调用方日志写入一行
    pub fn log(&self, message: impl AsRef<str>) {
        self.log.log(message.as_ref());
    }

    /// 向事件总线推送消息
    pub fn emit(&self, event: ImportEvent) {
        if let Some(sender) = &self.events {
            sender.emit(event);
        }
    }

    pub fn chapter_saved(&self, done: usize, order_index: i64, title: &str) {
        if let Some(sender) = &self.events {
            sender.chapter_saved(done, order_index, title);
        }
    }
}
