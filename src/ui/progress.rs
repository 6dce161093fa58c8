//! 终端进度渲染 (Terminal Progress)
//!
//! 基于 `indicatif` 的非阻塞进度条，消费导入引擎推送的事件。

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::core::event::{EventReceiver, ImportEvent};

/// 全局 TUI 容器 (Singleton)
static MULTI: OnceLock<MultiProgress> = OnceLock::new();

/// 获取全局进度容器实例
pub fn get_multi() -> &'static MultiProgress {
    MULTI.get_or_init(MultiProgress::new)
}

/// TUI 状态容器
#[derive(Default)]
pub struct UiState {
    /// 任务主状态条
    main_bar: Option<ProgressBar>,
    /// 章节导入进度条
    chapter_bar: Option<ProgressBar>,
}

static STATE: OnceLock<Arc<RwLock<UiState>>> = OnceLock::new();

fn get_state() -> &'static Arc<RwLock<UiState>> {
    STATE.get_or_init(|| Arc::new(RwLock::new(UiState::default())))
}

pub struct Ui;

impl Ui {
    /// 启动事件监听循环，发送端全部关闭后退出
    pub fn run(receiver: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = receiver.recv_async().await {
                Self::handle_event(event);
            }
        })
    }

    fn handle_event(event: ImportEvent) {
        let multi = get_multi();
        let mut ui = get_state().write();

        match event {
            ImportEvent::TaskStarted { source, url } => {
                let style = ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

                let bar = multi.add(ProgressBar::new_spinner());
                bar.set_style(style);
                bar.set_message(format!("📚 [{}] {}", source, truncate_string(&url, 60)));
                bar.enable_steady_tick(Duration::from_millis(100));
                ui.main_bar = Some(bar);
            }
            ImportEvent::NovelParsed { title } => {
                if let Some(ref bar) = ui.main_bar {
                    bar.set_message(format!("📚 {}", title));
                }
            }
            ImportEvent::ChaptersDiscovered { total } => {
                if let Some(ref bar) = ui.main_bar {
                    bar.set_message(format!("{} · {} chapters", bar.message(), total));
                }
            }
            ImportEvent::RangeResolved { count } => {
                let style = ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("█▉▊▋▌▍▎▏  ");

                let bar = multi.add(ProgressBar::new(count as u64));
                bar.set_style(style);
                ui.chapter_bar = Some(bar);
            }
            ImportEvent::ChapterSaved { done, title, .. } => {
                if let Some(ref bar) = ui.chapter_bar {
                    bar.set_position(done as u64);
                    bar.set_message(truncate_string(&title, 30));
                }
            }
            ImportEvent::TaskCompleted { novel_id, chapters } => {
                if let Some(ref bar) = ui.chapter_bar {
                    bar.finish_with_message("✅ SAVED");
                }
                if let Some(ref bar) = ui.main_bar {
                    bar.finish_with_message(format!("✅ Novel #{} ({} chapters)", novel_id, chapters));
                }
            }
            ImportEvent::TaskFailed { error } => {
                if let Some(ref bar) = ui.chapter_bar {
                    bar.abandon();
                }
                match ui.main_bar {
                    Some(ref bar) => bar.abandon_with_message(format!("❌ FAILED: {}", error)),
                    None => {
                        let _ = multi.println(format!("❌ FAILED: {}", error));
                    }
                }
            }
            ImportEvent::Log { message } => {
                let _ = multi.println(message);
            }
        }
    }
}

/// 按字符截断
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
