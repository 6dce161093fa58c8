//! 导入区间与单章任务

use std::fmt;

use tracing::debug;

use crate::core::error::Result;
use crate::core::model::ChapterRef;
use crate::utils::text::{chapter_title, normalize_chapter_text};

use super::context::JobContext;

/// 抓取结果为空时写入的占位正文
pub const EMPTY_CHAPTER: &str = "<p><em>(empty chapter)</em></p>";

/// 零基、闭区间的章节下标范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterRange {
    pub start: usize,
    pub end: usize,
}

impl ChapterRange {
    /// 将 1 起始的请求区间收敛到 `[0, total)` 内
    ///
    /// 起点越界时落在最后一章；终点早于起点时收缩为单章。
    /// `total` 为 0 时返回 None。
    pub fn resolve(total: usize, start_chapter: u32, end_chapter: Option<u32>) -> Option<Self> {
        let last = total.checked_sub(1)?;
        let start = (start_chapter.max(1) as usize - 1).min(last);
        let end = match end_chapter {
            Some(end) if end >= 1 => (end as usize - 1).min(last),
            Some(_) => start,
            None => last,
        };
        Some(Self {
            start,
            end: end.max(start),
        })
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn indices(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// 准备写库的章节
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedChapter {
    pub title: String,
    pub content: String,
}

/// 单章导入任务：抓取 (或复用内联正文) -> 归一化 -> 生成标题
#[derive(Debug)]
pub struct ChapterTask<'a> {
    /// 零基下标
    pub position: usize,
    pub order_index: i64,
    pub chapter: &'a ChapterRef,
}

impl fmt::Display for ChapterTask<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "章节 #{} ({})", self.position + 1, self.chapter.url)
    }
}

impl<'a> ChapterTask<'a> {
    pub fn new(position: usize, order_index: i64, chapter: &'a ChapterRef) -> Self {
        Self {
            position,
            order_index,
            chapter,
        }
    }

    pub async fn run(self, job: &JobContext, preserve_titles: bool) -> Result<PreparedChapter> {
        let mut name = self.chapter.name.trim().to_string();

        let html = match self.chapter.inline_content.as_deref() {
            Some(inline) if !inline.trim().is_empty() => {
                debug!("复用内联正文: {}", self);
                inline.to_string()
            }
            _ => {
                let fetched = job
                    .adapter
                    .fetch_chapter_content(&self.chapter.url, &job.site)
                    .await?;
                let title = fetched.title.trim();
                if !title.is_empty() {
                    name = title.to_string();
                }
                if fetched.html.trim().is_empty() {
                    EMPTY_CHAPTER.to_string()
                } else {
                    fetched.html
                }
            }
        };

        Ok(PreparedChapter {
            title: chapter_title(&name, self.order_index, preserve_titles),
            content: normalize_chapter_text(&html),
        })
    }
}
