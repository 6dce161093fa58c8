//! FanMTL 内容抓取器 (Content Fetcher)
//!
//! 负责章节正文的定位、广告节点过滤与相对地址改写。

use crate::core::error::Result;
use crate::core::model::ChapterContent;
use crate::markup::{FragmentCleaner, MarkupDocument, inner_html};

use super::SiteSelectors;
use super::selectors::CONTENT_REMOVALS;

/// 解析章节页
pub fn parse_chapter(html: &str, url: &str) -> Result<ChapterContent> {
    let (title, fragment) = {
        let doc = MarkupDocument::parse(html);
        let s = SiteSelectors::get();
        let title = doc.first_text(&s.chapter_title).unwrap_or_default();
        let fragment = doc.first_of(&s.content).map(|el| inner_html(&el)).unwrap_or_default();
        (title, fragment)
    };

    let html = FragmentCleaner::new()
        .remove_all(CONTENT_REMOVALS)
        .with_base(url)
        .clean(&fragment)?;

    Ok(ChapterContent { title, html })
}
