//! FanMTL 索引器
//!
//! 负责解析书籍元数据、章节列表与目录分页

use scraper::ElementRef;

use crate::core::model::{ChapterRef, NovelMeta};
use crate::interfaces::site::Landing;
use crate::markup::{MarkupDocument, element_attr, element_text};
use crate::sites::toc::query_param_pages;
use crate::utils::resolve_url;

use super::SiteSelectors;

/// 解析小说主页
pub fn parse_landing(html: &str, url: &str) -> Landing {
    let doc = MarkupDocument::parse(html);
    let s = SiteSelectors::get();

    let mut meta = NovelMeta {
        source_url: url.to_string(),
        title: doc.first_text(&s.title).unwrap_or_default(),
        ..Default::default()
    };

    if let Some(cover) = doc.first_of(&s.cover) {
        if let Some(src) = element_attr(&cover, "src") {
            meta.cover_url = resolve_url(url, &src);
        }
        if meta.title.is_empty() {
            meta.title = element_attr(&cover, "alt").unwrap_or_default();
        }
    }

    meta.author = doc.first_text(&s.author).unwrap_or_default();
    meta.summary = doc.first_text(&s.summary).unwrap_or_default();

    Landing {
        meta,
        chapters: chapter_links(&doc, url),
        toc_pages: toc_pages(&doc, url),
    }
}

/// 解析目录分页
pub fn parse_toc_page(html: &str, url: &str) -> Vec<ChapterRef> {
    chapter_links(&MarkupDocument::parse(html), url)
}

fn chapter_links(doc: &MarkupDocument, base: &str) -> Vec<ChapterRef> {
    let s = SiteSelectors::get();
    doc.select(&s.chapter_link)
        .filter_map(|a| {
            let href = element_attr(&a, "href")?;
            Some(ChapterRef::new(chapter_name(&a), resolve_url(base, &href)))
        })
        .collect()
}

/// 组合 "序号: 标题"，标题已含序号时直接使用
fn chapter_name(a: &ElementRef<'_>) -> String {
    let s = SiteSelectors::get();
    let num = a.select(&s.chapter_no).next().map(|n| element_text(&n)).unwrap_or_default();
    let title = a.select(&s.chapter_name).next().map(|n| element_text(&n)).unwrap_or_default();

    match (num.is_empty(), title.is_empty()) {
        (false, false) if title.contains(&num) => title,
        (false, false) => format!("{num}: {title}"),
        (true, false) => title,
        (false, true) => num,
        (true, true) => {
            let text = element_text(a);
            if text.is_empty() { "Chapter".to_string() } else { text }
        }
    }
}

fn toc_pages(doc: &MarkupDocument, base: &str) -> Vec<String> {
    let s = SiteSelectors::get();
    let links: Vec<String> = doc
        .select(&s.pagination_link)
        .filter_map(|a| element_attr(&a, "href"))
        .map(|href| resolve_url(base, &href))
        .collect();
    query_param_pages(&links, "page")
}
