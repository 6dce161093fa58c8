//! Novlove 站点实现
//!
//! 目录按最新章节在前排列，解析后需反转。正文中夹带的站点品牌文字会被剔除。

use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use scraper::Selector;

use crate::core::error::Result;
use crate::core::model::{ChapterContent, ChapterRef, NovelMeta};
use crate::interfaces::site::{Landing, SiteAdapter, SiteProfile};
use crate::markup::{FragmentCleaner, MarkupDocument, compile, element_attr, element_text, inner_html};
use crate::utils::resolve_url;

pub static PROFILE: SiteProfile = SiteProfile {
    tag: "novlove",
    label: "Novlove",
    hosts: &["novlove.com", "www.novlove.com"],
    min_throttle: 3.0,
};

pub const TITLE: &[&str] = &["div[class='profile-manga'] h1[class='post-title']", "h1"];
pub const COVER: &[&str] = &["div[class='summary_image'] img"];
pub const SUMMARY: &[&str] = &["div[class*='summary-text'] p"];
pub const CONTENT: &[&str] = &["div[class*='text-left']", "div#chapter-content"];
pub const CHAPTER_TITLE: &[&str] = &["h1[class='text-center']"];
pub const CONTENT_REMOVALS: &[&str] = &[
    "[class*=\"ads\"]",
    "[class*=\"novlove\"]",
    "a[href*=\"novlove.com\"]",
];

/// 容器缺失时的占位正文
pub const MISSING_CONTENT: &str = "<p><em>(content not found)</em></p>";

static BRANDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnovlove(?:\.com)?\b").unwrap());
static AUTHOR_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)Author\s*:\s*").unwrap());

struct Selectors {
    title: Vec<Selector>,
    cover: Vec<Selector>,
    summary: Vec<Selector>,
    content: Vec<Selector>,
    chapter_title: Vec<Selector>,
    author_block: Selector,
    chapter_link: Selector,
}

static SELECTORS: OnceLock<Selectors> = OnceLock::new();

fn selectors() -> &'static Selectors {
    SELECTORS.get_or_init(|| Selectors {
        title: compile(TITLE),
        cover: compile(COVER),
        summary: compile(SUMMARY),
        content: compile(CONTENT),
        chapter_title: compile(CHAPTER_TITLE),
        author_block: Selector::parse("div[class*='author-content']").unwrap(),
        chapter_link: Selector::parse("ul[class='listing-chapters_wrap'] li a").unwrap(),
    })
}

#[derive(Debug, Default)]
pub struct Novlove;

impl Novlove {
    /// 站点按倒序列出章节
    fn chapter_links(doc: &MarkupDocument, base: &str) -> Vec<ChapterRef> {
        let mut chapters: Vec<ChapterRef> = doc
            .select(&selectors().chapter_link)
            .filter_map(|a| {
                let href = element_attr(&a, "href")?;
                Some(ChapterRef::new(element_text(&a), resolve_url(base, &href)))
            })
            .collect();
        chapters.reverse();
        chapters
    }

    fn author(doc: &MarkupDocument) -> String {
        doc.select(&selectors().author_block)
            .map(|el| element_text(&el))
            .find(|text| text.contains("Author"))
            .map(|text| AUTHOR_LABEL.replace_all(&text, "").trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

impl SiteAdapter for Novlove {
    fn profile(&self) -> &SiteProfile {
        &PROFILE
    }

    fn parse_landing(&self, html: &str, url: &str) -> Result<Landing> {
        let doc = MarkupDocument::parse(html);
        let s = selectors();

        let mut meta = NovelMeta {
            source_url: url.to_string(),
            title: doc.first_text(&s.title).unwrap_or_default(),
            author: Self::author(&doc),
            summary: doc.first_text(&s.summary).unwrap_or_default(),
            ..Default::default()
        };
        if let Some(cover) = doc.first_of(&s.cover)
            && let Some(src) = element_attr(&cover, "data-src").or_else(|| element_attr(&cover, "src"))
        {
            meta.cover_url = resolve_url(url, &src);
        }

        Ok(Landing {
            meta,
            chapters: Self::chapter_links(&doc, url),
            toc_pages: Vec::new(),
        })
    }

    fn parse_toc_page(&self, html: &str, url: &str) -> Vec<ChapterRef> {
        Self::chapter_links(&MarkupDocument::parse(html), url)
    }

    fn parse_chapter(&self, html: &str, url: &str) -> Result<ChapterContent> {
        let (title, fragment) = {
            let doc = MarkupDocument::parse(html);
            let s = selectors();
            (
                doc.first_text(&s.chapter_title).unwrap_or_default(),
                doc.first_of(&s.content).map(|el| inner_html(&el)),
            )
        };

        let Some(fragment) = fragment else {
            return Ok(ChapterContent {
                title,
                html: MISSING_CONTENT.to_string(),
            });
        };

        let cleaned = FragmentCleaner::new()
            .remove_all(CONTENT_REMOVALS)
            .with_base(url)
            .clean(&fragment)?;
        let html = BRANDING.replace_all(&cleaned, "").into_owned();
        Ok(ChapterContent { title, html })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING: &str = r#"<html><body>
        <div class="profile-manga"><h1 class="post-title">Lord of  Mysteries</h1></div>
        <div class="summary_image"><img data-src="/lazy/lom.jpg" src="/placeholder.gif"></div>
        <div class="summary-text"><p>Klein wakes.</p><p>Second.</p></div>
        <div class="author-content">Genre: Mystery</div>
        <div class="author-content">Author: Cuttlefish</div>
        <ul class="listing-chapters_wrap">
            <li><a href="/lom/chapter-3">Chapter 3</a></li>
            <li><a href="/lom/chapter-2">Chapter 2</a></li>
            <li><a href="/lom/chapter-1">Chapter 1</a></li>
        </ul>
    </body></html>"#;

    #[test]
    fn chapters_are_reversed_to_reading_order() {
        let landing = Novlove.parse_landing(LANDING, "https://novlove.com/novel/lom").unwrap();
        let names: Vec<_> = landing.chapters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Chapter 1", "Chapter 2", "Chapter 3"]);
        assert_eq!(landing.chapters[0].url, "https://novlove.com/lom/chapter-1");
    }

    #[test]
    fn metadata_prefers_lazy_cover() {
        let landing = Novlove.parse_landing(LANDING, "https://novlove.com/novel/lom").unwrap();
        assert_eq!(landing.meta.title, "Lord of Mysteries");
        assert_eq!(landing.meta.cover_url, "https://novlove.com/lazy/lom.jpg");
        assert_eq!(landing.meta.summary, "Klein wakes.");
        assert_eq!(landing.meta.author, "Cuttlefish");
    }

    #[test]
    fn author_defaults_to_unknown() {
        let landing = Novlove.parse_landing("<h1>T</h1>", "https://novlove.com/novel/t").unwrap();
        assert_eq!(landing.meta.author, "Unknown");
        assert_eq!(landing.meta.title, "T");
    }

    #[test]
    fn branding_is_removed() {
        let page = r#"<html><body><h1 class="text-center">Chapter 1</h1><div class="text-left">
            <p>Read at Novlove today.</p><p><a href="https://www.novlove.com/x">link</a>Story.</p>
            <div class="ads-top">ad</div></div></body></html>"#;
        let content = Novlove.parse_chapter(page, "https://novlove.com/lom/chapter-1").unwrap();
        assert_eq!(content.title, "Chapter 1");
        assert!(!content.html.to_lowercase().contains("novlove"));
        assert!(content.html.contains("Story."));
        assert!(!content.html.contains("ad</div>"));
    }

    #[test]
    fn missing_container_yields_placeholder() {
        let content = Novlove.parse_chapter("<html><body><p>x</p></body></html>", "https://novlove.com/c").unwrap();
        assert_eq!(content.html, MISSING_CONTENT);
    }
}
