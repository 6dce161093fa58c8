//! NovelHall 站点实现
//!
//! 单页目录：页面中可能存在多个 `book-catalog` 区块，取链接最多的一个。

use std::sync::OnceLock;

use scraper::Selector;

use crate::core::error::Result;
use crate::core::model::{ChapterContent, ChapterRef, NovelMeta};
use crate::interfaces::site::{Landing, SiteAdapter, SiteProfile};
use crate::markup::{FragmentCleaner, MarkupDocument, compile, element_attr, element_text, inner_html};
use crate::utils::resolve_url;

pub static PROFILE: SiteProfile = SiteProfile {
    tag: "novelhall",
    label: "NovelHall",
    hosts: &["novelhall.com", "www.novelhall.com"],
    min_throttle: 3.0,
};

pub const TITLE: &[&str] = &["div[class*='book-info'] h1", "h1"];
pub const AUTHOR_META: &[&str] = &["meta[property='books:author']"];
pub const COVER: &[&str] = &["div[class*='book-img'] img"];
pub const SUMMARY: &[&str] = &["div[class*='book-info'] div[class*='intro']"];
pub const CONTENT: &[&str] = &[
    "article div[class*='entry-content']",
    "div[class*='entry-content']",
];
pub const CHAPTER_TITLE: &[&str] = &["article div[class*='single-header'] h1", "h1"];
pub const CONTENT_REMOVALS: &[&str] = &["[class*=\"adsbox\"]"];

struct Selectors {
    title: Vec<Selector>,
    author: Vec<Selector>,
    cover: Vec<Selector>,
    summary: Vec<Selector>,
    content: Vec<Selector>,
    chapter_title: Vec<Selector>,
    catalog: Selector,
    anchor: Selector,
}

static SELECTORS: OnceLock<Selectors> = OnceLock::new();

fn selectors() -> &'static Selectors {
    SELECTORS.get_or_init(|| Selectors {
        title: compile(TITLE),
        author: compile(AUTHOR_META),
        cover: compile(COVER),
        summary: compile(SUMMARY),
        content: compile(CONTENT),
        chapter_title: compile(CHAPTER_TITLE),
        catalog: Selector::parse("div[class*='book-catalog']").unwrap(),
        anchor: Selector::parse("a").unwrap(),
    })
}

#[derive(Debug, Default)]
pub struct NovelHall;

impl NovelHall {
    fn chapter_links(doc: &MarkupDocument, base: &str) -> Vec<ChapterRef> {
        let s = selectors();
        let best = doc
            .select(&s.catalog)
            .map(|c| c.select(&s.anchor).collect::<Vec<_>>())
            .fold(Vec::new(), |best, anchors| {
                if anchors.len() > best.len() { anchors } else { best }
            });

        best.iter()
            .filter_map(|a| {
                let href = element_attr(a, "href")?;
                let name = element_text(a);
                let name = if name.is_empty() { "Chapter".to_string() } else { name };
                Some(ChapterRef::new(name, resolve_url(base, &href)))
            })
            .collect()
    }
}

impl SiteAdapter for NovelHall {
    fn profile(&self) -> &SiteProfile {
        &PROFILE
    }

    fn parse_landing(&self, html: &str, url: &str) -> Result<Landing> {
        let doc = MarkupDocument::parse(html);
        let s = selectors();

        let mut meta = NovelMeta {
            source_url: url.to_string(),
            title: doc.first_text(&s.title).unwrap_or_default(),
            author: doc.first_attr(&s.author, "content").unwrap_or_default(),
            summary: doc.texts(&s.summary).join("\n\n"),
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
                doc.first_of(&s.content).map(|el| inner_html(&el)).unwrap_or_default(),
            )
        };

        let html = FragmentCleaner::new()
            .remove_all(CONTENT_REMOVALS)
            .with_base(url)
            .clean(&fragment)?;
        Ok(ChapterContent { title, html })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING: &str = r#"<html><head><meta property="books:author" content=" Er Gen "></head><body>
        <div class="book-img"><img src="/cover/ri.jpg" alt="Renegade"></div>
        <div class="book-info"><h1>Renegade Immortal</h1>
            <div class="intro"><span>First part.</span></div>
            <div class="intro">Second   part.</div>
        </div>
        <div class="book-catalog"><ul><li><a href="/ri/latest.html">Latest</a></li></ul></div>
        <div class="book-catalog inner"><ul>
            <li><a href="/ri/1.html">Chapter 1 Leaving Home</a></li>
            <li><a href="/ri/2.html"> </a></li>
            <li><a href="/ri/3.html">Chapter 3</a></li>
        </ul></div>
    </body></html>"#;

    #[test]
    fn picks_largest_catalog() {
        let landing = NovelHall.parse_landing(LANDING, "https://www.novelhall.com/ri/").unwrap();
        assert_eq!(landing.meta.title, "Renegade Immortal");
        assert_eq!(landing.meta.author, "Er Gen");
        assert_eq!(landing.meta.cover_url, "https://www.novelhall.com/cover/ri.jpg");
        assert_eq!(landing.meta.summary, "First part.\n\nSecond part.");

        let names: Vec<_> = landing.chapters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Chapter 1 Leaving Home", "Chapter", "Chapter 3"]);
        assert_eq!(landing.chapters[0].url, "https://www.novelhall.com/ri/1.html");
        assert!(landing.toc_pages.is_empty());
    }

    #[test]
    fn chapter_prefers_article_content() {
        let page = r#"<html><body><h1>Site</h1><article><div class="single-header"><h1>Chapter 2 Rain</h1></div>
            <div class="entry-content"><p>Rain fell.</p><div class="adsbox">ad</div></div></article></body></html>"#;
        let content = NovelHall.parse_chapter(page, "https://www.novelhall.com/ri/2.html").unwrap();
        assert_eq!(content.title, "Chapter 2 Rain");
        assert_eq!(content.html, "<p>Rain fell.</p>");
    }

    #[test]
    fn host_allowlist_is_case_insensitive() {
        assert!(NovelHall.supports_host("WWW.NovelHall.com"));
        assert!(!NovelHall.supports_host("novelhall.net"));
    }
}
