//! ReadNovelFull 站点实现
//!
//! 主页未直接给出章节列表时，通过 `chapter-archive` AJAX 接口补齐。

use std::sync::OnceLock;

use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use scraper::Selector;
use tracing::warn;
use url::Url;

use crate::core::error::Result;
use crate::core::model::{ChapterContent, ChapterRef, NovelMeta, NovelPage};
use crate::interfaces::site::{Landing, SiteAdapter, SiteContext, SiteProfile};
use crate::markup::{FragmentCleaner, MarkupDocument, compile, element_attr, element_text, inner_html};
use crate::sites::toc;
use crate::utils::resolve_url;

pub static PROFILE: SiteProfile = SiteProfile {
    tag: "readnovelfull",
    label: "ReadNovelFull",
    hosts: &["readnovelfull.com", "www.readnovelfull.com"],
    min_throttle: 1.0,
};

pub const TITLE: &[&str] = &["h3[class*='title']"];
pub const AUTHOR: &[&str] = &["ul[class*='info'] > li:nth-of-type(2) a"];
pub const COVER: &[&str] = &["div[class*='book'] img"];
pub const SUMMARY: &[&str] = &["div[class*='desc-text']"];
pub const CONTENT: &[&str] = &["div#chr-content"];
pub const CHAPTER_TITLE: &[&str] = &["a[class*='chr-title']"];
pub const CONTENT_REMOVALS: &[&str] = &["[class*=\"adsbox\"]"];

struct Selectors {
    title: Vec<Selector>,
    author: Vec<Selector>,
    cover: Vec<Selector>,
    summary: Vec<Selector>,
    content: Vec<Selector>,
    chapter_title: Vec<Selector>,
    info_item: Selector,
    anchor: Selector,
    chapter_link: Selector,
    rating: Selector,
}

static SELECTORS: OnceLock<Selectors> = OnceLock::new();

fn selectors() -> &'static Selectors {
    SELECTORS.get_or_init(|| Selectors {
        title: compile(TITLE),
        author: compile(AUTHOR),
        cover: compile(COVER),
        summary: compile(SUMMARY),
        content: compile(CONTENT),
        chapter_title: compile(CHAPTER_TITLE),
        info_item: Selector::parse("ul[class*='info'] li").unwrap(),
        anchor: Selector::parse("a").unwrap(),
        chapter_link: Selector::parse("ul[class*='list-chapter'] a").unwrap(),
        rating: Selector::parse("div#rating[data-novel-id]").unwrap(),
    })
}

#[derive(Debug, Default)]
pub struct ReadNovelFull;

impl ReadNovelFull {
    fn chapter_links(doc: &MarkupDocument, base: &str) -> Vec<ChapterRef> {
        doc.select(&selectors().chapter_link)
            .filter_map(|a| {
                let href = element_attr(&a, "href")?;
                Some(ChapterRef::new(element_text(&a), resolve_url(base, &href)))
            })
            .collect()
    }

    fn author(doc: &MarkupDocument) -> String {
        let s = selectors();
        if let Some(author) = doc.first_text(&s.author) {
            return author;
        }
        doc.select(&s.info_item)
            .filter(|li| li.text().collect::<String>().to_lowercase().contains("author"))
            .find_map(|li| li.select(&s.anchor).next())
            .map(|a| element_text(&a))
            .unwrap_or_default()
    }

    /// 主页上声明的小说 ID
    pub fn novel_id(html: &str) -> Option<String> {
        let doc = MarkupDocument::parse(html);
        doc.first(&selectors().rating)
            .and_then(|div| element_attr(&div, "data-novel-id"))
    }

    /// `{origin}/ajax/chapter-archive?novelId={id}`
    pub fn archive_url(page_url: &str, novel_id: &str) -> Option<String> {
        let origin = Url::parse(page_url).ok()?.origin().ascii_serialization();
        let id = utf8_percent_encode(novel_id, NON_ALPHANUMERIC);
        Some(format!("{origin}/ajax/chapter-archive?novelId={id}"))
    }

    /// AJAX 补齐章节列表，失败只记录日志
    async fn archive_chapters(&self, ctx: &SiteContext, page_url: &str, novel_id: &str) -> Vec<ChapterRef> {
        let Some(archive) = Self::archive_url(page_url, novel_id) else {
            return Vec::new();
        };
        ctx.log(format!("Chapter list empty, fetching archive: {archive}"));
        match ctx.get(&archive).await {
            Ok(html) => self.parse_toc_page(&html, page_url),
            Err(e) => {
                warn!("章节归档接口请求失败: {} ({})", archive, e);
                ctx.log(format!("Warning: chapter archive request failed – {e}"));
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SiteAdapter for ReadNovelFull {
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
            summary: doc.texts(&s.summary).join("\n\n"),
            ..Default::default()
        };
        if let Some(src) = doc.first_attr(&s.cover, "src") {
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
                doc.first_of(&s.content).map(|el| inner_html(&el)).unwrap_or_default(),
            )
        };

        let html = FragmentCleaner::new()
            .remove_all(CONTENT_REMOVALS)
            .with_base(url)
            .clean(&fragment)?;
        Ok(ChapterContent { title, html })
    }

    async fn parse_novel_page(&self, url: &str, ctx: &SiteContext) -> Result<NovelPage> {
        self.ensure_supported(url)?;
        let html = toc::fetch_landing(ctx, url).await?;
        let mut landing = self.parse_landing(&html, url)?;

        if landing.chapters.is_empty()
            && let Some(id) = Self::novel_id(&html)
        {
            landing.chapters = self.archive_chapters(ctx, url, &id).await;
        }

        let meta = landing.meta.clone();
        let chapters = toc::walk_toc_pages(self, ctx, url, landing).await;
        toc::report_novel(ctx, &meta, chapters.len());
        Ok(NovelPage { meta, chapters })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANDING: &str = r#"<html><body>
        <div class="book"><img src="/media/n.jpg"></div>
        <h3 class="title">Shadow  Slave</h3>
        <ul class="info info-meta"><li><h3>Alt:</h3><a href="/x">Other</a></li><li><h3>Author:</h3><a href="/a">Guiltythree</a></li></ul>
        <div class="desc-text">Sunny.</div>
        <div id="rating" data-novel-id="a b/1"></div>
    </body></html>"#;

    #[test]
    fn landing_without_inline_chapters() {
        let landing = ReadNovelFull.parse_landing(LANDING, "https://readnovelfull.com/shadow.html").unwrap();
        assert_eq!(landing.meta.title, "Shadow Slave");
        assert_eq!(landing.meta.author, "Guiltythree");
        assert_eq!(landing.meta.cover_url, "https://readnovelfull.com/media/n.jpg");
        assert_eq!(landing.meta.summary, "Sunny.");
        assert!(landing.chapters.is_empty());
        assert_eq!(ReadNovelFull::novel_id(LANDING).as_deref(), Some("a b/1"));
    }

    #[test]
    fn archive_url_keeps_origin_and_encodes_id() {
        assert_eq!(
            ReadNovelFull::archive_url("http://readnovelfull.com:8080/shadow.html", "a b/1").as_deref(),
            Some("http://readnovelfull.com:8080/ajax/chapter-archive?novelId=a%20b%2F1")
        );
    }

    #[test]
    fn author_falls_back_to_labelled_item() {
        let html = r#"<ul class="info"><li>Author: <a href="/a">Solo</a></li></ul>"#;
        let landing = ReadNovelFull.parse_landing(html, "https://readnovelfull.com/x.html").unwrap();
        assert_eq!(landing.meta.author, "Solo");
    }

    #[test]
    fn chapter_title_from_link() {
        let page = r##"<html><body><a class="chr-title" href="#">Chapter 9 Night</a>
            <div id="chr-content"><p>Dark.</p><div class="adsbox">x</div></div></body></html>"##;
        let content = ReadNovelFull.parse_chapter(page, "https://readnovelfull.com/shadow/c9.html").unwrap();
        assert_eq!(content.title, "Chapter 9 Night");
        assert_eq!(content.html, "<p>Dark.</p>");
    }
}
