//! NovelFull 系列站点
//!
//! novelfull/novelbin/novelnext 等克隆站共享同一套页面结构。
//! allnovel.org 使用独立的来源标签，解析逻辑相同。

use std::sync::OnceLock;

use scraper::Selector;
use url::Url;

use crate::core::error::Result;
use crate::core::model::{ChapterContent, ChapterRef, NovelMeta};
use crate::interfaces::site::{Landing, SiteAdapter, SiteProfile};
use crate::markup::{FragmentCleaner, MarkupDocument, compile, element_attr, element_text, inner_html};
use crate::sites::toc::leading_number;
use crate::utils::{query_value, resolve_url};

pub static PROFILE: SiteProfile = SiteProfile {
    tag: "novelfull",
    label: "NovelFull",
    hosts: &[
        "allnovelbin.net", "www.allnovelbin.net",
        "allnovelfull.app", "www.allnovelfull.app",
        "allnovelfull.com", "www.allnovelfull.com",
        "allnovelfull.org", "www.allnovelfull.org",
        "allnovelfull.net", "www.allnovelfull.net",
        "allnovelnext.com", "www.allnovelnext.com",
        "all-novelfull.net", "www.all-novelfull.net",
        "boxnovelfull.com", "www.boxnovelfull.com",
        "freenovelsread.com", "www.freenovelsread.com",
        "freewn.com", "www.freewn.com",
        "novel-bin.com", "www.novel-bin.com",
        "novel-bin.net", "www.novel-bin.net",
        "novel-bin.org", "www.novel-bin.org",
        "novel-next.com", "www.novel-next.com",
        "novel35.com", "www.novel35.com",
        "novelactive.org", "www.novelactive.org",
        "novelbin.com", "www.novelbin.com",
        "novelbin.me", "www.novelbin.me",
        "novelbin.net", "www.novelbin.net",
        "novelbin.org", "www.novelbin.org",
        "noveldrama.org", "www.noveldrama.org",
        "novelebook.net", "www.novelebook.net",
        "novelfull.com", "www.novelfull.com",
        "novelfull.net", "www.novelfull.net",
        "novelfullbook.com", "www.novelfullbook.com",
        "novelfulll.com", "www.novelfulll.com",
        "novelhulk.net", "www.novelhulk.net",
        "novelmax.net", "www.novelmax.net",
        "novelnext.com", "www.novelnext.com",
        "novelnext.dramanovels.io", "www.novelnext.dramanovels.io",
        "novelnext.net", "www.novelnext.net",
        "novelnextz.com", "www.novelnextz.com",
        "noveltop1.org", "www.noveltop1.org",
        "noveltrust.net", "www.noveltrust.net",
        "novelusb.com", "www.novelusb.com",
        "novelusb.net", "www.novelusb.net",
        "novelxo.net", "www.novelxo.net",
        "readnovelfull.me", "www.readnovelfull.me",
        "thenovelbin.org", "www.thenovelbin.org",
        "topnovelfull.com", "www.topnovelfull.com",
        "zinnovel.net", "www.zinnovel.net",
    ],
    min_throttle: 1.0,
};

pub static ALLNOVEL_PROFILE: SiteProfile = SiteProfile {
    tag: "allnovel",
    label: "AllNovel",
    hosts: &["allnovel.org", "www.allnovel.org"],
    min_throttle: 1.0,
};

pub const TITLE: &[&str] = &["h3[class*='title']", "h1, h2"];
pub const COVER: &[&str] = &["div[class*='book'] img"];
pub const SUMMARY: &[&str] = &["div[class*='desc-text'], div[class*='info']"];
pub const CONTENT: &[&str] = &["#chr-content", "#chapter-content"];
pub const CHAPTER_TITLE: &[&str] = &["h2"];
pub const CONTENT_REMOVALS: &[&str] = &[
    "[class*=\"adsbox\"]",
    "[class*=\"novel_online\"]",
    "[class*=\"unlock-buttons\"]",
];

struct Selectors {
    title: Vec<Selector>,
    cover: Vec<Selector>,
    summary: Vec<Selector>,
    content: Vec<Selector>,
    chapter_title: Vec<Selector>,
    info_item: Selector,
    info_label: Selector,
    anchor: Selector,
    chapter_link: Selector,
    last_page: Selector,
}

static SELECTORS: OnceLock<Selectors> = OnceLock::new();

fn selectors() -> &'static Selectors {
    SELECTORS.get_or_init(|| Selectors {
        title: compile(TITLE),
        cover: compile(COVER),
        summary: compile(SUMMARY),
        content: compile(CONTENT),
        chapter_title: compile(CHAPTER_TITLE),
        info_item: Selector::parse("ul[class*='info-meta'] li").unwrap(),
        info_label: Selector::parse("h3").unwrap(),
        anchor: Selector::parse("a").unwrap(),
        chapter_link: Selector::parse("ul[class*='list-chapter'] a").unwrap(),
        last_page: Selector::parse("li[class*='last'] a").unwrap(),
    })
}

/// NovelFull 结构的站点实现，按 profile 区分来源
#[derive(Debug)]
pub struct NovelFull {
    profile: &'static SiteProfile,
}

impl NovelFull {
    pub fn new() -> Self {
        Self { profile: &PROFILE }
    }

    pub fn allnovel() -> Self {
        Self {
            profile: &ALLNOVEL_PROFILE,
        }
    }

    fn chapter_links(doc: &MarkupDocument, base: &str) -> Vec<ChapterRef> {
        doc.select(&selectors().chapter_link)
            .filter_map(|a| {
                let href = element_attr(&a, "href")?;
                let name = element_text(&a);
                let name = if name.is_empty() { "Chapter".to_string() } else { name };
                Some(ChapterRef::new(name, resolve_url(base, &href)))
            })
            .collect()
    }

    fn author(doc: &MarkupDocument) -> String {
        let s = selectors();
        doc.select(&s.info_item)
            .find(|li| {
                li.select(&s.info_label)
                    .next()
                    .is_some_and(|h3| element_text(&h3) == "Author:")
            })
            .and_then(|li| li.select(&s.anchor).next())
            .map(|a| element_text(&a))
            .unwrap_or_default()
    }

    /// "最后一页" 链接给出页数：`data-page` 与 `page_num` 为零基，需加一；
    /// 仅有 `page` 时直接作为页数
    fn toc_pages(doc: &MarkupDocument, base: &str) -> Vec<String> {
        let Some(last) = doc.first(&selectors().last_page) else {
            return Vec::new();
        };
        let Some(href) = element_attr(&last, "href") else {
            return Vec::new();
        };
        let href = resolve_url(base, &href);

        let zero_based = element_attr(&last, "data-page")
            .or_else(|| query_value(&href, "page_num"))
            .and_then(|v| leading_number(&v));
        let limit = match zero_based {
            Some(last_index) => last_index + 1,
            None => query_value(&href, "page")
                .and_then(|v| leading_number(&v))
                .unwrap_or(0),
        };

        (1..=limit).filter_map(|i| toc_page_url(&href, i)).collect()
    }
}

impl Default for NovelFull {
    fn default() -> Self {
        Self::new()
    }
}

/// 按主机拼出第 i 页目录地址
fn toc_page_url(href: &str, page: u32) -> Option<String> {
    let mut url = Url::parse(href).ok()?;
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match host.trim_start_matches("www.") {
        "freenovelsread.com" => {
            let first = url
                .path_segments()
                .and_then(|mut segs| segs.find(|s| !s.is_empty()))
                .map(str::to_string);
            match first {
                Some(seg) => url.set_path(&format!("/{seg}/{page}")),
                None => url.set_path(&format!("/{page}")),
            }
            url.set_query(None);
        }
        "novelfulll.com" => {
            url.set_query(Some(&format!("page_num={page}")));
        }
        _ => {
            url.set_query(Some(&format!("page={page}&per-page=50")));
        }
    }
    url.set_fragment(None);
    Some(url.to_string())
}

impl SiteAdapter for NovelFull {
    fn profile(&self) -> &SiteProfile {
        self.profile
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
            toc_pages: Self::toc_pages(&doc, url),
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
