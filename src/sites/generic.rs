//! 通用启发式解析器 (Generic Adapter)
//!
//! 没有专用适配器的站点回退到这里：
//! - 章节发现：文本形如章节的锚点，按归一化 URL 去重
//! - 正文定位：`div`/`article`/`section` 中 "文本长度 - 链接文本长度" 最大者
//! - 下一章：优先 `rel="next"`，其次按文字匹配，排除翻页链接
//!
//! 主页没有章节锚点但存在下一章链接时，沿下一章链接顺序抓取 (soft chaining)。

use std::collections::HashSet;
use std::sync::{LazyLock, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

use crate::core::error::Result;
use crate::core::model::{ChapterContent, ChapterRef, NovelMeta, NovelPage};
use crate::interfaces::site::{Landing, SiteAdapter, SiteContext, SiteProfile};
use crate::markup::{FragmentCleaner, MarkupDocument, compile, element_attr, element_text, inner_html};
use crate::sites::toc;
use crate::utils::{normalize_for_compare, resolve_url};

pub static PROFILE: SiteProfile = SiteProfile {
    tag: "generic",
    label: "Generic",
    hosts: &[],
    min_throttle: 1.0,
};

pub const TITLE: &[&str] = &["h1"];
pub const AUTHOR_META: &[&str] = &["meta[name='author'], meta[property='og:book:author']"];
pub const COVER_META: &[&str] = &["meta[property='og:image']"];
pub const SUMMARY_META: &[&str] = &["meta[name='description'], meta[property='og:description']"];

/// 正文中整体移除的标签
pub const JUNK_TAGS: &[&str] = &[
    "iframe", "form", "input", "button", "textarea",
];

/// 分享、广告等挂件的 class 片段
pub const JUNK_CLASSES: &[&str] = &[
    "sharedaddy",
    "wpcnt",
    "post-categories",
    "mistape_caption",
    "wpulike",
    "wp-next-post-navi",
    "ezoic-adpicker-ad",
    "ezoic-ad",
    "adsbygoogle",
    "sharepost",
    "adsbox",
];

static CHAPTER_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)chapter|vol|episode|\d+").unwrap());
static NEXT_TEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)next|→|»").unwrap());
static PAGE_TEXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)page").unwrap());
static CHAPTER_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)chapter").unwrap());
static NAV_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)next|prev|previous|index|toc").unwrap());

/// 正文清洗时移除的选择器 (junk 标签 + `div`/`ul`/`ins` 上的挂件 class)
static JUNK_SELECTORS: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut selectors: Vec<String> = JUNK_TAGS.iter().map(|t| t.to_string()).collect();
    for class in JUNK_CLASSES {
        for tag in ["div", "ul", "ins"] {
            selectors.push(format!("{tag}[class*=\"{class}\"]"));
        }
    }
    selectors
});

struct Selectors {
    title: Vec<Selector>,
    author: Vec<Selector>,
    cover: Vec<Selector>,
    summary: Vec<Selector>,
    link: Selector,
    rel_next: Selector,
    candidate: Selector,
    anchor: Selector,
}

static SELECTORS: OnceLock<Selectors> = OnceLock::new();

fn selectors() -> &'static Selectors {
    SELECTORS.get_or_init(|| Selectors {
        title: compile(TITLE),
        author: compile(AUTHOR_META),
        cover: compile(COVER_META),
        summary: compile(SUMMARY_META),
        link: Selector::parse("a[href]").unwrap(),
        rel_next: Selector::parse("a[rel='next']").unwrap(),
        candidate: Selector::parse("div, article, section").unwrap(),
        anchor: Selector::parse("a").unwrap(),
    })
}

/// 链接密度惩罚后的得分：`textLen * (1 - linkLen / textLen)`
pub fn content_score(el: &ElementRef<'_>) -> usize {
    let text_len = el.text().collect::<String>().trim().len();
    if text_len == 0 {
        return 0;
    }
    let link_len: usize = el
        .select(&selectors().anchor)
        .map(|a| a.text().collect::<String>().trim().len())
        .sum();
    text_len.saturating_sub(link_len)
}

/// 得分最高的候选容器，均为零分时回退到 `<body>`
pub fn find_content<'a>(doc: &'a MarkupDocument) -> Option<ElementRef<'a>> {
    let mut best = None;
    let mut best_score = 0;
    for el in doc.select(&selectors().candidate) {
        let score = content_score(&el);
        if score > best_score {
            best_score = score;
            best = Some(el);
        }
    }
    best.or_else(|| doc.body())
}

/// 文本形如章节的锚点，按归一化 URL 去重
pub fn chapter_links(doc: &MarkupDocument, base: &str) -> Vec<ChapterRef> {
    let mut seen = HashSet::new();
    doc.select(&selectors().link)
        .filter_map(|a| {
            let text = element_text(&a);
            let href = element_attr(&a, "href")?;
            if text.is_empty() {
                return None;
            }
            let url = resolve_url(base, &href);
            if !CHAPTER_TEXT.is_match(&text) || !seen.insert(normalize_for_compare(&url)) {
                return None;
            }
            Some(ChapterRef::new(text, url))
        })
        .collect()
}

/// 下一章链接
pub fn find_next_link(doc: &MarkupDocument, base: &str) -> Option<String> {
    let s = selectors();
    if let Some(href) = doc.first(&s.rel_next).and_then(|a| element_attr(&a, "href")) {
        return Some(resolve_url(base, &href));
    }

    doc.select(&s.link).find_map(|a| {
        let text = element_text(&a);
        if !NEXT_TEXT.is_match(&text) {
            return None;
        }
        if PAGE_TEXT.is_match(&text) && !CHAPTER_WORD.is_match(&text) {
            return None;
        }
        element_attr(&a, "href").map(|href| resolve_url(base, &href))
    })
}

fn has_next_link(html: &str, url: &str) -> bool {
    find_next_link(&MarkupDocument::parse(html), url).is_some()
}

#[derive(Debug, Default)]
pub struct Generic;

impl Generic {
    /// 解析章节并同时给出下一章链接
    pub fn parse_chain_page(&self, html: &str, url: &str) -> Result<(ChapterContent, Option<String>)> {
        let next = find_next_link(&MarkupDocument::parse(html), url);
        Ok((self.parse_chapter(html, url)?, next))
    }

    /// 从主页出发沿下一章链接抓取，主页本身作为第一章
    async fn follow_chain(&self, ctx: &SiteContext, landing_url: &str, landing_html: &str) -> Result<Vec<ChapterRef>> {
        let limit = ctx.chain_limit().max(1);
        let (first, mut next) = self.parse_chain_page(landing_html, landing_url)?;

        let mut visited = HashSet::from([normalize_for_compare(landing_url)]);
        let mut chapters = vec![chain_ref(first, landing_url)];
        ctx.log("No chapter list found; following next-chapter links.");

        while chapters.len() < limit {
            let Some(url) = next.take() else { break };
            if !visited.insert(normalize_for_compare(&url)) {
                debug!("下一章链接回到已访问页面，停止: {}", url);
                break;
            }

            let html = match ctx.get(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("下一章抓取失败，停止串联: {} ({})", url, e);
                    ctx.log(format!("Warning: failed to fetch next chapter {url} – {e}"));
                    break;
                }
            };
            let (content, following) = self.parse_chain_page(&html, &url)?;
            chapters.push(chain_ref(content, &url));
            next = following;
        }

        Ok(chapters)
    }
}

fn chain_ref(content: ChapterContent, url: &str) -> ChapterRef {
    ChapterRef::new(content.title, url).with_content(content.html)
}

#[async_trait]
impl SiteAdapter for Generic {
    fn profile(&self) -> &SiteProfile {
        &PROFILE
    }

    fn supports_host(&self, _host: &str) -> bool {
        true
    }

    fn parse_landing(&self, html: &str, url: &str) -> Result<Landing> {
        let doc = MarkupDocument::parse(html);
        let s = selectors();

        let meta = NovelMeta {
            source_url: url.to_string(),
            title: doc.first_text(&s.title).unwrap_or_else(|| "Unknown Title".into()),
            author: doc
                .first_attr(&s.author, "content")
                .unwrap_or_else(|| "Unknown Author".into()),
            cover_url: doc.first_attr(&s.cover, "content").unwrap_or_default(),
            summary: doc.first_attr(&s.summary, "content").unwrap_or_default(),
        };

        Ok(Landing {
            meta,
            chapters: chapter_links(&doc, url),
            toc_pages: Vec::new(),
        })
    }

    fn parse_toc_page(&self, html: &str, url: &str) -> Vec<ChapterRef> {
        chapter_links(&MarkupDocument::parse(html), url)
    }

    fn parse_chapter(&self, html: &str, url: &str) -> Result<ChapterContent> {
        let (title, fragment, mask) = {
            let doc = MarkupDocument::parse(html);
            let title = doc
                .first_text(&selectors().title)
                .unwrap_or_else(|| "Chapter".to_string());
            match find_content(&doc) {
                Some(el) => {
                    let mask: Vec<bool> = el
                        .select(&selectors().anchor)
                        .map(|a| NAV_TEXT.is_match(&element_text(&a)))
                        .collect();
                    (title, inner_html(&el), mask)
                }
                None => (title, String::new(), Vec::new()),
            }
        };

        let junk: Vec<&str> = JUNK_SELECTORS.iter().map(String::as_str).collect();
        let html = FragmentCleaner::new()
            .remove_all(&junk)
            .drop_anchors(mask)
            .with_base(url)
            .clean(&fragment)?;
        Ok(ChapterContent { title, html })
    }

    async fn parse_novel_page(&self, url: &str, ctx: &SiteContext) -> Result<NovelPage> {
        self.ensure_supported(url)?;
        let html = toc::fetch_landing(ctx, url).await?;
        let mut landing = self.parse_landing(&html, url)?;

        if landing.chapters.is_empty() && has_next_link(&html, url) {
            landing.chapters = self.follow_chain(ctx, url, &html).await?;
        }

        let meta = landing.meta.clone();
        let chapters = toc::walk_toc_pages(self, ctx, url, landing).await;
        toc::report_novel(ctx, &meta, chapters.len());
        Ok(NovelPage { meta, chapters })
    }
}
