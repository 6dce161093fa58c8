//! FanMTL 选择器
//!
//! 预编译的 CSS 选择器。多策略字段按优先级排列，命中即止。

use std::sync::OnceLock;

use scraper::Selector;

use crate::markup::compile;

pub const TITLE: &[&str] = &["div[class*='main-head'] h1", "h1"];
pub const COVER: &[&str] = &["figure[class*='cover'] img"];
pub const AUTHOR: &[&str] = &["span[itemprop='author']"];
pub const SUMMARY: &[&str] = &["div[class*='summary'] div[class*='content']"];
pub const CONTENT: &[&str] = &[
    "div[class*='chapter-content']",
    "div#chapter-content",
    "article",
    "main",
];
pub const CHAPTER_TITLE: &[&str] = &["h2"];

/// 正文中需要移除的节点 (lol_html 选择器)
pub const CONTENT_REMOVALS: &[&str] = &["[class*=\"adsbox\"]"];

/// 站点选择器集合
pub struct SiteSelectors {
    pub title: Vec<Selector>,
    pub cover: Vec<Selector>,
    pub author: Vec<Selector>,
    pub summary: Vec<Selector>,
    pub content: Vec<Selector>,
    pub chapter_title: Vec<Selector>,
    pub chapter_link: Selector,
    pub chapter_no: Selector,
    pub chapter_name: Selector,
    pub pagination_link: Selector,
}

static SELECTORS: OnceLock<SiteSelectors> = OnceLock::new();

impl SiteSelectors {
    /// 获取全局选择器实例
    pub fn get() -> &'static SiteSelectors {
        SELECTORS.get_or_init(|| SiteSelectors {
            title: compile(TITLE),
            cover: compile(COVER),
            author: compile(AUTHOR),
            summary: compile(SUMMARY),
            content: compile(CONTENT),
            chapter_title: compile(CHAPTER_TITLE),
            chapter_link: Selector::parse("ul[class*='chapter-list'] a").unwrap(),
            chapter_no: Selector::parse("[class*='chapter-no']").unwrap(),
            chapter_name: Selector::parse("[class*='chapter-title']").unwrap(),
            pagination_link: Selector::parse("ul[class*='pagination'] li a[href]").unwrap(),
        })
    }
}
