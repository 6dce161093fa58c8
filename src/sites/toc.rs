//! 目录分页遍历 (TOC Pagination Walker)
//!
//! 各适配器共用的流程：主页 -> 分页发现 -> 逐页抓取 -> 按 URL 去重合并。
//! 分页抓取失败只记录警告，不终止任务。

use tracing::{debug, warn};

use crate::core::error::{IngestError, Result};
use crate::core::model::{ChapterList, ChapterRef, NovelMeta};
use crate::interfaces::site::{Landing, SiteAdapter, SiteContext};
use crate::utils::{normalize_for_compare, query_value, with_query_param};

/// 获取小说主页，失败映射为 `UnreachablePage`
pub async fn fetch_landing(ctx: &SiteContext, url: &str) -> Result<String> {
    ctx.log(format!("Fetching novel page: {url}"));
    ctx.get(url).await.map_err(|e| IngestError::UnreachablePage {
        url: url.to_string(),
        source: Box::new(e),
    })
}

/// 遍历目录分页并合并章节
pub async fn walk_toc_pages<A>(
    adapter: &A,
    ctx: &SiteContext,
    landing_url: &str,
    landing: Landing,
) -> Vec<ChapterRef>
where
    A: SiteAdapter + ?Sized,
{
    let mut list = ChapterList::new();
    list.merge(landing.chapters);

    let pages = landing.toc_pages;
    ctx.log(format!("Discovered {} TOC page(s).", pages.len().max(1)));

    let landing_key = normalize_for_compare(landing_url);
    for page in &pages {
        if normalize_for_compare(page) == landing_key {
            continue;
        }

        ctx.log(format!("Fetching TOC page: {page}"));
        match ctx.get(page).await {
            Ok(html) => {
                let found = adapter.parse_toc_page(&html, page);
                ctx.log(format!("TOC page returned {} chapter links.", found.len()));
                let added = list.merge(found);
                debug!(added, total = list.len(), "目录分页已合并: {}", page);
            }
            Err(e) => {
                warn!("目录分页抓取失败，跳过: {} ({})", page, e);
                ctx.log(format!("Warning: failed to fetch TOC page {page} – {e}"));
            }
        }
    }

    list.into_vec()
}

/// 输出解析摘要
pub fn report_novel(ctx: &SiteContext, meta: &NovelMeta, total: usize) {
    ctx.log(format!("Parsed novel title: {}", meta.title));
    if !meta.author.is_empty() {
        ctx.log(format!("Author: {}", meta.author));
    }
    if !meta.cover_url.is_empty() {
        ctx.log(format!("Cover URL: {}", meta.cover_url));
    }
    ctx.log(format!("Total discovered chapter links: {total}"));
}

/// 查询参数式分页：在携带 `param=` 的链接中取最大页码 N，
/// 以首个此类链接为模板生成第 1..=N 页。无分页时返回空列表。
pub fn query_param_pages(links: &[String], param: &str) -> Vec<String> {
    let needle = format!("{param}=");
    let candidates: Vec<&String> = links
        .iter()
        .filter(|l| {
            l.split_once('?')
                .is_some_and(|(_, q)| q.split('#').next().unwrap_or("").contains(&needle))
        })
        .collect();

    let Some(template) = candidates.first() else {
        return Vec::new();
    };

    let max_page = candidates
        .iter()
        .filter_map(|l| query_value(l, param))
        .filter_map(|v| leading_number(&v))
        .max()
        .unwrap_or(0);

    (1..=max_page)
        .map(|i| with_query_param(template, param, &i.to_string()))
        .collect()
}

/// 取字符串开头的整数部分 (`"12abc"` -> 12)
pub fn leading_number(value: &str) -> Option<u32> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
