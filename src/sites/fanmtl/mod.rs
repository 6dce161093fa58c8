//! FanMTL 站点模块
//!
//! 覆盖 readwn 系列的镜像站点

mod fetcher;
mod indexer;
mod selectors;

use crate::core::error::Result;
use crate::core::model::{ChapterContent, ChapterRef};
use crate::interfaces::site::{Landing, SiteAdapter, SiteProfile};

pub use self::selectors::SiteSelectors;

pub static PROFILE: SiteProfile = SiteProfile {
    tag: "fanmtl",
    label: "FanMTL",
    hosts: &[
        "fannovel.com", "www.fannovel.com",
        "fannovels.com", "www.fannovels.com",
        "fansmtl.com", "www.fansmtl.com",
        "fanmtl.com", "www.fanmtl.com",
        "novelmt.com", "www.novelmt.com",
        "novelmtl.com", "www.novelmtl.com",
        "readwn.com", "www.readwn.com",
        "wuxiabee.com", "www.wuxiabee.com",
        "wuxiabee.net", "www.wuxiabee.net",
        "wuxiabee.org", "www.wuxiabee.org",
        "wuxiafox.com", "www.wuxiafox.com",
        "wuxiago.com", "www.wuxiago.com",
        "wuxiahere.com", "www.wuxiahere.com",
        "wuxiahub.com", "www.wuxiahub.com",
        "wuxiamtl.com", "www.wuxiamtl.com",
        "wuxiaone.com", "www.wuxiaone.com",
        "wuxiap.com", "www.wuxiap.com",
        "wuxiapub.com", "www.wuxiapub.com",
        "wuxiaspot.com", "www.wuxiaspot.com",
        "wuxiar.com", "www.wuxiar.com",
        "wuxiau.com", "www.wuxiau.com",
        "wuxiazone.com", "www.wuxiazone.com",
    ],
    min_throttle: 3.0,
};

/// FanMTL 站点实现
#[derive(Debug, Default)]
pub struct FanMtl;

impl SiteAdapter for FanMtl {
    fn profile(&self) -> &SiteProfile {
        &PROFILE
    }

    fn parse_landing(&self, html: &str, url: &str) -> Result<Landing> {
        Ok(indexer::parse_landing(html, url))
    }

    fn parse_toc_page(&self, html: &str, url: &str) -> Vec<ChapterRef> {
        indexer::parse_toc_page(html, url)
    }

    fn parse_chapter(&self, html: &str, url: &str) -> Result<ChapterContent> {
        fetcher::parse_chapter(html, url)
    }
}
