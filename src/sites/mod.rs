use std::sync::Arc;

use tracing::debug;

use crate::core::error::{IngestError, Result};
use crate::interfaces::site::{SiteAdapter, SiteProfile};
use crate::utils::host_of;

pub mod fanmtl;
pub mod generic;
pub mod novelfull;
pub mod novelhall;
pub mod novlove;
pub mod readnovelfull;
pub mod toc;

// ============================================================================
// 站点注册表
// ============================================================================

/// 按主机名分派适配器，未命中时回退到通用解析器
pub struct SiteRegistry {
    adapters: Vec<Arc<dyn SiteAdapter>>,
    fallback: Arc<dyn SiteAdapter>,
}

impl SiteRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(fanmtl::FanMtl);
        registry.register(novelhall::NovelHall);
        registry.register(novelfull::NovelFull::new());
        registry.register(novelfull::NovelFull::allnovel());
        registry.register(readnovelfull::ReadNovelFull);
        registry.register(novlove::Novlove);
        registry
    }

    /// 不含任何专用适配器的注册表
    pub fn empty() -> Self {
        Self {
            adapters: Vec::new(),
            fallback: Arc::new(generic::Generic),
        }
    }

    pub fn register<A>(&mut self, adapter: A)
    where
        A: SiteAdapter + 'static,
    {
        self.adapters.push(Arc::new(adapter));
    }

    /// 主机白名单精确匹配 (大小写不敏感)；`allow_generic` 为 false 时未命中即报错
    pub fn resolve(&self, url: &str, allow_generic: bool) -> Result<Arc<dyn SiteAdapter>> {
        let host = host_of(url).ok_or_else(|| IngestError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".into(),
        })?;

        if let Some(adapter) = self.adapters.iter().find(|a| a.supports_host(&host)) {
            debug!("适配器命中: {} -> {}", host, adapter.profile().tag);
            return Ok(adapter.clone());
        }

        if allow_generic {
            debug!("无专用适配器，使用通用解析: {}", host);
            Ok(self.fallback.clone())
        } else {
            Err(IngestError::UnsupportedHost { host })
        }
    }

    /// 已注册的站点配置 (通用解析器排在最后)
    pub fn list(&self) -> Vec<&SiteProfile> {
        self.adapters
            .iter()
            .chain(std::iter::once(&self.fallback))
            .map(|a| a.profile())
            .collect()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_by_exact_host() {
        let registry = SiteRegistry::new();
        let tag = |url: &str| registry.resolve(url, true).unwrap().profile().tag;
        assert_eq!(tag("https://WWW.FanMTL.com/novel/x.html"), "fanmtl");
        assert_eq!(tag("https://novelbin.me/b"), "novelfull");
        assert_eq!(tag("https://allnovel.org/b"), "allnovel");
        assert_eq!(tag("https://readnovelfull.com/b.html"), "readnovelfull");
        assert_eq!(tag("https://novlove.com/novel/b"), "novlove");
        assert_eq!(tag("https://www.novelhall.com/b/"), "novelhall");
        assert_eq!(tag("https://sub.fanmtl.com/novel/x.html"), "generic");
    }

    #[test]
    fn unknown_host_without_fallback_is_rejected() {
        let registry = SiteRegistry::new();
        match registry.resolve("https://example.org/book", false) {
            Err(IngestError::UnsupportedHost { host }) => assert_eq!(host, "example.org"),
            other => panic!("unexpected: {:?}", other.map(|a| a.profile().tag)),
        }
    }

    #[test]
    fn allowlists_do_not_overlap() {
        let registry = SiteRegistry::new();
        let profiles = registry.list();
        let mut seen = std::collections::HashSet::new();
        for profile in &profiles {
            for host in profile.hosts {
                assert!(seen.insert(*host), "duplicate host {host}");
            }
        }
        assert_eq!(profiles.last().map(|p| p.tag), Some("generic"));
    }
}
