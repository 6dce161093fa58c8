//! 站点定义
//!
//! 定义了站点适配器需要实现的核心接口：主页解析、目录分页与正文抓取。

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::error::{IngestError, Result};
use crate::core::model::{ChapterContent, ChapterRef, NovelMeta, NovelPage};
use crate::interfaces::log::ImportLog;
use crate::network::client::Transport;
use crate::sites::toc;
use crate::utils::host_of;

/// 适配器静态配置：来源标签、主机白名单与节流下限
#[derive(Debug)]
pub struct SiteProfile {
    /// 来源标签，同时作为去重键写入 `tags`
    pub tag: &'static str,
    /// 日志中使用的展示名
    pub label: &'static str,
    pub hosts: &'static [&'static str],
    /// 节流下限 (秒)
    pub min_throttle: f64,
}

impl SiteProfile {
    /// 大小写不敏感的精确匹配
    pub fn allows(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.hosts.iter().any(|h| *h == host)
    }
}

/// 小说主页的同步解析结果
#[derive(Debug, Clone, Default)]
pub struct Landing {
    pub meta: NovelMeta,
    /// 主页上的第一页章节
    pub chapters: Vec<ChapterRef>,
    /// 需要额外抓取的目录分页
    pub toc_pages: Vec<String>,
}

/// 站点执行上下文 (单任务)
#[derive(Clone)]
pub struct SiteContext {
    transport: Transport,
    log: Arc<dyn ImportLog>,
    chain_limit: usize,
}

impl SiteContext {
    pub fn new(transport: Transport, log: Arc<dyn ImportLog>) -> Self {
        Self {
            transport,
            log,
            chain_limit: usize::MAX,
        }
    }

    pub fn with_chain_limit(mut self, limit: usize) -> Self {
        self.chain_limit = limit;
        self
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.transport.get_text(url).await
    }

    pub async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<String> {
        self.transport.post_form(url, fields).await
    }

    pub fn log(&self, message: impl AsRef<str>) {
        self.log.log(message.as_ref());
    }

    pub fn chain_limit(&self) -> usize {
        self.chain_limit
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

/// 站点适配器 Trait
///
/// 解析方法均为同步纯函数 (HTML -> 结构)，网络交互由默认的异步方法驱动。
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    fn profile(&self) -> &SiteProfile;

    fn supports_host(&self, host: &str) -> bool {
        self.profile().allows(host)
    }

    /// 在发出任何请求之前校验主机
    fn ensure_supported(&self, url: &str) -> Result<()> {
        let host = host_of(url).ok_or_else(|| IngestError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".into(),
        })?;
        if self.supports_host(&host) {
            Ok(())
        } else {
            Err(IngestError::UnsupportedHost { host })
        }
    }

    /// 解析小说主页：元数据、首页章节与目录分页
    fn parse_landing(&self, html: &str, url: &str) -> Result<Landing>;

    /// 解析单个目录分页
    fn parse_toc_page(&self, html: &str, url: &str) -> Vec<ChapterRef>;

    /// 解析章节页：标题与清洗后的正文片段
    fn parse_chapter(&self, html: &str, url: &str) -> Result<ChapterContent>;

    /// 获取主页并遍历全部目录分页
    async fn parse_novel_page(&self, url: &str, ctx: &SiteContext) -> Result<NovelPage> {
        self.ensure_supported(url)?;
        let html = toc::fetch_landing(ctx, url).await?;
        let landing = self.parse_landing(&html, url)?;
        let meta = landing.meta.clone();
        let chapters = toc::walk_toc_pages(self, ctx, url, landing).await;
        toc::report_novel(ctx, &meta, chapters.len());
        Ok(NovelPage { meta, chapters })
    }

    /// 获取单个章节
    async fn fetch_chapter_content(&self, url: &str, ctx: &SiteContext) -> Result<ChapterContent> {
        let html = ctx.get(url).await?;
        self.parse_chapter(&html, url)
    }
}
