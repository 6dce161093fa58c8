//! 配置管理系统 (Configuration Management)
//!
//! 负责 `config.toml` 的反序列化及其层级结构映射，支持环境变量与默认值回退机制。

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use bon::Builder;
use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::core::error::{IngestError, Result};

/// 全局应用配置
#[derive(Debug, Deserialize, Builder, Clone, Default)]
pub struct AppConfig {
    /// 传输层身份与超时
    #[serde(default)]
    #[builder(default)]
    pub http: HttpConfig,

    /// 持久化存储
    #[serde(default)]
    #[builder(default)]
    pub database: DatabaseConfig,

    /// 导入任务默认参数
    #[serde(default)]
    #[builder(default)]
    pub import: ImportConfig,

    /// 站点特定配置覆盖映射 (按来源标签索引)
    #[serde(default)]
    #[builder(default)]
    pub sites: HashMap<String, SiteConfig>,
}

/// HTTP 传输配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    #[builder(default = default_user_agent(), into)]
    pub user_agent: String,
    #[serde(default = "default_accept")]
    #[builder(default = default_accept(), into)]
    pub accept: String,
    #[serde(default = "default_accept_language")]
    #[builder(default = default_accept_language(), into)]
    pub accept_language: String,
    #[serde(default = "default_timeout")]
    #[builder(default = default_timeout())]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    #[builder(default = default_connect_timeout())]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    #[builder(default = default_max_redirects())]
    pub max_redirects: usize,
    /// 单任务内是否保持 Cookie
    #[serde(default = "default_true")]
    #[builder(default = true)]
    pub cookies: bool,
    /// 出站代理 (http/https/socks5)
    pub proxy: Option<String>,
    /// 主机名到固定地址的解析覆盖
    #[serde(default)]
    #[builder(default)]
    pub resolve: HashMap<String, SocketAddr>,
}

/// 存储配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct DatabaseConfig {
    /// SQLite 连接串，缺省时落在平台数据目录
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    #[builder(default = default_max_connections())]
    pub max_connections: u32,
}

/// 导入默认值
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct ImportConfig {
    /// 调用方未给出节流时使用 (仍受适配器下限约束)
    pub default_throttle: Option<f64>,
    /// 通用适配器按"下一章"链接串联的最大页数
    #[serde(default = "default_chain_limit")]
    #[builder(default = default_chain_limit())]
    pub chain_limit: usize,
}

/// 站点特定配置覆盖
#[derive(Debug, Deserialize, Builder, Clone, Default)]
pub struct SiteConfig {
    /// 该来源的默认节流秒数
    pub throttle: Option<f64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36".to_string()
}
fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".to_string()
}
fn default_accept_language() -> String {
    "en-US,en;q=0.5".to_string()
}
fn default_timeout() -> u64 {
    60
}
fn default_connect_timeout() -> u64 {
    20
}
fn default_max_redirects() -> usize {
    8
}
fn default_true() -> bool {
    true
}
fn default_max_connections() -> u32 {
    4
}
fn default_chain_limit() -> usize {
    200
}

impl AppConfig {
    /// 从文件系统与环境变量中加载并解析配置
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let builder = Config::builder();

        let builder = if config_path.exists() {
            builder.add_source(File::from(config_path))
        } else {
            builder
        };

        let settings = builder
            .add_source(Environment::with_prefix("NOVEL_INGEST").separator("__"))
            .build()
            .map_err(IngestError::Config)?;
        settings.try_deserialize().map_err(IngestError::Config)
    }

    /// 解析数据库连接串，必要时创建数据目录
    pub fn database_url(&self) -> Result<String> {
        if let Some(url) = &self.database.url {
            return Ok(url.clone());
        }
        let dirs = ProjectDirs::from("org", "novel-ingest", "novel-ingest")
            .ok_or_else(|| IngestError::Parse("Unable to determine data directory".into()))?;
        let dir = dirs.data_dir();
        std::fs::create_dir_all(dir)?;
        Ok(format!("sqlite://{}", dir.join("novels.db").display()))
    }

    /// 某来源的默认节流
    pub fn site_throttle(&self, tag: &str) -> Option<f64> {
        self.sites
            .get(tag)
            .and_then(|s| s.throttle)
            .or(self.import.default_throttle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_browser_identity() {
        let http = HttpConfig::default();
        assert!(http.user_agent.contains("Chrome/115"));
        assert_eq!(http.timeout_secs, 60);
        assert_eq!(http.connect_timeout_secs, 20);
        assert_eq!(http.max_redirects, 8);
        assert!(http.cookies);
    }

    #[test]
    fn site_throttle_prefers_site_override() {
        let mut sites = HashMap::new();
        sites.insert("novlove".to_string(), SiteConfig { throttle: Some(5.0) });
        let cfg = AppConfig::builder()
            .sites(sites)
            .import(ImportConfig::builder().default_throttle(2.0).build())
            .build();

        assert_eq!(cfg.site_throttle("novlove"), Some(5.0));
        assert_eq!(cfg.site_throttle("fanmtl"), Some(2.0));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = AppConfig::load_from(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(cfg.import.chain_limit, 200);
        assert!(cfg.database.url.is_none());
    }
}
