//! 错误处理体系 (Error Handling System)
//!
//! 定义导入管线的领域错误类型以及全局 Result 别名。

use thiserror::Error;

/// 全局错误定义 (Ingest Domain Errors)
#[derive(Error, Debug)]
pub enum IngestError {
    /// 主机不在任何适配器的白名单内，且未启用通用回退
    #[error("Unsupported host: {host}")]
    UnsupportedHost { host: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Middleware error: {0}")]
    Middleware(reqwest_middleware::Error),

    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },

    /// 小说主页无法获取 (首个请求失败即终止任务)
    #[error("Failed to fetch novel page {url}: {source}")]
    UnreachablePage {
        url: String,
        #[source]
        source: Box<IngestError>,
    },

    #[error("No chapters found on novel page.")]
    NoChaptersFound,

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Rewrite error: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {0}")]
    Parse(String),

    #[error("Import cancelled")]
    Cancelled,
}

/// 全局 Result 别名
pub type Result<T> = std::result::Result<T, IngestError>;

impl From<reqwest_middleware::Error> for IngestError {
    /// 展开中间件包装，使传输层失败统一归类为 `Network`
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => IngestError::Network(e),
            reqwest_middleware::Error::Middleware(inner) => match inner.downcast::<IngestError>() {
                Ok(domain) => domain,
                Err(other) => IngestError::Middleware(reqwest_middleware::Error::Middleware(other)),
            },
        }
    }
}

impl IngestError {
    /// 是否属于传输层失败 (连接、超时或 HTTP 状态码)
    pub fn is_transport(&self) -> bool {
        match self {
            IngestError::Network(_) | IngestError::HttpStatus { .. } | IngestError::Middleware(_) => true,
            IngestError::UnreachablePage { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}
