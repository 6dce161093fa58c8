//! 传输层 (Transport)
//!
//! 单任务独占的 HTTP 客户端：固定身份头、超时、重定向上限与 Cookie 罐，
//! 所有请求都经过节流中间件。

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use tracing::debug;

use crate::core::config::HttpConfig;
use crate::core::error::{IngestError, Result};
use crate::network::middleware::{PacingMiddleware, TraceMiddleware};
use crate::network::pacer::Pacer;

/// 面向导入任务的 HTTP 客户端封装
#[derive(Clone)]
pub struct Transport {
    client: ClientWithMiddleware,
    pacer: Arc<Pacer>,
}

impl Transport {
    pub fn new(config: &HttpConfig, pacer: Arc<Pacer>) -> Result<Self> {
        let client = Self::try_build_internal_client(config)?;
        let client = ClientBuilder::new(client)
            .with(TraceMiddleware)
            .with(PacingMiddleware::new(pacer.clone()))
            .build();
        Ok(Self { client, pacer })
    }

    /// 构建底层的 HTTP 客户端
    fn try_build_internal_client(config: &HttpConfig) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();

        let base_headers = [
            (USER_AGENT, config.user_agent.as_str()),
            (ACCEPT, config.accept.as_str()),
            (ACCEPT_LANGUAGE, config.accept_language.as_str()),
        ];
        headers.extend(
            base_headers
                .into_iter()
                .filter(|(_, v)| !v.is_empty())
                .filter_map(|(k, v)| HeaderValue::from_str(v).ok().map(|val| (k, val))),
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(config.cookies)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs));

        builder = match &config.proxy {
            Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy)?),
            None => builder.no_proxy(),
        };

        for (host, addr) in &config.resolve {
            builder = builder.resolve(host, *addr);
        }

        Ok(builder.build()?)
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// GET 并读取文本，状态码 >= 400 视为失败
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        Self::read_text(url, resp).await
    }

    /// 以 `application/x-www-form-urlencoded` 提交表单
    pub async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> Result<String> {
        let body = serde_urlencoded::to_string(fields)
            .map_err(|e| IngestError::Parse(format!("form encoding failed: {e}")))?;
        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;
        Self::read_text(url, resp).await
    }

    async fn read_text(url: &str, resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        if status.as_u16() >= 400 {
            return Err(IngestError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let text = resp.text().await?;
        debug!(bytes = text.len(), "已读取响应: {}", url);
        Ok(text)
    }
}
