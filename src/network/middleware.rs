use std::sync::Arc;

use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};
use tracing::{debug, warn};

use crate::network::pacer::Pacer;

/// 节流中间件
/// 负责在每次请求发出前执行任务级的阻塞等待
pub struct PacingMiddleware {
    pacer: Arc<Pacer>,
}

impl PacingMiddleware {
    pub fn new(pacer: Arc<Pacer>) -> Self {
        Self { pacer }
    }
}

#[async_trait::async_trait]
impl Middleware for PacingMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        self.pacer.wait().await;
        next.run(req, extensions).await
    }
}

/// 请求追踪中间件
/// 记录方法、地址与响应状态
pub struct TraceMiddleware;

#[async_trait::async_trait]
impl Middleware for TraceMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        let url = req.url().to_string();
        debug!("{} {}", method, url);

        let resp = next.run(req, extensions).await;
        match &resp {
            Ok(r) if r.status().is_client_error() || r.status().is_server_error() => {
                warn!("{} {} -> {}", method, url, r.status());
            }
            Ok(r) => debug!("{} {} -> {}", method, url, r.status()),
            Err(e) => warn!("{} {} 失败: {}", method, url, e),
        }
        resp
    }
}
