//! 集成测试夹具：本地 HTTP 站点、日志收集与导入器构造

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use novel_ingest::core::config::{AppConfig, HttpConfig};
use novel_ingest::engine::ImportOrchestrator;
use novel_ingest::interfaces::ImportLog;
use novel_ingest::network::RecordingSleeper;
use novel_ingest::sites::SiteRegistry;
use novel_ingest::store::SqliteStore;

/// 路径 (含查询串) -> (状态码, 正文)
pub type Routes = HashMap<String, (u16, String)>;

/// 本地站点，记录收到的每个请求路径
pub struct FixtureSite {
    pub addr: SocketAddr,
    hits: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FixtureSite {
    pub fn spawn(routes: Routes) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start fixture server");
        let addr = server
            .server_addr()
            .to_ip()
            .expect("fixture server bound to an ip address");

        let hits = Arc::new(Mutex::new(Vec::new()));
        let recorded = hits.clone();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                recorded.lock().push(path.clone());

                let (status, body) = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| (404, "not found".to_string()));
                let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
                    .expect("static header");
                let _ = request.respond(
                    tiny_http::Response::from_string(body)
                        .with_status_code(status)
                        .with_header(header),
                );
            }
        });

        Self {
            addr,
            hits,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// 以指定主机名访问本站点 (主机名需通过解析覆盖指向本地)
    pub fn url(&self, host: &str, path: &str) -> String {
        format!("http://{}:{}{}", host, self.addr.port(), path)
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().clone()
    }

    /// 将若干主机名解析到本站点
    pub fn config(&self, hosts: &[&str]) -> AppConfig {
        let resolve = hosts.iter().map(|h| (h.to_string(), self.addr)).collect();
        AppConfig::builder()
            .http(HttpConfig::builder().resolve(resolve).timeout_secs(5).build())
            .build()
    }
}

impl Drop for FixtureSite {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// 收集导入日志行
#[derive(Default)]
pub struct CollectingLog {
    lines: Mutex<Vec<String>>,
}

impl CollectingLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }
}

impl ImportLog for CollectingLog {
    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

/// 一次测试会话：内存库、日志与不真正等待的节流
pub struct Harness {
    pub store: SqliteStore,
    pub log: Arc<CollectingLog>,
    pub sleeper: Arc<RecordingSleeper>,
}

impl Harness {
    pub async fn new() -> Self {
        Self {
            store: SqliteStore::in_memory().await.expect("in-memory store"),
            log: Arc::new(CollectingLog::default()),
            sleeper: Arc::new(RecordingSleeper::new()),
        }
    }

    pub fn orchestrator(&self, config: AppConfig) -> ImportOrchestrator {
        ImportOrchestrator::builder()
            .registry(Arc::new(SiteRegistry::new()))
            .store(Arc::new(self.store.clone()))
            .log(self.log.clone())
            .sleeper(self.sleeper.clone())
            .config(config)
            .build()
    }
}

/// FanMTL 风格的小说：主页列出前 5 章，其余分布在 3 个目录分页。
/// 第 1 页重复列出第 5 章。
pub fn fanmtl_novel(total: usize) -> Routes {
    let mut routes = Routes::new();

    let item = |i: usize| {
        format!(
            r#"<li><a href="/novel/mp_{i}.html"><span class="chapter-no">{i}</span><strong class="chapter-title">Chapter {i} Title {i}</strong></a></li>"#
        )
    };
    let list = |range: std::ops::RangeInclusive<usize>| {
        let items: String = range.filter(|i| *i <= total).map(item).collect();
        format!(r#"<ul class="chapter-list">{items}</ul>"#)
    };

    routes.insert(
        "/novel/mp.html".into(),
        (
            200,
            format!(
                r#"<html><body>
                <div class="main-head"><h1>Martial Peak</h1></div>
                <figure class="cover"><img src="/cover.jpg" alt="cover"></figure>
                <span itemprop="author">Momo</span>
                <div class="summary"><div class="content">A young man climbs.</div></div>
                {}
                <ul class="pagination">
                    <li><a href="/e/extend/fy.php?page=1&wjm=mp">2</a></li>
                    <li><a href="/e/extend/fy.php?page=3&wjm=mp">Last</a></li>
                </ul>
                </body></html>"#,
                list(1..=5)
            ),
        ),
    );

    for page in 1..=3 {
        let first = if page == 1 { 5 } else { page * 5 + 1 };
        routes.insert(
            format!("/e/extend/fy.php?page={page}&wjm=mp"),
            (200, format!("<html><body>{}</body></html>", list(first..=page * 5 + 5))),
        );
    }

    for i in 1..=total {
        routes.insert(
            format!("/novel/mp_{i}.html"),
            (
                200,
                format!(
                    r#"<html><body><h2>Chapter {i} - Title {i}</h2>
                    <div class="chapter-content"><p>Body of chapter {i}.</p><div class="adsbox">ad</div><p>Second &amp; last.</p></div>
                    </body></html>"#
                ),
            ),
        );
    }

    routes
}
