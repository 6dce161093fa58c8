//! 应用程序入口 (Application Entrypoint)
//!
//! 负责 CLI 指令解析、遥测层初始化、依赖注入及导入任务生命周期管理。

use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::MakeWriter;

use novel_ingest::core::config::AppConfig;
use novel_ingest::core::event::create_event_channel;
use novel_ingest::core::model::ImportRequest;
use novel_ingest::engine::ImportOrchestrator;
use novel_ingest::sites::SiteRegistry;
use novel_ingest::store::SqliteStore;
use novel_ingest::ui::{Ui, get_multi};

/// 进度条感知的日志写入器 (TUI-aware Log Writer)
///
/// 确保日志输出不会破坏终端进度条的渲染布局。
struct IndicatifWriter;

impl io::Write for IndicatifWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let _ = get_multi().println(s.trim_end());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for IndicatifWriter {
    type Writer = IndicatifWriter;

    fn make_writer(&self) -> Self::Writer {
        IndicatifWriter
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// SQLite 连接串 (覆盖配置文件)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 导入一部小说
    Import {
        /// 小说主页 URL
        url: String,
        /// 起始章节 (1 起始)
        #[arg(short, long, default_value_t = 1)]
        start: u32,
        /// 结束章节 (含)，缺省导入到最后一章
        #[arg(short, long)]
        end: Option<u32>,
        /// 请求间隔秒数，低于站点下限时取下限
        #[arg(short, long)]
        throttle: Option<f64>,
        /// 保留站点原始章节标题
        #[arg(long)]
        preserve_titles: bool,
        /// 主机无匹配适配器时直接失败，不使用通用解析
        #[arg(long)]
        no_generic: bool,
    },
    /// 列出已注册的站点适配器
    Sites,
    /// 打印已导入的小说及其章节
    Show {
        novel_id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(IndicatifWriter)
        .with_target(false)
        .with_ansi(true)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let registry = Arc::new(SiteRegistry::new());

    let database_url = match cli.database {
        Some(url) => url,
        None => config.database_url()?,
    };

    match cli.command {
        Commands::Import {
            url,
            start,
            end,
            throttle,
            preserve_titles,
            no_generic,
        } => {
            let store = SqliteStore::connect(&database_url, config.database.max_connections).await?;

            // 建立 UI 事件反馈链路
            let (event_sender, event_receiver) = create_event_channel();
            let ui_handle = Ui::run(event_receiver);

            let result = {
                let orchestrator = ImportOrchestrator::builder()
                    .registry(registry)
                    .store(Arc::new(store))
                    .log(Arc::new(event_sender.clone()))
                    .events(event_sender)
                    .config(config)
                    .build();

                // 信号处理与优雅退出
                let cancel = orchestrator.cancel_token();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                });

                let request = ImportRequest {
                    source_url: url,
                    start_chapter: start,
                    end_chapter: end,
                    throttle_seconds: throttle,
                    preserve_titles,
                    allow_generic: !no_generic,
                };
                orchestrator.run(request).await
            };

            // 发送端全部释放后 UI 循环退出
            let _ = ui_handle.await;

            let outcome = result?;
            tracing::info!(
                "Novel #{} ({}): {} chapters saved from order index {}{}",
                outcome.novel_id,
                outcome.source_tag,
                outcome.chapters_saved,
                outcome.first_order_index,
                if outcome.reused { ", appended to existing record" } else { "" }
            );
        }
        Commands::Sites => {
            for profile in registry.list() {
                let hosts = if profile.hosts.is_empty() {
                    "*".to_string()
                } else {
                    profile.hosts.join(", ")
                };
                println!(
                    "{:<14} {:<14} {:>4.1}s  {}",
                    profile.tag, profile.label, profile.min_throttle, hosts
                );
            }
        }
        Commands::Show { novel_id } => {
            let store = SqliteStore::connect(&database_url, config.database.max_connections).await?;
            let Some(novel) = store.novel(novel_id).await? else {
                anyhow::bail!("Novel #{} not found", novel_id);
            };

            println!("{} / {} [{}]", novel.title, novel.author, novel.tags);
            if let Some(cover) = &novel.cover_url {
                println!("cover: {}", cover);
            }
            if !novel.description.is_empty() {
                println!("\n{}\n", novel.description);
            }
            for chapter in store.chapters(novel_id).await? {
                println!(
                    "{:>5}  {}  ({} chars)",
                    chapter.order_index,
                    chapter.title,
                    chapter.content.chars().count()
                );
            }
        }
    }

    Ok(())
}
