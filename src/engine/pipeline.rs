//! 导入引擎调度器
//!
//! 负责协调任务的生命周期：
//! 选择适配器 -> 解析主页 (NovelFetched) -> 确定区间 (RangeResolved)
//! -> 逐章导入 (Importing) -> 提交 (Committed) 或回滚 (Failed)

use std::sync::Arc;

use bon::Builder;
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::config::AppConfig;
use crate::core::error::{IngestError, Result};
use crate::core::event::{EventSender, ImportEvent};
use crate::core::model::{ImportOutcome, ImportRequest, NewChapter, NewNovel, NovelPage};
use crate::interfaces::log::{ImportLog, TracingLog};
use crate::interfaces::site::{SiteAdapter, SiteContext};
use crate::interfaces::store::{Store, StoreTx};
use crate::network::client::Transport;
use crate::network::pacer::{Pacer, Sleeper, TokioSleeper, effective_delay};
use crate::sites::SiteRegistry;

use super::context::JobContext;
use super::task::{ChapterRange, ChapterTask};

/// 解析出的书名为空时使用
pub const DEFAULT_TITLE: &str = "Imported Novel";

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ImportPhase {
    Idle,
    NovelFetched,
    RangeResolved,
    Importing,
    Committed,
    Failed,
}

/// 导入引擎
///
/// 每次 `run` 都会新建独立的传输层 (Cookie 罐与节流器)，任务之间不共享状态。
#[derive(Builder)]
pub struct ImportOrchestrator {
    registry: Arc<SiteRegistry>,
    store: Arc<dyn Store>,
    /// 调用方日志，缺省转发到 tracing
    log: Option<Arc<dyn ImportLog>>,
    events: Option<EventSender>,
    /// 节流等待的实现，缺省为 tokio 计时器
    sleeper: Option<Arc<dyn Sleeper>>,
    #[builder(default)]
    config: AppConfig,
    #[builder(default)]
    cancel: CancellationToken,
}

impl ImportOrchestrator {
    /// 执行一次导入
    pub async fn run(&self, request: ImportRequest) -> Result<ImportOutcome> {
        match self.execute(&request).await {
            Ok(outcome) => {
                self.emit(ImportEvent::TaskCompleted {
                    novel_id: outcome.novel_id,
                    chapters: outcome.chapters_saved,
                });
                Ok(outcome)
            }
            Err(e) => {
                error!("导入失败: {} ({})", request.source_url, e);
                self.job_log().log(&format!("ERROR: {e}"));
                self.emit(ImportEvent::TaskFailed { error: e.to_string() });
                Err(e)
            }
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    async fn execute(&self, request: &ImportRequest) -> Result<ImportOutcome> {
        let url = request.source_url.trim();
        let adapter = self.registry.resolve(url, request.allow_generic)?;
        adapter.ensure_supported(url)?;

        let job = self.prepare_job(adapter, request)?;
        let mut phase = ImportPhase::Idle;

        // 1. 主页与目录 (Discover)
        let page = self.discover(&job, url).await?;
        advance(&mut phase, ImportPhase::NovelFetched);

        // 2. 区间 (Resolve)
        let range = ChapterRange::resolve(page.chapters.len(), request.start_chapter, request.end_chapter)
            .ok_or(IngestError::NoChaptersFound)?;
        advance(&mut phase, ImportPhase::RangeResolved);
        job.emit(ImportEvent::RangeResolved { count: range.len() });
        info!(
            "导入区间: {}..={} (共 {} 章)",
            range.start + 1,
            range.end + 1,
            range.len()
        );

        // 3. 事务内导入 (Import)
        let mut tx = self.store.begin().await?;
        advance(&mut phase, ImportPhase::Importing);
        let result = self.import(&job, tx.as_mut(), &page, range, request).await;

        match result {
            Ok(outcome) => {
                tx.commit().await?;
                advance(&mut phase, ImportPhase::Committed);
                job.log(format!(
                    "{} import complete for novel ID {}.",
                    job.profile().label,
                    outcome.novel_id
                ));
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!("事务回滚失败: {}", rollback);
                }
                advance(&mut phase, ImportPhase::Failed);
                Err(e)
            }
        }
    }

    /// 为单个任务构建传输层与节流器
    fn prepare_job(&self, adapter: Arc<dyn SiteAdapter>, request: &ImportRequest) -> Result<JobContext> {
        let profile = adapter.profile();
        let requested = request
            .throttle_seconds
            .or_else(|| self.config.site_throttle(profile.tag));
        let delay = effective_delay(requested, profile.min_throttle);

        let sleeper = self.sleeper.clone().unwrap_or_else(|| Arc::new(TokioSleeper));
        let pacer = Arc::new(Pacer::new(delay, sleeper));
        let transport = Transport::new(&self.config.http, pacer)?;

        let chain_limit = match request.end_chapter {
            Some(end) => (end as usize).min(self.config.import.chain_limit),
            None => self.config.import.chain_limit,
        };
        let site = SiteContext::new(transport, self.job_log()).with_chain_limit(chain_limit);

        info!(
            "使用 {} 适配器，请求间隔 {:.1}s",
            profile.label,
            delay.as_secs_f64()
        );
        self.emit(ImportEvent::TaskStarted {
            source: profile.label.to_string(),
            url: request.source_url.clone(),
        });

        Ok(JobContext::new(adapter, site, self.job_log(), self.events.clone()))
    }

    async fn discover(&self, job: &JobContext, url: &str) -> Result<NovelPage> {
        debug!("正在解析小说主页...");
        let page = job.adapter.parse_novel_page(url, &job.site).await?;
        if page.chapters.is_empty() {
            return Err(IngestError::NoChaptersFound);
        }

        job.emit(ImportEvent::NovelParsed {
            title: page.meta.title.clone(),
        });
        job.emit(ImportEvent::ChaptersDiscovered {
            total: page.chapters.len(),
        });
        info!("共发现 {} 个章节", page.chapters.len());
        Ok(page)
    }

    async fn import(
        &self,
        job: &JobContext,
        tx: &mut dyn StoreTx,
        page: &NovelPage,
        range: ChapterRange,
        request: &ImportRequest,
    ) -> Result<ImportOutcome> {
        let (novel_id, reused) = self.upsert_novel(job, tx, page).await?;

        let first_order_index = i64::from(request.start_chapter.max(1));
        let mut saved = 0;

        for (done, position) in range.indices().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let chapter = &page.chapters[position];
            let order_index = first_order_index + done as i64;
            job.log(format!("Fetching chapter {} ({})", position + 1, chapter.name));

            let task = ChapterTask::new(position, order_index, chapter);
            let prepared = tokio::select! {
                _ = self.cancel.cancelled() => return Err(IngestError::Cancelled),
                prepared = task.run(job, request.preserve_titles) => prepared?,
            };

            tx.insert_chapter(&NewChapter {
                novel_id,
                title: prepared.title.clone(),
                content: prepared.content,
                order_index,
            })
            .await?;

            saved += 1;
            job.log(format!("Saved chapter {order_index} to DB."));
            job.chapter_saved(saved, order_index, &prepared.title);
        }

        Ok(ImportOutcome {
            novel_id,
            reused,
            source_tag: job.profile().tag,
            chapters_saved: saved,
            first_order_index,
        })
    }

    /// 以 (书名, 来源标签) 查找已有记录，存在则复用
    async fn upsert_novel(&self, job: &JobContext, tx: &mut dyn StoreTx, page: &NovelPage) -> Result<(i64, bool)> {
        let profile = job.profile();
        let title = match page.meta.title.trim() {
            "" => DEFAULT_TITLE,
            t => t,
        };

        if let Some(id) = tx.find_novel_by_title_and_tag(title, profile.tag).await? {
            job.log(format!(
                "Reusing existing {} novel (ID {id}) with title '{title}'.",
                profile.label
            ));
            return Ok((id, true));
        }

        job.log(format!("Creating new {} novel with title '{title}'.", profile.label));
        let meta = &page.meta;
        let id = tx
            .insert_novel(&NewNovel {
                title: title.to_string(),
                cover_url: Some(meta.cover_url.clone()).filter(|c| !c.is_empty()),
                description: meta.summary.clone(),
                author: meta.author.clone(),
                tag: profile.tag.to_string(),
            })
            .await?;
        Ok((id, false))
    }

    fn job_log(&self) -> Arc<dyn ImportLog> {
        self.log.clone().unwrap_or_else(|| Arc::new(TracingLog))
    }

    fn emit(&self, event: ImportEvent) {
        if let Some(sender) = &self.events {
            sender.emit(event);
        }
    }
}

fn advance(phase: &mut ImportPhase, next: ImportPhase) {
    debug!("任务状态: {} -> {}", phase, next);
    *phase = next;
}
