//! SQLite 存储 (sqlx)
//!
//! 一次导入对应一个事务；事务对象在提交或回滚后被取走，之后的调用返回错误。

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::core::error::{IngestError, Result};
use crate::core::model::{ChapterRecord, NewChapter, NewNovel, NovelRecord};
use crate::interfaces::store::{Store, StoreTx};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS novels (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        cover_url TEXT,
        description TEXT NOT NULL DEFAULT '',
        author TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE INDEX IF NOT EXISTS idx_novels_title_tags ON novels (title, tags)",
    "CREATE TABLE IF NOT EXISTS chapters (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        novel_id INTEGER NOT NULL REFERENCES novels (id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        order_index INTEGER NOT NULL,
        created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (novel_id, order_index)
    )",
];

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// 连接数据库文件 (不存在时创建) 并建表
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        info!("数据库已连接: {}", url);
        Self::with_pool(pool).await
    }

    /// 进程内数据库，单连接且不过期
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub async fn novel(&self, id: i64) -> Result<Option<NovelRecord>> {
        let record = sqlx::query_as::<_, NovelRecord>(
            "SELECT id, title, cover_url, description, author, tags FROM novels WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// 按 order_index 升序
    pub async fn chapters(&self, novel_id: i64) -> Result<Vec<ChapterRecord>> {
        let rows = sqlx::query_as::<_, ChapterRecord>(
            "SELECT id, novel_id, title, content, order_index FROM chapters
            WHERE novel_id = ? ORDER BY order_index",
        )
        .bind(novel_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn novel_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM novels")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        debug!("导入事务已开启");
        Ok(Box::new(SqliteTx { tx: Some(tx) }))
    }
}

pub struct SqliteTx {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteTx {
    fn active(&mut self) -> Result<&mut Transaction<'static, Sqlite>> {
        self.tx
            .as_mut()
            .ok_or_else(|| IngestError::Persistence(sqlx::Error::Protocol("transaction already finished".into())))
    }
}

#[async_trait]
impl StoreTx for SqliteTx {
    async fn find_novel_by_title_and_tag(&mut self, title: &str, tag: &str) -> Result<Option<i64>> {
        let tx = self.active()?;
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM novels WHERE title = ? AND tags = ? LIMIT 1")
            .bind(title)
            .bind(tag)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(id)
    }

    async fn insert_novel(&mut self, novel: &NewNovel) -> Result<i64> {
        let tx = self.active()?;
        let result = sqlx::query(
            "INSERT INTO novels (title, cover_url, description, author, tags) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&novel.title)
        .bind(novel.cover_url.as_deref().filter(|c| !c.is_empty()))
        .bind(&novel.description)
        .bind(&novel.author)
        .bind(&novel.tag)
        .execute(&mut **tx)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn insert_chapter(&mut self, chapter: &NewChapter) -> Result<i64> {
        let tx = self.active()?;
        let result = sqlx::query(
            "INSERT INTO chapters (novel_id, title, content, order_index) VALUES (?, ?, ?, ?)",
        )
        .bind(chapter.novel_id)
        .bind(&chapter.title)
        .bind(&chapter.content)
        .bind(chapter.order_index)
        .execute(&mut **tx)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn commit(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => Ok(tx.commit().await?),
            None => Ok(()),
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => Ok(tx.rollback().await?),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn novel(title: &str, tag: &str) -> NewNovel {
        NewNovel {
            title: title.into(),
            cover_url: Some(String::new()),
            description: "d".into(),
            author: "a".into(),
            tag: tag.into(),
        }
    }

    #[tokio::test]
    async fn committed_rows_are_visible() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        let id = tx.insert_novel(&novel("T", "fanmtl")).await.unwrap();
        assert_eq!(tx.find_novel_by_title_and_tag("T", "fanmtl").await.unwrap(), Some(id));
        assert_eq!(tx.find_novel_by_title_and_tag("T", "novelhall").await.unwrap(), None);
        tx.insert_chapter(&NewChapter { novel_id: id, title: "Chapter 1".into(), content: "x".into(), order_index: 1 })
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let record = store.novel(id).await.unwrap().unwrap();
        assert_eq!(record.cover_url, None);
        assert_eq!(record.tags, "fanmtl");
        assert_eq!(store.chapters(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_everything() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.insert_novel(&novel("T", "fanmtl")).await.unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(store.novel_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_order_index_is_rejected() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        let id = tx.insert_novel(&novel("T", "fanmtl")).await.unwrap();
        let chapter = NewChapter { novel_id: id, title: "c".into(), content: "x".into(), order_index: 3 };
        tx.insert_chapter(&chapter).await.unwrap();
        let err = tx.insert_chapter(&chapter).await.unwrap_err();
        assert!(matches!(err, IngestError::Persistence(_)));
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn finished_transaction_cannot_be_reused() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut tx = store.begin().await.unwrap();
        tx.commit().await.unwrap();
        assert!(tx.insert_novel(&novel("T", "x")).await.is_err());
    }
}
