//! 持久化边界 (Store Boundary)
//!
//! 所有写操作都在同一个显式事务中完成。

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::model::{NewChapter, NewNovel};

#[async_trait]
pub trait Store: Send + Sync {
    /// 开启一个导入事务
    async fn begin(&self) -> Result<Box<dyn StoreTx>>;
}

/// 导入事务：提交或回滚之后不可再使用
#[async_trait]
pub trait StoreTx: Send {
    async fn find_novel_by_title_and_tag(&mut self, title: &str, tag: &str) -> Result<Option<i64>>;

    async fn insert_novel(&mut self, novel: &NewNovel) -> Result<i64>;

    async fn insert_chapter(&mut self, chapter: &NewChapter) -> Result<i64>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}
