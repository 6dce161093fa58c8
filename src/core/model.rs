//! 领域数据模型 (Domain Model)
//!
//! 导入过程中流转的瞬态结构与持久化记录。

use bon::Builder;
use indexmap::IndexMap;
use indexmap::map::Entry;

/// 小说元数据，仅在单次导入中存在
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NovelMeta {
    pub title: String,
    pub author: String,
    pub summary: String,
    pub cover_url: String,
    pub source_url: String,
}

/// 已发现但尚未抓取的章节引用
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterRef {
    pub name: String,
    pub url: String,
    /// 发现阶段已取得的正文 (HTML 片段)，存在时跳过抓取
    pub inline_content: Option<String>,
}

impl ChapterRef {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            inline_content: None,
        }
    }

    pub fn with_content(mut self, html: impl Into<String>) -> Self {
        self.inline_content = Some(html.into());
        self
    }
}

/// 按 URL 去重的有序章节序列，先到者保留
#[derive(Debug, Default)]
pub struct ChapterList {
    entries: IndexMap<String, ChapterRef>,
}

impl ChapterList {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加章节，重复 URL 被丢弃并返回 false
    pub fn push(&mut self, chapter: ChapterRef) -> bool {
        match self.entries.entry(chapter.url.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(chapter);
                true
            }
        }
    }

    /// 批量合并，返回新增数量
    pub fn merge(&mut self, chapters: impl IntoIterator<Item = ChapterRef>) -> usize {
        chapters.into_iter().filter(|c| self.push(c.clone())).count()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<ChapterRef> {
        self.entries.into_values().collect()
    }
}

/// 单章抓取结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterContent {
    pub title: String,
    pub html: String,
}

/// 小说主页解析结果：元数据 + 完整章节列表
#[derive(Debug, Clone)]
pub struct NovelPage {
    pub meta: NovelMeta,
    pub chapters: Vec<ChapterRef>,
}

/// 导入请求 (调用方参数)
#[derive(Debug, Clone, Builder)]
pub struct ImportRequest {
    #[builder(into)]
    pub source_url: String,
    /// 1 起始
    #[builder(default = 1)]
    pub start_chapter: u32,
    /// 1 起始，包含端点
    pub end_chapter: Option<u32>,
    /// 未指定时使用站点配置或适配器下限
    pub throttle_seconds: Option<f64>,
    #[builder(default)]
    pub preserve_titles: bool,
    /// 无匹配适配器时是否回退到通用解析
    #[builder(default = true)]
    pub allow_generic: bool,
}

/// 待写入的小说记录
#[derive(Debug, Clone)]
pub struct NewNovel {
    pub title: String,
    pub cover_url: Option<String>,
    pub description: String,
    pub author: String,
    pub tag: String,
}

/// 待写入的章节记录
#[derive(Debug, Clone)]
pub struct NewChapter {
    pub novel_id: i64,
    pub title: String,
    pub content: String,
    pub order_index: i64,
}

/// 已持久化的小说
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct NovelRecord {
    pub id: i64,
    pub title: String,
    pub cover_url: Option<String>,
    pub description: String,
    pub author: String,
    pub tags: String,
}

/// 已持久化的章节
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ChapterRecord {
    pub id: i64,
    pub novel_id: i64,
    pub title: String,
    pub content: String,
    pub order_index: i64,
}

/// 导入结果摘要
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub novel_id: i64,
    pub reused: bool,
    pub source_tag: &'static str,
    pub chapters_saved: usize,
    pub first_order_index: i64,
}
