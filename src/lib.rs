//! 小说内容导入引擎
//!
//! 站点适配器 + 通用启发式解析，发现分页目录、抽取章节正文、
//! 归一化为段落文本，并在单个事务内写入存储。

pub mod core;
pub mod engine;
pub mod interfaces;
pub mod markup;
pub mod network;
pub mod sites;
pub mod store;
pub mod ui;
pub mod utils;
