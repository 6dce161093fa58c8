//! 正文文本规范化 (Text Normalization)
//!
//! 清洗后的章节 HTML -> 保留段落结构的纯文本，以及章节标题重编号。
//! 全部为纯函数，相同输入得到逐字节相同的输出。

use std::sync::LazyLock;

use regex::Regex;

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static BLOCK_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:p|div|section|article|h[1-5]|blockquote|pre|li)(?:\s[^>]*)?/?>").unwrap()
});
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static CARRIAGE_RETURN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\r").unwrap());
static NEWLINE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static CHAPTER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:Chapter|Chap|Ch)[\s.\-:]*\d+[\s.\-:]*\s*").unwrap());
static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d{1,4}[.)\-:\s]+\s*").unwrap());

/// 章节 HTML 转纯文本
pub fn normalize_chapter_text(html: &str) -> String {
    let text = LINE_BREAK.replace_all(html, "\n");
    let text = BLOCK_TAG.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = html_escape::decode_html_entities(&text);
    let text = CARRIAGE_RETURN.replace_all(&text, "\n");
    let text = NEWLINE_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// 折叠空白并去除首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

/// 去掉 "Chapter 12:" / "12." 之类的序号前缀
pub fn strip_chapter_prefix(title: &str) -> String {
    let t = CHAPTER_PREFIX.replace(title, "");
    let t = NUMBER_PREFIX.replace(&t, "");
    t.trim().to_string()
}

/// 计算入库标题
pub fn chapter_title(raw: &str, order_index: i64, preserve: bool) -> String {
    let raw = raw.trim();
    if preserve {
        return if raw.is_empty() {
            format!("Chapter {order_index}")
        } else {
            raw.to_string()
        };
    }

    let short = strip_chapter_prefix(raw);
    if short.is_empty() {
        format!("Chapter {order_index}")
    } else {
        format!("Chapter {order_index}: {short}")
    }
}
