//! 片段清洗器 (Fragment Cleaner)
//!
//! 基于 `lol_html` 的流式改写：移除脚本/样式/注释/广告节点，
//! 并将相对 `src`/`href` 改写为绝对地址。输出为新的字符串，不修改输入。

use lol_html::{RewriteStrSettings, doc_comments, element, rewrite_str};

use crate::core::error::Result;
use crate::utils::{is_resolvable_reference, resolve_url};

/// 所有清洗都会移除的节点
pub const BASE_REMOVALS: &[&str] = &["script", "style", "noscript"];

#[derive(Debug, Clone)]
pub struct FragmentCleaner {
    removals: Vec<String>,
    base_url: Option<String>,
    anchor_mask: Option<Vec<bool>>,
}

impl Default for FragmentCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl FragmentCleaner {
    pub fn new() -> Self {
        Self {
            removals: BASE_REMOVALS.iter().map(|s| s.to_string()).collect(),
            base_url: None,
            anchor_mask: None,
        }
    }

    /// 追加需要整体移除的选择器
    pub fn remove_all(mut self, selectors: &[&str]) -> Self {
        self.removals.extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    /// 相对地址的解析基准
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    /// 按文档顺序移除锚点：`mask[i]` 为 true 的第 i 个 `<a>` 被删除
    pub fn drop_anchors(mut self, mask: Vec<bool>) -> Self {
        self.anchor_mask = Some(mask);
        self
    }

    pub fn clean(&self, html: &str) -> Result<String> {
        let html = match &self.anchor_mask {
            Some(mask) if mask.iter().any(|drop| *drop) => Self::remove_anchors(html, mask)?,
            _ => html.to_string(),
        };

        let mut handlers = Vec::with_capacity(self.removals.len() + 2);
        for selector in &self.removals {
            handlers.push(element!(selector.as_str(), |el| {
                el.remove();
                Ok(())
            }));
        }

        if let Some(base) = self.base_url.as_deref() {
            handlers.push(element!("[src]", move |el| {
                if let Some(v) = el.get_attribute("src")
                    && is_resolvable_reference(v.trim())
                {
                    el.set_attribute("src", &resolve_url(base, &v))?;
                }
                Ok(())
            }));
            handlers.push(element!("[href]", move |el| {
                if let Some(v) = el.get_attribute("href")
                    && is_resolvable_reference(v.trim())
                {
                    el.set_attribute("href", &resolve_url(base, &v))?;
                }
                Ok(())
            }));
        }

        let output = rewrite_str(
            &html,
            RewriteStrSettings {
                element_content_handlers: handlers,
                document_content_handlers: vec![doc_comments!(|c| {
                    c.remove();
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        )?;
        Ok(output.trim().to_string())
    }

    fn remove_anchors(html: &str, mask: &[bool]) -> Result<String> {
        let mut index = 0usize;
        let output = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!("a", move |el| {
                    if mask.get(index).copied().unwrap_or(false) {
                        el.remove();
                    }
                    index += 1;
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        )?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_styles_comments_and_ads() {
        let html = r#"<p>Keep</p><script>x()</script><style>p{}</style><!-- note --><div class="top adsbox">ad</div><noscript>n</noscript><p>Also</p>"#;
        let cleaned = FragmentCleaner::new()
            .remove_all(&["[class*=\"adsbox\"]"])
            .clean(html)
            .unwrap();
        assert_eq!(cleaned, "<p>Keep</p><p>Also</p>");
    }

    #[test]
    fn rewrites_relative_references() {
        let html = r#"<img src="../img/a.png"><a href="/c/2">next</a><a href="mailto:x@y.z">m</a><a href="https://o.com/">o</a>"#;
        let cleaned = FragmentCleaner::new()
            .with_base("https://site.com/novel/ch-1.html")
            .clean(html)
            .unwrap();
        assert_eq!(
            cleaned,
            r#"<img src="https://site.com/img/a.png"><a href="https://site.com/c/2">next</a><a href="mailto:x@y.z">m</a><a href="https://o.com/">o</a>"#
        );
    }

    #[test]
    fn anchors_dropped_by_position() {
        let html = r#"<a href="/prev">Prev</a><p>Body <a href="/note">note</a></p><a href="/next">Next</a>"#;
        let cleaned = FragmentCleaner::new()
            .drop_anchors(vec![true, false, true])
            .clean(html)
            .unwrap();
        assert_eq!(cleaned, r#"<p>Body <a href="/note">note</a></p>"#);
    }
}
