//! 可查询的 HTML 文档 (Markup Document)
//!
//! 对 `scraper::Html` 的薄封装。文档仅在单次解析内存活，
//! 不跨越任何 await 点。

use scraper::{ElementRef, Html, Selector};

use crate::utils::text::collapse_whitespace;

/// 将一组静态选择器按顺序编译
///
/// 仅用于编译期已知合法的常量选择器。
pub fn compile(strategies: &[&str]) -> Vec<Selector> {
    strategies
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
}

pub struct MarkupDocument {
    html: Html,
}

impl MarkupDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn parse_fragment(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
        }
    }

    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> scraper::html::Select<'a, 'b> {
        self.html.select(selector)
    }

    pub fn first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.html.select(selector).next()
    }

    /// 依次尝试各策略，返回首个命中的元素
    pub fn first_of(&self, strategies: &[Selector]) -> Option<ElementRef<'_>> {
        strategies.iter().find_map(|s| self.first(s))
    }

    /// 依次尝试各策略，返回首个非空文本
    pub fn first_text(&self, strategies: &[Selector]) -> Option<String> {
        strategies
            .iter()
            .flat_map(|s| self.html.select(s))
            .map(|el| element_text(&el))
            .find(|t| !t.is_empty())
    }

    /// 依次尝试各策略，返回首个非空属性值
    pub fn first_attr(&self, strategies: &[Selector], attr: &str) -> Option<String> {
        strategies
            .iter()
            .flat_map(|s| self.html.select(s))
            .find_map(|el| element_attr(&el, attr))
    }

    /// 所有策略命中元素的非空文本，按策略顺序排列
    pub fn texts(&self, strategies: &[Selector]) -> Vec<String> {
        strategies
            .iter()
            .flat_map(|s| self.html.select(s))
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// 按标签名查询
    pub fn by_tag(&self, tag: &str) -> Vec<ElementRef<'_>> {
        self.query(tag)
    }

    /// 按 class 子串查询 (等价于 `contains(@class, ..)`)
    pub fn by_class(&self, tag: &str, fragment: &str) -> Vec<ElementRef<'_>> {
        self.query(&format!("{tag}[class*=\"{fragment}\"]"))
    }

    /// 按属性值精确查询
    pub fn by_attr(&self, tag: &str, attr: &str, value: &str) -> Vec<ElementRef<'_>> {
        self.query(&format!("{tag}[{attr}=\"{value}\"]"))
    }

    fn query(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(sel) => self.html.select(&sel).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn body(&self) -> Option<ElementRef<'_>> {
        self.by_tag("body").into_iter().next()
    }

    /// 整个文档的序列化结果
    pub fn html(&self) -> String {
        self.html.html()
    }
}

/// 元素的可见文本 (空白折叠)
pub fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// 元素的原始文本 (仅去首尾空白)
pub fn raw_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// 非空属性值
pub fn element_attr(el: &ElementRef<'_>, name: &str) -> Option<String> {
    el.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 子节点序列化
pub fn inner_html(el: &ElementRef<'_>) -> String {
    el.inner_html()
}
