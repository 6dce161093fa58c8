use std::sync::LazyLock;

use regex::Regex;
use url::Url;

pub mod text;

static ABSOLUTE_HTTP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?://").unwrap());
static EMPTY_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/\.?/").unwrap());
static PARENT_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/[^/]+/\.\./").unwrap());
static NON_RESOLVABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:https?|data|mailto|tel|javascript):").unwrap());

/// 将相对引用解析为绝对 URL
///
/// - `http(s)://` 原样返回
/// - `//host/...` 继承基准协议
/// - `/path` 继承协议、主机与端口
/// - 其余按基准路径所在目录拼接，再对路径执行 `.`/`..` 段消解
pub fn resolve_url(base: &str, rel: &str) -> String {
    let rel = rel.trim();
    if ABSOLUTE_HTTP.is_match(rel) {
        return rel.to_string();
    }
    if rel.is_empty() {
        return base.to_string();
    }

    let Ok(parsed) = Url::parse(base) else {
        return rel.to_string();
    };

    if let Some(rest) = rel.strip_prefix("//") {
        return format!("{}://{}", parsed.scheme(), rest);
    }

    let origin = origin_of(&parsed);
    if rel.starts_with('/') {
        return format!("{origin}{rel}");
    }

    let base_path = parsed.path();
    if rel.starts_with('?') {
        return format!("{origin}{base_path}{rel}");
    }
    if rel.starts_with('#') {
        let query = parsed.query().map(|q| format!("?{q}")).unwrap_or_default();
        return format!("{origin}{base_path}{query}{rel}");
    }

    let dir = match base_path.rfind('/') {
        Some(i) => &base_path[..=i],
        None => "/",
    };
    let split = rel.find(['?', '#']).unwrap_or(rel.len());
    let (rel_path, suffix) = rel.split_at(split);
    let joined = format!(
        "{}/{}",
        dir.trim_end_matches('/'),
        rel_path.trim_start_matches('/')
    );

    format!("{origin}{}{suffix}", remove_dot_segments(&joined))
}

/// 路径段消解：折叠 `//` 与 `/./`，再反复消去 `/x/../` 直至不再出现
fn remove_dot_segments(path: &str) -> String {
    let mut path = path.to_string();
    loop {
        let collapsed = EMPTY_SEGMENT.replace_all(&path, "/").into_owned();
        if collapsed == path {
            break;
        }
        path = collapsed;
    }
    while let Some(m) = PARENT_SEGMENT.find(&path) {
        path.replace_range(m.range(), "/");
    }
    path
}

fn origin_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    }
}

/// 属性值是否需要相对解析 (排除绝对地址与伪协议)
pub fn is_resolvable_reference(value: &str) -> bool {
    !value.is_empty() && !NON_RESOLVABLE.is_match(value)
}

/// 用于去重比较的 URL 规范形式：去片段、去尾斜杠、去协议
pub fn normalize_for_compare(url: &str) -> String {
    let no_fragment = url.split('#').next().unwrap_or(url);
    let trimmed = no_fragment.strip_suffix('/').unwrap_or(no_fragment);
    match trimmed.find("://") {
        Some(i) => trimmed[i + 3..].to_string(),
        None => trimmed.to_string(),
    }
}

/// 提取小写主机名
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// 读取查询参数
pub fn query_value(url: &str, key: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// 替换 (或追加) 查询参数，其余参数及其顺序保持不变
pub fn with_query_param(url: &str, key: &str, value: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    {
        let mut query = parsed.query_pairs_mut();
        query.clear();
        let mut replaced = false;
        for (k, v) in &pairs {
            if k == key {
                if !replaced {
                    query.append_pair(key, value);
                    replaced = true;
                }
            } else {
                query.append_pair(k, v);
            }
        }
        if !replaced {
            query.append_pair(key, value);
        }
    }
    parsed.to_string()
}
