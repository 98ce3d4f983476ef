//! 语言协商中间件
//!
//! 解析 `Accept-Language`，在请求扩展中放入 [`Language`]，
//! 并在响应回程写 `Content-Language`。支持 en / ru，未识别回退 en。
//! 错误体本身只携带 key + params，文案渲染归客户端。

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_LANGUAGE};
use axum::middleware::Next;
use axum::response::Response;

/// 请求协商出的界面语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }
}

/// 取首个受支持的语言标签；q 值按出现顺序近似
fn parse_accept_language(header: &str) -> Language {
    for part in header.split(',') {
        let tag = part.split(';').next().unwrap_or("").trim().to_lowercase();
        if tag == "ru" || tag.starts_with("ru-") {
            return Language::Ru;
        }
        if tag == "en" || tag.starts_with("en-") || tag == "*" {
            return Language::En;
        }
    }
    Language::En
}

/// 语言协商中间件
pub async fn negotiate_language(mut req: Request, next: Next) -> Response {
    let language = req
        .headers()
        .get(ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .map(parse_accept_language)
        .unwrap_or_default();
    req.extensions_mut().insert(language);

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(CONTENT_LANGUAGE, HeaderValue::from_static(language.as_str()));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_tags() {
        assert_eq!(parse_accept_language("ru"), Language::Ru);
        assert_eq!(parse_accept_language("ru-RU,ru;q=0.9"), Language::Ru);
        assert_eq!(parse_accept_language("en-US,en;q=0.5"), Language::En);
    }

    #[test]
    fn test_unknown_falls_back_to_en() {
        assert_eq!(parse_accept_language("zh-CN"), Language::En);
        assert_eq!(parse_accept_language(""), Language::En);
    }

    #[test]
    fn test_first_supported_wins() {
        assert_eq!(parse_accept_language("de, ru;q=0.8, en;q=0.5"), Language::Ru);
    }
}
