//! API Response envelopes
//!
//! All success responses follow one format:
//! ```json
//! {"status":"success","message":{"key":"...","params":{}},"data":{...}}
//! ```
//! Paginated listings use:
//! ```json
//! {"data":[...],"meta":{"page":1,"perPage":20,"total":42,"hasNext":true}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Localizable message reference (key + interpolation params)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageKey {
    pub key: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl MessageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Unified success envelope
///
/// `Deserialize` 是手写的（见下）：`status` 为 `&'static str`，
/// 无法由 derive 生成。
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Always `"success"` — errors use the error envelope instead
    pub status: &'static str,
    /// Optional localizable confirmation message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageKey>,
    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Success with data
    pub fn ok(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data: Some(data),
        }
    }

    /// Success with data and a confirmation message key
    pub fn ok_with_message(data: T, message: MessageKey) -> Self {
        Self {
            status: "success",
            message: Some(message),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// Success with only a message key, no payload
    pub fn message(message: MessageKey) -> Self {
        Self {
            status: "success",
            message: Some(message),
            data: None,
        }
    }
}

impl<'de, T> Deserialize<'de> for ApiResponse<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw<T> {
            #[allow(dead_code)]
            status: String,
            message: Option<MessageKey>,
            data: Option<T>,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Self {
            status: "success",
            message: raw.message,
            data: raw.data,
        })
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Current page number (1-based)
    pub page: u32,
    /// Items per page
    pub per_page: u32,
    /// Total number of items
    pub total: u64,
    /// Whether a further page exists
    pub has_next: bool,
}

impl PageMeta {
    pub fn new(page: u32, per_page: u32, total: u64) -> Self {
        let has_next = per_page > 0 && (page as u64) * (per_page as u64) < total;
        Self {
            page,
            per_page,
            total,
            has_next,
        }
    }
}

/// Paginated listing envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    /// Slice a full result set into one page
    pub fn from_items(items: Vec<T>, page: u32, per_page: u32) -> Self {
        let total = items.len() as u64;
        let page = page.max(1);
        let start = ((page - 1) as usize).saturating_mul(per_page as usize);
        let data: Vec<T> = items
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        Self {
            data,
            meta: PageMeta::new(page, per_page, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::ok(serde_json::json!({"id": 1}))).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["id"], 1);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_message_only_envelope() {
        let json = serde_json::to_value(ApiResponse::message(
            MessageKey::new("message.auth.logged_out").with_param("device", "phone-1"),
        ))
        .unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"]["key"], "message.auth.logged_out");
        assert_eq!(json["message"]["params"]["device"], "phone-1");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_envelope_round_trips() {
        let wire = serde_json::to_string(&ApiResponse::ok(vec![1, 2, 3])).unwrap();
        let parsed: ApiResponse<Vec<i32>> = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed.status, "success");
        assert_eq!(parsed.data, Some(vec![1, 2, 3]));
        assert!(parsed.message.is_none());
    }

    #[test]
    fn test_meta_camel_case() {
        let meta = PageMeta::new(2, 20, 45);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["perPage"], 20);
        assert_eq!(json["hasNext"], true);
        assert_eq!(json["total"], 45);
    }

    #[test]
    fn test_pagination_slicing() {
        let page = Paginated::from_items((1..=45).collect::<Vec<i32>>(), 3, 20);
        assert_eq!(page.data, (41..=45).collect::<Vec<i32>>());
        assert!(!page.meta.has_next);
        assert_eq!(page.meta.total, 45);
    }

    #[test]
    fn test_pagination_page_zero_clamped() {
        let page = Paginated::from_items(vec![1, 2, 3], 0, 2);
        assert_eq!(page.meta.page, 1);
        assert_eq!(page.data, vec![1, 2]);
        assert!(page.meta.has_next);
    }
}
