//! Decoding of `runQuery` response items.
//!
//! Firestore wraps every field in a typed value object (`{"stringValue": ...}`).
//! Only string values are meaningful for links; any other kind, or a missing
//! field, reads as absent.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::source::RawLink;

/// One element of the streamed `runQuery` response array. Elements without a
/// `document` only report read progress.
#[derive(Debug, Deserialize)]
pub(crate) struct RunQueryItem {
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcStatus {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Document {
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl Document {
    fn string_field(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)?
            .get("stringValue")?
            .as_str()
            .map(str::to_owned)
    }

    pub(crate) fn into_raw(self) -> RawLink {
        let id = self.name.rsplit('/').next().unwrap_or_default().to_owned();
        RawLink {
            href: self.string_field("href"),
            title: self.string_field("title"),
            uploaded_date: self.string_field("uploadedDate"),
            member: self.string_field("member"),
            text: self.string_field("text"),
            id,
            document_name: self.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_string_fields_and_id() {
        let item: RunQueryItem = serde_json::from_value(serde_json::json!({
            "document": {
                "name": "projects/p/databases/(default)/documents/scraped_links/Xy12",
                "fields": {
                    "href": { "stringValue": "https://vod/9" },
                    "title": { "stringValue": "노래" },
                    "uploadedDate": { "stringValue": "2025-06-09" },
                    "member": { "stringValue": "비챤" }
                },
                "createTime": "2025-06-09T01:00:00Z",
                "updateTime": "2025-06-09T01:00:00Z"
            },
            "readTime": "2025-06-10T00:00:00Z"
        }))
        .unwrap();

        let raw = item.document.unwrap().into_raw();
        assert_eq!(raw.id, "Xy12");
        assert_eq!(raw.href.as_deref(), Some("https://vod/9"));
        assert_eq!(raw.member.as_deref(), Some("비챤"));
        assert!(raw.text.is_none());
    }

    #[test]
    fn non_string_values_read_as_absent() {
        let item: RunQueryItem = serde_json::from_value(serde_json::json!({
            "document": {
                "name": "a/b/c",
                "fields": {
                    "member": { "nullValue": null },
                    "title": { "integerValue": "3" }
                }
            }
        }))
        .unwrap();
        let raw = item.document.unwrap().into_raw();
        assert!(raw.member.is_none());
        assert!(raw.title.is_none());
        assert!(raw.href.is_none());
    }

    #[test]
    fn read_time_only_item_has_no_document() {
        let item: RunQueryItem =
            serde_json::from_str(r#"{"readTime":"2025-06-10T00:00:00Z"}"#).unwrap();
        assert!(item.document.is_none());
        assert!(item.error.is_none());
    }
}
