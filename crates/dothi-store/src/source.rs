//! The backing-store seam: anything that can answer an ordered link query.

use async_trait::async_trait;
use chrono::NaiveDate;
use dothi_core::LinkRecord;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A record as it comes out of the store, before decoration. Missing fields
/// stay `None` rather than failing the whole query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLink {
    /// Full document path, used as the pagination tie-breaker.
    pub document_name: String,
    pub id: String,
    pub href: Option<String>,
    pub title: Option<String>,
    pub uploaded_date: Option<String>,
    pub member: Option<String>,
    pub text: Option<String>,
}

impl RawLink {
    /// Cursor positioned on this record.
    #[must_use]
    pub fn cursor(&self) -> PageCursor {
        PageCursor {
            uploaded_date: self.uploaded_date.clone().unwrap_or_default(),
            document_name: self.document_name.clone(),
        }
    }

    /// Decorates the raw fields into a [`LinkRecord`] with its embed URL.
    #[must_use]
    pub fn into_record(self) -> LinkRecord {
        let record = LinkRecord::new(
            self.id,
            self.href.unwrap_or_default(),
            self.title.unwrap_or_default(),
            self.uploaded_date.unwrap_or_default(),
            self.member,
        );
        match self.text {
            Some(text) => record.with_text(text),
            None => record,
        }
    }
}

/// Position after which the next page starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    pub uploaded_date: String,
    pub document_name: String,
}

/// Results are always ascending by `uploadedDate`, ties broken by document
/// name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkQuery {
    /// Inclusive lower bound on `uploadedDate`.
    pub since: Option<NaiveDate>,
    /// Inclusive upper bound on `uploadedDate`.
    pub until: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub start_after: Option<PageCursor>,
}

impl LinkQuery {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            since: Some(start),
            until: Some(end),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn page(limit: u32, start_after: Option<PageCursor>) -> Self {
        Self {
            limit: Some(limit),
            start_after,
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn query(&self, query: &LinkQuery) -> Result<Vec<RawLink>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_record_defaults_missing_fields() {
        let raw = RawLink {
            document_name: "projects/p/databases/(default)/documents/scraped_links/abc".into(),
            id: "abc".into(),
            href: Some("https://vod/1".into()),
            ..RawLink::default()
        };
        let record = raw.into_record();
        assert_eq!(record.id, "abc");
        assert_eq!(record.title, "");
        assert_eq!(record.uploaded_date, "");
        assert_eq!(record.iframe_url, dothi_core::embed_url("https://vod/1"));
    }

    #[test]
    fn into_record_keeps_legacy_text() {
        let raw = RawLink {
            id: "x".into(),
            text: Some("릴파 커버".into()),
            ..RawLink::default()
        };
        assert_eq!(raw.into_record().text.as_deref(), Some("릴파 커버"));
    }

    #[test]
    fn cursor_uses_date_and_document_name() {
        let raw = RawLink {
            document_name: "docs/scraped_links/z".into(),
            uploaded_date: Some("2025-06-09".into()),
            ..RawLink::default()
        };
        assert_eq!(
            raw.cursor(),
            PageCursor {
                uploaded_date: "2025-06-09".into(),
                document_name: "docs/scraped_links/z".into(),
            }
        );
    }
}
