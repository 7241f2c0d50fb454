use serde::{Deserialize, Serialize};

use crate::members::Member;

/// Query suffix that turns a VOD page URL into its embeddable player.
pub const EMBED_SUFFIX: &str = "/embed?autoPlay=false&mutePlay=false&showChat=false";

/// Builds the embeddable player URL for a record's `href`.
#[must_use]
pub fn embed_url(href: &str) -> String {
    format!("{href}{EMBED_SUFFIX}")
}

/// One scraped video link.
///
/// Every field tolerates absence: records written by older scraper versions
/// lack `member` and carry free-form `text` instead, and a record missing
/// `title` or `uploadedDate` still decodes with an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub title: String,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub uploaded_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Derived from `href` at fetch time; never written back to the store.
    #[serde(default)]
    pub iframe_url: String,
}

impl LinkRecord {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        href: impl Into<String>,
        title: impl Into<String>,
        uploaded_date: impl Into<String>,
        member: Option<String>,
    ) -> Self {
        let href = href.into();
        Self {
            id: id.into(),
            iframe_url: embed_url(&href),
            href,
            title: title.into(),
            uploaded_date: uploaded_date.into(),
            member,
            text: None,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// The roster member named by the `member` field, if it is an exact match.
    #[must_use]
    pub fn member(&self) -> Option<Member> {
        self.member.as_deref().and_then(Member::from_label)
    }

    /// Recomputes `iframe_url` from `href`. Records restored from a local
    /// snapshot written by an older build may carry a stale or empty value.
    pub fn redecorate(&mut self) {
        self.iframe_url = embed_url(&self.href);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_iframe_url() {
        let record = LinkRecord::new(
            "a1",
            "https://vod.sooplive.co.kr/player/1234",
            "title",
            "2025-06-09",
            Some("아이네".into()),
        );
        assert_eq!(
            record.iframe_url,
            "https://vod.sooplive.co.kr/player/1234/embed?autoPlay=false&mutePlay=false&showChat=false"
        );
        assert_eq!(record.member(), Some(Member::Ine));
    }

    #[test]
    fn unknown_member_name_is_not_a_roster_member() {
        let record = LinkRecord::new("a", "h", "t", "2025-06-09", Some("부가땅".into()));
        assert_eq!(record.member(), None);
    }

    #[test]
    fn deserializes_camel_case_with_missing_fields() {
        let record: LinkRecord =
            serde_json::from_str(r#"{"id":"x","href":"https://a","uploadedDate":"2025-01-02"}"#)
                .unwrap();
        assert_eq!(record.uploaded_date, "2025-01-02");
        assert_eq!(record.title, "");
        assert!(record.member.is_none());
        assert!(record.iframe_url.is_empty());
    }

    #[test]
    fn redecorate_restores_iframe_url() {
        let mut record: LinkRecord =
            serde_json::from_str(r#"{"id":"x","href":"https://a"}"#).unwrap();
        record.redecorate();
        assert_eq!(record.iframe_url, embed_url("https://a"));
    }
}
