//! Data models for the Reader (v3) and Highlights (v2) backend APIs.
//!
//! Timestamps are carried as the backend's verbatim strings so shaped
//! output stays byte-identical to the source. Tag payloads are kept as
//! opaque JSON because the backend has returned both plain strings and
//! structured objects for them.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Reader document location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    New,
    Later,
    Archive,
    Feed,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Later => "later",
            Self::Archive => "archive",
            Self::Feed => "feed",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "later" => Ok(Self::Later),
            "archive" => Ok(Self::Archive),
            "feed" => Ok(Self::Feed),
            other => Err(GatewayError::InvalidParameters(format!(
                "unknown location '{other}', expected one of: new, later, archive, feed"
            ))),
        }
    }
}

/// Reader document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentCategory {
    Article,
    Email,
    Rss,
    Highlight,
    Note,
    Pdf,
    Epub,
    Tweet,
    Video,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Email => "email",
            Self::Rss => "rss",
            Self::Highlight => "highlight",
            Self::Note => "note",
            Self::Pdf => "pdf",
            Self::Epub => "epub",
            Self::Tweet => "tweet",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentCategory {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(Self::Article),
            "email" => Ok(Self::Email),
            "rss" => Ok(Self::Rss),
            "highlight" => Ok(Self::Highlight),
            "note" => Ok(Self::Note),
            "pdf" => Ok(Self::Pdf),
            "epub" => Ok(Self::Epub),
            "tweet" => Ok(Self::Tweet),
            "video" => Ok(Self::Video),
            other => Err(GatewayError::InvalidParameters(format!(
                "unknown category '{other}', expected one of: article, email, rss, \
                 highlight, note, pdf, epub, tweet, video"
            ))),
        }
    }
}

/// Highlights-library source category (v2 API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookCategory {
    Books,
    Articles,
    Tweets,
    Podcasts,
}

impl BookCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Articles => "articles",
            Self::Tweets => "tweets",
            Self::Podcasts => "podcasts",
        }
    }
}

impl fmt::Display for BookCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookCategory {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "books" => Ok(Self::Books),
            "articles" => Ok(Self::Articles),
            "tweets" => Ok(Self::Tweets),
            "podcasts" => Ok(Self::Podcasts),
            other => Err(GatewayError::InvalidParameters(format!(
                "unknown category '{other}', expected one of: books, articles, tweets, podcasts"
            ))),
        }
    }
}

/// A Reader document (v3 API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<PublishedDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_opened_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_moved_at: Option<String>,
}

/// Published date as either epoch milliseconds or a date string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublishedDate {
    Integer(i64),
    String(String),
}

/// A highlight record (v2 API).
///
/// Also covers daily-review and export rows, which carry the book
/// title/author inline instead of a book reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub id: i64,
    #[serde(default)]
    pub text: String,
    pub note: Option<String>,
    pub location: Option<i64>,
    pub location_type: Option<String>,
    pub color: Option<String>,
    pub url: Option<String>,
    pub book_id: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub highlighted_at: Option<String>,
    pub updated: Option<String>,
    pub tags: Option<Value>,
}

/// A source book/article in the highlights library (v2 API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub num_highlights: i64,
    pub last_highlight_at: Option<String>,
    pub updated: Option<String>,
    pub cover_image_url: Option<String>,
    pub highlights_url: Option<String>,
    pub source_url: Option<String>,
    pub asin: Option<String>,
    pub tags: Option<Value>,
}

/// Offset-paginated envelope returned by v2 list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResponse<T> {
    #[serde(default)]
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Cursor-paginated envelope returned by the v3 list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListResponse {
    pub count: Option<i64>,
    #[serde(default = "Vec::new")]
    pub results: Vec<Document>,
    pub next_page_cursor: Option<String>,
}

/// Envelope returned by the v3 tags endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsResponse {
    #[serde(default = "Vec::new")]
    pub tags: Vec<Value>,
}

/// Daily review payload (v2 spaced-repetition endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReview {
    pub review_id: Option<i64>,
    pub review_url: Option<String>,
    pub review_completed: Option<bool>,
    #[serde(default = "Vec::new")]
    pub highlights: Vec<Highlight>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_round_trip() {
        for (text, location) in [
            ("new", Location::New),
            ("later", Location::Later),
            ("archive", Location::Archive),
            ("feed", Location::Feed),
        ] {
            assert_eq!(text.parse::<Location>().unwrap(), location);
            assert_eq!(location.as_str(), text);
        }
    }

    #[test]
    fn test_location_rejects_unknown_value() {
        let err = "inbox".parse::<Location>().unwrap_err();
        assert!(matches!(err, GatewayError::InvalidParameters(_)));
        assert!(err.to_string().contains("inbox"));
    }

    #[test]
    fn test_book_category_rejects_singular_form() {
        // The v2 API uses plural category names; "book" is a common typo.
        assert!("book".parse::<BookCategory>().is_err());
        assert_eq!(
            "podcasts".parse::<BookCategory>().unwrap(),
            BookCategory::Podcasts
        );
    }

    #[test]
    fn test_document_deserializes_with_sparse_fields() {
        let doc: Document = serde_json::from_str(
            r#"{"id": "01jq", "url": "https://example.com/a", "saved_at": "2025-11-02T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(doc.id, "01jq");
        assert!(doc.title.is_none());
        assert!(doc.reading_progress.is_none());
    }

    #[test]
    fn test_document_serialization_skips_absent_fields() {
        let doc: Document = serde_json::from_str(r#"{"id": "01jq"}"#).unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["id"], "01jq");
    }

    #[test]
    fn test_published_date_accepts_both_shapes() {
        let doc: Document =
            serde_json::from_str(r#"{"id": "a", "published_date": 1730505600000}"#).unwrap();
        assert!(matches!(
            doc.published_date,
            Some(PublishedDate::Integer(1730505600000))
        ));

        let doc: Document =
            serde_json::from_str(r#"{"id": "b", "published_date": "2025-11-02"}"#).unwrap();
        assert!(matches!(doc.published_date, Some(PublishedDate::String(_))));
    }

    #[test]
    fn test_collection_response_deserializes_v2_envelope() {
        let body = r#"{
            "count": 2,
            "next": "https://readwise.io/api/v2/highlights?page=2",
            "previous": null,
            "results": [
                {"id": 1, "text": "first", "book_id": 7, "updated": "2025-11-01T00:00:00Z"},
                {"id": 2, "text": "second", "book_id": 7}
            ]
        }"#;
        let page: CollectionResponse<Highlight> = serde_json::from_str(body).unwrap();
        assert_eq!(page.count, 2);
        assert!(page.next.is_some());
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].text, "first");
        assert_eq!(page.results[1].book_id, Some(7));
    }

    #[test]
    fn test_document_list_response_reads_camel_case_cursor() {
        let body = r#"{"count": 1, "nextPageCursor": "abc123", "results": [{"id": "d1"}]}"#;
        let page: DocumentListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.next_page_cursor.as_deref(), Some("abc123"));
        assert_eq!(page.results[0].id, "d1");
    }

    #[test]
    fn test_tags_response_accepts_mixed_tag_shapes() {
        let body = r#"{"tags": ["rust", {"key": "async", "name": "async"}]}"#;
        let tags: TagsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(tags.tags.len(), 2);
        assert_eq!(tags.tags[0], Value::String("rust".to_string()));
        assert!(tags.tags[1].is_object());
    }

    #[test]
    fn test_daily_review_deserializes() {
        let body = r#"{
            "review_id": 42,
            "review_url": "https://readwise.io/reviews/42",
            "review_completed": false,
            "highlights": [{"id": 9, "text": "recall this", "title": "A Book"}]
        }"#;
        let review: DailyReview = serde_json::from_str(body).unwrap();
        assert_eq!(review.review_id, Some(42));
        assert_eq!(review.highlights.len(), 1);
        assert_eq!(review.highlights[0].title.as_deref(), Some("A Book"));
    }
}
