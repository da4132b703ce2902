//! Highlights-library (v2) API.
//!
//! Highlights, books, bulk export, the daily review, and highlight
//! creation. All list endpoints share the v2 envelope
//! (`count`/`next`/`previous`/`results`) and paginate by page number.

use std::marker::PhantomData;

use async_trait::async_trait;
use readwise_mcp_core::{
    Book, BookCategory, CollectionResponse, DailyReview, GatewayError, GatewayResult, Highlight,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::client::ReadwiseClient;
use crate::pagination::{Page, PageCursor, PageSource};

/// Highlights API for the annotation library.
pub struct HighlightsApi<'a> {
    client: &'a ReadwiseClient,
}

impl<'a> HighlightsApi<'a> {
    pub(crate) fn new(client: &'a ReadwiseClient) -> Self {
        Self { client }
    }

    /// Fetch a single page of highlights.
    pub async fn list_page(
        &self,
        filter: &HighlightFilter,
        page: u32,
        page_size: u32,
    ) -> GatewayResult<CollectionResponse<Highlight>> {
        let mut query = filter.to_query();
        query.push(("page_size", page_size.to_string()));
        query.push(("page", page.to_string()));
        self.client
            .http
            .get_with_query("/api/v2/highlights", &query)
            .await
    }

    /// Page source over every highlight matching `filter`.
    pub fn highlights(&self, filter: HighlightFilter) -> OffsetPages<'a, Highlight> {
        OffsetPages::new(self.client, "/api/v2/highlights", filter.to_query())
    }

    /// Page source over a single book's highlights.
    pub fn book_highlights(&self, book_id: i64) -> OffsetPages<'a, Highlight> {
        self.highlights(HighlightFilter {
            book_id: Some(book_id),
            ..Default::default()
        })
    }

    /// Fetch a single page of books.
    pub async fn books_page(
        &self,
        filter: &BookFilter,
        page: u32,
        page_size: u32,
    ) -> GatewayResult<CollectionResponse<Book>> {
        let mut query = filter.to_query();
        query.push(("page_size", page_size.to_string()));
        query.push(("page", page.to_string()));
        self.client
            .http
            .get_with_query("/api/v2/books", &query)
            .await
    }

    /// Page source over every book matching `filter`.
    pub fn books(&self, filter: BookFilter) -> OffsetPages<'a, Book> {
        OffsetPages::new(self.client, "/api/v2/books", filter.to_query())
    }

    /// Page source over the bulk export rows.
    ///
    /// Export rows are full highlights; `updated_after` narrows the walk
    /// to highlights changed since the watermark.
    pub fn export(&self, filter: ExportFilter) -> OffsetPages<'a, Highlight> {
        OffsetPages::new(self.client, "/api/v2/export", filter.to_query())
    }

    /// Today's spaced-repetition review.
    pub async fn daily_review(&self) -> GatewayResult<DailyReview> {
        self.client.http.get("/api/v2/review").await
    }

    /// Append highlights to the library.
    pub async fn create(&self, highlights: &[NewHighlight]) -> GatewayResult<Value> {
        let body = serde_json::json!({ "highlights": highlights });
        self.client.http.post("/api/v2/highlights", &body).await
    }
}

/// Server-side filters for highlight listing and search.
#[derive(Debug, Clone, Default)]
pub struct HighlightFilter {
    pub book_id: Option<i64>,
    /// Free-text search over highlight text and notes.
    pub search: Option<String>,
    /// RFC 3339 lower bound on `highlighted_at`, exclusive.
    pub highlighted_after: Option<String>,
    /// RFC 3339 upper bound on `highlighted_at`, exclusive.
    pub highlighted_before: Option<String>,
}

impl HighlightFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(book_id) = self.book_id {
            query.push(("book_id", book_id.to_string()));
        }
        if let Some(search) = &self.search {
            query.push(("q", search.clone()));
        }
        if let Some(after) = &self.highlighted_after {
            query.push(("highlighted_at__gt", after.clone()));
        }
        if let Some(before) = &self.highlighted_before {
            query.push(("highlighted_at__lt", before.clone()));
        }
        query
    }
}

/// Server-side filters for the books listing.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub category: Option<BookCategory>,
    /// RFC 3339 lower bound on `last_highlight_at`, exclusive.
    pub last_highlight_after: Option<String>,
}

impl BookFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(category) = self.category {
            query.push(("category", category.to_string()));
        }
        if let Some(after) = &self.last_highlight_after {
            query.push(("last_highlight_at__gt", after.clone()));
        }
        query
    }
}

/// Filters for the bulk export walk.
#[derive(Debug, Clone, Default)]
pub struct ExportFilter {
    /// RFC 3339 watermark; only highlights updated after it are exported.
    pub updated_after: Option<String>,
    /// Include highlights deleted since the watermark.
    pub include_deleted: bool,
}

impl ExportFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(updated_after) = &self.updated_after {
            query.push(("updatedAfter", updated_after.clone()));
        }
        if self.include_deleted {
            query.push(("deleted", "true".to_string()));
        }
        query
    }
}

/// A highlight to append to the library.
#[derive(Debug, Clone, Serialize)]
pub struct NewHighlight {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<BookCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted_at: Option<String>,
}

/// Page source over an offset-paginated v2 collection.
///
/// The cursor is a page number derived locally; a page is last when the
/// envelope's `next` link is null.
pub struct OffsetPages<'a, T> {
    client: &'a ReadwiseClient,
    path: &'static str,
    base_query: Vec<(&'static str, String)>,
    page_size: u32,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T> OffsetPages<'a, T> {
    fn new(
        client: &'a ReadwiseClient,
        path: &'static str,
        base_query: Vec<(&'static str, String)>,
    ) -> Self {
        Self {
            client,
            path,
            base_query,
            page_size: client.config().fetch_page_size,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<T> PageSource for OffsetPages<'_, T>
where
    T: DeserializeOwned + Send + Sync,
{
    type Record = T;

    async fn fetch(&self, cursor: Option<PageCursor>) -> GatewayResult<Page<T>> {
        let page_number = match cursor {
            None => 1,
            Some(PageCursor::Page(n)) => n,
            Some(PageCursor::Token(_)) => {
                return Err(GatewayError::InvalidParameters(
                    "cursor token given to an offset-paginated source".to_string(),
                ));
            }
        };

        let mut query = self.base_query.clone();
        query.push(("page_size", self.page_size.to_string()));
        query.push(("page", page_number.to_string()));

        let response: CollectionResponse<T> =
            self.client.http.get_with_query(self.path, &query).await?;

        let next = response
            .next
            .is_some()
            .then(|| PageCursor::Page(page_number + 1));

        Ok(Page {
            records: response.results,
            next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::pagination::{collect_pages, FetchLimit};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_client(server: &MockServer) -> ReadwiseClient {
        ReadwiseClient::builder()
            .base_url(server.uri())
            .token("test-token")
            .retry(RetryPolicy::no_retry())
            .fetch_page_size(2)
            .build()
            .unwrap()
    }

    fn highlight(id: i64) -> Value {
        json!({"id": id, "text": format!("highlight {id}"), "book_id": 7})
    }

    #[tokio::test]
    async fn list_page_sends_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/highlights"))
            .and(query_param("book_id", "7"))
            .and(query_param("q", "rust"))
            .and(query_param("page", "3"))
            .and(query_param("page_size", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "next": null,
                "previous": null,
                "results": [highlight(1)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let filter = HighlightFilter {
            book_id: Some(7),
            search: Some("rust".to_string()),
            ..Default::default()
        };
        let page = client
            .highlights()
            .list_page(&filter, 3, 50)
            .await
            .unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].id, 1);
    }

    #[tokio::test]
    async fn highlight_walk_increments_page_until_next_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/highlights"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "next": null,
                "previous": "https://readwise.io/api/v2/highlights?page=1",
                "results": [highlight(3)]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/highlights"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 3,
                "next": "https://readwise.io/api/v2/highlights?page=2",
                "previous": null,
                "results": [highlight(1), highlight(2)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let source = client.highlights().highlights(HighlightFilter::default());
        let highlights = collect_pages(&source, FetchLimit::All).await.unwrap();

        let ids: Vec<i64> = highlights.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn walk_uses_configured_page_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/highlights"))
            .and(query_param("page_size", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 0,
                "next": null,
                "previous": null,
                "results": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let source = client.highlights().highlights(HighlightFilter::default());
        let highlights = collect_pages(&source, FetchLimit::All).await.unwrap();
        assert!(highlights.is_empty());
    }

    #[tokio::test]
    async fn book_highlights_filters_by_book() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/highlights"))
            .and(query_param("book_id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "next": null,
                "previous": null,
                "results": [highlight(9)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let source = client.highlights().book_highlights(42);
        let highlights = collect_pages(&source, FetchLimit::All).await.unwrap();
        assert_eq!(highlights.len(), 1);
    }

    #[tokio::test]
    async fn books_walk_deserializes_book_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/books"))
            .and(query_param("category", "articles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "next": null,
                "previous": null,
                "results": [{
                    "id": 42,
                    "title": "Persistent Structures",
                    "author": "Okasaki",
                    "category": "articles",
                    "num_highlights": 12
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let source = client.highlights().books(BookFilter {
            category: Some(BookCategory::Articles),
            last_highlight_after: None,
        });
        let books = collect_pages(&source, FetchLimit::All).await.unwrap();
        assert_eq!(books[0].id, 42);
        assert_eq!(books[0].num_highlights, 12);
    }

    #[tokio::test]
    async fn export_sends_watermark_and_deleted_flag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/export"))
            .and(query_param("updatedAfter", "2025-06-01T00:00:00Z"))
            .and(query_param("deleted", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 0,
                "next": null,
                "previous": null,
                "results": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let source = client.highlights().export(ExportFilter {
            updated_after: Some("2025-06-01T00:00:00Z".to_string()),
            include_deleted: true,
        });
        collect_pages(&source, FetchLimit::All).await.unwrap();
    }

    #[tokio::test]
    async fn daily_review_deserializes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/review"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "review_id": 77,
                "review_url": "https://readwise.io/reviews/77",
                "review_completed": false,
                "highlights": [highlight(5)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let review = client.highlights().daily_review().await.unwrap();
        assert_eq!(review.highlights.len(), 1);
        assert_eq!(review.review_completed, Some(false));
    }

    #[tokio::test]
    async fn create_wraps_highlights_in_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/highlights"))
            .and(body_partial_json(json!({
                "highlights": [{"text": "a thing worth keeping", "title": "Notes"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 101}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server).await;
        let new = NewHighlight {
            text: "a thing worth keeping".to_string(),
            title: Some("Notes".to_string()),
            author: None,
            note: None,
            category: None,
            highlighted_at: None,
        };
        let created = client.highlights().create(&[new]).await.unwrap();
        assert_eq!(created[0]["id"], 101);
    }
}
