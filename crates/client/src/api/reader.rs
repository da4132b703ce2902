//! Reader (v3) document API.
//!
//! Saving, listing, updating, and deleting documents in the reading
//! library, plus the tag index. Listing is cursor paginated: each page
//! carries an opaque `nextPageCursor` the caller echoes back verbatim.

use async_trait::async_trait;
use readwise_mcp_core::{
    Document, DocumentCategory, DocumentListResponse, GatewayError, GatewayResult, Location,
    TagsResponse,
};
use serde::Serialize;
use serde_json::Value;

use crate::client::ReadwiseClient;
use crate::pagination::{Page, PageCursor, PageSource};

/// Reader API for managing documents in the reading library.
pub struct ReaderApi<'a> {
    client: &'a ReadwiseClient,
}

impl<'a> ReaderApi<'a> {
    pub(crate) fn new(client: &'a ReadwiseClient) -> Self {
        Self { client }
    }

    /// Save a URL to the reading queue.
    ///
    /// The backend returns the stored document representation, which is
    /// passed through untouched.
    pub async fn save(&self, request: &SaveDocumentRequest) -> GatewayResult<Value> {
        self.client.http.post("/api/v3/save", request).await
    }

    /// Fetch a single page of documents.
    ///
    /// `cursor` continues the walk started by a previous page; `None`
    /// fetches the first page.
    pub async fn list_page(
        &self,
        filter: &DocumentFilter,
        cursor: Option<&str>,
    ) -> GatewayResult<DocumentListResponse> {
        let mut query = filter.to_query();
        if let Some(cursor) = cursor {
            query.push(("pageCursor", cursor.to_string()));
        }
        self.client.http.get_with_query("/api/v3/list", &query).await
    }

    /// Page source over every document matching `filter`.
    pub fn documents(&self, filter: DocumentFilter) -> DocumentPages<'a> {
        DocumentPages {
            client: self.client,
            filter,
        }
    }

    /// Update mutable fields of an existing document.
    pub async fn update(&self, document_id: &str, update: &DocumentUpdate) -> GatewayResult<Value> {
        self.client
            .http
            .patch(&format!("/api/v3/documents/{document_id}"), update)
            .await
    }

    /// Delete a document. The backend responds with an empty body.
    pub async fn delete(&self, document_id: &str) -> GatewayResult<Value> {
        self.client
            .http
            .delete(&format!("/api/v3/documents/{document_id}"))
            .await
    }

    /// Every tag known to the reading library.
    pub async fn tags(&self) -> GatewayResult<Vec<Value>> {
        let response: TagsResponse = self.client.http.get("/api/v3/tags").await?;
        Ok(response.tags)
    }
}

/// Payload for saving a document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveDocumentRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<DocumentCategory>,
}

/// Mutable document fields for an update. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl DocumentUpdate {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.summary.is_none()
            && self.location.is_none()
            && self.tags.is_none()
    }
}

/// Server-side filters for the document listing.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub location: Option<Location>,
    pub category: Option<DocumentCategory>,
    /// RFC 3339 watermark; only documents updated after it are returned.
    pub updated_after: Option<String>,
}

impl DocumentFilter {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(location) = self.location {
            query.push(("location", location.to_string()));
        }
        if let Some(category) = self.category {
            query.push(("category", category.to_string()));
        }
        if let Some(updated_after) = &self.updated_after {
            query.push(("updatedAfter", updated_after.clone()));
        }
        query
    }
}

/// Page source over the cursor-paginated document listing.
pub struct DocumentPages<'a> {
    client: &'a ReadwiseClient,
    filter: DocumentFilter,
}

#[async_trait]
impl PageSource for DocumentPages<'_> {
    type Record = Document;

    async fn fetch(&self, cursor: Option<PageCursor>) -> GatewayResult<Page<Document>> {
        let token = match cursor {
            None => None,
            Some(PageCursor::Token(token)) => Some(token),
            Some(PageCursor::Page(_)) => {
                return Err(GatewayError::InvalidParameters(
                    "page number given to a cursor-paginated source".to_string(),
                ));
            }
        };

        let mut query = self.filter.to_query();
        if let Some(token) = &token {
            query.push(("pageCursor", token.clone()));
        }

        let response: DocumentListResponse = self
            .client
            .http
            .get_with_query("/api/v3/list", &query)
            .await?;

        Ok(Page {
            records: response.results,
            next: response.next_page_cursor.map(PageCursor::Token),
        })
    }
}
