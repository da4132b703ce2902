// Reader document tools (v3 API)

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    json_schema_array, json_schema_boolean, json_schema_integer, json_schema_object,
    json_schema_string, outcome, validate, Tool,
};
use anyhow::Result;
use readwise_mcp_client::{
    collect_matching, collect_pages, DocumentFilter, DocumentUpdate, FetchLimit, ReadwiseClient,
    SaveDocumentRequest,
};
use readwise_mcp_core::shape::{self, ContentMode, ShapeConfig};
use readwise_mcp_core::{Document, GatewayError, GatewayResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Default record cap for document listings and topic search.
const DEFAULT_DOCUMENT_LIMIT: usize = 20;

fn location_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description,
        "enum": ["new", "later", "archive", "feed"]
    })
}

fn category_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description,
        "enum": ["article", "email", "rss", "highlight", "note", "pdf", "epub", "tweet", "video"]
    })
}

fn shape_documents(documents: &[Document], mode: ContentMode, config: &ShapeConfig) -> Vec<Value> {
    documents
        .iter()
        .map(|document| shape::document_record(document, mode, config))
        .collect()
}

fn content_mode(with_full_content: bool, content_max_length: Option<usize>) -> ContentMode {
    if !with_full_content {
        ContentMode::Omit
    } else {
        match content_max_length {
            Some(max) => ContentMode::Clipped(max),
            None => ContentMode::Full,
        }
    }
}

fn contains_ci(haystack: Option<&str>, lowered_needle: &str) -> bool {
    haystack.is_some_and(|value| value.to_lowercase().contains(lowered_needle))
}

/// Tool to save a URL into the reading queue
pub struct SaveDocumentTool {
    client: Arc<ReadwiseClient>,
}

impl SaveDocumentTool {
    pub fn new(client: Arc<ReadwiseClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: SaveDocumentArgs) -> GatewayResult<CallToolResult> {
        validate::http_url(&args.url)?;
        let request = SaveDocumentRequest {
            url: args.url,
            tags: args.tags,
            location: Some(args.location.parse()?),
            category: Some(args.category.parse()?),
        };
        let saved = self.client.reader().save(&request).await?;
        Ok(outcome::success(json!({ "saved": saved })))
    }
}

fn default_save_location() -> String {
    "later".to_string()
}

fn default_save_category() -> String {
    "article".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SaveDocumentArgs {
    url: String,
    tags: Option<Vec<String>>,
    #[serde(default = "default_save_location")]
    location: String,
    #[serde(default = "default_save_category")]
    category: String,
}

#[async_trait::async_trait]
impl Tool for SaveDocumentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_save_document".to_string(),
            description: "Save a document to Readwise Reader.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "url": json_schema_string("The URL of the document to save"),
                    "tags": json_schema_array(
                        json_schema_string("A tag name"),
                        "Optional list of tags to apply"
                    ),
                    "location": location_schema("Where to save the document (default: later)"),
                    "category": category_schema("Document category (default: article)")
                }),
                vec!["url"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SaveDocumentArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}

/// Tool to list documents with server-side and gateway-side filters
pub struct ListDocumentsTool {
    client: Arc<ReadwiseClient>,
    shape: ShapeConfig,
}

impl ListDocumentsTool {
    pub fn new(client: Arc<ReadwiseClient>, shape: ShapeConfig) -> Self {
        Self { client, shape }
    }

    async fn run(&self, args: ListDocumentsArgs) -> GatewayResult<CallToolResult> {
        let location = args.location.as_deref().map(str::parse).transpose()?;
        let category = args.category.as_deref().map(str::parse).transpose()?;
        validate::feed_location_category(location, category)?;
        if let Some(updated_after) = &args.updated_after {
            validate::rfc3339("updated_after", updated_after)?;
        }
        let limit = validate::positive("limit", args.limit.unwrap_or(DEFAULT_DOCUMENT_LIMIT))?;
        if let Some(max) = args.content_max_length {
            validate::positive("content_max_length", max)?;
        }

        let fetch_limit = if args.fetch_all {
            FetchLimit::All
        } else {
            FetchLimit::Bounded(limit)
        };
        let mode = content_mode(args.with_full_content, args.content_max_length);

        let filter = DocumentFilter {
            location,
            category,
            updated_after: args.updated_after.clone(),
        };
        let source = self.client.reader().documents(filter);

        let documents = match collect_pages(&source, fetch_limit).await {
            Ok(documents) => documents,
            Err(interrupted) => {
                let kept = Self::post_filter(interrupted.collected, &args);
                let records = shape_documents(&kept, mode, &self.shape);
                return Ok(outcome::interrupted(records, &interrupted.cause));
            }
        };

        let documents = Self::post_filter(documents, &args);
        let records = shape_documents(&documents, mode, &self.shape);

        let mut payload = json!({
            "count": records.len(),
            "documents": records,
        });
        if let Some(description) = Self::filter_description(&args) {
            payload["filtered_by"] = json!(description);
        }
        Ok(outcome::success(payload))
    }

    /// Author and site filters the backend cannot apply; matched
    /// case-insensitively against substrings after retrieval.
    fn post_filter(documents: Vec<Document>, args: &ListDocumentsArgs) -> Vec<Document> {
        let author = args.author.as_deref().map(str::to_lowercase);
        let site = args.site_name.as_deref().map(str::to_lowercase);
        documents
            .into_iter()
            .filter(|document| {
                author
                    .as_deref()
                    .is_none_or(|needle| contains_ci(document.author.as_deref(), needle))
                    && site
                        .as_deref()
                        .is_none_or(|needle| contains_ci(document.site_name.as_deref(), needle))
            })
            .collect()
    }

    fn filter_description(args: &ListDocumentsArgs) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(location) = &args.location {
            parts.push(format!("location={location}"));
        }
        if let Some(category) = &args.category {
            parts.push(format!("category={category}"));
        }
        if let Some(author) = &args.author {
            parts.push(format!("author contains '{author}'"));
        }
        if let Some(site) = &args.site_name {
            parts.push(format!("site contains '{site}'"));
        }
        if let Some(updated_after) = &args.updated_after {
            parts.push(format!("updated after {updated_after}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListDocumentsArgs {
    location: Option<String>,
    category: Option<String>,
    author: Option<String>,
    site_name: Option<String>,
    limit: Option<usize>,
    #[serde(default)]
    fetch_all: bool,
    updated_after: Option<String>,
    #[serde(default)]
    with_full_content: bool,
    content_max_length: Option<usize>,
}

#[async_trait::async_trait]
impl Tool for ListDocumentsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_list_documents".to_string(),
            description: "List documents from Readwise Reader with filtering and full-library fetch support.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "location": location_schema("Filter by location"),
                    "category": category_schema("Filter by category"),
                    "author": json_schema_string("Filter by author name (case-insensitive partial match)"),
                    "site_name": json_schema_string("Filter by site name (case-insensitive partial match)"),
                    "limit": json_schema_integer("Maximum documents to return; ignored if fetch_all is true (default: 20)"),
                    "fetch_all": json_schema_boolean("Fetch every document across all pages, ignoring limit (default: false)"),
                    "updated_after": json_schema_string("RFC 3339 timestamp; only documents updated after this time, e.g. 2025-11-01T00:00:00Z"),
                    "with_full_content": json_schema_boolean("Include full document content; responses may be large (default: false)"),
                    "content_max_length": json_schema_integer("Cap content length per document; only used with with_full_content")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ListDocumentsArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}

/// Tool to update document metadata
pub struct UpdateDocumentTool {
    client: Arc<ReadwiseClient>,
}

impl UpdateDocumentTool {
    pub fn new(client: Arc<ReadwiseClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: UpdateDocumentArgs) -> GatewayResult<CallToolResult> {
        if args.document_id.is_empty() {
            return Err(GatewayError::InvalidParameters(
                "document_id must not be empty".to_string(),
            ));
        }
        let location = args.location.as_deref().map(str::parse).transpose()?;
        let update = DocumentUpdate {
            title: args.title,
            author: args.author,
            summary: args.summary,
            location,
            tags: args.tags,
        };
        if update.is_empty() {
            return Err(GatewayError::InvalidParameters(
                "at least one field to update is required".to_string(),
            ));
        }
        let updated = self
            .client
            .reader()
            .update(&args.document_id, &update)
            .await?;
        Ok(outcome::success(json!({ "updated": updated })))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateDocumentArgs {
    document_id: String,
    title: Option<String>,
    author: Option<String>,
    summary: Option<String>,
    location: Option<String>,
    tags: Option<Vec<String>>,
}

#[async_trait::async_trait]
impl Tool for UpdateDocumentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_update_document".to_string(),
            description: "Update document metadata in Readwise Reader. At least one field besides document_id is required.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "document_id": json_schema_string("The ID of the document to update"),
                    "title": json_schema_string("New title"),
                    "author": json_schema_string("New author"),
                    "summary": json_schema_string("New summary"),
                    "location": location_schema("New location"),
                    "tags": json_schema_array(json_schema_string("A tag name"), "Replacement tag list")
                }),
                vec!["document_id"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: UpdateDocumentArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}

/// Tool to delete a document
pub struct DeleteDocumentTool {
    client: Arc<ReadwiseClient>,
}

impl DeleteDocumentTool {
    pub fn new(client: Arc<ReadwiseClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: DeleteDocumentArgs) -> GatewayResult<CallToolResult> {
        if args.document_id.is_empty() {
            return Err(GatewayError::InvalidParameters(
                "document_id must not be empty".to_string(),
            ));
        }
        self.client.reader().delete(&args.document_id).await?;
        Ok(outcome::success(json!({ "deleted": args.document_id })))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeleteDocumentArgs {
    document_id: String,
}

#[async_trait::async_trait]
impl Tool for DeleteDocumentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_delete_document".to_string(),
            description: "Delete a document from Readwise Reader.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "document_id": json_schema_string("The ID of the document to delete")
                }),
                vec!["document_id"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: DeleteDocumentArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}

/// Tool to list every tag in the reading library
pub struct ListTagsTool {
    client: Arc<ReadwiseClient>,
}

impl ListTagsTool {
    pub fn new(client: Arc<ReadwiseClient>) -> Self {
        Self { client }
    }

    async fn run(&self) -> GatewayResult<CallToolResult> {
        let tags = self.client.reader().tags().await?;
        Ok(outcome::success(json!({
            "count": tags.len(),
            "tags": tags,
        })))
    }
}

#[async_trait::async_trait]
impl Tool for ListTagsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_list_tags".to_string(),
            description: "Get all tags from Readwise Reader.".to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        Ok(self
            .run()
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}

/// Tool to search documents by topic with gateway-side matching
pub struct TopicSearchTool {
    client: Arc<ReadwiseClient>,
    shape: ShapeConfig,
}

impl TopicSearchTool {
    pub fn new(client: Arc<ReadwiseClient>, shape: ShapeConfig) -> Self {
        Self { client, shape }
    }

    async fn run(&self, args: TopicSearchArgs) -> GatewayResult<CallToolResult> {
        if args.query.trim().is_empty() {
            return Err(GatewayError::InvalidParameters(
                "query must not be empty".to_string(),
            ));
        }
        let location = args.location.as_deref().map(str::parse).transpose()?;
        let category = args.category.as_deref().map(str::parse).transpose()?;
        validate::feed_location_category(location, category)?;
        let limit = validate::positive("limit", args.limit.unwrap_or(DEFAULT_DOCUMENT_LIMIT))?;

        let filter = DocumentFilter {
            location,
            category,
            updated_after: None,
        };
        let source = self.client.reader().documents(filter);
        let needle = args.query.to_lowercase();

        match collect_matching(
            &source,
            |document: &Document| Self::matches(document, &needle),
            limit,
        )
        .await
        {
            Ok(documents) => {
                let records = shape_documents(&documents, ContentMode::Omit, &self.shape);
                Ok(outcome::success(json!({
                    "count": records.len(),
                    "query": args.query,
                    "search_mode": "client-side",
                    "documents": records,
                })))
            }
            Err(interrupted) => {
                let records =
                    shape_documents(&interrupted.collected, ContentMode::Omit, &self.shape);
                Ok(outcome::interrupted(records, &interrupted.cause))
            }
        }
    }

    fn matches(document: &Document, lowered_query: &str) -> bool {
        [
            &document.title,
            &document.summary,
            &document.notes,
            &document.author,
        ]
        .into_iter()
        .any(|field| contains_ci(field.as_deref(), lowered_query))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TopicSearchArgs {
    query: String,
    location: Option<String>,
    category: Option<String>,
    limit: Option<usize>,
}

#[async_trait::async_trait]
impl Tool for TopicSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_topic_search".to_string(),
            description: "Search documents by topic. The Reader API has no native search, so matching runs against title, summary, notes, and author after retrieval; large libraries take longer.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "query": json_schema_string("Search query (case-insensitive, matches title/summary/notes/author)"),
                    "location": location_schema("Restrict the search to one location"),
                    "category": category_schema("Restrict the search to one category"),
                    "limit": json_schema_integer("Maximum results to return (default: 20)")
                }),
                vec!["query"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: TopicSearchArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}
