// Highlights-library tools (v2 API)

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{
    json_schema_boolean, json_schema_integer, json_schema_object, json_schema_string, outcome,
    validate, Tool,
};
use anyhow::Result;
use readwise_mcp_client::{
    collect_pages, BookFilter, ExportFilter, FetchLimit, HighlightFilter, NewHighlight,
    ReadwiseClient,
};
use readwise_mcp_core::shape::{self, ShapeConfig};
use readwise_mcp_core::{BookCategory, GatewayError, GatewayResult, Highlight};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Default page size for v2 listing endpoints.
const DEFAULT_PAGE_SIZE: u32 = 100;

fn book_category_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "description": description,
        "enum": ["books", "articles", "tweets", "podcasts"]
    })
}

/// Tool to list highlights, one page at a time or across the library
pub struct ListHighlightsTool {
    client: Arc<ReadwiseClient>,
    shape: ShapeConfig,
}

impl ListHighlightsTool {
    pub fn new(client: Arc<ReadwiseClient>, shape: ShapeConfig) -> Self {
        Self { client, shape }
    }

    async fn run(&self, args: ListHighlightsArgs) -> GatewayResult<CallToolResult> {
        let page_size = validate::page_size(args.page_size.unwrap_or(DEFAULT_PAGE_SIZE))?;
        let page = validate::page_number(args.page.unwrap_or(1))?;
        validate::date_window(
            "highlighted_at__gt",
            args.highlighted_at__gt.as_deref(),
            "highlighted_at__lt",
            args.highlighted_at__lt.as_deref(),
        )?;

        let filter = HighlightFilter {
            book_id: args.book_id,
            search: None,
            highlighted_after: args.highlighted_at__gt.clone(),
            highlighted_before: args.highlighted_at__lt.clone(),
        };

        if args.fetch_all {
            let source = self.client.highlights().highlights(filter);
            return Ok(match collect_pages(&source, FetchLimit::All).await {
                Ok(highlights) => {
                    let records = self.summaries(&highlights);
                    outcome::success(json!({
                        "count": records.len(),
                        "fetch_mode": "all pages",
                        "highlights": records,
                    }))
                }
                Err(interrupted) => {
                    let records = self.summaries(&interrupted.collected);
                    outcome::interrupted(records, &interrupted.cause)
                }
            });
        }

        let response = self
            .client
            .highlights()
            .list_page(&filter, page, page_size)
            .await?;
        let records = self.summaries(&response.results);
        Ok(outcome::success(json!({
            "count": response.count,
            "fetch_mode": format!("page {page}"),
            "highlights": records,
        })))
    }

    fn summaries(&self, highlights: &[Highlight]) -> Vec<Value> {
        highlights
            .iter()
            .map(|highlight| shape::highlight_summary(highlight, &self.shape))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListHighlightsArgs {
    book_id: Option<i64>,
    page_size: Option<u32>,
    page: Option<u32>,
    #[serde(default)]
    fetch_all: bool,
    highlighted_at__gt: Option<String>,
    highlighted_at__lt: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ListHighlightsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_list_highlights".to_string(),
            description: "List highlights from the Readwise library, one page at a time or the whole library with fetch_all.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "book_id": json_schema_integer("Only highlights from this book"),
                    "page_size": json_schema_integer("Results per page, 1 to 1000 (default: 100)"),
                    "page": json_schema_integer("Page number to fetch (default: 1)"),
                    "fetch_all": json_schema_boolean("Fetch every page, ignoring page and page_size (default: false)"),
                    "highlighted_at__gt": json_schema_string("RFC 3339 timestamp; only highlights made after this time"),
                    "highlighted_at__lt": json_schema_string("RFC 3339 timestamp; only highlights made before this time")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ListHighlightsArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}

/// Tool for today's spaced-repetition review
pub struct DailyReviewTool {
    client: Arc<ReadwiseClient>,
    shape: ShapeConfig,
}

impl DailyReviewTool {
    pub fn new(client: Arc<ReadwiseClient>, shape: ShapeConfig) -> Self {
        Self { client, shape }
    }

    async fn run(&self) -> GatewayResult<CallToolResult> {
        let review = self.client.highlights().daily_review().await?;
        let records: Vec<Value> = review
            .highlights
            .iter()
            .map(|highlight| shape::review_highlight(highlight, &self.shape))
            .collect();

        let mut payload = json!({
            "count": records.len(),
            "highlights": records,
        });
        if let Some(id) = review.review_id {
            payload["review_id"] = json!(id);
        }
        if let Some(url) = &review.review_url {
            payload["review_url"] = json!(url);
        }
        if let Some(completed) = review.review_completed {
            payload["review_completed"] = json!(completed);
        }
        Ok(outcome::success(payload))
    }
}

#[async_trait::async_trait]
impl Tool for DailyReviewTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_get_daily_review".to_string(),
            description: "Get today's daily review highlights from Readwise.".to_string(),
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

/// Tool for full-text highlight search
pub struct SearchHighlightsTool {
    client: Arc<ReadwiseClient>,
    shape: ShapeConfig,
}

impl SearchHighlightsTool {
    pub fn new(client: Arc<ReadwiseClient>, shape: ShapeConfig) -> Self {
        Self { client, shape }
    }

    async fn run(&self, args: SearchHighlightsArgs) -> GatewayResult<CallToolResult> {
        if args.query.trim().is_empty() {
            return Err(GatewayError::InvalidParameters(
                "query must not be empty".to_string(),
            ));
        }
        let page_size = validate::page_size(args.page_size.unwrap_or(DEFAULT_PAGE_SIZE))?;
        let page = validate::page_number(args.page.unwrap_or(1))?;

        let filter = HighlightFilter {
            search: Some(args.query.clone()),
            ..Default::default()
        };

        if args.fetch_all {
            let source = self.client.highlights().highlights(filter);
            return Ok(match collect_pages(&source, FetchLimit::All).await {
                Ok(highlights) => {
                    let records = self.matches(&highlights);
                    outcome::success(json!({
                        "count": records.len(),
                        "fetch_mode": "all matches",
                        "query": args.query,
                        "highlights": records,
                    }))
                }
                Err(interrupted) => {
                    let records = self.matches(&interrupted.collected);
                    outcome::interrupted(records, &interrupted.cause)
                }
            });
        }

        let response = self
            .client
            .highlights()
            .list_page(&filter, page, page_size)
            .await?;
        let records = self.matches(&response.results);
        Ok(outcome::success(json!({
            "count": records.len(),
            "fetch_mode": format!("page {page}"),
            "query": args.query,
            "highlights": records,
        })))
    }

    fn matches(&self, highlights: &[Highlight]) -> Vec<Value> {
        highlights
            .iter()
            .map(|highlight| shape::search_highlight(highlight, &self.shape))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchHighlightsArgs {
    query: String,
    page_size: Option<u32>,
    page: Option<u32>,
    #[serde(default)]
    fetch_all: bool,
}

#[async_trait::async_trait]
impl Tool for SearchHighlightsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_search_highlights".to_string(),
            description: "Search highlights by text across the Readwise library.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "query": json_schema_string("Text to search for"),
                    "page_size": json_schema_integer("Results per page, 1 to 1000 (default: 100)"),
                    "page": json_schema_integer("Page number to fetch (default: 1)"),
                    "fetch_all": json_schema_boolean("Fetch every matching page (default: false)")
                }),
                vec!["query"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: SearchHighlightsArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}

/// Tool to list the books and articles highlights came from
pub struct ListBooksTool {
    client: Arc<ReadwiseClient>,
}

impl ListBooksTool {
    pub fn new(client: Arc<ReadwiseClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: ListBooksArgs) -> GatewayResult<CallToolResult> {
        let category = args
            .category
            .as_deref()
            .map(str::parse::<BookCategory>)
            .transpose()?;
        if let Some(after) = &args.last_highlight_at__gt {
            validate::rfc3339("last_highlight_at__gt", after)?;
        }
        let page_size = validate::page_size(args.page_size.unwrap_or(DEFAULT_PAGE_SIZE))?;
        let page = validate::page_number(args.page.unwrap_or(1))?;

        let filter = BookFilter {
            category,
            last_highlight_after: args.last_highlight_at__gt.clone(),
        };

        if args.fetch_all {
            let source = self.client.highlights().books(filter);
            return Ok(match collect_pages(&source, FetchLimit::All).await {
                Ok(books) => {
                    let records: Vec<Value> = books.iter().map(shape::book_summary).collect();
                    outcome::success(json!({
                        "count": records.len(),
                        "fetch_mode": "all pages",
                        "books": records,
                    }))
                }
                Err(interrupted) => {
                    let records = interrupted
                        .collected
                        .iter()
                        .map(shape::book_summary)
                        .collect();
                    outcome::interrupted(records, &interrupted.cause)
                }
            });
        }

        let response = self
            .client
            .highlights()
            .books_page(&filter, page, page_size)
            .await?;
        let records: Vec<Value> = response.results.iter().map(shape::book_summary).collect();
        Ok(outcome::success(json!({
            "count": response.count,
            "fetch_mode": format!("page {page}"),
            "books": records,
        })))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListBooksArgs {
    category: Option<String>,
    page_size: Option<u32>,
    page: Option<u32>,
    #[serde(default)]
    fetch_all: bool,
    last_highlight_at__gt: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ListBooksTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_list_books".to_string(),
            description: "List the books, articles, and other sources highlights were made in.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "category": book_category_schema("Filter by source category"),
                    "page_size": json_schema_integer("Results per page, 1 to 1000 (default: 100)"),
                    "page": json_schema_integer("Page number to fetch (default: 1)"),
                    "fetch_all": json_schema_boolean("Fetch every page (default: false)"),
                    "last_highlight_at__gt": json_schema_string("RFC 3339 timestamp; only sources highlighted after this time")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ListBooksArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}

/// Tool to fetch every highlight in one book
pub struct BookHighlightsTool {
    client: Arc<ReadwiseClient>,
    shape: ShapeConfig,
}

impl BookHighlightsTool {
    pub fn new(client: Arc<ReadwiseClient>, shape: ShapeConfig) -> Self {
        Self { client, shape }
    }

    async fn run(&self, args: BookHighlightsArgs) -> GatewayResult<CallToolResult> {
        let source = self.client.highlights().book_highlights(args.book_id);
        match collect_pages(&source, FetchLimit::All).await {
            Ok(highlights) => {
                let records: Vec<Value> = highlights
                    .iter()
                    .map(|highlight| shape::book_highlight(highlight, &self.shape))
                    .collect();
                Ok(outcome::success(json!({
                    "book_id": args.book_id,
                    "count": records.len(),
                    "fetch_mode": "all pages",
                    "highlights": records,
                })))
            }
            Err(interrupted) => {
                let records = interrupted
                    .collected
                    .iter()
                    .map(|highlight| shape::book_highlight(highlight, &self.shape))
                    .collect();
                Ok(outcome::interrupted(records, &interrupted.cause))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BookHighlightsArgs {
    book_id: i64,
}

#[async_trait::async_trait]
impl Tool for BookHighlightsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_get_book_highlights".to_string(),
            description: "Get every highlight from a specific book or article.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "book_id": json_schema_integer("The ID of the book to fetch highlights from")
                }),
                vec!["book_id"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: BookHighlightsArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}

/// Tool for bulk export of the highlights library
pub struct ExportHighlightsTool {
    client: Arc<ReadwiseClient>,
    shape: ShapeConfig,
}

impl ExportHighlightsTool {
    pub fn new(client: Arc<ReadwiseClient>, shape: ShapeConfig) -> Self {
        Self { client, shape }
    }

    async fn run(&self, args: ExportHighlightsArgs) -> GatewayResult<CallToolResult> {
        if let Some(after) = &args.updated_after {
            validate::rfc3339("updated_after", after)?;
        }
        if let Some(max) = args.max_results {
            validate::positive("max_results", max)?;
        }

        let filter = ExportFilter {
            updated_after: args.updated_after.clone(),
            include_deleted: args.include_deleted,
        };
        let limit = match args.max_results {
            Some(max) => FetchLimit::Bounded(max),
            None => FetchLimit::All,
        };

        let source = self.client.highlights().export(filter);
        match collect_pages(&source, limit).await {
            Ok(highlights) => {
                let records = self.rows(&highlights);
                let export_mode = match args.max_results {
                    Some(max) => format!("limited to first {max}"),
                    None => "all highlights".to_string(),
                };
                Ok(outcome::success(json!({
                    "count": records.len(),
                    "export_mode": export_mode,
                    "highlights": records,
                })))
            }
            Err(interrupted) => {
                let records = self.rows(&interrupted.collected);
                Ok(outcome::interrupted(records, &interrupted.cause))
            }
        }
    }

    fn rows(&self, highlights: &[Highlight]) -> Vec<Value> {
        highlights
            .iter()
            .map(|highlight| shape::export_highlight(highlight, &self.shape))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExportHighlightsArgs {
    updated_after: Option<String>,
    #[serde(default)]
    include_deleted: bool,
    max_results: Option<usize>,
}

#[async_trait::async_trait]
impl Tool for ExportHighlightsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_export_highlights".to_string(),
            description: "Export highlights with book metadata attached to each row.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "updated_after": json_schema_string("RFC 3339 timestamp; only highlights updated after this time"),
                    "include_deleted": json_schema_boolean("Include deleted highlights (default: false)"),
                    "max_results": json_schema_integer("Stop after this many highlights; pages beyond the cap are never fetched")
                }),
                vec![],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: ExportHighlightsArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}

/// Tool to append a highlight to the library
pub struct CreateHighlightTool {
    client: Arc<ReadwiseClient>,
}

impl CreateHighlightTool {
    pub fn new(client: Arc<ReadwiseClient>) -> Self {
        Self { client }
    }

    async fn run(&self, args: CreateHighlightArgs) -> GatewayResult<CallToolResult> {
        if args.text.trim().is_empty() {
            return Err(GatewayError::InvalidParameters(
                "text must not be empty".to_string(),
            ));
        }
        let category: BookCategory = args.category.parse()?;
        if let Some(at) = &args.highlighted_at {
            validate::rfc3339("highlighted_at", at)?;
        }

        let highlight = NewHighlight {
            text: args.text,
            title: args.title,
            author: args.author,
            note: args.note,
            category: Some(category),
            highlighted_at: args.highlighted_at,
        };
        let created = self.client.highlights().create(&[highlight]).await?;
        Ok(outcome::success(json!({ "created": created })))
    }
}

fn default_highlight_category() -> String {
    "books".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateHighlightArgs {
    text: String,
    title: Option<String>,
    author: Option<String>,
    note: Option<String>,
    #[serde(default = "default_highlight_category")]
    category: String,
    highlighted_at: Option<String>,
}

#[async_trait::async_trait]
impl Tool for CreateHighlightTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "readwise_create_highlight".to_string(),
            description: "Create a new highlight in the Readwise library.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "text": json_schema_string("The highlight text"),
                    "title": json_schema_string("Title of the source book or article"),
                    "author": json_schema_string("Author of the source"),
                    "note": json_schema_string("A note to attach to the highlight"),
                    "category": book_category_schema("Source category (default: books)"),
                    "highlighted_at": json_schema_string("RFC 3339 timestamp of when the highlight was made")
                }),
                vec!["text"],
            ),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args: CreateHighlightArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(error) => return Ok(outcome::invalid_args(&error)),
        };
        Ok(self
            .run(args)
            .await
            .unwrap_or_else(|error| outcome::failure(&error)))
    }
}
