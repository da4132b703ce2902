//! # Readwise client
//!
//! Async client for the Readwise Reader (v3) and Highlights (v2) APIs,
//! with a shared transport, bounded retries, and a pagination engine
//! that hides the two incompatible paging schemes behind one interface.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use readwise_mcp_client::{FetchLimit, ReadwiseClient};
//! use readwise_mcp_core::GatewayResult;
//!
//! #[tokio::main]
//! async fn main() -> GatewayResult<()> {
//!     let client = ReadwiseClient::builder()
//!         .token("rw-your-token")
//!         .build()?;
//!
//!     // One page of recent documents
//!     let page = client
//!         .reader()
//!         .list_page(&Default::default(), None)
//!         .await?;
//!     println!("got {} documents", page.results.len());
//!
//!     // Every highlight for a book, across all backend pages
//!     let source = client.highlights().book_highlights(42);
//!     let all = readwise_mcp_client::collect_pages(&source, FetchLimit::All)
//!         .await
//!         .map_err(|interrupted| interrupted.cause)?;
//!     println!("got {} highlights", all.len());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod pagination;
pub mod transport;

// Re-export main client
pub use client::{ReadwiseClient, ReadwiseClientBuilder};
pub use config::{ApiToken, ClientConfig, RetryPolicy};
pub use pagination::{
    collect_matching, collect_pages, FetchInterrupted, FetchLimit, Page, PageCursor, PageSource,
};

// Re-export the filter/request types tool handlers build
pub use api::highlights::{BookFilter, ExportFilter, HighlightFilter, NewHighlight};
pub use api::reader::{DocumentFilter, DocumentUpdate, SaveDocumentRequest};

// Re-export core types for convenience
pub use readwise_mcp_core::{
    Book, BookCategory, CollectionResponse, DailyReview, Document, DocumentCategory,
    DocumentListResponse, ErrorKind, GatewayError, GatewayResult, Highlight, Location,
};
