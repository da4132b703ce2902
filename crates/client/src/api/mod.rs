//! API groups for the Readwise client.

pub mod highlights;
pub mod reader;

pub use highlights::HighlightsApi;
pub use reader::ReaderApi;
