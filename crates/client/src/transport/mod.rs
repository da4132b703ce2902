//! Transport layer for the Readwise client.

pub mod http;

pub use http::HttpTransport;
