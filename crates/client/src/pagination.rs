//! Unified pagination engine over the two backend paging schemes.
//!
//! The v3 Reader API pages with an opaque cursor token; the v2
//! Highlights API pages with an incrementing page number. Both are
//! exposed through [`PageSource`], so the walk logic here never knows
//! which scheme it is driving. Walks are strictly sequential and stop
//! issuing requests the moment a caller limit is satisfied.

use async_trait::async_trait;
use readwise_mcp_core::{GatewayError, GatewayResult};

/// Position inside a paged collection.
///
/// Scoped to a single walk; never persisted or shared across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCursor {
    /// Opaque continuation token (v3 cursor pagination).
    Token(String),
    /// 1-based page number (v2 offset pagination).
    Page(u32),
}

/// One fetched page of records plus the position of the next one.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub next: Option<PageCursor>,
}

/// How many records a walk may collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchLimit {
    /// Stop once this many records are held; the backend's page size
    /// never constrains the caller.
    Bounded(usize),
    /// Walk every page until the backend signals exhaustion.
    All,
}

/// A paged backend collection the engine can walk.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Record: Send;

    /// Fetch one page. `None` means the first page.
    async fn fetch(&self, cursor: Option<PageCursor>) -> GatewayResult<Page<Self::Record>>;
}

/// A walk that failed partway through.
///
/// Carries everything collected before the failing page so callers can
/// surface a partial result instead of silently losing the work.
#[derive(Debug)]
pub struct FetchInterrupted<T> {
    pub collected: Vec<T>,
    pub cause: GatewayError,
}

/// Walk `source` sequentially and collect records up to `limit`.
///
/// A page with zero records is treated as exhaustion even when a next
/// cursor is present, so a misbehaving backend cannot induce an endless
/// walk. Under a bounded limit, no page request is issued once the
/// limit is already satisfied.
pub async fn collect_pages<S: PageSource>(
    source: &S,
    limit: FetchLimit,
) -> Result<Vec<S::Record>, FetchInterrupted<S::Record>> {
    if let FetchLimit::Bounded(0) = limit {
        return Ok(Vec::new());
    }

    let mut collected = Vec::new();
    let mut cursor = None;

    loop {
        let page = match source.fetch(cursor.take()).await {
            Ok(page) => page,
            Err(cause) => return Err(FetchInterrupted { collected, cause }),
        };

        if page.records.is_empty() {
            break;
        }

        collected.extend(page.records);

        if let FetchLimit::Bounded(max) = limit {
            if collected.len() >= max {
                collected.truncate(max);
                break;
            }
        }

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(collected)
}

/// Walk `source` and keep records matching `predicate`, stopping as soon
/// as `limit` matches are held.
///
/// The match count acts as a cooperative cancellation signal: a hit-rich
/// collection stops after its first pages instead of being walked to the
/// end.
pub async fn collect_matching<S, F>(
    source: &S,
    predicate: F,
    limit: usize,
) -> Result<Vec<S::Record>, FetchInterrupted<S::Record>>
where
    S: PageSource,
    F: Fn(&S::Record) -> bool + Send + Sync,
{
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut matched = Vec::new();
    let mut cursor = None;

    loop {
        let page = match source.fetch(cursor.take()).await {
            Ok(page) => page,
            Err(cause) => {
                return Err(FetchInterrupted {
                    collected: matched,
                    cause,
                })
            }
        };

        if page.records.is_empty() {
            break;
        }

        for record in page.records {
            if predicate(&record) {
                matched.push(record);
                if matched.len() >= limit {
                    return Ok(matched);
                }
            }
        }

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(matched)
}
