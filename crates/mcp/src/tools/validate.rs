// Parameter validation applied before any backend request is issued

use chrono::{DateTime, FixedOffset};
use readwise_mcp_core::{DocumentCategory, GatewayError, GatewayResult, Location};
use url::Url;

/// Backend page size bounds for the v2 API.
pub fn page_size(value: u32) -> GatewayResult<u32> {
    if (1..=1000).contains(&value) {
        Ok(value)
    } else {
        Err(GatewayError::InvalidParameters(
            "page_size must be between 1 and 1000".to_string(),
        ))
    }
}

/// Page numbers are 1-based.
pub fn page_number(value: u32) -> GatewayResult<u32> {
    if value >= 1 {
        Ok(value)
    } else {
        Err(GatewayError::InvalidParameters(
            "page must be at least 1".to_string(),
        ))
    }
}

/// Record caps must ask for at least one record.
pub fn positive(name: &str, value: usize) -> GatewayResult<usize> {
    if value >= 1 {
        Ok(value)
    } else {
        Err(GatewayError::InvalidParameters(format!(
            "{name} must be at least 1"
        )))
    }
}

/// Watermarks and highlight dates must be RFC 3339.
pub fn rfc3339(name: &str, value: &str) -> GatewayResult<()> {
    parse_rfc3339(name, value).map(|_| ())
}

fn parse_rfc3339(name: &str, value: &str) -> GatewayResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|_| {
        GatewayError::InvalidParameters(format!(
            "{name} must be an RFC 3339 timestamp like 2025-11-01T00:00:00Z"
        ))
    })
}

/// Validate an optional date window: each bound must parse, and the
/// lower bound must be earlier than the upper one.
pub fn date_window(
    gt_name: &str,
    gt: Option<&str>,
    lt_name: &str,
    lt: Option<&str>,
) -> GatewayResult<()> {
    let lower = gt.map(|value| parse_rfc3339(gt_name, value)).transpose()?;
    let upper = lt.map(|value| parse_rfc3339(lt_name, value)).transpose()?;
    if let (Some(lower), Some(upper)) = (lower, upper) {
        if lower >= upper {
            return Err(GatewayError::InvalidParameters(format!(
                "{gt_name} must be earlier than {lt_name}"
            )));
        }
    }
    Ok(())
}

/// The feed location only carries RSS documents; any other category
/// combined with it can never match.
pub fn feed_location_category(
    location: Option<Location>,
    category: Option<DocumentCategory>,
) -> GatewayResult<()> {
    if location == Some(Location::Feed) {
        if let Some(category) = category {
            if category != DocumentCategory::Rss {
                return Err(GatewayError::InvalidParameters(format!(
                    "location 'feed' only supports category 'rss', got '{category}'"
                )));
            }
        }
    }
    Ok(())
}

/// Documents are saved by absolute http(s) URL.
pub fn http_url(value: &str) -> GatewayResult<()> {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        _ => Err(GatewayError::InvalidParameters(
            "url must be an absolute http(s) URL".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_bounds() {
        assert!(page_size(1).is_ok());
        assert!(page_size(1000).is_ok());
        assert!(page_size(0).is_err());
        assert!(page_size(1001).is_err());
    }

    #[test]
    fn test_page_number_is_one_based() {
        assert!(page_number(1).is_ok());
        assert!(page_number(0).is_err());
    }

    #[test]
    fn test_positive_caps() {
        assert!(positive("limit", 1).is_ok());
        let err = positive("max_results", 0).unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn test_rfc3339_accepts_offsets_and_z() {
        assert!(rfc3339("updated_after", "2025-11-01T00:00:00Z").is_ok());
        assert!(rfc3339("updated_after", "2025-11-01T09:30:00+02:00").is_ok());
        assert!(rfc3339("updated_after", "2025-11-01").is_err());
        assert!(rfc3339("updated_after", "yesterday").is_err());
    }

    #[test]
    fn test_date_window_rejects_inversion() {
        assert!(date_window(
            "highlighted_at__gt",
            Some("2025-01-01T00:00:00Z"),
            "highlighted_at__lt",
            Some("2025-06-01T00:00:00Z"),
        )
        .is_ok());

        let err = date_window(
            "highlighted_at__gt",
            Some("2025-06-01T00:00:00Z"),
            "highlighted_at__lt",
            Some("2025-01-01T00:00:00Z"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("earlier than"));

        // Equal bounds select nothing, so they are rejected too.
        assert!(date_window(
            "highlighted_at__gt",
            Some("2025-01-01T00:00:00Z"),
            "highlighted_at__lt",
            Some("2025-01-01T00:00:00Z"),
        )
        .is_err());
    }

    #[test]
    fn test_feed_location_category_combinations() {
        assert!(feed_location_category(Some(Location::Feed), None).is_ok());
        assert!(
            feed_location_category(Some(Location::Feed), Some(DocumentCategory::Rss)).is_ok()
        );
        assert!(feed_location_category(None, Some(DocumentCategory::Article)).is_ok());
        assert!(
            feed_location_category(Some(Location::Feed), Some(DocumentCategory::Article)).is_err()
        );
    }

    #[test]
    fn test_http_url() {
        assert!(http_url("https://example.com/post").is_ok());
        assert!(http_url("http://example.com").is_ok());
        assert!(http_url("ftp://example.com").is_err());
        assert!(http_url("example.com/post").is_err());
        assert!(http_url("").is_err());
    }
}
