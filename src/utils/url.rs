//! Place URL preparation.
//!
//! Users paste share links (short links or full place URLs carrying tracking
//! query parameters). The harvester wants the canonical place URL with an
//! explicit UI language.

use url::Url;

/// Errors from preparing a place URL.
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("Invalid URL '{url}': {source}")]
    Invalid {
        url: String,
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
    #[error("Failed to resolve {url}: {source}")]
    Resolve { url: String, source: reqwest::Error },
}

/// Follow redirects from a share link and return the final URL.
pub async fn resolve_place_url(client: &reqwest::Client, input: &str) -> Result<String, UrlError> {
    let start = parse_http_url(input)?;
    let response = client
        .get(start.as_str())
        .send()
        .await
        .map_err(|source| UrlError::Resolve {
            url: input.to_string(),
            source,
        })?;
    let resolved = response.url().to_string();
    tracing::debug!("Resolved {} -> {}", input, resolved);
    Ok(resolved)
}

/// Drop query and fragment (the `?entry=...` tracking tail) and request the
/// given UI language via `hl`.
pub fn normalize_place_url(resolved: &str, language: &str) -> Result<String, UrlError> {
    let mut url = parse_http_url(resolved)?;
    url.set_fragment(None);
    if language.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&format!("hl={}", language)));
    }
    Ok(url.to_string())
}

fn parse_http_url(input: &str) -> Result<Url, UrlError> {
    let url = Url::parse(input.trim()).map_err(|source| UrlError::Invalid {
        url: input.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UrlError::UnsupportedScheme(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_entry_tail() {
        let resolved = concat!(
            "https://www.google.com/maps/place/Cafe+Nord/@52.5,13.4,17z/data=!4m6!3m5",
            "?entry=ttu&g_ep=abc"
        );
        assert_eq!(
            normalize_place_url(resolved, "en").unwrap(),
            "https://www.google.com/maps/place/Cafe+Nord/@52.5,13.4,17z/data=!4m6!3m5?hl=en"
        );
    }

    #[test]
    fn test_normalize_without_query() {
        assert_eq!(
            normalize_place_url("https://example.com/place/x#frag", "de").unwrap(),
            "https://example.com/place/x?hl=de"
        );
        assert_eq!(
            normalize_place_url("https://example.com/place/x?a=1", "").unwrap(),
            "https://example.com/place/x"
        );
    }

    #[test]
    fn test_rejects_non_http() {
        assert!(matches!(
            normalize_place_url("ftp://example.com/x", "en"),
            Err(UrlError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            normalize_place_url("not a url", "en"),
            Err(UrlError::Invalid { .. })
        ));
    }
}
