//! Redirect resolution rules used by the manual redirect chase.

use crate::error::{FetchError, Result};
use reqwest::StatusCode;
use url::Url;

/// Whether the response has to be chased: a 3xx status, or the transport
/// ended up somewhere other than where it was sent.
pub(crate) fn is_redirect(status: StatusCode, requested: &Url, responded: &Url) -> bool {
    status.is_redirection() || requested != responded
}

/// Resolve a `Location` header against the URL that produced it.
pub fn resolve_location(request_url: &Url, location: &str) -> Result<Url> {
    let location = location.trim();
    if location.is_empty() {
        return Err(FetchError::InvalidInput(format!(
            "empty redirect location from {request_url}"
        )));
    }
    request_url
        .join(location)
        .map_err(|e| FetchError::InvalidInput(format!("bad redirect location {location:?}: {e}")))
}

/// Carry the original query string over to the redirect target.
///
/// - target without a query: `target?query`
/// - target with a different query: `target&query`
/// - target with the same query: unchanged
pub fn preserve_query(original: &str, target: &str) -> String {
    let original_query = match original.split_once('?') {
        Some((_, q)) if !q.is_empty() && !q.contains('?') => q,
        _ => return target.to_string(),
    };
    match target.split_once('?') {
        Some((_, q)) if q == original_query => target.to_string(),
        Some(_) => format!("{target}&{original_query}"),
        None => format!("{target}?{original_query}"),
    }
}
