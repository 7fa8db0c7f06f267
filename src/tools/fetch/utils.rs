use super::types::FetchResult;
use crate::error::{error_chain, FetchError};
use tracing::{error, warn};
use url::Url;

/// Fragments the HTTP/1 parser puts in its error when a response header line
/// cannot be parsed (bare CR, missing colon, illegal token).
const HEADER_PARSE_MARKERS: [&str; 3] = [
    "invalid http header parsed",
    "invalid header",
    "section=responseheader",
];

/// Whether a send failed because the response headers could not be parsed.
pub(crate) fn is_header_parse_failure(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_connect() || err.is_builder() {
        return false;
    }
    is_header_parse_message(&error_chain(err))
}

fn is_header_parse_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    HEADER_PARSE_MARKERS.iter().any(|m| lower.contains(m))
}

/// Log a failure at the level it deserves: server answers and local problems
/// are warnings, transport failures are errors.
pub(crate) fn log_failure(err: &FetchError) {
    match err {
        FetchError::Transport { .. } | FetchError::Io(_) => error!("{}", err),
        _ => warn!("{}", err),
    }
}

/// Read a response body as text; an empty body is [`FetchResult::Empty`].
pub(crate) async fn read_text(url: &Url, response: reqwest::Response) -> FetchResult<String> {
    match response.text().await {
        Ok(body) if body.is_empty() => FetchResult::Empty,
        Ok(body) => FetchResult::Success(body),
        Err(e) => {
            let err = FetchError::transport(url.as_str(), &e);
            log_failure(&err);
            FetchResult::Failure(err)
        }
    }
}
