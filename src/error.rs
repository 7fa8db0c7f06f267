use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Discriminant callers match on instead of inspecting message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    TransportFailure,
    ServerError(u16),
    RedirectLoopExceeded,
    CacheMiss,
    MalformedCookie,
    Decode,
    Io,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },

    #[error("status {status} for {url}")]
    Server { url: String, status: u16 },

    #[error("more than {limit} redirects starting at {url}")]
    RedirectLoopExceeded { url: String, limit: usize },

    #[error("no cached copy of {0}")]
    CacheMiss(String),

    #[error("malformed cookie '{name}': {reason}")]
    MalformedCookie { name: String, reason: String },

    #[error("could not decode body from {url}: {detail}")]
    Decode { url: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::InvalidInput(_) => ErrorKind::InvalidInput,
            FetchError::Transport { .. } => ErrorKind::TransportFailure,
            FetchError::Server { status, .. } => ErrorKind::ServerError(*status),
            FetchError::RedirectLoopExceeded { .. } => ErrorKind::RedirectLoopExceeded,
            FetchError::CacheMiss(_) => ErrorKind::CacheMiss,
            FetchError::MalformedCookie { .. } => ErrorKind::MalformedCookie,
            FetchError::Decode { .. } => ErrorKind::Decode,
            FetchError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn invalid_url(url: &str) -> Self {
        FetchError::InvalidInput(format!("not a valid url: {url}"))
    }

    pub fn transport(url: &str, err: &reqwest::Error) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            detail: error_chain(err),
        }
    }

    pub fn malformed_cookie(name: &str, reason: impl Into<String>) -> Self {
        FetchError::MalformedCookie {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP 403 responses, whether reported by us or by a collaborator in text form.
    pub fn is_forbidden(&self) -> bool {
        match self {
            FetchError::Server { status, .. } => *status == 403,
            other => other.to_string().contains("(403)"),
        }
    }
}

/// Flatten an error and all of its sources into one line.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !parts.iter().any(|p| p == &text) {
            parts.push(text);
        }
        source = inner.source();
    }
    parts.join(": ")
}
