use crate::error::{ErrorKind, FetchError};
use serde::{Deserialize, Serialize};
use url::Url;

/// A cookie as handed over by the host (browser export, login view, settings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default)]
    pub path: String,
}

impl Cookie {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: path.into(),
        }
    }
}

/// One extra request header. Order is preserved when applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Which statuses count as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusPolicy {
    /// Any 2xx.
    #[default]
    AnySuccess,
    /// Exactly 200.
    ExactOk,
}

impl StatusPolicy {
    pub fn accepts(self, status: reqwest::StatusCode) -> bool {
        match self {
            StatusPolicy::AnySuccess => status.is_success(),
            StatusPolicy::ExactOk => status == reqwest::StatusCode::OK,
        }
    }
}

/// Well-known user agent flavours some endpoints expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserAgentKind {
    /// Default browser string plus the `request` product token.
    Request,
}

impl UserAgentKind {
    pub fn token(self) -> &'static str {
        match self {
            UserAgentKind::Request => "request",
        }
    }
}

/// Per-call knobs for every GET and POST variant.
///
/// Start from [`FetchOptions::default()`] and chain the builder methods:
///
/// ```
/// use plugin_web::tools::fetch::{Cookie, FetchOptions};
///
/// let opts = FetchOptions::default()
///     .with_token("abc")
///     .with_accept_language("en-US")
///     .with_cookies(vec![Cookie::new("sid", "1", ".example.com", "/")])
///     .preserve_query();
/// assert!(opts.preserve_query_on_redirect);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOptions {
    pub user_agent: Option<String>,
    pub cookies: Option<Vec<Cookie>>,
    pub token: Option<String>,
    pub extra_headers: Vec<HeaderEntry>,
    pub accept_language: Option<String>,
    pub accept: Option<String>,
    pub preflight_url: Option<String>,
    pub preserve_query_on_redirect: bool,
    pub decompress: bool,
    pub status_policy: StatusPolicy,
}

impl FetchOptions {
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Use one of the predefined agents. `Request` also switches to [`StatusPolicy::ExactOk`].
    pub fn with_user_agent_kind(mut self, kind: UserAgentKind) -> Self {
        self.user_agent = Some(format!("{} {}", super::headers::default_user_agent(), kind.token()));
        if kind == UserAgentKind::Request {
            self.status_policy = StatusPolicy::ExactOk;
        }
        self
    }

    pub fn with_cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.cookies = Some(cookies);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push(HeaderEntry::new(key, value));
        self
    }

    pub fn with_accept_language(mut self, lang: impl Into<String>) -> Self {
        self.accept_language = Some(lang.into());
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn with_preflight(mut self, url: impl Into<String>) -> Self {
        self.preflight_url = Some(url.into());
        self
    }

    pub fn preserve_query(mut self) -> Self {
        self.preserve_query_on_redirect = true;
        self
    }

    pub fn decompressed(mut self) -> Self {
        self.decompress = true;
        self
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }
}

/// Outcome of a single logical fetch.
#[derive(Debug)]
pub enum FetchResult<T> {
    /// The server answered with an accepted status and content.
    Success(T),
    /// The server answered with an accepted status but an empty body.
    Empty,
    /// Nothing usable came back.
    Failure(FetchError),
}

impl<T> FetchResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FetchResult::Empty)
    }

    /// `None` unless this is a failure.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            FetchResult::Failure(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchResult::Failure(e) => Some(e),
            _ => None,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            FetchResult::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchResult<U> {
        match self {
            FetchResult::Success(v) => FetchResult::Success(f(v)),
            FetchResult::Empty => FetchResult::Empty,
            FetchResult::Failure(e) => FetchResult::Failure(e),
        }
    }

    /// Collapse into a plain `Result`, with `Empty` mapped to `Ok(None)`.
    pub fn into_result(self) -> crate::Result<Option<T>> {
        match self {
            FetchResult::Success(v) => Ok(Some(v)),
            FetchResult::Empty => Ok(None),
            FetchResult::Failure(e) => Err(e),
        }
    }
}

impl<T: Default> FetchResult<T> {
    /// The content, or `T::default()` for empty and failed fetches.
    pub fn unwrap_or_default(self) -> T {
        self.ok().unwrap_or_default()
    }
}

impl<T> From<FetchError> for FetchResult<T> {
    fn from(err: FetchError) -> Self {
        FetchResult::Failure(err)
    }
}

/// A GET that may have followed redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// URL that produced the body.
    pub final_url: Url,
    /// Number of redirects followed.
    pub hops: usize,
    pub status: u16,
    pub body: String,
}
