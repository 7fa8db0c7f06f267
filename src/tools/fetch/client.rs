use super::cookies::{build_jar, CookiePolicy};
use super::headers::{build_headers, HeaderPlan, ALTERNATE_USER_AGENT};
use super::types::FetchOptions;
use crate::config::FetchSettings;
use crate::error::{FetchError, Result};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{redirect, Client, Method, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// True for absolute `http://` or `https://` URLs with a host.
pub fn is_http_url(url: &str) -> bool {
    parse_http_url(url).is_ok()
}

pub(crate) fn parse_http_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim()).map_err(|_| FetchError::invalid_url(url))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some_and(|h| !h.is_empty()) => Ok(parsed),
        _ => Err(FetchError::invalid_url(url)),
    }
}

#[derive(Debug, Clone)]
pub(crate) enum RequestBody {
    Text { content: String, content_type: String },
    Form(Vec<(String, String)>),
}

/// Everything one logical fetch needs. Built per call, dropped with it.
#[derive(Debug, Clone)]
pub(crate) struct RequestContext {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub jar: Option<Arc<Jar>>,
    pub body: Option<RequestBody>,
    pub preflight_url: Option<Url>,
    pub decompress: bool,
    pub preserve_query: bool,
    /// Let the transport follow redirects itself (POST variants).
    pub follow_redirects: bool,
    pub lenient_headers: bool,
}

impl RequestContext {
    /// GET context from caller options. Cookies go through unfiltered.
    pub fn get(url: &str, opts: &FetchOptions, settings: &FetchSettings) -> Result<Self> {
        let url = parse_http_url(url)?;
        let preflight_url = match opts.preflight_url.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => match parse_http_url(p) {
                Ok(preflight) => Some(preflight),
                Err(e) => {
                    warn!("skipping pre-request: {}", e);
                    None
                }
            },
            _ => None,
        };

        let user_agent = opts
            .user_agent
            .as_deref()
            .or(settings.user_agent.as_deref());
        let headers = build_headers(&HeaderPlan {
            user_agent,
            token: opts.token.as_deref(),
            accept_language: opts.accept_language.as_deref(),
            accept: opts.accept.as_deref(),
            extra: &opts.extra_headers,
        });

        // Cookies set by the pre-request must reach the real request.
        let jar = match opts.cookies.as_deref() {
            Some(cookies) => Some(build_jar(cookies, &CookiePolicy::allow_all()).jar),
            None if preflight_url.is_some() => Some(Arc::new(Jar::default())),
            None => None,
        };

        Ok(Self {
            url,
            method: Method::GET,
            headers,
            jar,
            body: None,
            preflight_url,
            decompress: opts.decompress,
            preserve_query: opts.preserve_query_on_redirect,
            follow_redirects: false,
            lenient_headers: false,
        })
    }

    /// Same request as a POST carrying `body`.
    pub fn into_post(mut self, body: RequestBody) -> Self {
        self.method = Method::POST;
        self.body = Some(body);
        self.preflight_url = None;
        self.follow_redirects = true;
        self
    }

    /// Switch to the alternate user agent on a lenient client.
    pub fn use_alternate_agent(&mut self) {
        self.headers
            .insert(USER_AGENT, HeaderValue::from_static(ALTERNATE_USER_AGENT));
        self.lenient_headers = true;
    }

    /// A fresh client for this call only.
    pub fn client(&self, settings: &FetchSettings) -> Result<Client> {
        let policy = if self.follow_redirects {
            redirect::Policy::limited(settings.max_redirects)
        } else {
            redirect::Policy::none()
        };

        let mut builder = Client::builder()
            .redirect(policy)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .gzip(self.decompress)
            .deflate(self.decompress)
            .brotli(self.decompress);

        if let Some(jar) = &self.jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        if self.lenient_headers {
            builder = builder
                .http1_allow_obsolete_multiline_headers_in_responses(true)
                .http1_allow_spaces_after_header_name_in_responses(true);
        }

        builder.build().map_err(|e| FetchError::transport(self.url.as_str(), &e))
    }

    pub fn request(&self, client: &Client, url: &Url) -> RequestBuilder {
        let builder = client
            .request(self.method.clone(), url.clone())
            .headers(self.headers.clone());
        match &self.body {
            Some(RequestBody::Text {
                content,
                content_type,
            }) => builder
                .header(CONTENT_TYPE, content_type.as_str())
                .body(content.clone()),
            Some(RequestBody::Form(fields)) => builder.form(fields),
            None => builder,
        }
    }

    /// The priming request: same headers minus Authorization.
    pub fn preflight_request(&self, client: &Client, url: &Url) -> RequestBuilder {
        let mut headers = self.headers.clone();
        headers.remove(AUTHORIZATION);
        client.get(url.clone()).headers(headers)
    }
}

/// Entry point for every retrieval variant.
///
/// Holds settings and the payload cookie policy only; each call builds and
/// drops its own transport client, so a `Fetcher` can be cloned and shared
/// freely across tasks.
#[derive(Debug, Clone)]
pub struct Fetcher {
    pub(crate) settings: FetchSettings,
    pub(crate) payload_policy: CookiePolicy,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(FetchSettings::default())
    }
}

impl Fetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self {
            settings,
            payload_policy: CookiePolicy::payload_default(),
        }
    }

    /// Replace the cookie allow-list used by payload submissions.
    pub fn with_payload_policy(mut self, policy: CookiePolicy) -> Self {
        self.payload_policy = policy;
        self
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }
}
