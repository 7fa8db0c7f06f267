use super::types::HeaderEntry;
use once_cell::sync::OnceCell;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, USER_AGENT,
};
use tracing::warn;

/// Browser part of the default user agent. Some hosts reject anything that
/// does not look like a desktop browser.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0";

/// Sent on the one retry after a response with unparseable headers.
pub const ALTERNATE_USER_AGENT: &str = "Anything";

/// Accept header used for JSON payload submissions.
pub(crate) const PAYLOAD_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

static HOST_IDENTITY: OnceCell<String> = OnceCell::new();

/// Record the host product token appended to the default user agent.
///
/// Only the first call wins; returns `false` when an identity was already set.
pub fn set_host_identity(product: &str, version: &str) -> bool {
    HOST_IDENTITY.set(format!("{product}/{version}")).is_ok()
}

/// The process-wide default user agent: browser string plus host product token.
pub fn default_user_agent() -> String {
    match HOST_IDENTITY.get() {
        Some(identity) => format!("{BROWSER_USER_AGENT} {identity}"),
        None => format!(
            "{BROWSER_USER_AGENT} {}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
    }
}

/// What goes into the header map of one request, before any cookies.
#[derive(Debug, Default)]
pub(crate) struct HeaderPlan<'a> {
    pub user_agent: Option<&'a str>,
    pub token: Option<&'a str>,
    pub accept_language: Option<&'a str>,
    pub accept: Option<&'a str>,
    pub extra: &'a [HeaderEntry],
}

/// Build the header map: user agent, then Authorization / Accept / Accept-Language,
/// then caller headers appended last.
pub(crate) fn build_headers(plan: &HeaderPlan<'_>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let ua = match plan.user_agent.filter(|ua| !ua.trim().is_empty()) {
        Some(ua) => ua.to_string(),
        None => default_user_agent(),
    };
    match HeaderValue::from_str(&ua) {
        Ok(value) => {
            headers.insert(USER_AGENT, value);
        }
        Err(_) => {
            warn!("invalid user agent {:?}, falling back to default", ua);
            if let Ok(value) = HeaderValue::from_str(&default_user_agent()) {
                headers.insert(USER_AGENT, value);
            }
        }
    }

    if let Some(token) = non_blank(plan.token) {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("bearer token contains invalid header characters, not sent"),
        }
    }

    if let Some(accept) = non_blank(plan.accept) {
        insert_checked(&mut headers, ACCEPT, accept);
    }

    if let Some(lang) = non_blank(plan.accept_language) {
        insert_checked(&mut headers, ACCEPT_LANGUAGE, lang);
    }

    append_extra(&mut headers, plan.extra);
    headers
}

/// Append caller headers without removing values already present.
pub(crate) fn append_extra(headers: &mut HeaderMap, extra: &[HeaderEntry]) {
    for entry in extra {
        let name = match HeaderName::from_bytes(entry.key.trim().as_bytes()) {
            Ok(name) => name,
            Err(_) => {
                warn!("skipping header with invalid name {:?}", entry.key);
                continue;
            }
        };
        match HeaderValue::from_str(&entry.value) {
            Ok(value) => {
                headers.append(name, value);
            }
            Err(_) => warn!("skipping header {} with invalid value", entry.key),
        }
    }
}

fn insert_checked(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => warn!("skipping {} header with invalid value {:?}", name, value),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `scheme//host` built from the first and third `/` segments, as sent in
/// Origin and Referer for form posts.
pub(crate) fn origin_of(url: &str) -> Option<String> {
    let parts: Vec<&str> = url.split('/').collect();
    match parts.as_slice() {
        [scheme, "", host, ..] if !scheme.is_empty() && !host.is_empty() => {
            Some(format!("{scheme}//{host}"))
        }
        _ => None,
    }
}

/// Value for an explicit Host header: host, plus the port when it is not the default.
pub(crate) fn host_header(url: &url::Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_agent_looks_like_a_browser() {
        let ua = default_user_agent();
        assert!(ua.starts_with("Mozilla/5.0 (Windows NT 10.0"));
        assert!(ua.contains("Firefox/126.0"));
        // product token after the browser part
        assert!(ua.split(' ').last().is_some_and(|t| t.contains('/')));
    }

    #[test]
    fn caller_user_agent_is_used_verbatim() {
        let headers = build_headers(&HeaderPlan {
            user_agent: Some("MyAgent/1.0"),
            ..Default::default()
        });
        assert_eq!(headers.get(USER_AGENT).unwrap(), "MyAgent/1.0");
    }

    #[test]
    fn blank_user_agent_falls_back_to_default() {
        let headers = build_headers(&HeaderPlan {
            user_agent: Some("   "),
            ..Default::default()
        });
        assert_eq!(
            headers.get(USER_AGENT).unwrap().to_str().unwrap(),
            default_user_agent()
        );
    }

    #[test]
    fn token_and_language_only_when_not_blank() {
        let headers = build_headers(&HeaderPlan {
            token: Some(" "),
            accept_language: Some(""),
            ..Default::default()
        });
        assert!(!headers.contains_key(AUTHORIZATION));
        assert!(!headers.contains_key(ACCEPT_LANGUAGE));

        let headers = build_headers(&HeaderPlan {
            token: Some("abc"),
            accept_language: Some("fr-FR"),
            ..Default::default()
        });
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        assert_eq!(headers.get(ACCEPT_LANGUAGE).unwrap(), "fr-FR");
    }

    #[test]
    fn extra_headers_are_appended_after_defaults() {
        let extra = vec![
            HeaderEntry::new("X-Requested-With", "XMLHttpRequest"),
            HeaderEntry::new("Accept", "text/plain"),
            HeaderEntry::new("bad header", "x"),
        ];
        let headers = build_headers(&HeaderPlan {
            accept: Some("*/*"),
            extra: &extra,
            ..Default::default()
        });
        assert_eq!(headers.get("x-requested-with").unwrap(), "XMLHttpRequest");
        let accepts: Vec<_> = headers.get_all(ACCEPT).iter().collect();
        assert_eq!(accepts, vec!["*/*", "text/plain"]);
        assert!(!headers.contains_key("bad header"));
    }

    #[test]
    fn origin_uses_scheme_and_host_segments() {
        assert_eq!(
            origin_of("https://www.example.com/account/login?x=1").as_deref(),
            Some("https://www.example.com")
        );
        assert_eq!(
            origin_of("http://127.0.0.1:8080/form").as_deref(),
            Some("http://127.0.0.1:8080")
        );
        assert_eq!(origin_of("not a url"), None);
    }

    #[test]
    fn host_header_keeps_explicit_port() {
        let url = url::Url::parse("http://127.0.0.1:8080/x").unwrap();
        assert_eq!(host_header(&url).as_deref(), Some("127.0.0.1:8080"));
        let url = url::Url::parse("https://howlongtobeat.com/api").unwrap();
        assert_eq!(host_header(&url).as_deref(), Some("howlongtobeat.com"));
    }
}
