use super::types::Cookie;
use crate::error::{FetchError, Result};
use reqwest::cookie::Jar;
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// Characters that may not appear in a cookie name (RFC 6265 token separators).
const NAME_SEPARATORS: &[char] = &[
    '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}', ' ',
    '\t',
];

/// Names allowed through for HowLongToBeat payload posts.
const HLTB_ALLOWED: &[&str] = &[
    "hltb_alive",
    "hltb_view_list",
    "hltb_online",
    "OTGPPConsent",
    "OptanonConsent",
    "usprivacy",
];

/// Normalize a cookie value exported by a browser so the transport accepts it.
///
/// A single pair of surrounding double quotes is removed, then characters
/// that are not legal in a cookie value are percent-encoded.
pub fn fix_cookie_value(value: &str) -> String {
    let trimmed = value.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(trimmed);

    let mut fixed = String::with_capacity(unquoted.len());
    for ch in unquoted.chars() {
        match ch {
            ',' => fixed.push_str("%2C"),
            ';' => fixed.push_str("%3B"),
            '"' => fixed.push_str("%22"),
            '\\' => fixed.push_str("%5C"),
            ' ' => fixed.push_str("%20"),
            c if c.is_control() => {}
            c => fixed.push(c),
        }
    }
    fixed
}

/// Strip the leading dot a browser stores on domain cookies.
pub fn cookie_host(domain: &str) -> &str {
    let domain = domain.trim();
    domain.strip_prefix('.').unwrap_or(domain)
}

/// Origin a render view should install the cookie on. Always https.
pub fn cookie_origin(cookie: &Cookie) -> String {
    format!("https://{}", cookie_host(&cookie.domain))
}

/// A cookie that passed validation, ready for a jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCookie {
    pub name: String,
    pub value: String,
    /// ASCII host, no leading dot.
    pub host: String,
    pub path: String,
}

impl ValidCookie {
    fn set_cookie_line(&self) -> String {
        format!(
            "{}={}; Domain={}; Path={}",
            self.name, self.value, self.host, self.path
        )
    }

    fn scope_url(&self) -> Result<Url> {
        Url::parse(&format!("https://{}{}", self.host, self.path))
            .map_err(|e| FetchError::malformed_cookie(&self.name, e.to_string()))
    }
}

/// Check one cookie and produce its transport form.
pub fn validate_cookie(cookie: &Cookie) -> Result<ValidCookie> {
    let name = cookie.name.trim();
    if name.is_empty() {
        return Err(FetchError::malformed_cookie(name, "empty name"));
    }
    if name
        .chars()
        .any(|c| c.is_control() || !c.is_ascii() || NAME_SEPARATORS.contains(&c))
    {
        return Err(FetchError::malformed_cookie(name, "illegal character in name"));
    }

    let value = fix_cookie_value(&cookie.value);
    if !value.is_ascii() {
        return Err(FetchError::malformed_cookie(name, "non-ascii value"));
    }

    let host = cookie_host(&cookie.domain);
    if host.is_empty() {
        return Err(FetchError::malformed_cookie(name, "empty domain"));
    }
    if host
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | ':' | '?' | '#' | '@' | '\\'))
        || host.starts_with('.')
        || host.ends_with('.')
        || host.contains("..")
    {
        return Err(FetchError::malformed_cookie(
            name,
            format!("malformed domain {:?}", cookie.domain),
        ));
    }
    let host = idna::domain_to_ascii(&host.to_ascii_lowercase()).map_err(|_| {
        FetchError::malformed_cookie(name, format!("malformed domain {:?}", cookie.domain))
    })?;

    let path = cookie.path.trim();
    let path = if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') && !path.contains(';') {
        path.to_string()
    } else {
        return Err(FetchError::malformed_cookie(
            name,
            format!("malformed path {:?}", cookie.path),
        ));
    };

    Ok(ValidCookie {
        name: name.to_string(),
        value,
        host,
        path,
    })
}

/// Domain-scoped allow-list: for a cookie whose domain contains one of the
/// fragments, only the listed names survive. Other domains pass through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookiePolicy {
    rules: Vec<CookieRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CookieRule {
    domain_fragment: String,
    allowed: Vec<String>,
}

impl CookiePolicy {
    /// A policy that keeps every cookie.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Table used by payload submissions.
    pub fn payload_default() -> Self {
        Self::allow_all().with_rule("howlongtobeat", HLTB_ALLOWED)
    }

    pub fn with_rule<S: AsRef<str>>(mut self, domain_fragment: &str, allowed: &[S]) -> Self {
        self.rules.push(CookieRule {
            domain_fragment: domain_fragment.to_ascii_lowercase(),
            allowed: allowed.iter().map(|s| s.as_ref().to_string()).collect(),
        });
        self
    }

    pub fn allows(&self, cookie: &Cookie) -> bool {
        let domain = cookie.domain.to_ascii_lowercase();
        self.rules
            .iter()
            .filter(|rule| domain.contains(&rule.domain_fragment))
            .all(|rule| {
                rule.allowed
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(&cookie.name))
            })
    }
}

/// A jar built for one request plus the cookies that went into it.
#[derive(Debug, Clone)]
pub struct CookieJar {
    pub jar: Arc<Jar>,
    pub accepted: Vec<ValidCookie>,
}

impl CookieJar {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Validate each cookie, apply the policy, and load survivors into a fresh jar.
///
/// Rejected cookies are logged and skipped; this never fails as a whole.
pub fn build_jar(cookies: &[Cookie], policy: &CookiePolicy) -> CookieJar {
    let jar = Jar::default();
    let mut accepted = Vec::with_capacity(cookies.len());

    for cookie in cookies {
        if !policy.allows(cookie) {
            continue;
        }
        let added = validate_cookie(cookie).and_then(|valid| {
            let url = valid.scope_url()?;
            jar.add_cookie_str(&valid.set_cookie_line(), &url);
            Ok(valid)
        });
        match added {
            Ok(valid) => accepted.push(valid),
            Err(e) => warn!("dropping cookie: {}", e),
        }
    }

    CookieJar {
        jar: Arc::new(jar),
        accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn cookie(name: &str, domain: &str) -> Cookie {
        Cookie::new(name, "v", domain, "/")
    }

    #[test]
    fn value_fixups() {
        assert_eq!(fix_cookie_value("\"quoted\""), "quoted");
        assert_eq!(fix_cookie_value("a,b;c d"), "a%2Cb%3Bc%20d");
        assert_eq!(fix_cookie_value("in\"ner\\x"), "in%22ner%5Cx");
        assert_eq!(fix_cookie_value("  plain=="), "plain==");
    }

    #[test]
    fn leading_dot_is_stripped() {
        assert_eq!(cookie_host(".example.com"), "example.com");
        assert_eq!(cookie_host("example.com"), "example.com");
        assert_eq!(
            cookie_origin(&cookie("a", ".store.example.com")),
            "https://store.example.com"
        );
    }

    #[test]
    fn rejects_empty_name_and_bad_domain() {
        let err = validate_cookie(&cookie("", "example.com")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedCookie);
        assert!(validate_cookie(&cookie("a", "")).is_err());
        assert!(validate_cookie(&cookie("a", "exa mple.com")).is_err());
        assert!(validate_cookie(&cookie("a", "http://example.com")).is_err());
        assert!(validate_cookie(&cookie("a", "..example.com")).is_err());
        assert!(validate_cookie(&cookie("a=b", "example.com")).is_err());
    }

    #[test]
    fn empty_path_defaults_to_root() {
        let valid = validate_cookie(&Cookie::new("a", "1", ".Example.com", "")).unwrap();
        assert_eq!(valid.path, "/");
        assert_eq!(valid.host, "example.com");
        assert!(validate_cookie(&Cookie::new("a", "1", "example.com", "relative")).is_err());
    }

    #[test]
    fn bad_cookies_do_not_abort_the_jar() {
        let cookies = vec![
            cookie("good", ".example.com"),
            cookie("", "example.com"),
            cookie("also_good", "example.com"),
            cookie("bad_domain", "exa mple.com"),
        ];
        let jar = build_jar(&cookies, &CookiePolicy::allow_all());
        let names: Vec<_> = jar.accepted.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["good", "also_good"]);
    }

    #[test]
    fn jar_sends_cookie_to_matching_host() {
        use reqwest::cookie::CookieStore;

        let jar = build_jar(
            &[Cookie::new("sid", "\"abc\"", ".example.com", "/")],
            &CookiePolicy::allow_all(),
        );
        let url = Url::parse("https://www.example.com/page").unwrap();
        let header = jar.jar.cookies(&url).expect("cookie header");
        assert_eq!(header.to_str().unwrap(), "sid=abc");
    }

    #[test]
    fn payload_policy_filters_hltb_cookies() {
        let policy = CookiePolicy::payload_default();
        assert!(policy.allows(&cookie("hltb_alive", ".howlongtobeat.com")));
        assert!(policy.allows(&cookie("OPTANONCONSENT", "howlongtobeat.com")));
        assert!(!policy.allows(&cookie("random_tracker", ".howlongtobeat.com")));
        assert!(policy.allows(&cookie("random_tracker", ".example.com")));

        let jar = build_jar(
            &[
                cookie("hltb_alive", ".howlongtobeat.com"),
                cookie("random_tracker", ".howlongtobeat.com"),
            ],
            &policy,
        );
        let names: Vec<_> = jar.accepted.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["hltb_alive"]);
    }

    #[test]
    fn custom_rules_stack() {
        let policy = CookiePolicy::allow_all().with_rule("example", &["session"]);
        assert!(policy.allows(&cookie("SESSION", "www.example.org")));
        assert!(!policy.allows(&cookie("ads", "www.example.org")));
    }
}
