mod client;
mod cookies;
mod get;
mod headers;
mod post;
mod redirect;
mod tests;
mod utils;

pub mod cli;
pub mod types;

pub use client::{is_http_url, Fetcher};
pub use cookies::{
    build_jar, cookie_host, cookie_origin, fix_cookie_value, validate_cookie, CookieJar,
    CookiePolicy, ValidCookie,
};
pub use get::ByteStream;
pub use headers::{default_user_agent, set_host_identity, ALTERNATE_USER_AGENT};
pub use redirect::{preserve_query, resolve_location};
pub use types::*;

/// Fetch a URL as text with default settings, chasing redirects manually.
///
/// Non-2xx answers, transport errors and redirect loops come back as
/// [`FetchResult::Failure`]; nothing panics or propagates.
///
/// # Examples
/// ```no_run
/// use plugin_web::tools::fetch::{get_string, FetchOptions, FetchResult};
///
/// # async fn example() {
/// match get_string("https://example.com", &FetchOptions::default()).await {
///     FetchResult::Success(html) => println!("{} bytes", html.len()),
///     FetchResult::Empty => println!("nothing there"),
///     FetchResult::Failure(e) => println!("{:?}: {}", e.kind(), e),
/// }
/// # }
/// ```
pub async fn get_string(url: &str, opts: &FetchOptions) -> FetchResult<String> {
    Fetcher::default().get_string(url, opts).await
}

/// Fetch and deserialize JSON with default settings.
///
/// # Examples
/// ```no_run
/// use plugin_web::tools::fetch::{get_json, FetchOptions};
///
/// # async fn example() {
/// let value: Option<serde_json::Value> =
///     get_json("https://example.com/api.json", &FetchOptions::default()).await.ok();
/// # }
/// ```
pub async fn get_json<T: serde::de::DeserializeOwned>(
    url: &str,
    opts: &FetchOptions,
) -> FetchResult<T> {
    Fetcher::default().get_json(url, opts).await
}

/// Fetch raw bytes with default settings.
pub async fn get_bytes(url: &str, opts: &FetchOptions) -> FetchResult<bytes::Bytes> {
    Fetcher::default().get_bytes(url, opts).await
}

/// Post a JSON payload with default settings and the default cookie allow-list.
///
/// # Examples
/// ```no_run
/// use plugin_web::tools::fetch::{post_payload, Cookie};
///
/// # async fn example() {
/// let cookies = vec![Cookie::new("hltb_alive", "1", ".howlongtobeat.com", "/")];
/// let body = post_payload(
///     "https://howlongtobeat.com/api/search",
///     r#"{"searchTerms":["portal"]}"#,
///     Some(cookies.as_slice()),
///     &[],
/// )
/// .await
/// .unwrap_or_default();
/// # }
/// ```
pub async fn post_payload(
    url: &str,
    payload: &str,
    cookies: Option<&[Cookie]>,
    extra_headers: &[HeaderEntry],
) -> FetchResult<String> {
    Fetcher::default()
        .post_payload(url, payload, cookies, extra_headers)
        .await
}

/// Post form fields with default settings.
pub async fn post_form(
    url: &str,
    fields: &[(String, String)],
    cookies: Option<&[Cookie]>,
) -> FetchResult<String> {
    Fetcher::default().post_form(url, fields, cookies).await
}
