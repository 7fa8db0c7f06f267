use super::client::{parse_http_url, Fetcher, RequestBody, RequestContext};
use super::cookies::build_jar;
use super::headers::{append_extra, build_headers, host_header, origin_of, HeaderPlan, PAYLOAD_ACCEPT};
use super::types::{Cookie, FetchOptions, FetchResult, HeaderEntry, StatusPolicy};
use super::utils::{log_failure, read_text};
use crate::error::{FetchError, Result};
use reqwest::header::{HeaderValue, ACCEPT, HOST, ORIGIN, REFERER};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

impl Fetcher {
    /// POST a JSON payload.
    ///
    /// Cookies are filtered through the fetcher's payload policy (see
    /// [`CookiePolicy::payload_default`](super::CookiePolicy::payload_default)); Host, User-Agent and Accept are
    /// set before `extra_headers`, and the response is decompressed.
    pub async fn post_payload(
        &self,
        url: &str,
        payload: &str,
        cookies: Option<&[Cookie]>,
        extra_headers: &[HeaderEntry],
    ) -> FetchResult<String> {
        let ctx = match self.payload_context(url, payload, cookies, extra_headers) {
            Ok(ctx) => ctx,
            Err(e) => return failed(e),
        };
        self.submit(ctx, StatusPolicy::AnySuccess).await
    }

    /// POST url-encoded form fields with Origin/Referer set to the target's origin.
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
        cookies: Option<&[Cookie]>,
    ) -> FetchResult<String> {
        let ctx = match self.form_context(url, fields, cookies) {
            Ok(ctx) => ctx,
            Err(e) => return failed(e),
        };
        self.submit(ctx, StatusPolicy::AnySuccess).await
    }

    /// POST an arbitrary body with the usual per-call options (agent, token, cookies).
    pub async fn post_content(
        &self,
        url: &str,
        body: impl Into<String>,
        content_type: &str,
        opts: &FetchOptions,
    ) -> FetchResult<String> {
        let ctx = match RequestContext::get(url, opts, &self.settings) {
            Ok(ctx) => ctx.into_post(RequestBody::Text {
                content: body.into(),
                content_type: content_type.to_string(),
            }),
            Err(e) => return failed(e),
        };
        self.submit(ctx, opts.status_policy).await
    }

    pub(crate) fn payload_context(
        &self,
        url: &str,
        payload: &str,
        cookies: Option<&[Cookie]>,
        extra_headers: &[HeaderEntry],
    ) -> Result<RequestContext> {
        let target = parse_http_url(url)?;

        let mut headers = build_headers(&HeaderPlan {
            user_agent: self.settings.user_agent.as_deref(),
            ..Default::default()
        });
        if let Some(host) = host_header(&target).and_then(|h| HeaderValue::from_str(&h).ok()) {
            headers.insert(HOST, host);
        }
        headers.insert(ACCEPT, HeaderValue::from_static(PAYLOAD_ACCEPT));
        append_extra(&mut headers, extra_headers);

        let jar = build_jar(cookies.unwrap_or_default(), &self.payload_policy);

        Ok(RequestContext {
            url: target,
            method: reqwest::Method::POST,
            headers,
            jar: Some(jar.jar),
            body: Some(RequestBody::Text {
                content: payload.to_string(),
                content_type: JSON_CONTENT_TYPE.to_string(),
            }),
            preflight_url: None,
            decompress: true,
            preserve_query: false,
            follow_redirects: true,
            lenient_headers: false,
        })
    }

    pub(crate) fn form_context(
        &self,
        url: &str,
        fields: &[(String, String)],
        cookies: Option<&[Cookie]>,
    ) -> Result<RequestContext> {
        let mut opts = FetchOptions::default();
        if let Some(cookies) = cookies {
            opts = opts.with_cookies(cookies.to_vec());
        }
        let mut ctx = RequestContext::get(url, &opts, &self.settings)?;

        let origin = origin_of(url)
            .and_then(|o| HeaderValue::from_str(&o).ok())
            .ok_or_else(|| FetchError::invalid_url(url))?;
        ctx.headers.insert(ORIGIN, origin.clone());
        ctx.headers.insert(REFERER, origin);

        Ok(ctx.into_post(RequestBody::Form(fields.to_vec())))
    }

    async fn submit(&self, ctx: RequestContext, policy: StatusPolicy) -> FetchResult<String> {
        let client = match ctx.client(&self.settings) {
            Ok(client) => client,
            Err(e) => return failed(e),
        };
        let response = match ctx.request(&client, &ctx.url).send().await {
            Ok(response) => response,
            Err(e) => return failed(FetchError::transport(ctx.url.as_str(), &e)),
        };

        let status = response.status();
        if !policy.accepts(status) {
            return failed(FetchError::Server {
                url: ctx.url.to_string(),
                status: status.as_u16(),
            });
        }
        let landed = response.url().clone();
        read_text(&landed, response).await
    }
}

fn failed<T>(err: FetchError) -> FetchResult<T> {
    log_failure(&err);
    FetchResult::Failure(err)
}
