use super::client::{Fetcher, RequestContext};
use super::redirect::{is_redirect, preserve_query, resolve_location};
use super::types::{FetchOptions, FetchResult, Page, StatusPolicy};
use super::utils::{is_header_parse_failure, log_failure, read_text};
use crate::error::{FetchError, Result};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::LOCATION;
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::pin::Pin;
use tracing::{debug, warn};
use url::Url;

/// Response body as a stream of chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A response that passed the status policy, plus where it came from.
pub(crate) struct Landed {
    pub response: Response,
    pub url: Url,
    pub hops: usize,
}

impl Fetcher {
    /// Redirect-aware GET returning the body and where it ended up.
    pub async fn get_page(&self, url: &str, opts: &FetchOptions) -> FetchResult<Page> {
        let landed = match self.land(url, opts).await {
            Ok(landed) => landed,
            Err(e) => return failed(e),
        };
        let status = landed.response.status().as_u16();
        let Landed { response, url, hops } = landed;
        read_text(&url, response).await.map(|body| Page {
            final_url: url,
            hops,
            status,
            body,
        })
    }

    /// Body text of a GET. See [`FetchOptions`] for redirects, cookies and decompression.
    pub async fn get_string(&self, url: &str, opts: &FetchOptions) -> FetchResult<String> {
        self.get_page(url, opts).await.map(|page| page.body)
    }

    /// GET with `Accept: */*` (unless overridden) and deserialize the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: &FetchOptions,
    ) -> FetchResult<T> {
        let opts = if opts.accept.is_none() {
            opts.clone().with_accept("*/*")
        } else {
            opts.clone()
        };
        match self.get_page(url, &opts).await {
            FetchResult::Success(page) => match serde_json::from_str(&page.body) {
                Ok(value) => FetchResult::Success(value),
                Err(e) => failed(FetchError::Decode {
                    url: page.final_url.to_string(),
                    detail: e.to_string(),
                }),
            },
            FetchResult::Empty => FetchResult::Empty,
            FetchResult::Failure(e) => FetchResult::Failure(e),
        }
    }

    /// Whole binary body.
    pub async fn get_bytes(&self, url: &str, opts: &FetchOptions) -> FetchResult<Bytes> {
        let landed = match self.land(url, opts).await {
            Ok(landed) => landed,
            Err(e) => return failed(e),
        };
        match landed.response.bytes().await {
            Ok(bytes) if bytes.is_empty() => FetchResult::Empty,
            Ok(bytes) => FetchResult::Success(bytes),
            Err(e) => failed(FetchError::transport(landed.url.as_str(), &e)),
        }
    }

    /// Body as a chunk stream; the caller drives the read.
    pub async fn get_stream(&self, url: &str, opts: &FetchOptions) -> FetchResult<ByteStream> {
        let landed = match self.land(url, opts).await {
            Ok(landed) => landed,
            Err(e) => return failed(e),
        };
        if landed.response.content_length() == Some(0) {
            return FetchResult::Empty;
        }
        let source = landed.url.to_string();
        let stream = landed
            .response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| FetchError::transport(&source, &e)));
        FetchResult::Success(Box::pin(stream))
    }

    /// Cheap reachability check for an image URL: exactly 200, nothing else.
    pub async fn probe_image(&self, url: &str) -> bool {
        if !url.to_ascii_lowercase().contains("http") {
            return false;
        }
        let opts = FetchOptions::default().with_status_policy(StatusPolicy::ExactOk);
        self.land(url, &opts).await.map_err(|e| log_failure(&e)).is_ok()
    }

    /// Build the context, prime, chase redirects, apply the status policy.
    pub(crate) async fn land(&self, url: &str, opts: &FetchOptions) -> Result<Landed> {
        let mut ctx = RequestContext::get(url, opts, &self.settings)?;
        let landed = self.chase(&mut ctx).await?;

        let status = landed.response.status();
        if !opts.status_policy.accepts(status) {
            return Err(FetchError::Server {
                url: landed.url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(landed)
    }

    async fn chase(&self, ctx: &mut RequestContext) -> Result<Landed> {
        let mut client = ctx.client(&self.settings)?;
        self.prime(ctx, &client).await;

        let start = ctx.url.clone();
        let mut current = ctx.url.clone();
        let mut hops = 0usize;
        let mut retried = false;

        loop {
            let response = match ctx.request(&client, &current).send().await {
                Ok(response) => response,
                Err(e) if !retried && is_header_parse_failure(&e) => {
                    warn!(
                        "unparseable response headers from {}, retrying with alternate user agent",
                        current
                    );
                    retried = true;
                    ctx.use_alternate_agent();
                    client = ctx.client(&self.settings)?;
                    continue;
                }
                Err(e) => return Err(FetchError::transport(current.as_str(), &e)),
            };

            let status = response.status();
            if !is_redirect(status, &current, response.url()) {
                return Ok(Landed {
                    response,
                    url: current,
                    hops,
                });
            }

            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let mut target = match location {
                Some(location) => resolve_location(&current, &location)?,
                None if status.is_redirection() => {
                    return Err(FetchError::Server {
                        url: current.to_string(),
                        status: status.as_u16(),
                    });
                }
                None => response.url().clone(),
            };
            if ctx.preserve_query {
                let kept = preserve_query(current.as_str(), target.as_str());
                target = Url::parse(&kept).map_err(|_| FetchError::invalid_url(&kept))?;
            }

            hops += 1;
            if hops > self.settings.max_redirects {
                return Err(FetchError::RedirectLoopExceeded {
                    url: start.to_string(),
                    limit: self.settings.max_redirects,
                });
            }
            debug!("{} {} redirecting to {}", status.as_u16(), current, target);
            current = target;
        }
    }

    /// Throwaway GET to the preflight URL. Failures are logged, never returned.
    async fn prime(&self, ctx: &RequestContext, client: &reqwest::Client) {
        let Some(preflight) = &ctx.preflight_url else {
            return;
        };
        match ctx.preflight_request(client, preflight).send().await {
            Ok(response) => {
                debug!("pre-request to {} returned {}", preflight, response.status());
            }
            Err(e) => warn!("pre-request to {} failed: {}", preflight, e),
        }
    }
}

fn failed<T>(err: FetchError) -> FetchResult<T> {
    log_failure(&err);
    FetchResult::Failure(err)
}
