//! CLI for the fetch tool.

use super::{Cookie, FetchOptions, FetchResult, Fetcher, HeaderEntry, UserAgentKind};
use anyhow::{bail, Context};
use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum FetchCommand {
    /// GET a URL and print the body
    Get(GetArgs),
    /// GET a URL and pretty-print its JSON body
    Json(GetArgs),
    /// POST a JSON payload
    Post(PostArgs),
    /// POST url-encoded form fields (key=value)
    Form(FormArgs),
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Cookie as name=value@domain (repeatable)
    #[arg(long = "cookie", value_name = "NAME=VALUE@DOMAIN")]
    pub cookies: Vec<String>,

    /// Extra header as Key: Value (repeatable)
    #[arg(short = 'H', long = "header", value_name = "KEY: VALUE")]
    pub headers: Vec<String>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// URL to fetch
    pub url: String,

    #[command(flatten)]
    pub request: RequestArgs,

    /// User agent to send instead of the default browser string
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Use the `request` user agent and accept only HTTP 200
    #[arg(long, conflicts_with = "user_agent")]
    pub request_agent: bool,

    /// Bearer token
    #[arg(long)]
    pub token: Option<String>,

    /// Accept-Language value
    #[arg(long)]
    pub lang: Option<String>,

    /// URL to visit before the real request
    #[arg(long)]
    pub preflight: Option<String>,

    /// Keep the query string across redirects
    #[arg(long)]
    pub keep_query: bool,

    /// Accept gzip/deflate encoded responses
    #[arg(long)]
    pub gzip: bool,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    pub url: String,

    /// JSON payload
    #[arg(long)]
    pub payload: String,

    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Args, Debug)]
pub struct FormArgs {
    pub url: String,

    /// Form field as key=value (repeatable)
    #[arg(short, long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    #[command(flatten)]
    pub request: RequestArgs,
}

pub async fn run(fetcher: &Fetcher, command: FetchCommand) -> anyhow::Result<()> {
    match command {
        FetchCommand::Get(args) => {
            let opts = get_options(&args)?;
            let page = fetcher.get_page(&args.url, &opts).await;
            if let FetchResult::Success(page) = &page {
                eprintln!(
                    "✓ {} after {} redirect(s) from {}",
                    page.status, page.hops, page.final_url
                );
            }
            finish(page.map(|p| p.body))
        }
        FetchCommand::Json(args) => {
            let opts = get_options(&args)?;
            let value = fetcher.get_json::<serde_json::Value>(&args.url, &opts).await;
            finish(value.map(|v| serde_json::to_string_pretty(&v).unwrap_or_default()))
        }
        FetchCommand::Post(args) => {
            let cookies = parse_cookies(&args.request.cookies)?;
            let headers = parse_headers(&args.request.headers)?;
            let body = fetcher
                .post_payload(&args.url, &args.payload, Some(cookies.as_slice()), &headers)
                .await;
            finish(body)
        }
        FetchCommand::Form(args) => {
            let cookies = parse_cookies(&args.request.cookies)?;
            let fields = args
                .fields
                .iter()
                .map(|f| {
                    f.split_once('=')
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .with_context(|| format!("field {f:?} is not key=value"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            finish(fetcher.post_form(&args.url, &fields, Some(cookies.as_slice())).await)
        }
    }
}

fn get_options(args: &GetArgs) -> anyhow::Result<FetchOptions> {
    let mut opts = FetchOptions {
        extra_headers: parse_headers(&args.request.headers)?,
        token: args.token.clone(),
        accept_language: args.lang.clone(),
        preflight_url: args.preflight.clone(),
        preserve_query_on_redirect: args.keep_query,
        decompress: args.gzip,
        ..FetchOptions::default()
    };
    if !args.request.cookies.is_empty() {
        opts.cookies = Some(parse_cookies(&args.request.cookies)?);
    }
    if let Some(ua) = &args.user_agent {
        opts = opts.with_user_agent(ua);
    } else if args.request_agent {
        opts = opts.with_user_agent_kind(UserAgentKind::Request);
    }
    Ok(opts)
}

/// `name=value@domain`, optionally followed by a path: `name=value@domain/path`.
pub fn parse_cookie(raw: &str) -> anyhow::Result<Cookie> {
    let (pair, scope) = raw
        .rsplit_once('@')
        .with_context(|| format!("cookie {raw:?} is missing @domain"))?;
    let (name, value) = pair
        .split_once('=')
        .with_context(|| format!("cookie {raw:?} is not name=value"))?;
    let (domain, path) = match scope.find('/') {
        Some(idx) => scope.split_at(idx),
        None => (scope, "/"),
    };
    Ok(Cookie::new(name, value, domain, path))
}

fn parse_cookies(raw: &[String]) -> anyhow::Result<Vec<Cookie>> {
    raw.iter().map(|c| parse_cookie(c)).collect()
}

pub fn parse_header(raw: &str) -> anyhow::Result<HeaderEntry> {
    let Some((key, value)) = raw.split_once(':') else {
        bail!("header {raw:?} is not Key: Value");
    };
    Ok(HeaderEntry::new(key.trim(), value.trim()))
}

fn parse_headers(raw: &[String]) -> anyhow::Result<Vec<HeaderEntry>> {
    raw.iter().map(|h| parse_header(h)).collect()
}

fn finish(result: FetchResult<String>) -> anyhow::Result<()> {
    match result {
        FetchResult::Success(body) => {
            println!("{}", body);
            Ok(())
        }
        FetchResult::Empty => {
            eprintln!("(empty response)");
            Ok(())
        }
        FetchResult::Failure(e) => bail!("{:?}: {}", e.kind(), e),
    }
}
