//! Page text for JavaScript-dependent pages, via a host-provided offscreen view.


use crate::error::{FetchError, Result};
use crate::tools::fetch::{cookie_origin, default_user_agent, Cookie, FetchResult};
use async_trait::async_trait;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSettings {
    pub javascript_enabled: bool,
    pub user_agent: String,
}

#[async_trait]
pub trait ViewFactory: Send + Sync {
    async fn create_view(&self, settings: ViewSettings) -> Result<Box<dyn PageView>>;
}

/// One offscreen view. Dropped (released) after a single page is read.
#[async_trait]
pub trait PageView: Send {
    fn set_cookie(&mut self, origin: &str, cookie: &Cookie);
    async fn navigate_and_wait(&mut self, url: &str) -> Result<()>;
    async fn page_text(&mut self) -> Result<String>;
}

/// Render `url` with JavaScript enabled and return the visible page text.
///
/// Cookies are installed on `https://<domain>` (leading dot stripped) before
/// navigation. A blank `user_agent` falls back to the default one.
pub async fn render_page_text(
    factory: &dyn ViewFactory,
    url: &str,
    cookies: Option<&[Cookie]>,
    user_agent: Option<&str>,
) -> FetchResult<String> {
    let settings = ViewSettings {
        javascript_enabled: true,
        user_agent: user_agent
            .filter(|ua| !ua.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_user_agent),
    };

    match render(factory, url, cookies.unwrap_or_default(), settings).await {
        Ok(text) if text.is_empty() => FetchResult::Empty,
        Ok(text) => FetchResult::Success(text),
        Err(e) => {
            error!("render of {} failed: {}", url, e);
            FetchResult::Failure(e)
        }
    }
}

async fn render(
    factory: &dyn ViewFactory,
    url: &str,
    cookies: &[Cookie],
    settings: ViewSettings,
) -> Result<String> {
    let mut view = factory.create_view(settings).await.map_err(|e| as_transport(url, e))?;
    for cookie in cookies {
        view.set_cookie(&cookie_origin(cookie), cookie);
    }
    debug!("rendering {} with {} cookie(s)", url, cookies.len());
    view.navigate_and_wait(url).await.map_err(|e| as_transport(url, e))?;
    view.page_text().await.map_err(|e| as_transport(url, e))
}

fn as_transport(url: &str, err: FetchError) -> FetchError {
    match err {
        FetchError::Transport { .. } => err,
        other => FetchError::Transport {
            url: url.to_string(),
            detail: other.to_string(),
        },
    }
}
