//! Icon acquisition: cached image -> 64x64 png under the plugin's cache folder.

pub mod types;

pub use types::*;

use crate::error::FetchError;
use crate::tools::fetch::is_http_url;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use url::Url;

pub const ICON_SIZE: u32 = 64;

/// CDN hosts whose resize failures are routine and not worth an error log.
pub const NOISY_HOSTS: [&str; 1] = ["steamcdn-a.akamaihd.net"];

/// `cache_root/<namespace lowercased>/<file_name>`, without the `.png` the resizer adds.
pub fn icon_destination(cache_root: &Path, plugin_namespace: &str, image_file_name: &str) -> PathBuf {
    cache_root
        .join(plugin_namespace.to_lowercase())
        .join(image_file_name)
}

/// Resize the cached copy of `url` into the plugin's icon folder.
///
/// Never fetches: a missing cache entry is [`IconOutcome::CacheMiss`]. A
/// zero-byte result is removed so callers can treat "no file" as "no icon".
pub async fn acquire_icon(
    cache: &dyn WebFileCache,
    resizer: &dyn ImageResizer,
    image_file_name: &str,
    url: &str,
    cache_root: &Path,
    plugin_namespace: &str,
) -> IconOutcome {
    if !is_http_url(url) {
        debug!("not an http url, skipping icon: {}", url);
        return IconOutcome::Rejected;
    }

    let Some(source) = cache.cached_file(url).await else {
        debug!("{}", FetchError::CacheMiss(url.to_string()));
        return IconOutcome::CacheMiss;
    };

    let destination = icon_destination(cache_root, plugin_namespace, image_file_name);
    if let Err(e) = resize_into(resizer, &source, &destination).await {
        if is_noisy(url, &e) {
            debug!("icon resize failed for {}: {}", url, e);
        } else {
            error!("icon resize failed for {}: {}", url, e);
        }
        return IconOutcome::Failed;
    }

    match remove_empty_icon(&destination).await {
        Ok(true) => IconOutcome::DeletedEmpty,
        Ok(false) => IconOutcome::Resized,
        Err(e) => {
            error!("could not clean up icon {}: {}", destination.display(), e);
            IconOutcome::Failed
        }
    }
}

async fn resize_into(
    resizer: &dyn ImageResizer,
    source: &Path,
    destination: &Path,
) -> crate::Result<()> {
    if let Some(dir) = destination.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    resizer
        .resize(source, ICON_SIZE, ICON_SIZE, destination)
        .await
}

fn is_noisy(url: &str, err: &FetchError) -> bool {
    let noisy_host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| NOISY_HOSTS.contains(&host.as_str()));
    noisy_host || err.is_forbidden()
}

/// Delete `<destination>.png` when it exists with zero bytes.
///
/// Returns whether a file was removed.
pub async fn remove_empty_icon(destination: &Path) -> io::Result<bool> {
    let mut png = destination.as_os_str().to_owned();
    png.push(".png");
    let png = PathBuf::from(png);

    let meta = match tokio::fs::metadata(&png).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("resizer left no file at {}", png.display());
            return Ok(false);
        }
        Err(e) => return Err(e),
    };
    if meta.is_file() && meta.len() == 0 {
        tokio::fs::remove_file(&png).await?;
        debug!("removed empty icon {}", png.display());
        return Ok(true);
    }
    Ok(false)
}
