use crate::error::{FetchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env prefix for overrides, e.g. `PLUGIN_WEB__TIMEOUT_SECS=10`.
const ENV_PREFIX: &str = "PLUGIN_WEB";

/// Transport settings shared by every call a [`Fetcher`](crate::Fetcher) makes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FetchSettings {
    /// Deadline for one request, connect through body read.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Redirect hops followed before giving up.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Replaces the built-in browser user agent when the caller supplies none.
    #[serde(default)]
    pub user_agent: Option<String>,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_redirects() -> usize {
    10
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_redirects: default_max_redirects(),
            user_agent: None,
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl FetchSettings {
    /// Default location: `<config dir>/plugin-web/plugin-web.toml`.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "plugin-web")
            .map(|dirs| dirs.config_dir().join("plugin-web.toml"))
    }

    /// Load from an optional TOML file plus environment overrides.
    ///
    /// A missing file is fine; a file that does not parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        let file = path.map(Path::to_path_buf).or_else(Self::default_path);
        if let Some(file) = file {
            builder = builder.add_source(
                config::File::from(file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        let cfg = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| FetchError::InvalidInput(format!("settings: {e}")))?;

        let settings: FetchSettings = cfg
            .try_deserialize()
            .map_err(|e| FetchError::InvalidInput(format!("settings: {e}")))?;
        settings.validated()
    }

    fn validated(self) -> Result<Self> {
        if self.timeout_secs == 0 {
            return Err(FetchError::InvalidInput(
                "settings: timeout_secs must be at least 1".into(),
            ));
        }
        Ok(self)
    }
}
