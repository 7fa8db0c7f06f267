#![doc = include_str!("../README.md")]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod tools;

pub use config::FetchSettings;
pub use error::{ErrorKind, FetchError, Result};
pub use tools::fetch::{Cookie, FetchOptions, FetchResult, Fetcher, HeaderEntry};
pub use tools::image::{acquire_icon, IconOutcome};
pub use tools::render::render_page_text;
