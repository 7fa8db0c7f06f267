//! Shared runtime for synchronous callers (the CLI, hosts without tokio).

use once_cell::sync::OnceCell;
use std::future::Future;
use tokio::runtime::{Builder, Runtime};

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

fn runtime() -> std::io::Result<&'static Runtime> {
    RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .enable_all()
            .thread_name("plugin-web")
            .build()
    })
}

/// Run a future to completion on the shared runtime.
///
/// Must not be called from inside an async context.
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    Ok(runtime()?.block_on(future))
}
