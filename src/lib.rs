pub mod api;
pub mod capability;
pub mod config;
pub mod messages;
pub mod models;
pub mod navigation;
pub mod notify;
pub mod query_cache;
pub mod session; // Login / logout ordering, cache eviction
pub mod tab_storage;

use tracing_subscriber::EnvFilter;

pub use session::{ProviderState, SessionError, SessionManager, SessionManagerBuilder};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `config::default_log_filter()`.
/// Calling it twice is harmless.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}
