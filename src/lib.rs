//! LMS client core
//!
//! Wires the workspace crates into one application:
//!
//! - `storage` - Durable key-value store
//! - `api-client` - REST client with bearer-token handling
//! - `app-state` - Theme, session and onboarding services
//! - `app-ui` - Navigation and the route gate
//!
//! # Example
//!
//! ```no_run
//! use lms_client::{AppConfig, AppContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     lms_client::init_tracing()?;
//!
//!     let context = AppContext::bootstrap(AppConfig::from_env()).await?;
//!     let _gate = context.start_gate();
//!
//!     context.session().sign_in("user@fpt.com", "password").await?;
//!     context.shutdown().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;

pub use config::{AppConfig, AuthMode};
pub use context::AppContext;

pub use api_client;
pub use app_state;
pub use app_ui;
pub use storage;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "lms_client=info,app_state=info,app_ui=info";

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`]. Fails if a
/// subscriber is already installed.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
