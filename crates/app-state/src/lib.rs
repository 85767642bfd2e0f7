//! Application state for the LMS client
//!
//! This crate owns the state services behind the app's screens: theme
//! resolution, the signed-in session and the onboarding flag. Each service
//! persists through the [`storage::KeyValueStore`] seam and exposes tokio
//! channels for observers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod onboarding;
pub mod session;
pub mod theme;
pub mod timer;

pub use auth::{AuthError, Authenticator, Credentials, DemoAuthenticator, RemoteAuthenticator};
pub use onboarding::OnboardingStore;
pub use session::{SessionSnapshot, SessionStore, UserSession};
pub use theme::{
    EffectiveScheme, ThemeChange, ThemeConfig, ThemeError, ThemeEvent, ThemePreference,
    ThemeResolver,
};
