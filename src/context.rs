//! Application context
//!
//! [`AppContext`] builds every service once at startup and hands out shared
//! handles. Nothing in the client is a global.

use anyhow::Context as _;
use api_client::{ApiClient, ApiRequest, ApiResponse, AuthService};
use app_state::{
    Authenticator, DemoAuthenticator, OnboardingStore, RemoteAuthenticator, SessionStore,
    ThemeResolver,
};
use app_ui::{GateHandle, Navigator, Route, RouteGate};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use storage::{KeyValueStore, KvStore, MemoryStore};

use crate::config::{AppConfig, AuthMode};

/// Root object owning the client's services
pub struct AppContext {
    config: AppConfig,
    store: Arc<dyn KeyValueStore>,
    api: ApiClient,
    theme: Arc<ThemeResolver>,
    session: Arc<SessionStore>,
    onboarding: Arc<OnboardingStore>,
    navigator: Navigator,
}

impl AppContext {
    /// Open the configured store and build the services over it
    pub async fn bootstrap(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn KeyValueStore> = match config.kv_config() {
            Some(kv) => {
                let path = kv.path.clone();
                let store = KvStore::new(kv)
                    .with_context(|| format!("failed to open key-value store at {}", path))?;
                tracing::info!(%path, "opened key-value store");
                Arc::new(store)
            }
            None => {
                tracing::info!("no data directory configured, state is kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        Self::with_store(store, config).await
    }

    /// Build the services over an existing store
    ///
    /// Loads the theme preference and the persisted session before
    /// returning.
    pub async fn with_store(
        store: Arc<dyn KeyValueStore>,
        config: AppConfig,
    ) -> anyhow::Result<Self> {
        let api = ApiClient::new(config.api.clone(), Arc::clone(&store))
            .context("failed to build HTTP client")?;

        let authenticator: Arc<dyn Authenticator> = match config.auth_mode {
            AuthMode::Demo => Arc::new(DemoAuthenticator::new()),
            AuthMode::Remote => Arc::new(RemoteAuthenticator::new(AuthService::new(api.clone()))),
        };

        let theme =
            ThemeResolver::load(Arc::clone(&store), config.device_scheme, config.theme).await;

        let session = SessionStore::new(Arc::clone(&store), authenticator);
        session.load().await;

        let onboarding = OnboardingStore::new(Arc::clone(&store));

        tracing::info!(
            auth_mode = ?config.auth_mode,
            theme = %theme.preference(),
            signed_in = session.is_signed_in(),
            "app context ready"
        );

        Ok(Self {
            config,
            store,
            api,
            theme: Arc::new(theme),
            session: Arc::new(session),
            onboarding: Arc::new(onboarding),
            navigator: Navigator::new(Route::Index),
        })
    }

    /// Configuration the context was built with
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared key-value store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// HTTP client
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Theme resolver
    pub fn theme(&self) -> &Arc<ThemeResolver> {
        &self.theme
    }

    /// Session store
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Onboarding flag
    pub fn onboarding(&self) -> &Arc<OnboardingStore> {
        &self.onboarding
    }

    /// Navigator
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Send an API request on behalf of the signed-in user
    ///
    /// A rejected token ends the session, so the route gate sends the user
    /// back to sign-in. The error is still returned to the caller.
    pub async fn request<T>(&self, request: ApiRequest) -> api_client::Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let result = self.api.send(request).await;
        if let Err(e) = &result {
            self.session.handle_api_error(e).await;
        }
        result
    }

    /// Start the route gate over this context's navigator
    ///
    /// The landing screen hands off to the auth screen first; the gate then
    /// moves signed-in users on from there.
    pub fn start_gate(&self) -> GateHandle {
        if self.navigator.current() == Route::Index {
            self.navigator.replace(Route::Auth);
        }

        RouteGate::new(Arc::clone(&self.session), Arc::clone(&self.onboarding))
            .spawn(self.navigator.clone())
    }

    /// Flush pending writes before the process exits
    pub async fn shutdown(&self) {
        self.theme.shutdown().await;
        tracing::info!("app context shut down");
    }
}
