//! Theme preference resolution and persistence
//!
//! The [`ThemeResolver`] owns the user's theme preference (`light`, `dark`
//! or `system`), resolves it against the device's reported scheme into the
//! [`EffectiveScheme`] the UI renders with, and persists the preference.
//!
//! Two independent timers shape its behavior:
//! - a throttle window (700ms) gating *acceptance* of new preferences and
//!   device scheme changes, and
//! - a persistence debounce (500ms) gating *when* accepted preferences
//!   reach the store.
//!
//! A device scheme report dropped by the throttle is still recorded; the
//! effective scheme catches up with it one throttle window later.
//!
//! Teardown: [`ThemeResolver::shutdown`] flushes a pending write. Dropping
//! the resolver without calling it cancels the pending write.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use storage::{keys, KeyValueStore};
use thiserror::Error;
use tokio::sync::{broadcast, watch};

use crate::timer::{Debouncer, Throttle};

/// Theme-related errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    /// Value is not one of `light`, `dark`, `system`
    #[error("Invalid theme value: {0:?}")]
    InvalidThemeValue(String),
}

// =============================================================================
// Preference and Scheme
// =============================================================================

/// Theme preference chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    /// Always light
    Light,
    /// Always dark
    Dark,
    /// Follow the device
    #[default]
    System,
}

impl ThemePreference {
    /// Persisted form of the preference
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    /// Resolve to the scheme the UI should render with
    ///
    /// An unavailable device scheme resolves to light.
    pub fn resolve(&self, device: Option<EffectiveScheme>) -> EffectiveScheme {
        match self {
            ThemePreference::Light => EffectiveScheme::Light,
            ThemePreference::Dark => EffectiveScheme::Dark,
            ThemePreference::System => device.unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThemePreference {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" => Ok(ThemePreference::System),
            _ => Err(ThemeError::InvalidThemeValue(s.to_string())),
        }
    }
}

/// Concrete scheme applied to the UI; never `system`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveScheme {
    /// Light scheme
    #[default]
    Light,
    /// Dark scheme
    Dark,
}

impl EffectiveScheme {
    /// Scheme name
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectiveScheme::Light => "light",
            EffectiveScheme::Dark => "dark",
        }
    }

    /// Check if this is the dark scheme
    pub fn is_dark(&self) -> bool {
        matches!(self, EffectiveScheme::Dark)
    }

    /// The other scheme
    pub fn opposite(&self) -> Self {
        match self {
            EffectiveScheme::Light => EffectiveScheme::Dark,
            EffectiveScheme::Dark => EffectiveScheme::Light,
        }
    }
}

impl std::fmt::Display for EffectiveScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Configuration, Outcomes and Events
// =============================================================================

/// Timer configuration for the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeConfig {
    /// Minimum time between two accepted changes
    pub throttle_window: Duration,
    /// Quiet time before an accepted preference is written
    pub persist_debounce: Duration,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            throttle_window: Duration::from_millis(700),
            persist_debounce: Duration::from_millis(500),
        }
    }
}

impl ThemeConfig {
    /// Set the throttle window
    pub fn with_throttle_window(mut self, window: Duration) -> Self {
        self.throttle_window = window;
        self
    }

    /// Set the persistence debounce
    pub fn with_persist_debounce(mut self, delay: Duration) -> Self {
        self.persist_debounce = delay;
        self
    }
}

/// Outcome of a change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeChange {
    /// The change was applied
    Applied,
    /// Nothing to do; the state already matched
    Unchanged,
    /// Dropped because the throttle window is still open
    Throttled,
    /// Dropped because the value was invalid
    Rejected,
}

impl ThemeChange {
    /// Whether state changed
    pub fn is_applied(&self) -> bool {
        matches!(self, ThemeChange::Applied)
    }
}

/// Events broadcast by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeEvent {
    /// Visual transition hint; fired on every applied change
    Transition {
        /// Scheme before the change
        from: EffectiveScheme,
        /// Scheme after the change
        to: EffectiveScheme,
    },
    /// The stored preference changed
    PreferenceChanged(ThemePreference),
}

// =============================================================================
// Resolver
// =============================================================================

#[derive(Debug)]
struct ThemeInner {
    preference: ThemePreference,
    device_scheme: Option<EffectiveScheme>,
    scheme: EffectiveScheme,
}

/// State shared with the catch-up timer
struct ThemeShared {
    inner: Mutex<ThemeInner>,
    scheme_tx: watch::Sender<EffectiveScheme>,
    events_tx: broadcast::Sender<ThemeEvent>,
}

impl ThemeShared {
    fn publish(&self, from: EffectiveScheme, to: EffectiveScheme) {
        self.scheme_tx.send_if_modified(|current| {
            if *current != to {
                *current = to;
                true
            } else {
                false
            }
        });
        let _ = self.events_tx.send(ThemeEvent::Transition { from, to });
    }

    /// Bring the effective scheme in line with the recorded inputs
    fn reconcile(&self) -> bool {
        let mut inner = self.inner.lock();
        let next = inner.preference.resolve(inner.device_scheme);
        if next == inner.scheme {
            return false;
        }

        let from = inner.scheme;
        inner.scheme = next;
        self.publish(from, next);

        tracing::info!(scheme = %next, "caught up with device scheme");
        true
    }
}

/// Owner of the theme preference and the effective scheme
///
/// # Example
///
/// ```no_run
/// use app_state::theme::{EffectiveScheme, ThemeConfig, ThemePreference, ThemeResolver};
/// use std::sync::Arc;
/// use storage::MemoryStore;
///
/// #[tokio::main]
/// async fn main() {
///     let store = Arc::new(MemoryStore::new());
///     let resolver =
///         ThemeResolver::load(store, Some(EffectiveScheme::Dark), ThemeConfig::default()).await;
///
///     assert_eq!(resolver.effective_scheme(), EffectiveScheme::Dark);
///
///     resolver.set_preference(ThemePreference::Light);
///     assert_eq!(resolver.effective_scheme(), EffectiveScheme::Light);
///
///     resolver.shutdown().await;
/// }
/// ```
pub struct ThemeResolver {
    shared: Arc<ThemeShared>,
    throttle: Throttle,
    persist: Debouncer<ThemePreference>,
    catch_up: Debouncer<()>,
}

impl ThemeResolver {
    /// Build a resolver from the persisted preference
    ///
    /// Missing, invalid or unreadable values fall back to `system`.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        device_scheme: Option<EffectiveScheme>,
        config: ThemeConfig,
    ) -> Self {
        let preference = match store.get(keys::THEME).await {
            Ok(Some(raw)) => match raw.parse::<ThemePreference>() {
                Ok(preference) => preference,
                Err(e) => {
                    tracing::warn!("Ignoring stored theme preference: {}", e);
                    ThemePreference::default()
                }
            },
            Ok(None) => ThemePreference::default(),
            Err(e) => {
                tracing::error!("Failed to load theme preference: {}", e);
                ThemePreference::default()
            }
        };

        Self::new(store, preference, device_scheme, config)
    }

    /// Build a resolver with a known preference
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        preference: ThemePreference,
        device_scheme: Option<EffectiveScheme>,
        config: ThemeConfig,
    ) -> Self {
        let scheme = preference.resolve(device_scheme);

        let persist = Debouncer::new(config.persist_debounce, move |preference: ThemePreference| {
            let store = Arc::clone(&store);
            async move {
                match store.set(keys::THEME, preference.as_str()).await {
                    Ok(()) => tracing::debug!(%preference, "saved theme preference"),
                    Err(e) => tracing::error!("Failed to save theme preference: {}", e),
                }
            }
        });

        let (scheme_tx, _) = watch::channel(scheme);
        let (events_tx, _) = broadcast::channel(16);
        let shared = Arc::new(ThemeShared {
            inner: Mutex::new(ThemeInner { preference, device_scheme, scheme }),
            scheme_tx,
            events_tx,
        });

        let catch_up = Debouncer::new(config.throttle_window, {
            let shared = Arc::clone(&shared);
            move |()| {
                shared.reconcile();
                async {}
            }
        });

        Self { shared, throttle: Throttle::new(config.throttle_window), persist, catch_up }
    }

    /// Current preference
    pub fn preference(&self) -> ThemePreference {
        self.shared.inner.lock().preference
    }

    /// Scheme the UI should render with
    pub fn effective_scheme(&self) -> EffectiveScheme {
        self.shared.inner.lock().scheme
    }

    /// Last scheme reported by the device
    pub fn device_scheme(&self) -> Option<EffectiveScheme> {
        self.shared.inner.lock().device_scheme
    }

    /// Check if the effective scheme is dark
    pub fn is_dark(&self) -> bool {
        self.effective_scheme().is_dark()
    }

    /// Change the preference
    ///
    /// The new scheme is visible to the next read. The write to the store is
    /// debounced.
    pub fn set_preference(&self, preference: ThemePreference) -> ThemeChange {
        {
            let mut inner = self.shared.inner.lock();

            if inner.preference == preference {
                return ThemeChange::Unchanged;
            }

            if !self.throttle.try_acquire() {
                tracing::debug!(%preference, "Throttling theme change - too soon");
                return ThemeChange::Throttled;
            }

            let from = inner.scheme;
            inner.preference = preference;
            inner.scheme = preference.resolve(inner.device_scheme);
            self.shared.publish(from, inner.scheme);
            let _ = self.shared.events_tx.send(ThemeEvent::PreferenceChanged(preference));

            tracing::info!(%preference, scheme = %inner.scheme, "theme preference changed");
        }

        self.persist.schedule(preference);
        ThemeChange::Applied
    }

    /// Change the preference from its string form
    ///
    /// Invalid values are logged and ignored.
    pub fn set_preference_str(&self, value: &str) -> ThemeChange {
        match value.parse::<ThemePreference>() {
            Ok(preference) => self.set_preference(preference),
            Err(e) => {
                tracing::error!("{}", e);
                ThemeChange::Rejected
            }
        }
    }

    /// Flip between explicit light and dark
    ///
    /// Always lands on an explicit choice, never `system`.
    pub fn toggle(&self) -> ThemeChange {
        if self.throttle.is_throttled() {
            tracing::debug!("Ignoring theme toggle while a change is in progress");
            return ThemeChange::Throttled;
        }

        let target = if self.effective_scheme().is_dark() {
            ThemePreference::Light
        } else {
            ThemePreference::Dark
        };

        self.set_preference(target)
    }

    /// Record a new scheme reported by the device
    ///
    /// The report is always recorded. With an explicit preference nothing
    /// else happens. Under `system` a report that changes the effective
    /// scheme is subject to the throttle; when throttled, the effective
    /// scheme catches up one throttle window later.
    pub fn set_device_scheme(&self, reported: Option<EffectiveScheme>) -> ThemeChange {
        {
            let mut inner = self.shared.inner.lock();

            if inner.device_scheme == reported {
                return ThemeChange::Unchanged;
            }
            inner.device_scheme = reported;

            let next = inner.preference.resolve(reported);
            if inner.preference != ThemePreference::System || next == inner.scheme {
                return ThemeChange::Unchanged;
            }

            if self.throttle.try_acquire() {
                let from = inner.scheme;
                inner.scheme = next;
                self.shared.publish(from, next);

                tracing::info!(scheme = %next, "device scheme changed");
                return ThemeChange::Applied;
            }

            tracing::debug!(scheme = %next, "Deferring device scheme change inside throttle window");
        }

        self.catch_up.schedule(());
        ThemeChange::Throttled
    }

    /// Subscribe to effective scheme changes
    pub fn subscribe(&self) -> watch::Receiver<EffectiveScheme> {
        self.shared.scheme_tx.subscribe()
    }

    /// Subscribe to transition and preference events
    pub fn subscribe_events(&self) -> broadcast::Receiver<ThemeEvent> {
        self.shared.events_tx.subscribe()
    }

    /// Whether a preference write is waiting for its debounce
    pub fn has_pending_write(&self) -> bool {
        self.persist.is_pending()
    }

    /// Write any pending preference now
    pub async fn shutdown(&self) {
        if self.persist.flush().await {
            tracing::debug!("flushed pending theme preference on shutdown");
        }
    }
}
