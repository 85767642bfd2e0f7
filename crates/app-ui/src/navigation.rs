//! Navigation for the LMS client
//!
//! This module provides:
//! - Typed route definitions and path matching
//! - A navigation stack that is never empty
//! - A shared [`Navigator`] handle with change notification
//! - Transition animations per route

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

// =============================================================================
// Route Definitions
// =============================================================================

/// All screens of the application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "route", content = "path")]
pub enum Route {
    /// Landing screen shown while the app starts
    #[default]
    Index,
    /// Sign-in screen
    Auth,
    /// First-run onboarding
    Onboarding,

    // Main area tabs
    /// Home tab
    Home,
    /// Course catalogue tab
    Courses,
    /// Profile tab, third in the tab bar
    ///
    /// The tab is declared in the main-area layout even though the shipped
    /// app has no profile screen yet; the router still resolves its path.
    Profile,
    /// Notifications tab
    Notifications,
    /// More tab
    More,

    /// Unmatched path
    NotFound(String),
}

/// First path segment of a route, as seen by the route gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSegment {
    /// Authentication screens
    Auth,
    /// Onboarding screens
    Onboarding,
    /// Main app area
    Modules,
    /// Anything else
    Other,
}

impl Route {
    /// Get the URL path for this route
    pub fn to_path(&self) -> String {
        match self {
            Route::Index => "/".to_string(),
            Route::Auth => "/auth".to_string(),
            Route::Onboarding => "/onboarding".to_string(),
            Route::Home => "/modules/home".to_string(),
            Route::Courses => "/modules/courses".to_string(),
            Route::Profile => "/modules/profile".to_string(),
            Route::Notifications => "/modules/notifications".to_string(),
            Route::More => "/modules/more".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    /// Group this route belongs to
    pub fn segment(&self) -> RouteSegment {
        match self {
            Route::Auth => RouteSegment::Auth,
            Route::Onboarding => RouteSegment::Onboarding,
            Route::Home | Route::Courses | Route::Profile | Route::Notifications | Route::More => {
                RouteSegment::Modules
            }
            Route::Index | Route::NotFound(_) => RouteSegment::Other,
        }
    }

    /// Check if this route requires a signed-in user
    pub fn requires_auth(&self) -> bool {
        matches!(self.segment(), RouteSegment::Modules | RouteSegment::Onboarding)
    }

    /// Get the display title for this route
    pub fn title(&self) -> &'static str {
        match self {
            Route::Index => "FPT Software LMS",
            Route::Auth => "Sign In",
            Route::Onboarding => "Welcome",
            Route::Home => "Home",
            Route::Courses => "Courses",
            Route::Profile => "Profile",
            Route::Notifications => "Notifications",
            Route::More => "More",
            Route::NotFound(_) => "Not Found",
        }
    }

    /// Transition used when this route is shown
    pub fn animation(&self) -> NavigationAnimation {
        match self {
            Route::Onboarding => NavigationAnimation::SlideFromRight,
            Route::NotFound(_) => NavigationAnimation::Default,
            _ => NavigationAnimation::Fade,
        }
    }

    /// Tabs of the main area, in display order
    pub fn tabs() -> [Route; 5] {
        [Route::Home, Route::Courses, Route::Profile, Route::Notifications, Route::More]
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_path())
    }
}

/// Animation type for navigation transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NavigationAnimation {
    /// Platform default
    #[default]
    Default,
    /// Cross-fade
    Fade,
    /// Slide in from the right
    SlideFromRight,
    /// Instant
    None,
}

// =============================================================================
// Router
// =============================================================================

/// Parses URL paths into routes
#[derive(Debug, Clone, Copy, Default)]
pub struct Router;

impl Router {
    /// Create a router
    pub fn new() -> Self {
        Self
    }

    /// Match a path to a route
    ///
    /// The main area is reachable as `/modules/...`, through the group form
    /// `/(modules)/...` and by its bare tab path. Query strings and trailing
    /// `index` segments are ignored.
    pub fn match_path(&self, path: &str) -> Route {
        let pathname = path.split(['?', '#']).next().unwrap_or_default();

        let mut segments: Vec<&str> = pathname
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| if s == "(modules)" { "modules" } else { s })
            .collect();
        if segments.last() == Some(&"index") {
            segments.pop();
        }

        match segments.as_slice() {
            [] => Route::Index,
            ["auth"] => Route::Auth,
            ["onboarding"] => Route::Onboarding,
            ["modules"] => Route::Home,
            ["modules", tab] | [tab] => Self::tab(tab).unwrap_or_else(|| Self::not_found(pathname)),
            _ => Self::not_found(pathname),
        }
    }

    fn tab(name: &str) -> Option<Route> {
        match name {
            "home" => Some(Route::Home),
            "courses" => Some(Route::Courses),
            "profile" => Some(Route::Profile),
            "notifications" => Some(Route::Notifications),
            "more" => Some(Route::More),
            _ => None,
        }
    }

    fn not_found(pathname: &str) -> Route {
        Route::NotFound(pathname.to_string())
    }
}

// =============================================================================
// Navigation Stack
// =============================================================================

/// A navigation stack entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    /// The route
    pub route: Route,
    /// Unique key for this entry
    pub key: String,
}

impl StackEntry {
    /// Create a new stack entry
    pub fn new(route: Route) -> Self {
        Self { route, key: uuid::Uuid::new_v4().to_string() }
    }
}

/// Stack of visited routes; the root entry is always present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStack {
    root: StackEntry,
    above: Vec<StackEntry>,
}

impl NavigationStack {
    /// Create a stack with a root route
    pub fn new(root: Route) -> Self {
        Self { root: StackEntry::new(root), above: Vec::new() }
    }

    /// Push a route onto the stack
    pub fn push(&mut self, route: Route) {
        self.above.push(StackEntry::new(route));
    }

    /// Pop the top route (returns true if popped, false if at root)
    pub fn pop(&mut self) -> bool {
        self.above.pop().is_some()
    }

    /// Replace the top route
    pub fn replace(&mut self, route: Route) {
        let entry = StackEntry::new(route);
        match self.above.last_mut() {
            Some(top) => *top = entry,
            None => self.root = entry,
        }
    }

    /// Reset to a single root route
    pub fn reset(&mut self, route: Route) {
        self.root = StackEntry::new(route);
        self.above.clear();
    }

    /// Get the current (top) route
    pub fn current(&self) -> &Route {
        &self.current_entry().route
    }

    /// Get the current stack entry
    pub fn current_entry(&self) -> &StackEntry {
        self.above.last().unwrap_or(&self.root)
    }

    /// Check if we can go back
    pub fn can_go_back(&self) -> bool {
        !self.above.is_empty()
    }

    /// Get stack depth
    pub fn depth(&self) -> usize {
        self.above.len() + 1
    }

    /// Iterate entries from bottom to top
    pub fn entries(&self) -> impl Iterator<Item = &StackEntry> {
        std::iter::once(&self.root).chain(self.above.iter())
    }
}

impl Default for NavigationStack {
    fn default() -> Self {
        Self::new(Route::Index)
    }
}

// =============================================================================
// Navigator
// =============================================================================

/// Shared navigation handle
///
/// Clones operate on the same stack. Subscribers see the current route after
/// every change.
#[derive(Clone)]
pub struct Navigator {
    stack: Arc<Mutex<NavigationStack>>,
    tx: Arc<watch::Sender<Route>>,
}

impl Navigator {
    /// Create a navigator starting at `root`
    pub fn new(root: Route) -> Self {
        let (tx, _) = watch::channel(root.clone());
        Self { stack: Arc::new(Mutex::new(NavigationStack::new(root))), tx: Arc::new(tx) }
    }

    /// Push a route
    pub fn navigate(&self, route: Route) {
        tracing::debug!(%route, "navigate");
        self.apply(|stack| stack.push(route));
    }

    /// Replace the current route without adding history
    pub fn replace(&self, route: Route) {
        tracing::debug!(%route, "replace");
        self.apply(|stack| stack.replace(route));
    }

    /// Go back one entry (returns false at the root)
    pub fn go_back(&self) -> bool {
        let mut popped = false;
        self.apply(|stack| popped = stack.pop());
        popped
    }

    /// Reset history to a single route
    pub fn reset(&self, route: Route) {
        self.apply(|stack| stack.reset(route));
    }

    /// Current route
    pub fn current(&self) -> Route {
        self.stack.lock().current().clone()
    }

    /// Segment of the current route
    pub fn segment(&self) -> RouteSegment {
        self.stack.lock().current().segment()
    }

    /// Number of entries in the history
    pub fn depth(&self) -> usize {
        self.stack.lock().depth()
    }

    /// Copy of the current stack
    pub fn stack(&self) -> NavigationStack {
        self.stack.lock().clone()
    }

    /// Subscribe to current-route changes
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }

    fn apply(&self, f: impl FnOnce(&mut NavigationStack)) {
        let mut stack = self.stack.lock();
        f(&mut stack);
        let current = stack.current().clone();
        self.tx.send_if_modified(|route| {
            if *route != current {
                *route = current;
                true
            } else {
                false
            }
        });
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Index)
    }
}

// =============================================================================
// Tests
// =============================================================================
