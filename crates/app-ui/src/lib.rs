//! Navigation layer for the LMS client
//!
//! This crate turns the state services of `app-state` into screen flow:
//!
//! - [`navigation`] - Typed routes, path matching and the navigation stack
//! - [`gate`] - Redirects driven by session and onboarding state
//!
//! # Example
//!
//! ```rust
//! use app_ui::gate::{decide, GateInput, GateState};
//! use app_ui::navigation::{Route, RouteSegment, Router};
//!
//! let route = Router::new().match_path("/(modules)/courses");
//! assert_eq!(route, Route::Courses);
//!
//! let decision = decide(&GateInput {
//!     is_loading: false,
//!     signed_in: false,
//!     onboarding_completed: false,
//!     segment: route.segment(),
//! });
//! assert_eq!(decision.state, GateState::NeedsAuth);
//! assert_eq!(decision.redirect, Some(Route::Auth));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod gate;
pub mod navigation;

pub use gate::{decide, GateDecision, GateHandle, GateInput, GateState, RouteGate};
pub use navigation::{
    NavigationAnimation, NavigationStack, Navigator, Route, RouteSegment, Router, StackEntry,
};
