//! Persistent store keys
//!
//! Every value the client persists lives under one of these keys. They are
//! part of the on-device format and must stay stable across releases.

/// Theme preference: `light`, `dark` or `system`
pub const THEME: &str = "@theme";

/// Signed-in user record as JSON
pub const USER: &str = "@user";

/// Onboarding marker; only the exact value [`ONBOARDING_COMPLETED_VALUE`] counts
pub const ONBOARDING_COMPLETED: &str = "@onboarding_completed";

/// Value written under [`ONBOARDING_COMPLETED`] once onboarding finishes
pub const ONBOARDING_COMPLETED_VALUE: &str = "true";

/// Bearer token holder used by the HTTP client: `{token, user:{id,email}}`
pub const AUTH_DATA: &str = "auth_data";

/// All keys owned by the client
pub const ALL: [&str; 4] = [THEME, USER, ONBOARDING_COMPLETED, AUTH_DATA];
