//! API endpoint paths
//!
//! Paths are relative to the versioned base URL configured on the client.

use std::fmt::Display;

/// Authentication endpoints
pub mod auth {
    /// Sign in with email and password
    pub const LOGIN: &str = "/auth/login";
    /// Create an account
    pub const REGISTER: &str = "/auth/register";
    /// Request a password reset mail
    pub const FORGOT_PASSWORD: &str = "/auth/forgot-password";
    /// Set a new password with a reset token
    pub const RESET_PASSWORD: &str = "/auth/reset-password";
    /// Confirm an email address
    pub const VERIFY_EMAIL: &str = "/auth/verify-email";
    /// Exchange a refresh token
    pub const REFRESH_TOKEN: &str = "/auth/refresh-token";
    /// Invalidate the current token
    pub const LOGOUT: &str = "/auth/logout";
}

/// User profile endpoints
pub mod user {
    /// Read the signed-in profile
    pub const PROFILE: &str = "/user/profile";
    /// Update the signed-in profile
    pub const UPDATE_PROFILE: &str = "/user/profile";
    /// Change password
    pub const CHANGE_PASSWORD: &str = "/user/change-password";
}

/// Course endpoints
pub mod course {
    use super::Display;

    /// Course catalogue
    pub const LIST: &str = "/courses";

    /// A single course
    pub fn detail(id: impl Display) -> String {
        format!("/courses/{}", id)
    }

    /// Enroll the signed-in user in a course
    pub fn enroll(id: impl Display) -> String {
        format!("/courses/{}/enroll", id)
    }
}

/// Lesson endpoints
pub mod lesson {
    use super::Display;

    /// Lessons of a course
    pub fn list(course_id: impl Display) -> String {
        format!("/courses/{}/lessons", course_id)
    }

    /// A single lesson
    pub fn detail(course_id: impl Display, lesson_id: impl Display) -> String {
        format!("/courses/{}/lessons/{}", course_id, lesson_id)
    }

    /// Mark a lesson complete
    pub fn complete(course_id: impl Display, lesson_id: impl Display) -> String {
        format!("/courses/{}/lessons/{}/complete", course_id, lesson_id)
    }
}
