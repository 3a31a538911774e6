//! User domain model.

use uuid::Uuid;

/// Stable identifier for users.
pub type UserId = Uuid;

/// Account acting on proposals.
///
/// Authentication happens outside core; callers hand in the signed-in user
/// (or `None` for anonymous visitors).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub fullname: String,
    pub email: String,
    /// Administrators bypass ownership checks.
    pub admin: bool,
    /// Required before submitting when user profiles are enabled.
    pub complete_profile: bool,
}

impl User {
    /// Creates an ordinary user with a complete profile.
    pub fn new(fullname: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            fullname: fullname.into(),
            email: email.into(),
            admin: false,
            complete_profile: true,
        }
    }

    /// Creates an administrator.
    pub fn admin(fullname: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            admin: true,
            ..Self::new(fullname, email)
        }
    }
}

/// Returns whether the optional viewer is an administrator.
pub fn is_admin(viewer: Option<&User>) -> bool {
    viewer.is_some_and(|user| user.admin)
}
