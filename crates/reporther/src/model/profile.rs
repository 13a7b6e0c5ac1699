use serde::{Deserialize, Serialize};

/// The account profile of a signed-in caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
        }
    }
}

/// Access level the backend grants a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

impl UserRole {
    /// Whether the role may read and write its own records.
    pub fn is_registered(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::User)
    }
}
