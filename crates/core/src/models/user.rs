//! The signed-in dashboard user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, UserId};

/// The authenticated user. Authentication itself happens at the hosted
/// store; the dashboard only remembers who is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to greet the user with: full name if set, else the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.email.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut user = User {
            id: UserId::generate(),
            email: Email::parse("owner@kennel.dk").unwrap(),
            full_name: Some("  ".to_string()),
            avatar_url: None,
            created_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "owner@kennel.dk");

        user.full_name = Some("Karen Holm".to_string());
        assert_eq!(user.display_name(), "Karen Holm");
    }
}
