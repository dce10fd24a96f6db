use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use uuid::Uuid;

use crate::error::AppError;

/// Account role; gates administrative operations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(AppError::InvalidInput(format!("Invalid role: {}", s))),
        }
    }
}

/// Identity record as held by the user store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    /// Ids of shared watchlists this user is a member of
    #[serde(default)]
    pub shared_watchlists: Vec<Uuid>,
    pub joined: NaiveDate,
}

/// Canonical form of a username for storage and every lookup
pub fn normalize_username(raw: &str) -> &str {
    raw.trim()
}

impl User {
    /// Creates a regular user who joined today
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            role: Role::User,
            shared_watchlists: Vec::new(),
            joined: Utc::now().date_naive(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_member_of(&self, watchlist_id: &Uuid) -> bool {
        self.shared_watchlists.contains(watchlist_id)
    }

    /// Records membership; returns false if already recorded
    pub fn join_watchlist(&mut self, watchlist_id: Uuid) -> bool {
        if self.is_member_of(&watchlist_id) {
            return false;
        }
        self.shared_watchlists.push(watchlist_id);
        true
    }

    /// Drops membership; returns false if it was not recorded
    pub fn leave_watchlist(&mut self, watchlist_id: &Uuid) -> bool {
        let before = self.shared_watchlists.len();
        self.shared_watchlists.retain(|id| id != watchlist_id);
        before != self.shared_watchlists.len()
    }
}

/// User projection returned to clients (no credential hash)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub shared_watchlists: Vec<Uuid>,
    pub joined: NaiveDate,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            shared_watchlists: user.shared_watchlists.clone(),
            joined: user.joined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_username_trims_padding() {
        assert_eq!(normalize_username("  alice \t"), "alice");
        assert_eq!(normalize_username("alice"), "alice");
    }

    #[test]
    fn test_role_parse_case_insensitive() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert!(matches!(
            "superuser".parse::<Role>(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!(Role::User.to_string(), "USER");
    }

    #[test]
    fn test_join_and_leave_watchlist() {
        let mut user = User::new("alice".to_string(), "hash".to_string());
        let watchlist_id = Uuid::new_v4();

        assert!(user.join_watchlist(watchlist_id));
        assert!(!user.join_watchlist(watchlist_id));
        assert_eq!(user.shared_watchlists.len(), 1);

        assert!(user.leave_watchlist(&watchlist_id));
        assert!(!user.leave_watchlist(&watchlist_id));
        assert!(user.shared_watchlists.is_empty());
    }

    #[test]
    fn test_view_hides_password_hash() {
        let user = User::new("bob".to_string(), "secret-hash".to_string());
        let json = serde_json::to_string(&UserView::from(&user)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("bob"));
    }
}
