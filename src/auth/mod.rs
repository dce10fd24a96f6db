use uuid::Uuid;

pub mod guard;
pub mod password;
pub mod token;

pub use guard::{AccessControl, Gate};
pub use password::{PasswordHasher, SaltedSha256};
pub use token::{Claims, TokenService};

/// Authenticated identity attached to a request after token verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub username: String,
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.sub,
        }
    }
}
