//! Access control gates
//!
//! Each gate is a pure precondition: it reads the caller's stored user record,
//! then either lets the wrapped operation run unchanged or fails with
//! `Forbidden` before anything has been written. Roles and memberships are
//! always resolved from the user store, never from token claims.

use std::{future::Future, sync::Arc};

use uuid::Uuid;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
};

use super::Caller;

/// Precondition protecting an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Caller's stored role must be ADMIN
    Admin,
    /// Caller's membership list must contain the watchlist id
    WatchlistMember(Uuid),
}

/// Evaluates gates against the user store
#[derive(Clone)]
pub struct AccessControl {
    users: Arc<dyn UserStore>,
}

impl AccessControl {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn check(&self, caller: &Caller, gate: Gate) -> AppResult<()> {
        let user = self.users.find_by_id(caller.user_id).await?;

        let allowed = match (&user, gate) {
            (Some(user), Gate::Admin) => user.is_admin(),
            (Some(user), Gate::WatchlistMember(watchlist_id)) => user.is_member_of(&watchlist_id),
            (None, _) => false,
        };

        if allowed {
            return Ok(());
        }

        tracing::warn!(
            user_id = %caller.user_id,
            username = %caller.username,
            gate = ?gate,
            "Access denied"
        );

        Err(match gate {
            Gate::Admin => AppError::Forbidden("Admin access required".to_string()),
            Gate::WatchlistMember(_) => {
                AppError::Forbidden("No access to this watchlist".to_string())
            }
        })
    }

    /// Runs `operation` only if `gate` admits the caller
    pub async fn guarded<F, Fut, T>(&self, caller: &Caller, gate: Gate, operation: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        self.check(caller, gate).await?;
        operation().await
    }
}
