use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{PasswordHasher, TokenService},
    db::UserStore,
    error::{AppError, AppResult},
    models::{normalize_username, Role, User, UserView},
};

/// Session token handed out on register/authenticate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
}

/// Registration, login and user administration
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<AuthToken> {
        let user = self.create_user(username, password, Role::User).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        self.token_for(&user)
    }

    /// Unknown usernames and wrong passwords fail identically
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<AuthToken> {
        let username = normalize_username(username);
        let user = self.users.find_by_username(username).await?;
        match user {
            Some(user) if self.hasher.verify(password, &user.password_hash) => {
                tracing::debug!(user_id = %user.id, "Authenticated");
                self.token_for(&user)
            }
            _ => {
                tracing::warn!(username = %username, "Authentication failed");
                Err(AppError::Unauthorized("Invalid username or password".to_string()))
            }
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<UserView> {
        Ok(UserView::from(&self.user_by_id(id).await?))
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<UserView> {
        let user = self
            .users
            .find_by_username(normalize_username(username))
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(UserView::from(&user))
    }

    pub async fn list_all(&self) -> AppResult<Vec<UserView>> {
        Ok(self
            .users
            .find_all()
            .await?
            .iter()
            .map(UserView::from)
            .collect())
    }

    pub async fn update_role(&self, id: Uuid, role: &str) -> AppResult<UserView> {
        let mut user = self.user_by_id(id).await?;
        user.role = role.parse()?;
        self.users.save(&user).await?;
        tracing::info!(user_id = %id, role = %user.role, "Updated role");
        Ok(UserView::from(&user))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.users.exists_by_id(id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        self.users.delete_by_id(id).await?;
        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }

    pub async fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let mut user = self.user_by_id(id).await?;

        if !self.hasher.verify(current_password, &user.password_hash) {
            return Err(AppError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }
        if new_password.is_empty() {
            return Err(AppError::InvalidInput(
                "New password must not be empty".to_string(),
            ));
        }

        user.password_hash = self.hasher.hash(new_password);
        self.users.save(&user).await?;
        tracing::info!(user_id = %id, "Password changed");
        Ok(())
    }

    /// Creates an admin account unless the username is already taken
    pub async fn ensure_admin(&self, username: &str, password: &str) -> AppResult<()> {
        let username = normalize_username(username);
        if self.users.find_by_username(username).await?.is_some() {
            tracing::debug!(username = %username, "Bootstrap admin already present");
            return Ok(());
        }
        let user = self.create_user(username, password, Role::Admin).await?;
        tracing::info!(user_id = %user.id, username = %username, "Created bootstrap admin");
        Ok(())
    }

    async fn create_user(&self, username: &str, password: &str, role: Role) -> AppResult<User> {
        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(
                "Username and password are required".to_string(),
            ));
        }
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AppError::Conflict("Username is taken".to_string()));
        }

        let mut user = User::new(username.to_string(), self.hasher.hash(password));
        user.role = role;
        self.users.save(&user).await?;
        Ok(user)
    }

    async fn user_by_id(&self, id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    fn token_for(&self, user: &User) -> AppResult<AuthToken> {
        let token = self.tokens.issue(&user.username, user.id, &[user.role])?;
        Ok(AuthToken { token })
    }
}
