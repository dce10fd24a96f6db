use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{PersonalWatchlist, Rating, SharedWatchlist, User},
};

use super::{RatingStore, SharedWatchlistStore, UserStore, WatchlistStore};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the bundled schema migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Document store on PostgreSQL; one JSONB row per aggregate
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps unique-key violations to `Conflict`, everything else to `Database`
fn map_write_error(error: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            return AppError::Conflict(format!("{} already exists", what));
        }
    }
    AppError::Database(error)
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row: Option<(Json<User>,)> = sqlx::query_as("SELECT doc FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(Json(user),)| user))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row: Option<(Json<User>,)> =
            sqlx::query_as("SELECT doc FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(user),)| user))
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let rows: Vec<(Json<User>,)> =
            sqlx::query_as("SELECT doc FROM users ORDER BY username")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(Json(user),)| user).collect())
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO users (id, username, doc) VALUES ($1, $2, $3) \
             ON CONFLICT (id) DO UPDATE SET username = EXCLUDED.username, doc = EXCLUDED.doc",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(Json(user))
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Username"))?;
        Ok(())
    }

    async fn exists_by_id(&self, id: Uuid) -> AppResult<bool> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RatingStore for PgStore {
    async fn find_by_user_and_title(
        &self,
        user_id: Uuid,
        title_id: &str,
    ) -> AppResult<Option<Rating>> {
        let row: Option<(Json<Rating>,)> =
            sqlx::query_as("SELECT doc FROM ratings WHERE user_id = $1 AND title_id = $2")
                .bind(user_id)
                .bind(title_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(rating),)| rating))
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        let rows: Vec<(Json<Rating>,)> = sqlx::query_as(
            "SELECT doc FROM ratings WHERE user_id = $1 ORDER BY last_updated DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(Json(rating),)| rating).collect())
    }

    async fn save(&self, rating: &Rating) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO ratings (id, user_id, title_id, last_updated, doc) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET last_updated = EXCLUDED.last_updated, doc = EXCLUDED.doc",
        )
        .bind(rating.id)
        .bind(rating.user_id)
        .bind(&rating.title_id)
        .bind(rating.last_updated)
        .bind(Json(rating))
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Rating"))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl WatchlistStore for PgStore {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<PersonalWatchlist>> {
        let row: Option<(Json<PersonalWatchlist>,)> =
            sqlx::query_as("SELECT doc FROM watchlists WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(watchlist),)| watchlist))
    }

    async fn save(&self, watchlist: &PersonalWatchlist) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO watchlists (id, user_id, doc) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(watchlist.id)
        .bind(watchlist.user_id)
        .bind(Json(watchlist))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SharedWatchlistStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SharedWatchlist>> {
        let row: Option<(Json<SharedWatchlist>,)> =
            sqlx::query_as("SELECT doc FROM shared_watchlists WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(watchlist),)| watchlist))
    }

    async fn find_by_member(&self, user_id: Uuid) -> AppResult<Vec<SharedWatchlist>> {
        let rows: Vec<(Json<SharedWatchlist>,)> = sqlx::query_as(
            "SELECT doc FROM shared_watchlists \
             WHERE doc -> 'member_ids' @> jsonb_build_array($1::text)",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(Json(watchlist),)| watchlist).collect())
    }

    async fn save(&self, watchlist: &SharedWatchlist) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO shared_watchlists (id, doc) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(watchlist.id)
        .bind(Json(watchlist))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM shared_watchlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
