//! # User Profile Repository
//!
//! Dashboard users. Emails are stored lowercase and compared without case.
//! Password hashing happens in the API layer; this repository only stores
//! the finished hash.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use stockline_core::{new_id, Role, UserInput, UserProfile, UserUpdate};

use crate::error::{with_duplicate_value, DbError, DbResult};

const USER_COLUMNS: &str =
    "id, email, full_name, role, is_active, password_hash, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserProfileRepository {
    pool: SqlitePool,
}

impl UserProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserProfileRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<UserProfile>> {
        debug!("Listing users");
        let sql = format!(
            "SELECT {} FROM user_profiles ORDER BY full_name COLLATE NOCASE",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, UserProfile>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn get(&self, id: &str) -> DbResult<UserProfile> {
        let sql = format!("SELECT {} FROM user_profiles WHERE id = ?1", USER_COLUMNS);
        sqlx::query_as::<_, UserProfile>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<UserProfile>> {
        let sql = format!("SELECT {} FROM user_profiles WHERE email = ?1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, UserProfile>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Inserts a user with an already computed password hash.
    pub async fn insert(&self, input: &UserInput, password_hash: String) -> DbResult<UserProfile> {
        let user = UserProfile::from_input(new_id(), input, password_hash, Utc::now())?;

        info!(id = %user.id, role = user.role.as_str(), "Creating user");

        sqlx::query(
            r#"
            INSERT INTO user_profiles (
                id, email, full_name, role, is_active, password_hash, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(user.is_active)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_duplicate_value(e.into(), "email", &user.email))?;

        Ok(user)
    }

    /// Applies a role / active / name edit.
    pub async fn update(&self, id: &str, update: &UserUpdate) -> DbResult<UserProfile> {
        let mut user = self.get(id).await?;
        user.apply_update(update, Utc::now())?;

        info!(id = %id, role = user.role.as_str(), active = user.is_active, "Updating user");

        sqlx::query(
            "UPDATE user_profiles SET full_name = ?2, role = ?3, is_active = ?4, updated_at = ?5 \
             WHERE id = ?1",
        )
        .bind(&user.id)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn count(&self) -> DbResult<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM user_profiles")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Whether an active super admin exists.
    pub async fn has_super_admin(&self) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_profiles WHERE role = ?1 AND is_active = 1",
        )
        .bind(Role::SuperAdmin)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }
}
