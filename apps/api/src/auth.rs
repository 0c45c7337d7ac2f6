//! JWT authentication and password hashing.
//!
//! ## Request Flow
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! AuthUser extractor
//!   ├── decode + verify signature / expiry ──► 401 on failure
//!   ├── load user profile by `sub`          ──► 401 if missing / inactive
//!   └── AuthUser { id, email, role }         (role read fresh from the DB)
//!        │
//!        ▼
//! handler: user.require(Permission::ManageInventory)? ──► 403 on failure
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use stockline_core::{Permission, Role, UserInput, UserProfile, UserUpdate};
use stockline_db::Database;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    /// Role at the time the token was issued
    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, access_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &UserProfile) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage (argon2id, random salt).
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller of a route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        self.role.require(permission).map_err(ApiError::from)
    }

    /// Whether this user may create or edit a user holding `role`.
    pub fn require_manage(&self, role: Role) -> Result<(), ApiError> {
        self.require(Permission::ManageUsers)?;
        if self.role.can_manage(role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Role {} cannot manage {} users",
                self.role.as_str(),
                role.as_str()
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let claims = state.jwt.validate_token(token)?;
        let user = state
            .db
            .users()
            .get(&claims.sub)
            .await
            .map_err(|_| ApiError::unauthorized("Unknown user"))?;
        if !user.is_active {
            return Err(ApiError::unauthorized("User is deactivated"));
        }

        debug!(user_id = %user.id, role = user.role.as_str(), "Authenticated request");
        Ok(AuthUser {
            id: user.id,
            email: user.email,
            role: user.role,
        })
    }
}

// =============================================================================
// Bootstrap
// =============================================================================

/// Makes sure the configured super admin exists and is active.
///
/// Does nothing when no bootstrap credentials are configured or an active
/// super admin already exists.
pub async fn bootstrap_super_admin(
    db: &Database,
    config: &ApiConfig,
) -> Result<Option<UserProfile>, ApiError> {
    let (Some(email), Some(password)) = (
        config.bootstrap_admin_email.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) else {
        return Ok(None);
    };

    let users = db.users();
    if users.has_super_admin().await? {
        return Ok(None);
    }

    if let Some(existing) = users.get_by_email(email).await? {
        warn!(email = %existing.email, "Promoting existing user to super admin");
        let promoted = users
            .update(
                &existing.id,
                &UserUpdate {
                    full_name: None,
                    role: Some(Role::SuperAdmin),
                    is_active: Some(true),
                },
            )
            .await?;
        return Ok(Some(promoted));
    }

    let input = UserInput {
        email: email.to_string(),
        full_name: "Super Admin".to_string(),
        role: Role::SuperAdmin,
        password: password.to_string(),
    };
    input.validate()?;
    let user = users.insert(&input, hash_password(password)?).await?;
    info!(email = %user.email, "Bootstrapped super admin");
    Ok(Some(user))
}
