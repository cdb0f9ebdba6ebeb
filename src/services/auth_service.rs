use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::auth_dto::{normalize_email, LoginRequest, RegisterRequest, TokenResponse};
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::utils::crypto::{hash_password, verify_against_dummy, verify_password};
use crate::utils::token::{issue_access_token, Claims};

const USER_COLUMNS: &str =
    "id, email, name, hashed_password, is_active, is_verified, created_at, updated_at";

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt_secret: String,
    token_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt_secret: String, token_ttl_minutes: i64) -> Self {
        Self {
            pool,
            jwt_secret,
            token_ttl_minutes,
        }
    }

    pub async fn register(&self, payload: RegisterRequest) -> Result<TokenResponse> {
        let email = normalize_email(&payload.email);

        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(Error::BadRequest(
                "An account with this email already exists.".into(),
            ));
        }

        let hashed = hash_password(&payload.password)?;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, name, hashed_password)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(payload.name.trim())
        .bind(hashed)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::BadRequest("An account with this email already exists.".into()))?;

        tracing::info!(user_id = %user.id, "user registered");
        let token = issue_access_token(user.id, &self.jwt_secret, self.token_ttl_minutes)?;
        Ok(TokenResponse::bearer(token, user))
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, payload: LoginRequest) -> Result<TokenResponse> {
        let invalid = || Error::Unauthorized("Invalid email or password.".into());
        let email = normalize_email(&payload.email);

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user) = user else {
            verify_against_dummy(&payload.password);
            return Err(invalid());
        };

        if !verify_password(&payload.password, &user.hashed_password)? {
            tracing::info!(user_id = %user.id, "login rejected: wrong password");
            return Err(invalid());
        }

        if !user.is_active {
            return Err(Error::Forbidden(
                "Your account has been disabled. Please contact support.".into(),
            ));
        }

        tracing::info!(user_id = %user.id, "user logged in");
        let token = issue_access_token(user.id, &self.jwt_secret, self.token_ttl_minutes)?;
        Ok(TokenResponse::bearer(token, user))
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found.".into()))
    }

    /// Revokes the presented token until it would have expired anyway.
    pub async fn logout(&self, claims: &Claims) -> Result<()> {
        let jti = claims.token_id()?;
        let user_id = claims.user_id()?;
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(claims.expires_at())
        .execute(&self.pool)
        .await?;
        tracing::info!(%user_id, "token revoked");
        Ok(())
    }

    pub async fn is_revoked(&self, jti: Uuid) -> Result<bool> {
        let found = sqlx::query_scalar::<_, Uuid>("SELECT jti FROM revoked_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn purge_expired_revocations(&self) -> Result<u64> {
        let done = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}
