//! PostgreSQL Identity Store

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entity::user::{NewUser, User};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email, login::Login, user_id::UserId, user_password::UserPassword,
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = r#"
    id,
    login,
    email,
    password_hash,
    role,
    email_verified,
    external_id,
    full_name,
    avatar,
    rating,
    created_at,
    updated_at
"#;

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, filter: &str, value: &str) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {filter} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }
}

impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> AuthResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (
                login,
                email,
                password_hash,
                role,
                email_verified,
                external_id,
                full_name,
                avatar
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.login.as_str())
            .bind(user.email.as_str())
            .bind(user.password_hash.as_phc_string())
            .bind(user.role.code())
            .bind(user.email_verified)
            .bind(user.external_id.as_deref())
            .bind(user.full_name.as_deref())
            .bind(user.avatar.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)?;

        let created = row.into_user()?;
        tracing::debug!(user_id = %created.id, "User row inserted");
        Ok(created)
    }

    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.find_one("email", email.as_str()).await
    }

    async fn find_by_external_id(&self, external_id: &str) -> AuthResult<Option<User>> {
        self.find_one("external_id", external_id).await
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = $2,
                password_hash = $3,
                email_verified = $4,
                external_id = $5,
                full_name = $6,
                avatar = $7,
                rating = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_i64())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.email_verified)
        .bind(user.external_id.as_deref())
        .bind(user.full_name.as_deref())
        .bind(user.avatar.as_deref())
        .bind(user.rating)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> AuthResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Unique violations are told apart by constraint name.
fn map_unique_violation(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23505")
    {
        match db_err.constraint() {
            Some("users_email_key") => return AuthError::EmailTaken,
            Some("users_login_key") => return AuthError::DuplicateLogin,
            Some("users_external_id_key") => return AuthError::DuplicateExternalId,
            _ => {}
        }
    }
    AuthError::Database(err)
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    login: String,
    email: String,
    password_hash: String,
    role: String,
    email_verified: bool,
    external_id: Option<String>,
    full_name: Option<String>,
    avatar: Option<String>,
    rating: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let password_hash = UserPassword::from_phc_string(self.password_hash)
            .map_err(|_| AuthError::Internal(format!("Invalid password hash for user {}", self.id)))?;
        let role = self
            .role
            .parse::<UserRole>()
            .map_err(|e| AuthError::Internal(format!("Invalid role for user {}: {e}", self.id)))?;

        Ok(User {
            id: UserId::from_i64(self.id),
            login: Login::from_db(self.login),
            email: Email::from_db(self.email),
            password_hash,
            role,
            email_verified: self.email_verified,
            external_id: self.external_id,
            full_name: self.full_name,
            avatar: self.avatar,
            rating: self.rating,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
