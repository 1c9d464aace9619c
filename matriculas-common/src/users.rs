//! User repository
//!
//! Users live behind the [`UserRepository`] trait so the system of record
//! is a real store. Passwords are kept as salted SHA-256 digests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::roles::Role;
use crate::{Error, Result};

/// A registered dashboard user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub role: Role,
}

/// Registration request
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role,
        }
    }

    fn validate(&self) -> Result<()> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::InvalidInput(format!("Invalid email: {}", self.email)));
        }
        if self.password.is_empty() {
            return Err(Error::InvalidInput("Password must not be empty".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register a user; `false` when the email is already taken
    async fn add(&self, user: NewUser) -> Result<bool>;

    async fn find(&self, email: &str) -> Result<Option<User>>;

    /// The user when the password matches, `None` otherwise
    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>>;
}

/// Salted SHA-256 of a password, hex encoded
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// [`UserRepository`] over the `users` table
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Ensure a root account exists, leaving an existing account untouched
    pub async fn seed_root(&self, email: &str, password: &str) -> Result<()> {
        if self.add(NewUser::new(email, password, Role::Root)).await? {
            info!(email, "Seeded root user");
        }
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn parse_role(email: &str, role: &str) -> Role {
    role.parse().unwrap_or_else(|_| {
        warn!(email, role, "Stored role is unknown, treating user as viewer");
        Role::Viewer
    })
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn add(&self, user: NewUser) -> Result<bool> {
        user.validate()?;

        let salt = Uuid::new_v4().to_string();
        let hash = hash_password(&user.password, &salt);

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (email, password_hash, password_salt, role)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(normalize_email(&user.email))
        .bind(hash)
        .bind(salt)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find(&self, email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT email, role FROM users WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(email, role)| {
            let role = parse_role(&email, &role);
            User { email, role }
        }))
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        let row = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT email, password_hash, password_salt, role FROM users WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await?;

        let Some((email, stored_hash, salt, role)) = row else {
            return Ok(None);
        };

        if hash_password(password, &salt) != stored_hash {
            return Ok(None);
        }

        let role = parse_role(&email, &role);
        Ok(Some(User { email, role }))
    }
}
