//! User database queries

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::types::user::{CreateUserRequest, User};

/// Get user by username
pub async fn get_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT
            id, username, password_hash, name, surname, phone, email, role, created_at
        FROM users
        WHERE username = $1
        "#
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Check whether a username is taken
pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)"
    )
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// List all users, admins first
pub async fn list_users(pool: &PgPool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT
            id, username, password_hash, name, surname, phone, email, role, created_at
        FROM users
        ORDER BY role ASC, name ASC, surname ASC
        "#
    )
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Create a user
pub async fn create_user(pool: &PgPool, req: &CreateUserRequest) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, password_hash, name, surname, phone, email, role, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        RETURNING
            id, username, password_hash, name, surname, phone, email, role, created_at
        "#
    )
    .bind(Uuid::new_v4())
    .bind(&req.username)
    .bind(&req.password_hash)
    .bind(&req.name)
    .bind(&req.surname)
    .bind(&req.phone)
    .bind(&req.email)
    .bind(req.role.as_str())
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Replace a user's password hash
pub async fn update_password_hash(pool: &PgPool, username: &str, password_hash: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET password_hash = $1 WHERE username = $2"
    )
    .bind(password_hash)
    .bind(username)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
