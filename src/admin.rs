//! Cashier and administrator account management.

use anyhow::{bail, Context, Result};
use sqlx::PgPool;
use tracing::info;

use crate::auth;
use crate::db::queries;
use crate::types::user::{CreateUserRequest, Role, User};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Details for a new account (everything except the password)
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

/// Create a cashier (or administrator) account.
///
/// Without `password` the password is prompted for interactively (hidden
/// input, confirmed).
pub async fn create_cashier(pool: &PgPool, account: NewAccount, password: Option<String>) -> Result<User> {
    validate_username(&account.username)?;
    if let Some(email) = account.email.as_deref() {
        validate_email(email)?;
    }
    if queries::user::username_exists(pool, &account.username).await? {
        bail!("Username '{}' is already taken", account.username);
    }

    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };
    validate_password(&password)?;

    let req = CreateUserRequest {
        username: account.username,
        password_hash: auth::hash_password(&password)?,
        name: account.name,
        surname: account.surname,
        phone: account.phone,
        email: account.email,
        role: account.role,
    };

    let user = queries::user::create_user(pool, &req)
        .await
        .context("Failed to create user")?;

    info!("Created {} account '{}'", user.role(), user.username);
    Ok(user)
}

/// Set a new password for `username`. Without `password` a random one is
/// generated; the password actually set is returned.
pub async fn reset_password(pool: &PgPool, username: &str, password: Option<String>) -> Result<String> {
    let password = match password {
        Some(p) => {
            validate_password(&p)?;
            p
        }
        None => auth::generate_password(),
    };

    let hash = auth::hash_password(&password)?;
    if !queries::user::update_password_hash(pool, username, &hash).await? {
        bail!("User '{}' not found", username);
    }

    info!("Password reset for '{}'", username);
    Ok(password)
}

/// All accounts, for the `--list` table
pub async fn list_users(pool: &PgPool) -> Result<Vec<User>> {
    queries::user::list_users(pool)
        .await
        .context("Failed to list users")
}

/// Render users as a fixed-width table
pub fn format_user_table(users: &[User]) -> String {
    let mut out = format!("{:<20} {:<30} {:<8} {}\n", "USERNAME", "EMAIL", "ROLE", "NAME");
    out.push_str(&"-".repeat(80));
    out.push('\n');
    for user in users {
        out.push_str(&format!(
            "{:<20} {:<30} {:<8} {}\n",
            user.username,
            user.email.as_deref().unwrap_or("-"),
            user.role,
            user.full_name()
        ));
    }
    out
}

fn prompt_password() -> Result<String> {
    let pass = rpassword::prompt_password("Enter password: ")
        .context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Confirm password: ")
        .context("Failed to read password confirmation")?;

    if pass != confirm {
        bail!("Passwords do not match");
    }
    Ok(pass)
}

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        bail!("Username must not be empty");
    }
    if username.chars().any(char::is_whitespace) {
        bail!("Username must not contain whitespace: '{username}'");
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    if !email.contains('@') || !email.contains('.') {
        bail!("Invalid email address: {email}");
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        bail!("Password must be at least {MIN_PASSWORD_LENGTH} characters (got {len})");
    }
    Ok(())
}
