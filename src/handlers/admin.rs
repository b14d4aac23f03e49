//! Account command handlers (`create-cashier`, `reset-password`)

use anyhow::Result;
use sqlx::PgPool;

use crate::admin::{self, NewAccount};
use crate::types::user::Role;

pub async fn handle_create_cashier(pool: &PgPool, account: NewAccount, password: Option<String>) -> Result<()> {
    let user = admin::create_cashier(pool, account, password).await?;
    println!("Created {} account '{}' ({})", user.role(), user.username, user.full_name());
    Ok(())
}

pub async fn handle_reset_password(
    pool: &PgPool,
    username: Option<String>,
    password: Option<String>,
    list: bool,
) -> Result<()> {
    if list {
        let users = admin::list_users(pool).await?;
        print!("{}", admin::format_user_table(&users));
        return Ok(());
    }

    let Some(username) = username else {
        anyhow::bail!("--username is required unless --list is given");
    };

    let generated = password.is_none();
    let new_password = admin::reset_password(pool, &username, password).await?;
    if generated {
        println!("New password for '{}': {}", username, new_password);
        println!("It is shown only once; hand it over securely.");
    } else {
        println!("Password updated for '{}'", username);
    }
    Ok(())
}

/// Role for the `--admin` flag
pub fn role_for(admin_flag: bool) -> Role {
    if admin_flag {
        Role::Admin
    } else {
        Role::Cashier
    }
}
