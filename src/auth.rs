//! Authentication utilities: password hashing and the acting principal

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::queries;
use crate::types::{Role, User};

/// Length of generated passwords
const GENERATED_PASSWORD_LENGTH: usize = 12;

/// The authenticated user an operation runs as.
///
/// Resolved once at the entry point and passed into every debt operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl Principal {
    /// Unscoped principal for scheduled jobs run without `--as`
    pub fn system() -> Self {
        Self {
            user_id: Uuid::nil(),
            username: "system".to_string(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Cashier whose debts this principal may touch; `None` means all
    pub fn cashier_scope(&self) -> Option<Uuid> {
        match self.role {
            Role::Admin => None,
            Role::Cashier => Some(self.user_id),
        }
    }

    /// Whether a debt owned by `cashier_id` is visible to this principal
    pub fn can_access(&self, cashier_id: Uuid) -> bool {
        self.cashier_scope().map_or(true, |own| own == cashier_id)
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role(),
        }
    }
}

/// Look up the principal for a username
pub async fn resolve_principal(pool: &PgPool, username: &str) -> Result<Principal> {
    let user = queries::user::get_user_by_username(pool, username)
        .await?
        .ok_or_else(|| anyhow!("User '{}' not found", username))?;
    Ok(Principal::from(&user))
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Random alphanumeric password for resets
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            username: "nigar".to_string(),
            role,
        }
    }

    // ---- Password hashing tests ----

    #[test]
    fn test_hash_password_produces_valid_hash() {
        let hash = hash_password("my-secure-password").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_hash_password_different_each_time() {
        let hash1 = hash_password("same-password").unwrap();
        let hash2 = hash_password("same-password").unwrap();
        assert_ne!(hash1, hash2, "Hashes should differ due to random salt");
    }

    #[test]
    fn test_generated_password_shape() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, generate_password());
    }

    // ---- Principal scope tests ----

    #[test]
    fn test_admin_sees_every_cashier() {
        let admin = principal(Role::Admin);
        assert!(admin.is_admin());
        assert_eq!(admin.cashier_scope(), None);
        assert!(admin.can_access(Uuid::new_v4()));
    }

    #[test]
    fn test_system_principal_is_unscoped() {
        let system = Principal::system();
        assert!(system.is_admin());
        assert_eq!(system.cashier_scope(), None);
    }

    #[test]
    fn test_cashier_is_scoped_to_own_debts() {
        let cashier = principal(Role::Cashier);
        assert_eq!(cashier.cashier_scope(), Some(cashier.user_id));
        assert!(cashier.can_access(cashier.user_id));
        assert!(!cashier.can_access(Uuid::new_v4()));
    }
}
