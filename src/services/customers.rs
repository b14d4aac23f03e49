//! Manual customer management: add, search and edit
//!
//! Customers are shared by all cashiers. Any user may add or search them;
//! only administrators may edit one.

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::auth::Principal;
use crate::services::customer_store::{CustomerStore, StoreError};
use crate::types::customer::{Customer, CustomerChanges, NewCustomer};

/// Customer management failures
#[derive(Debug, Error)]
pub enum CustomerError {
    #[error("surname is required")]
    MissingSurname,

    #[error("nothing to change")]
    NoChanges,

    #[error("only administrators may edit customers")]
    Forbidden,

    #[error("customer {0} not found")]
    NotFound(Uuid),

    #[error("another customer already has this name and place: {0}")]
    Conflict(Customer),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CustomerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => CustomerError::NotFound(id),
            other => CustomerError::Store(other),
        }
    }
}

/// Result of a manual add
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub customer: Customer,
    /// `false` when the customer already existed and was left untouched
    pub created: bool,
}

/// Create a customer, or return the existing one with the same identity
pub async fn add_customer(
    store: &dyn CustomerStore,
    principal: &Principal,
    customer: &NewCustomer,
) -> Result<AddOutcome, CustomerError> {
    let request = customer.to_request();
    if request.identity.surname.is_empty() {
        return Err(CustomerError::MissingSurname);
    }

    if let Some(existing) = store.find_by_identity(&request.identity).await? {
        return Ok(AddOutcome { customer: existing, created: false });
    }

    match store.create(&request).await {
        Ok(created) => {
            info!("{} added customer {} ({})", principal.username, created, created.id);
            Ok(AddOutcome { customer: created, created: true })
        }
        // Inserted by someone else since the lookup
        Err(StoreError::UniqueViolation(_)) => {
            let existing = store
                .find_by_identity(&request.identity)
                .await?
                .ok_or(CustomerError::Store(StoreError::UniqueViolation(
                    request.identity.surname.clone(),
                )))?;
            Ok(AddOutcome { customer: existing, created: false })
        }
        Err(e) => Err(e.into()),
    }
}

/// Customers matching `search`, or all of them
pub async fn search_customers(
    store: &dyn CustomerStore,
    search: Option<&str>,
) -> Result<Vec<Customer>, CustomerError> {
    let term = search.map(str::trim).filter(|t| !t.is_empty());
    Ok(store.search(term).await?)
}

/// Apply `changes` to a customer. The new identity must not belong to
/// another customer.
pub async fn edit_customer(
    store: &dyn CustomerStore,
    principal: &Principal,
    customer_id: Uuid,
    changes: &CustomerChanges,
) -> Result<Customer, CustomerError> {
    if !principal.is_admin() {
        return Err(CustomerError::Forbidden);
    }
    if changes.is_empty() {
        return Err(CustomerError::NoChanges);
    }

    let current = store.get(customer_id).await?;
    let request = changes.apply(&current);
    if request.identity.surname.is_empty() {
        return Err(CustomerError::MissingSurname);
    }

    if let Some(other) = store.find_by_identity(&request.identity).await? {
        if other.id != customer_id {
            return Err(CustomerError::Conflict(other));
        }
    }

    let updated = match store.update(customer_id, &request).await {
        Ok(updated) => updated,
        Err(StoreError::UniqueViolation(_)) => {
            let other = store
                .find_by_identity(&request.identity)
                .await?
                .ok_or(CustomerError::Store(StoreError::UniqueViolation(
                    request.identity.surname.clone(),
                )))?;
            return Err(CustomerError::Conflict(other));
        }
        Err(e) => return Err(e.into()),
    };

    info!("{} edited customer {} ({})", principal.username, updated, updated.id);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::customer_store::MemoryCustomerStore;
    use crate::types::Role;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            username: "nigar".to_string(),
            role,
        }
    }

    fn new_customer(name: &str, surname: &str, place: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            surname: surname.to_string(),
            place: Some(place.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn add_creates_then_reports_existing() {
        let store = MemoryCustomerStore::new();
        let cashier = principal(Role::Cashier);
        let mut customer = new_customer("Əli", "Məmmədov", "Bakı");
        customer.phone = Some("0551234567".to_string());

        let first = add_customer(&store, &cashier, &customer).await.unwrap();
        assert!(first.created);

        // A second add neither duplicates nor changes the stored phone
        customer.phone = Some("0559999999".to_string());
        let second = add_customer(&store, &cashier, &customer).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.customer.id, first.customer.id);
        assert_eq!(second.customer.phone.as_deref(), Some("0551234567"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn add_requires_surname() {
        let store = MemoryCustomerStore::new();
        let err = add_customer(&store, &principal(Role::Admin), &new_customer("Əli", "  ", "Bakı"))
            .await
            .unwrap_err();
        assert!(matches!(err, CustomerError::MissingSurname));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn add_without_place_uses_default() {
        let store = MemoryCustomerStore::new();
        let customer = NewCustomer {
            surname: "Quliyev".to_string(),
            ..Default::default()
        };
        let outcome = add_customer(&store, &principal(Role::Cashier), &customer).await.unwrap();
        assert_eq!(outcome.customer.place, "Unknown");
        assert_eq!(outcome.customer.name, "");
    }

    #[tokio::test]
    async fn blank_search_lists_everyone() {
        let store = MemoryCustomerStore::new();
        let admin = principal(Role::Admin);
        add_customer(&store, &admin, &new_customer("Əli", "Məmmədov", "Bakı")).await.unwrap();
        add_customer(&store, &admin, &new_customer("Anar", "Quliyev", "Gəncə")).await.unwrap();

        assert_eq!(search_customers(&store, Some("  ")).await.unwrap().len(), 2);
        let found = search_customers(&store, Some("gəncə")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].surname, "Quliyev");
    }

    #[tokio::test]
    async fn cashier_cannot_edit() {
        let store = MemoryCustomerStore::new();
        let created = add_customer(&store, &principal(Role::Cashier), &new_customer("Əli", "Məmmədov", "Bakı"))
            .await
            .unwrap();
        let changes = CustomerChanges {
            place: Some("Şəki".to_string()),
            ..Default::default()
        };

        let err = edit_customer(&store, &principal(Role::Cashier), created.customer.id, &changes)
            .await
            .unwrap_err();
        assert!(matches!(err, CustomerError::Forbidden));
    }

    #[tokio::test]
    async fn admin_edit_updates_fields() {
        let store = MemoryCustomerStore::new();
        let admin = principal(Role::Admin);
        let created = add_customer(&store, &admin, &new_customer("Əli", "Məmmədov", "Bakı"))
            .await
            .unwrap();
        let changes = CustomerChanges {
            place: Some("Şəki".to_string()),
            phone: Some("0551234567".to_string()),
            ..Default::default()
        };

        let updated = edit_customer(&store, &admin, created.customer.id, &changes).await.unwrap();
        assert_eq!(updated.place, "Şəki");
        assert_eq!(updated.phone.as_deref(), Some("0551234567"));
        assert_eq!(updated.name, "Əli");
    }

    #[tokio::test]
    async fn edit_into_another_customers_identity_conflicts() {
        let store = MemoryCustomerStore::new();
        let admin = principal(Role::Admin);
        let ali = add_customer(&store, &admin, &new_customer("Əli", "Məmmədov", "Bakı"))
            .await
            .unwrap();
        let other = add_customer(&store, &admin, &new_customer("Əli", "Məmmədov", "Şəki"))
            .await
            .unwrap();
        let changes = CustomerChanges {
            place: Some("Bakı".to_string()),
            ..Default::default()
        };

        let err = edit_customer(&store, &admin, other.customer.id, &changes)
            .await
            .unwrap_err();
        assert!(matches!(err, CustomerError::Conflict(c) if c.id == ali.customer.id));
    }

    #[tokio::test]
    async fn edit_rejects_empty_changes_and_unknown_ids() {
        let store = MemoryCustomerStore::new();
        let admin = principal(Role::Admin);

        let err = edit_customer(&store, &admin, Uuid::new_v4(), &CustomerChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CustomerError::NoChanges));

        let changes = CustomerChanges {
            phone: Some("0551234567".to_string()),
            ..Default::default()
        };
        let err = edit_customer(&store, &admin, Uuid::new_v4(), &changes).await.unwrap_err();
        assert!(matches!(err, CustomerError::NotFound(_)));
    }
}
