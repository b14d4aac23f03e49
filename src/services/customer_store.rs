//! Customer persistence abstraction
//!
//! The importer needs create / lookup-by-identity / backfill; manual customer
//! management adds get / search / update. Two implementations:
//! - `PgCustomerStore` for production (uniqueness enforced by a DB index)
//! - `MemoryCustomerStore` for dry runs and tests (same uniqueness rule)

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::db::queries;
use crate::types::{ContactBackfill, CreateCustomerRequest, Customer, CustomerIdentity};

/// Customer store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another customer already has this (name, surname, patronymic, place)
    #[error("customer already exists: {0}")]
    UniqueViolation(String),

    #[error("customer {0} not found")]
    NotFound(Uuid),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify a sqlx error, turning unique-index conflicts into
    /// [`StoreError::UniqueViolation`]
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation(db_err.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Customer store - abstraction over the relational store
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Find the customer with this identity. A missing patronymic matches
    /// both NULL and empty string.
    async fn find_by_identity(&self, identity: &CustomerIdentity) -> Result<Option<Customer>, StoreError>;

    /// Insert a customer; fails with `UniqueViolation` on identity conflict
    async fn create(&self, request: &CreateCustomerRequest) -> Result<Customer, StoreError>;

    /// Fill the given contact fields where the stored value is missing or
    /// empty; stored values are never overwritten
    async fn backfill_contact(&self, customer_id: Uuid, backfill: &ContactBackfill) -> Result<Customer, StoreError>;

    async fn get(&self, customer_id: Uuid) -> Result<Customer, StoreError>;

    /// Customers ordered by surname, name and place. `term` filters on a
    /// case-insensitive substring of name, surname, patronymic, place or phone.
    async fn search(&self, term: Option<&str>) -> Result<Vec<Customer>, StoreError>;

    /// Replace a customer's identity and contact fields; fails with
    /// `UniqueViolation` when the new identity belongs to another customer
    async fn update(&self, customer_id: Uuid, request: &CreateCustomerRequest) -> Result<Customer, StoreError>;

    /// Name of this implementation (for logs)
    fn name(&self) -> &'static str;
}

// =============================================================================
// POSTGRES
// =============================================================================

/// PostgreSQL-backed store
pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn find_by_identity(&self, identity: &CustomerIdentity) -> Result<Option<Customer>, StoreError> {
        queries::customer::find_customer_by_identity(&self.pool, identity)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn create(&self, request: &CreateCustomerRequest) -> Result<Customer, StoreError> {
        queries::customer::create_customer(&self.pool, request)
            .await
            .map_err(StoreError::from_sqlx)
    }

    async fn backfill_contact(&self, customer_id: Uuid, backfill: &ContactBackfill) -> Result<Customer, StoreError> {
        queries::customer::backfill_customer_contact(&self.pool, customer_id, backfill)
            .await
            .map_err(StoreError::from_sqlx)?
            .ok_or(StoreError::NotFound(customer_id))
    }

    async fn get(&self, customer_id: Uuid) -> Result<Customer, StoreError> {
        queries::customer::get_customer(&self.pool, customer_id)
            .await?
            .ok_or(StoreError::NotFound(customer_id))
    }

    async fn search(&self, term: Option<&str>) -> Result<Vec<Customer>, StoreError> {
        Ok(queries::customer::search_customers(&self.pool, term).await?)
    }

    async fn update(&self, customer_id: Uuid, request: &CreateCustomerRequest) -> Result<Customer, StoreError> {
        queries::customer::update_customer(&self.pool, customer_id, request)
            .await
            .map_err(StoreError::from_sqlx)?
            .ok_or(StoreError::NotFound(customer_id))
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// In-memory store with the same identity rule as the database index
#[derive(Default)]
pub struct MemoryCustomerStore {
    customers: Mutex<Vec<Customer>>,
}

impl MemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing customers (stored as-is, including empty
    /// patronymics, to mimic legacy rows)
    pub fn with_customers(customers: Vec<Customer>) -> Self {
        Self {
            customers: Mutex::new(customers),
        }
    }

    pub fn len(&self) -> usize {
        self.customers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.lock().is_empty()
    }

    pub fn all(&self) -> Vec<Customer> {
        self.customers.lock().clone()
    }
}

fn matches_term(customer: &Customer, term: &str) -> bool {
    [
        Some(customer.name.as_str()),
        Some(customer.surname.as_str()),
        customer.patronymic.as_deref(),
        Some(customer.place.as_str()),
        customer.phone.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|value| value.to_lowercase().contains(term))
}

fn same_identity(customer: &Customer, identity: &CustomerIdentity) -> bool {
    customer.name == identity.name
        && customer.surname == identity.surname
        && customer.place == identity.place
        && customer.patronymic.as_deref().unwrap_or("") == identity.patronymic_key()
}

#[async_trait]
impl CustomerStore for MemoryCustomerStore {
    async fn find_by_identity(&self, identity: &CustomerIdentity) -> Result<Option<Customer>, StoreError> {
        let customers = self.customers.lock();
        Ok(customers.iter().find(|c| same_identity(c, identity)).cloned())
    }

    async fn create(&self, request: &CreateCustomerRequest) -> Result<Customer, StoreError> {
        let mut customers = self.customers.lock();
        if let Some(existing) = customers.iter().find(|c| same_identity(c, &request.identity)) {
            return Err(StoreError::UniqueViolation(existing.to_string()));
        }

        let customer = Customer {
            id: Uuid::new_v4(),
            name: request.identity.name.clone(),
            surname: request.identity.surname.clone(),
            patronymic: request.identity.patronymic.clone(),
            place: request.identity.place.clone(),
            phone: request.phone.clone(),
            address: request.address.clone(),
            created_at: Utc::now(),
        };
        customers.push(customer.clone());
        Ok(customer)
    }

    async fn backfill_contact(&self, customer_id: Uuid, backfill: &ContactBackfill) -> Result<Customer, StoreError> {
        let mut customers = self.customers.lock();
        let customer = customers
            .iter_mut()
            .find(|c| c.id == customer_id)
            .ok_or(StoreError::NotFound(customer_id))?;

        if let Some(phone) = backfill.phone.as_ref().filter(|_| !customer.has_phone()) {
            customer.phone = Some(phone.clone());
        }
        if let Some(address) = backfill.address.as_ref().filter(|_| !customer.has_address()) {
            customer.address = Some(address.clone());
        }
        Ok(customer.clone())
    }

    async fn get(&self, customer_id: Uuid) -> Result<Customer, StoreError> {
        self.customers
            .lock()
            .iter()
            .find(|c| c.id == customer_id)
            .cloned()
            .ok_or(StoreError::NotFound(customer_id))
    }

    async fn search(&self, term: Option<&str>) -> Result<Vec<Customer>, StoreError> {
        let term = term.map(str::to_lowercase);
        let mut found: Vec<Customer> = self
            .customers
            .lock()
            .iter()
            .filter(|c| term.as_deref().map_or(true, |t| matches_term(c, t)))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            (&a.surname, &a.name, &a.place).cmp(&(&b.surname, &b.name, &b.place))
        });
        Ok(found)
    }

    async fn update(&self, customer_id: Uuid, request: &CreateCustomerRequest) -> Result<Customer, StoreError> {
        let mut customers = self.customers.lock();
        if let Some(other) = customers
            .iter()
            .find(|c| c.id != customer_id && same_identity(c, &request.identity))
        {
            return Err(StoreError::UniqueViolation(other.to_string()));
        }

        let customer = customers
            .iter_mut()
            .find(|c| c.id == customer_id)
            .ok_or(StoreError::NotFound(customer_id))?;
        customer.name = request.identity.name.clone();
        customer.surname = request.identity.surname.clone();
        customer.patronymic = request.identity.patronymic.clone();
        customer.place = request.identity.place.clone();
        customer.phone = request.phone.clone();
        customer.address = request.address.clone();
        Ok(customer.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
