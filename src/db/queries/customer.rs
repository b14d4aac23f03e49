//! Customer database queries
//!
//! These return raw `sqlx::Error` so callers can tell unique-index
//! conflicts apart from other failures.

use sqlx::PgPool;
use uuid::Uuid;

use crate::types::customer::{ContactBackfill, CreateCustomerRequest, Customer, CustomerIdentity};

/// Create a new customer
pub async fn create_customer(
    pool: &PgPool,
    req: &CreateCustomerRequest,
) -> Result<Customer, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (
            id, name, surname, patronymic, place, phone, address, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        RETURNING
            id, name, surname, patronymic, place, phone, address, created_at
        "#
    )
    .bind(Uuid::new_v4())
    .bind(&req.identity.name)
    .bind(&req.identity.surname)
    .bind(&req.identity.patronymic)
    .bind(&req.identity.place)
    .bind(&req.phone)
    .bind(&req.address)
    .fetch_one(pool)
    .await
}

/// Find a customer by (name, surname, patronymic, place).
///
/// NULL and empty patronymic compare equal, matching the unique index.
pub async fn find_customer_by_identity(
    pool: &PgPool,
    identity: &CustomerIdentity,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        r#"
        SELECT
            id, name, surname, patronymic, place, phone, address, created_at
        FROM customers
        WHERE name = $1
          AND surname = $2
          AND COALESCE(patronymic, '') = $3
          AND place = $4
        LIMIT 1
        "#
    )
    .bind(&identity.name)
    .bind(&identity.surname)
    .bind(identity.patronymic_key())
    .bind(&identity.place)
    .fetch_optional(pool)
    .await
}

/// Get a customer by id
pub async fn get_customer(pool: &PgPool, customer_id: Uuid) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        r#"
        SELECT
            id, name, surname, patronymic, place, phone, address, created_at
        FROM customers
        WHERE id = $1
        "#
    )
    .bind(customer_id)
    .fetch_optional(pool)
    .await
}

/// List customers, optionally filtered by a case-insensitive substring of
/// name, surname, patronymic, place or phone
pub async fn search_customers(
    pool: &PgPool,
    term: Option<&str>,
) -> Result<Vec<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        r#"
        SELECT
            id, name, surname, patronymic, place, phone, address, created_at
        FROM customers
        WHERE ($1::text IS NULL
            OR name ILIKE '%' || $1 || '%'
            OR surname ILIKE '%' || $1 || '%'
            OR COALESCE(patronymic, '') ILIKE '%' || $1 || '%'
            OR place ILIKE '%' || $1 || '%'
            OR COALESCE(phone, '') ILIKE '%' || $1 || '%')
        ORDER BY surname ASC, name ASC, place ASC
        "#
    )
    .bind(term)
    .fetch_all(pool)
    .await
}

/// Replace identity and contact fields of a customer
pub async fn update_customer(
    pool: &PgPool,
    customer_id: Uuid,
    req: &CreateCustomerRequest,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers
        SET
            name = $2,
            surname = $3,
            patronymic = $4,
            place = $5,
            phone = $6,
            address = $7
        WHERE id = $1
        RETURNING
            id, name, surname, patronymic, place, phone, address, created_at
        "#
    )
    .bind(customer_id)
    .bind(&req.identity.name)
    .bind(&req.identity.surname)
    .bind(&req.identity.patronymic)
    .bind(&req.identity.place)
    .bind(&req.phone)
    .bind(&req.address)
    .fetch_optional(pool)
    .await
}

/// Fill phone/address on an existing customer.
///
/// A stored non-empty value always wins, even one written after the caller
/// read the row; `None` keeps the stored value.
pub async fn backfill_customer_contact(
    pool: &PgPool,
    customer_id: Uuid,
    backfill: &ContactBackfill,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        r#"
        UPDATE customers
        SET
            phone = COALESCE(NULLIF(phone, ''), $2),
            address = COALESCE(NULLIF(address, ''), $3)
        WHERE id = $1
        RETURNING
            id, name, surname, patronymic, place, phone, address, created_at
        "#
    )
    .bind(customer_id)
    .bind(&backfill.phone)
    .bind(&backfill.address)
    .fetch_optional(pool)
    .await
}
