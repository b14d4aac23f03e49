//! Debt database queries
//!
//! Every read computes `paid_amount` from the payments table. `cashier_id`
//! parameters are the caller's scope: `None` matches all cashiers.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::types::debt::{CreateDebtRequest, Debt, DebtFilter, DebtListItem, PaymentMethod};

/// Select list shared by every `DebtListItem` query (aliases: d, c, u)
const DEBT_ITEM_SELECT: &str = r#"
    SELECT
        d.id, d.cashier_id, d.customer_id, d.amount, d.date_given, d.promise_date,
        d.description, d.is_paid, d.paid_date, d.payment_method,
        d.is_deleted, d.deleted_at, d.deleted_by, d.created_at, d.updated_at,
        COALESCE((SELECT SUM(p.amount) FROM payments p WHERE p.debt_id = d.id), 0) AS paid_amount,
        c.name AS customer_name,
        c.surname AS customer_surname,
        c.place AS customer_place,
        u.username AS cashier_username,
        u.name || ' ' || u.surname AS cashier_name
    FROM debts d
    JOIN customers c ON c.id = d.customer_id
    JOIN users u ON u.id = d.cashier_id
"#;

/// Create a new debt owned by `cashier_id`
pub async fn create_debt(
    pool: &PgPool,
    cashier_id: Uuid,
    req: &CreateDebtRequest,
) -> Result<Debt, sqlx::Error> {
    sqlx::query_as::<_, Debt>(
        r#"
        INSERT INTO debts (
            id, cashier_id, customer_id, amount, date_given, promise_date, description,
            is_paid, is_deleted, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, NOW(), $5, $6, FALSE, FALSE, NOW(), NOW())
        RETURNING
            id, cashier_id, customer_id, amount, date_given, promise_date, description,
            is_paid, paid_date, payment_method, is_deleted, deleted_at, deleted_by,
            created_at, updated_at,
            0::numeric AS paid_amount
        "#
    )
    .bind(Uuid::new_v4())
    .bind(cashier_id)
    .bind(req.customer_id)
    .bind(req.amount)
    .bind(req.promise_date)
    .bind(&req.description)
    .fetch_one(pool)
    .await
}

/// Get a debt by ID
pub async fn get_debt<'e, E: PgExecutor<'e>>(
    executor: E,
    debt_id: Uuid,
) -> Result<Option<Debt>, sqlx::Error> {
    sqlx::query_as::<_, Debt>(
        r#"
        SELECT
            d.id, d.cashier_id, d.customer_id, d.amount, d.date_given, d.promise_date,
            d.description, d.is_paid, d.paid_date, d.payment_method,
            d.is_deleted, d.deleted_at, d.deleted_by, d.created_at, d.updated_at,
            COALESCE((SELECT SUM(p.amount) FROM payments p WHERE p.debt_id = d.id), 0) AS paid_amount
        FROM debts d
        WHERE d.id = $1
        "#
    )
    .bind(debt_id)
    .fetch_optional(executor)
    .await
}

/// Get a debt by ID and lock its row until the transaction ends
pub async fn lock_debt<'e, E: PgExecutor<'e>>(
    executor: E,
    debt_id: Uuid,
) -> Result<Option<Debt>, sqlx::Error> {
    sqlx::query_as::<_, Debt>(
        r#"
        SELECT
            d.id, d.cashier_id, d.customer_id, d.amount, d.date_given, d.promise_date,
            d.description, d.is_paid, d.paid_date, d.payment_method,
            d.is_deleted, d.deleted_at, d.deleted_by, d.created_at, d.updated_at,
            COALESCE((SELECT SUM(p.amount) FROM payments p WHERE p.debt_id = d.id), 0) AS paid_amount
        FROM debts d
        WHERE d.id = $1
        FOR UPDATE
        "#
    )
    .bind(debt_id)
    .fetch_optional(executor)
    .await
}

/// Mark a single debt paid
pub async fn mark_debt_paid<'e, E: PgExecutor<'e>>(
    executor: E,
    debt_id: Uuid,
    paid_date: DateTime<Utc>,
    method: PaymentMethod,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE debts
        SET is_paid = TRUE, paid_date = $2, payment_method = $3, updated_at = NOW()
        WHERE id = $1 AND is_paid = FALSE AND is_deleted = FALSE
        "#
    )
    .bind(debt_id)
    .bind(paid_date)
    .bind(method.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Unpaid, non-deleted debts of a customer, oldest first
pub async fn list_open_debts_for_customer<'e, E: PgExecutor<'e>>(
    executor: E,
    customer_id: Uuid,
    cashier_id: Option<Uuid>,
) -> Result<Vec<Debt>, sqlx::Error> {
    sqlx::query_as::<_, Debt>(
        r#"
        SELECT
            d.id, d.cashier_id, d.customer_id, d.amount, d.date_given, d.promise_date,
            d.description, d.is_paid, d.paid_date, d.payment_method,
            d.is_deleted, d.deleted_at, d.deleted_by, d.created_at, d.updated_at,
            COALESCE((SELECT SUM(p.amount) FROM payments p WHERE p.debt_id = d.id), 0) AS paid_amount
        FROM debts d
        WHERE d.customer_id = $1
          AND ($2::uuid IS NULL OR d.cashier_id = $2)
          AND d.is_paid = FALSE
          AND d.is_deleted = FALSE
        ORDER BY d.date_given ASC
        FOR UPDATE
        "#
    )
    .bind(customer_id)
    .bind(cashier_id)
    .fetch_all(executor)
    .await
}

/// Mark several debts paid at once
pub async fn mark_debts_paid<'e, E: PgExecutor<'e>>(
    executor: E,
    debt_ids: &[Uuid],
    method: PaymentMethod,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE debts
        SET is_paid = TRUE, paid_date = NOW(), payment_method = $2, updated_at = NOW()
        WHERE id = ANY($1) AND is_paid = FALSE AND is_deleted = FALSE
        "#
    )
    .bind(debt_ids)
    .bind(method.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Soft delete a debt, recording who deleted it
pub async fn soft_delete_debt(
    pool: &PgPool,
    debt_id: Uuid,
    deleted_by: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE debts
        SET is_deleted = TRUE, deleted_at = NOW(), deleted_by = $2, updated_at = NOW()
        WHERE id = $1 AND is_deleted = FALSE
        "#
    )
    .bind(debt_id)
    .bind(deleted_by)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// List debts with customer and cashier data, newest first
pub async fn list_debt_items(
    pool: &PgPool,
    cashier_id: Option<Uuid>,
    filter: &DebtFilter,
) -> Result<Vec<DebtListItem>, sqlx::Error> {
    let sql = format!(
        r#"{DEBT_ITEM_SELECT}
        WHERE ($1::uuid IS NULL OR d.cashier_id = $1)
          AND ($2::bool OR d.is_deleted = FALSE)
          AND ($3::bool IS NULL OR d.is_paid = $3)
          AND ($4::date IS NULL OR (d.date_given AT TIME ZONE 'UTC')::date >= $4)
          AND ($5::date IS NULL OR (d.date_given AT TIME ZONE 'UTC')::date <= $5)
          AND ($6::uuid IS NULL OR d.customer_id = $6)
        ORDER BY d.date_given DESC
        "#
    );

    sqlx::query_as::<_, DebtListItem>(&sql)
        .bind(cashier_id)
        .bind(filter.include_deleted)
        .bind(filter.paid)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.customer_id)
        .fetch_all(pool)
        .await
}

/// Unpaid, non-deleted debts whose promise date is before `today`,
/// ordered by cashier then promise date
pub async fn list_overdue_items(
    pool: &PgPool,
    cashier_id: Option<Uuid>,
    today: NaiveDate,
) -> Result<Vec<DebtListItem>, sqlx::Error> {
    let sql = format!(
        r#"{DEBT_ITEM_SELECT}
        WHERE ($1::uuid IS NULL OR d.cashier_id = $1)
          AND d.is_paid = FALSE
          AND d.is_deleted = FALSE
          AND d.promise_date < $2
        ORDER BY u.username ASC, d.promise_date ASC
        "#
    );

    sqlx::query_as::<_, DebtListItem>(&sql)
        .bind(cashier_id)
        .bind(today)
        .fetch_all(pool)
        .await
}

/// Which timestamp a daily listing is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtEvent {
    Given,
    Paid,
    Deleted,
}

impl DebtEvent {
    fn column(&self) -> &'static str {
        match self {
            DebtEvent::Given => "d.date_given",
            DebtEvent::Paid => "d.paid_date",
            DebtEvent::Deleted => "d.deleted_at",
        }
    }
}

/// Debts whose `event` timestamp falls on `date` (UTC day), deleted ones included
pub async fn list_items_on(
    pool: &PgPool,
    cashier_id: Option<Uuid>,
    event: DebtEvent,
    date: NaiveDate,
) -> Result<Vec<DebtListItem>, sqlx::Error> {
    let column = event.column();
    let sql = format!(
        r#"{DEBT_ITEM_SELECT}
        WHERE ($1::uuid IS NULL OR d.cashier_id = $1)
          AND ({column} AT TIME ZONE 'UTC')::date = $2
        ORDER BY {column} DESC
        "#
    );

    sqlx::query_as::<_, DebtListItem>(&sql)
        .bind(cashier_id)
        .bind(date)
        .fetch_all(pool)
        .await
}
