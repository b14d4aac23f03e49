//! Partial payment database queries

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::types::debt::{CreatePaymentRequest, Payment};

/// Insert a partial payment
pub async fn create_payment<'e, E: PgExecutor<'e>>(
    executor: E,
    debt_id: Uuid,
    req: &CreatePaymentRequest,
    payment_date: DateTime<Utc>,
    created_by: Uuid,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (
            id, debt_id, amount, payment_date, payment_method, notes, created_by, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        RETURNING
            id, debt_id, amount, payment_date, payment_method, notes, created_by, created_at
        "#
    )
    .bind(Uuid::new_v4())
    .bind(debt_id)
    .bind(req.amount)
    .bind(payment_date)
    .bind(req.payment_method.as_str())
    .bind(&req.notes)
    .bind(created_by)
    .fetch_one(executor)
    .await
}

/// Payments made on `date` (UTC day) against debts in scope
pub async fn list_payments_on(
    pool: &PgPool,
    cashier_id: Option<Uuid>,
    date: NaiveDate,
) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        r#"
        SELECT
            p.id, p.debt_id, p.amount, p.payment_date, p.payment_method,
            p.notes, p.created_by, p.created_at
        FROM payments p
        JOIN debts d ON d.id = p.debt_id
        WHERE ($1::uuid IS NULL OR d.cashier_id = $1)
          AND (p.payment_date AT TIME ZONE 'UTC')::date = $2
        ORDER BY p.payment_date DESC
        "#
    )
    .bind(cashier_id)
    .bind(date)
    .fetch_all(pool)
    .await
}
