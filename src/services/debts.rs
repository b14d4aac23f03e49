//! Debt ledger: recording debts, partial payments, settlement and reports
//!
//! Every operation takes the acting [`Principal`]. Cashiers only see and
//! modify their own debts; administrators act on all of them.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::Principal;
use crate::db::queries;
use crate::db::queries::debt::DebtEvent;
use crate::types::debt::{
    CreateDebtRequest, CreatePaymentRequest, DailyOperations, Debt, DebtFilter, DebtListItem,
    OverdueGroup, Payment, PaymentMethod,
};

/// Debt ledger failures
#[derive(Debug, Error)]
pub enum DebtError {
    #[error("invalid amount {0}: {1}")]
    InvalidAmount(Decimal, &'static str),

    #[error("payment of {amount} exceeds remaining amount {remaining}")]
    PaymentExceedsRemaining { amount: Decimal, remaining: Decimal },

    #[error("debt {0} is already paid")]
    AlreadyPaid(Uuid),

    #[error("debt {0} has been deleted")]
    Deleted(Uuid),

    #[error("debt {0} not found")]
    NotFound(Uuid),

    #[error("debt {0} belongs to another cashier")]
    Forbidden(Uuid),

    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Result of recording a partial payment
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub payment: Payment,
    /// The payment cleared the remaining amount and the debt is now paid
    pub settled: bool,
}

/// Result of settling every open debt of a customer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayAllOutcome {
    pub count: u64,
    pub total_settled: Decimal,
}

/// Smallest accepted partial payment
fn min_payment() -> Decimal {
    Decimal::new(1, 2)
}

// =============================================================================
// VALIDATION
// =============================================================================

pub fn validate_debt_amount(amount: Decimal) -> Result<(), DebtError> {
    if amount <= Decimal::ZERO {
        return Err(DebtError::InvalidAmount(amount, "must be greater than zero"));
    }
    Ok(())
}

/// The principal may act on this debt
pub fn ensure_access(principal: &Principal, debt: &Debt) -> Result<(), DebtError> {
    if principal.can_access(debt.cashier_id) {
        Ok(())
    } else {
        Err(DebtError::Forbidden(debt.id))
    }
}

/// The debt is neither deleted nor paid
pub fn ensure_open(debt: &Debt) -> Result<(), DebtError> {
    if debt.is_deleted {
        return Err(DebtError::Deleted(debt.id));
    }
    if debt.is_paid {
        return Err(DebtError::AlreadyPaid(debt.id));
    }
    Ok(())
}

/// Check a partial payment against the debt's remaining amount
pub fn validate_payment(debt: &Debt, amount: Decimal) -> Result<(), DebtError> {
    ensure_open(debt)?;
    if amount < min_payment() {
        return Err(DebtError::InvalidAmount(amount, "must be at least 0.01"));
    }
    let remaining = debt.remaining_amount();
    if amount > remaining {
        return Err(DebtError::PaymentExceedsRemaining { amount, remaining });
    }
    Ok(())
}

/// Whether paying `amount` clears the debt
pub fn settles(debt: &Debt, amount: Decimal) -> bool {
    debt.remaining_amount() - amount <= Decimal::ZERO
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Record a new debt owned by the principal
pub async fn record_debt(
    pool: &PgPool,
    principal: &Principal,
    req: &CreateDebtRequest,
) -> Result<Debt, DebtError> {
    validate_debt_amount(req.amount)?;

    let debt = queries::debt::create_debt(pool, principal.user_id, req).await?;
    info!(
        "Debt {} recorded by {}: {} due {}",
        debt.id, principal.username, debt.amount, debt.promise_date
    );
    Ok(debt)
}

/// Fetch a debt the principal may act on
async fn load_debt(pool: &PgPool, principal: &Principal, debt_id: Uuid) -> Result<Debt, DebtError> {
    let debt = queries::debt::get_debt(pool, debt_id)
        .await?
        .ok_or(DebtError::NotFound(debt_id))?;
    ensure_access(principal, &debt)?;
    Ok(debt)
}

/// Record a partial payment; a payment that clears the remaining amount
/// marks the debt paid with the payment's date and method
pub async fn record_payment(
    pool: &PgPool,
    principal: &Principal,
    debt_id: Uuid,
    req: &CreatePaymentRequest,
) -> Result<PaymentOutcome, DebtError> {
    let mut tx = pool.begin().await?;

    let debt = queries::debt::lock_debt(&mut *tx, debt_id)
        .await?
        .ok_or(DebtError::NotFound(debt_id))?;
    ensure_access(principal, &debt)?;
    validate_payment(&debt, req.amount)?;

    let payment_date = req.payment_date.unwrap_or_else(Utc::now);
    let payment =
        queries::payment::create_payment(&mut *tx, debt_id, req, payment_date, principal.user_id)
            .await?;

    let settled = settles(&debt, req.amount);
    if settled {
        queries::debt::mark_debt_paid(&mut *tx, debt_id, payment_date, req.payment_method).await?;
    }

    tx.commit().await?;

    info!(
        "Payment of {} on debt {} by {} ({}){}",
        payment.amount,
        debt_id,
        principal.username,
        req.payment_method,
        if settled { ", debt settled" } else { "" }
    );
    Ok(PaymentOutcome { payment, settled })
}

/// Mark a debt paid in full
pub async fn mark_paid(
    pool: &PgPool,
    principal: &Principal,
    debt_id: Uuid,
    method: PaymentMethod,
) -> Result<Debt, DebtError> {
    let debt = load_debt(pool, principal, debt_id).await?;
    ensure_open(&debt)?;

    if !queries::debt::mark_debt_paid(pool, debt_id, Utc::now(), method).await? {
        // Lost a race with another settlement or delete
        return Err(DebtError::AlreadyPaid(debt_id));
    }

    info!("Debt {} marked paid by {} ({})", debt_id, principal.username, method);
    load_debt(pool, principal, debt_id).await
}

/// Settle every unpaid, non-deleted debt of the customer that owes `debt_id`.
///
/// A customer with nothing left to pay yields a zero count, not an error.
pub async fn pay_all_for_customer(
    pool: &PgPool,
    principal: &Principal,
    debt_id: Uuid,
    method: PaymentMethod,
) -> Result<PayAllOutcome, DebtError> {
    let debt = load_debt(pool, principal, debt_id).await?;

    let mut tx = pool.begin().await?;
    let open = queries::debt::list_open_debts_for_customer(
        &mut *tx,
        debt.customer_id,
        principal.cashier_scope(),
    )
    .await?;

    if open.is_empty() {
        debug!("Customer {} has no unpaid debts", debt.customer_id);
        return Ok(PayAllOutcome { count: 0, total_settled: Decimal::ZERO });
    }

    let ids: Vec<Uuid> = open.iter().map(|d| d.id).collect();
    let count = queries::debt::mark_debts_paid(&mut *tx, &ids, method).await?;
    tx.commit().await?;

    let outcome = PayAllOutcome {
        count,
        total_settled: total_remaining(&open),
    };
    info!(
        "{} debts of customer {} settled by {}: {} ({})",
        outcome.count, debt.customer_id, principal.username, outcome.total_settled, method
    );
    Ok(outcome)
}

/// Soft delete a debt
pub async fn soft_delete(pool: &PgPool, principal: &Principal, debt_id: Uuid) -> Result<(), DebtError> {
    let debt = load_debt(pool, principal, debt_id).await?;
    if debt.is_deleted {
        return Err(DebtError::Deleted(debt_id));
    }

    if !queries::debt::soft_delete_debt(pool, debt_id, principal.user_id).await? {
        return Err(DebtError::Deleted(debt_id));
    }

    info!("Debt {} deleted by {}", debt_id, principal.username);
    Ok(())
}

/// List debts in the principal's scope, newest first
pub async fn list_debts(
    pool: &PgPool,
    principal: &Principal,
    filter: &DebtFilter,
) -> Result<Vec<DebtListItem>, DebtError> {
    let debts = queries::debt::list_debt_items(pool, principal.cashier_scope(), filter).await?;
    debug!("Listed {} debts for {}", debts.len(), principal.username);
    Ok(debts)
}

/// Overdue debts grouped by cashier
pub async fn overdue_report(
    pool: &PgPool,
    principal: &Principal,
    today: NaiveDate,
) -> Result<Vec<OverdueGroup>, DebtError> {
    let items = queries::debt::list_overdue_items(pool, principal.cashier_scope(), today).await?;
    Ok(group_overdue(items))
}

/// Everything that happened on one calendar day
pub async fn daily_operations(
    pool: &PgPool,
    principal: &Principal,
    date: NaiveDate,
) -> Result<DailyOperations, DebtError> {
    let scope = principal.cashier_scope();

    let debts_given = queries::debt::list_items_on(pool, scope, DebtEvent::Given, date).await?;
    let debts_paid = queries::debt::list_items_on(pool, scope, DebtEvent::Paid, date).await?;
    let debts_deleted = queries::debt::list_items_on(pool, scope, DebtEvent::Deleted, date).await?;
    let payments = queries::payment::list_payments_on(pool, scope, date).await?;

    Ok(summarize_day(date, debts_given, debts_paid, debts_deleted, payments))
}

// =============================================================================
// AGGREGATION
// =============================================================================

fn total_remaining(debts: &[Debt]) -> Decimal {
    debts.iter().map(Debt::remaining_amount).sum()
}

/// Group overdue items by cashier, keeping the order in which cashiers
/// first appear
pub fn group_overdue(items: Vec<DebtListItem>) -> Vec<OverdueGroup> {
    let mut groups: Vec<OverdueGroup> = Vec::new();

    for item in items {
        let cashier_id = item.debt.cashier_id;
        let remaining = item.debt.remaining_amount();

        let position = groups.iter().position(|g| g.cashier_id == cashier_id);
        let group = match position {
            Some(idx) => &mut groups[idx],
            None => {
                groups.push(OverdueGroup {
                    cashier_id,
                    cashier_name: item.cashier_name.clone(),
                    debts: Vec::new(),
                    total_remaining: Decimal::ZERO,
                });
                let last = groups.len() - 1;
                &mut groups[last]
            }
        };

        group.total_remaining += remaining;
        group.debts.push(item);
    }

    groups
}

/// Build the day summary.
///
/// Money received counts every partial payment plus, for debts marked paid
/// that day without a payment that day, the amount they still had open.
pub fn summarize_day(
    date: NaiveDate,
    debts_given: Vec<DebtListItem>,
    debts_paid: Vec<DebtListItem>,
    debts_deleted: Vec<DebtListItem>,
    payments: Vec<Payment>,
) -> DailyOperations {
    let total_given: Decimal = debts_given.iter().map(|d| d.debt.amount).sum();

    let paid_by_payment: HashSet<Uuid> = payments.iter().map(|p| p.debt_id).collect();
    let partial_total: Decimal = payments.iter().map(|p| p.amount).sum();
    let settled_total: Decimal = debts_paid
        .iter()
        .filter(|d| d.debt.is_paid && !paid_by_payment.contains(&d.debt.id))
        .map(|d| d.debt.remaining_amount())
        .sum();

    DailyOperations {
        date,
        debts_given,
        debts_paid,
        debts_deleted,
        payments,
        total_given,
        total_received: partial_total + settled_total,
    }
}
