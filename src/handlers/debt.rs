//! `debt` subcommand handlers

use anyhow::Result;
use sqlx::PgPool;

use crate::auth;
use crate::cli::DebtCommand;
use crate::handlers::report::format_debt_line;
use crate::services::debts;
use crate::types::debt::{CreateDebtRequest, CreatePaymentRequest, DebtFilter};

/// Paid-state filter from the `--paid` / `--unpaid` flags
fn paid_filter(paid: bool, unpaid: bool) -> Option<bool> {
    match (paid, unpaid) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

pub async fn handle_debt_command(pool: &PgPool, command: DebtCommand) -> Result<()> {
    match command {
        DebtCommand::Add { as_user, customer, amount, promise_date, description } => {
            let principal = auth::resolve_principal(pool, &as_user).await?;
            let req = CreateDebtRequest {
                customer_id: customer,
                amount,
                promise_date,
                description: description.filter(|d| !d.trim().is_empty()),
            };
            let debt = debts::record_debt(pool, &principal, &req).await?;
            println!("Debt recorded: {} ({:.2} due {})", debt.id, debt.amount, debt.promise_date);
        }

        DebtCommand::Pay { as_user, debt_id, amount, method, notes } => {
            let principal = auth::resolve_principal(pool, &as_user).await?;
            let req = CreatePaymentRequest {
                amount,
                payment_method: method,
                payment_date: None,
                notes,
            };
            let outcome = debts::record_payment(pool, &principal, debt_id, &req).await?;
            println!("Payment recorded: {:.2} ({})", outcome.payment.amount, method);
            if outcome.settled {
                println!("Debt {} is now fully paid", debt_id);
            }
        }

        DebtCommand::MarkPaid { as_user, debt_id, method } => {
            let principal = auth::resolve_principal(pool, &as_user).await?;
            let debt = debts::mark_paid(pool, &principal, debt_id, method).await?;
            println!("Debt {} marked as paid ({})", debt.id, method);
        }

        DebtCommand::PayAll { as_user, debt_id, method } => {
            let principal = auth::resolve_principal(pool, &as_user).await?;
            let outcome = debts::pay_all_for_customer(pool, &principal, debt_id, method).await?;
            if outcome.count == 0 {
                println!("This customer has no unpaid debts");
            } else {
                println!(
                    "{} debt(s) paid. Total amount: {:.2}. Payment method: {}",
                    outcome.count, outcome.total_settled, method
                );
            }
        }

        DebtCommand::Delete { as_user, debt_id } => {
            let principal = auth::resolve_principal(pool, &as_user).await?;
            debts::soft_delete(pool, &principal, debt_id).await?;
            println!("Debt {} deleted", debt_id);
        }

        DebtCommand::List { as_user, include_deleted, unpaid, paid, customer, from, to } => {
            let principal = auth::resolve_principal(pool, &as_user).await?;
            let filter = DebtFilter {
                include_deleted,
                paid: paid_filter(paid, unpaid),
                from,
                to,
                customer_id: customer,
            };
            let items = debts::list_debts(pool, &principal, &filter).await?;
            if items.is_empty() {
                println!("No debts found");
            }
            for item in &items {
                println!("{}", format_debt_line(item));
            }
        }
    }

    Ok(())
}
