//! `customer` subcommand handlers

use anyhow::Result;
use sqlx::PgPool;

use crate::auth;
use crate::cli::CustomerCommand;
use crate::services::customer_store::PgCustomerStore;
use crate::services::customers;
use crate::types::customer::{Customer, CustomerChanges, NewCustomer};

/// One customer per line: id, full name, place, then contact details
pub fn format_customer_line(customer: &Customer) -> String {
    let mut line = format!("{}  {}", customer.id, customer);
    if let Some(phone) = customer.phone.as_deref().filter(|p| !p.is_empty()) {
        line.push_str(&format!("  tel: {}", phone));
    }
    if let Some(address) = customer.address.as_deref().filter(|a| !a.is_empty()) {
        line.push_str(&format!("  addr: {}", address));
    }
    line
}

pub async fn handle_customer_command(pool: &PgPool, command: CustomerCommand) -> Result<()> {
    let store = PgCustomerStore::new(pool.clone());

    match command {
        CustomerCommand::Add { as_user, surname, name, patronymic, place, phone, address } => {
            let principal = auth::resolve_principal(pool, &as_user).await?;
            let customer = NewCustomer { name, surname, patronymic, place, phone, address };
            let outcome = customers::add_customer(&store, &principal, &customer).await?;
            if outcome.created {
                println!("Customer added: {}", format_customer_line(&outcome.customer));
            } else {
                println!("Customer already exists: {}", format_customer_line(&outcome.customer));
            }
        }

        CustomerCommand::List { as_user, search } => {
            auth::resolve_principal(pool, &as_user).await?;
            let found = customers::search_customers(&store, search.as_deref()).await?;
            if found.is_empty() {
                println!("No customers found");
            }
            for customer in &found {
                println!("{}", format_customer_line(customer));
            }
        }

        CustomerCommand::Edit { as_user, customer_id, name, surname, patronymic, place, phone, address } => {
            let principal = auth::resolve_principal(pool, &as_user).await?;
            let changes = CustomerChanges { name, surname, patronymic, place, phone, address };
            let updated = customers::edit_customer(&store, &principal, customer_id, &changes).await?;
            println!("Customer updated: {}", format_customer_line(&updated));
        }
    }

    Ok(())
}
