//! Command handlers

pub mod admin;
pub mod customer;
pub mod debt;
pub mod import;
pub mod report;

use anyhow::Result;
use tracing::info;

use crate::admin::NewAccount;
use crate::cli::Command;
use crate::config::Config;
use crate::db;

/// Dispatch a parsed command
pub async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Migrate => {
            db::connect(config).await?;
            info!("Migrations applied");
        }

        // Connects on its own: a dry run never touches the database
        Command::ImportCustomers(args) => {
            import::handle_import_customers(args, config).await?;
        }

        Command::CheckOverdueDebts { as_user, today } => {
            let pool = db::connect(config).await?;
            report::handle_check_overdue(&pool, as_user.as_deref(), today).await?;
        }

        Command::Customer(customer_command) => {
            let pool = db::connect(config).await?;
            customer::handle_customer_command(&pool, customer_command).await?;
        }

        Command::Debt(debt_command) => {
            let pool = db::connect(config).await?;
            debt::handle_debt_command(&pool, debt_command).await?;
        }

        Command::Operations { as_user, date } => {
            let pool = db::connect(config).await?;
            report::handle_operations(&pool, &as_user, date).await?;
        }

        Command::CreateCashier { username, name, surname, phone, email, admin: as_admin, password } => {
            let pool = db::connect(config).await?;
            let account = NewAccount {
                username,
                name,
                surname,
                phone,
                email,
                role: admin::role_for(as_admin),
            };
            admin::handle_create_cashier(&pool, account, password).await?;
        }

        Command::ResetPassword { username, password, list } => {
            let pool = db::connect(config).await?;
            admin::handle_reset_password(&pool, username, password, list).await?;
        }
    }

    Ok(())
}
