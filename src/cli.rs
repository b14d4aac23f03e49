//! CLI argument parsing for the debtbook binary.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::debt::PaymentMethod;

#[derive(Parser)]
#[command(name = "debtbook", version, about = "Customer debt ledger and customer import tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run database migrations and exit
    Migrate,

    /// Import customers from a CSV or Excel file
    ImportCustomers(ImportArgs),

    /// Print overdue debt reminders grouped by cashier
    CheckOverdueDebts {
        /// Act as this user (defaults to every cashier's debts)
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: Option<String>,

        /// Reference date (defaults to today, UTC)
        #[arg(long, value_name = "YYYY-MM-DD")]
        today: Option<NaiveDate>,
    },

    /// Add, list and edit customers
    #[command(subcommand)]
    Customer(CustomerCommand),

    /// Debt ledger operations
    #[command(subcommand)]
    Debt(DebtCommand),

    /// Show debts given, paid and deleted on one day
    Operations {
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: String,

        /// Day to report (defaults to today, UTC)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },

    /// Create a cashier account (prompts for the password)
    CreateCashier {
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Create an administrator instead of a cashier
        #[arg(long)]
        admin: bool,
        /// Set the password without prompting
        #[arg(long)]
        password: Option<String>,
    },

    /// Reset a user's password, or list users
    ResetPassword {
        #[arg(long, required_unless_present = "list")]
        username: Option<String>,
        /// New password (a random one is generated when omitted)
        #[arg(long)]
        password: Option<String>,
        /// List all users instead
        #[arg(long, conflicts_with_all = ["username", "password"])]
        list: bool,
    },
}

#[derive(Args)]
pub struct ImportArgs {
    /// Path to a .csv, .xlsx or .xls file
    pub file: PathBuf,

    /// Skip rows matching an existing customer instead of merging contact data
    #[arg(long)]
    pub skip_duplicates: bool,

    /// Keep rows with an empty counterparty instead of skipping them
    #[arg(long)]
    pub keep_empty: bool,

    /// Place for customers without one (overrides IMPORT_DEFAULT_PLACE)
    #[arg(long, value_name = "PLACE")]
    pub default_place: Option<String>,

    /// Run against an empty in-memory store; touches no database
    #[arg(long)]
    pub dry_run: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum CustomerCommand {
    /// Add a customer, or show the existing one with the same name and place
    Add {
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: String,
        #[arg(long)]
        surname: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        patronymic: Option<String>,
        /// Defaults to "Unknown"
        #[arg(long)]
        place: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// List customers, optionally filtered by name, place or phone
    List {
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: String,
        #[arg(long)]
        search: Option<String>,
    },

    /// Edit a customer (administrators only); an empty value clears
    /// patronymic, phone or address
    Edit {
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: String,
        customer_id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        surname: Option<String>,
        #[arg(long)]
        patronymic: Option<String>,
        #[arg(long)]
        place: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DebtCommand {
    /// Record a new debt
    Add {
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: String,
        #[arg(long)]
        customer: Uuid,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, value_name = "YYYY-MM-DD")]
        promise_date: NaiveDate,
        #[arg(long)]
        description: Option<String>,
    },

    /// Record a partial payment
    Pay {
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: String,
        debt_id: Uuid,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, value_enum)]
        method: PaymentMethod,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark a debt paid in full
    MarkPaid {
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: String,
        debt_id: Uuid,
        #[arg(long, value_enum)]
        method: PaymentMethod,
    },

    /// Settle every open debt of the customer owing DEBT_ID
    PayAll {
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: String,
        debt_id: Uuid,
        #[arg(long, value_enum)]
        method: PaymentMethod,
    },

    /// Soft delete a debt
    Delete {
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: String,
        debt_id: Uuid,
    },

    /// List debts, newest first
    List {
        #[arg(long = "as", value_name = "USERNAME")]
        as_user: String,
        #[arg(long)]
        include_deleted: bool,
        #[arg(long, conflicts_with = "paid")]
        unpaid: bool,
        #[arg(long)]
        paid: bool,
        #[arg(long)]
        customer: Option<Uuid>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        from: Option<NaiveDate>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        to: Option<NaiveDate>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_migrate_command_parses() {
        let cli = Cli::parse_from(["debtbook", "migrate"]);
        assert!(matches!(cli.command, Command::Migrate));
    }

    #[test]
    fn test_cli_requires_a_command() {
        assert!(Cli::try_parse_from(["debtbook"]).is_err());
    }

    #[test]
    fn test_cli_import_defaults() {
        let cli = Cli::parse_from(["debtbook", "import-customers", "clients.xlsx"]);
        let Command::ImportCustomers(args) = cli.command else {
            panic!("expected import-customers");
        };
        assert_eq!(args.file, PathBuf::from("clients.xlsx"));
        assert!(!args.skip_duplicates);
        assert!(!args.keep_empty);
        assert!(!args.dry_run);
        assert!(args.default_place.is_none());
    }

    #[test]
    fn test_cli_import_flags() {
        let cli = Cli::parse_from([
            "debtbook",
            "import-customers",
            "clients.csv",
            "--skip-duplicates",
            "--keep-empty",
            "--default-place",
            "Sumqayıt",
            "--dry-run",
        ]);
        let Command::ImportCustomers(args) = cli.command else {
            panic!("expected import-customers");
        };
        assert!(args.skip_duplicates);
        assert!(args.keep_empty);
        assert!(args.dry_run);
        assert_eq!(args.default_place.as_deref(), Some("Sumqayıt"));
    }

    #[test]
    fn test_cli_debt_pay_parses() {
        let id = Uuid::new_v4();
        let id_arg = id.to_string();
        let cli = Cli::parse_from([
            "debtbook",
            "debt",
            "pay",
            "--as",
            "kassir1",
            id_arg.as_str(),
            "--amount",
            "12.50",
            "--method",
            "posterminal",
        ]);
        match cli.command {
            Command::Debt(DebtCommand::Pay { as_user, debt_id, amount, method, notes }) => {
                assert_eq!(as_user, "kassir1");
                assert_eq!(debt_id, id);
                assert_eq!(amount, Decimal::new(1250, 2));
                assert_eq!(method, PaymentMethod::Posterminal);
                assert!(notes.is_none());
            }
            _ => panic!("expected debt pay"),
        }
    }

    #[test]
    fn test_cli_customer_add_parses() {
        let cli = Cli::parse_from([
            "debtbook", "customer", "add", "--as", "kassir1", "--surname", "Məmmədov", "--name", "Əli",
            "--place", "Bakı",
        ]);
        match cli.command {
            Command::Customer(CustomerCommand::Add { as_user, surname, name, place, patronymic, .. }) => {
                assert_eq!(as_user, "kassir1");
                assert_eq!(surname, "Məmmədov");
                assert_eq!(name, "Əli");
                assert_eq!(place.as_deref(), Some("Bakı"));
                assert!(patronymic.is_none());
            }
            _ => panic!("expected customer add"),
        }
    }

    #[test]
    fn test_cli_customer_add_requires_surname() {
        assert!(Cli::try_parse_from(["debtbook", "customer", "add", "--as", "kassir1"]).is_err());
    }

    #[test]
    fn test_cli_customer_list_and_edit_parse() {
        let cli = Cli::parse_from(["debtbook", "customer", "list", "--as", "admin", "--search", "Quli"]);
        assert!(matches!(
            cli.command,
            Command::Customer(CustomerCommand::List { search: Some(ref s), .. }) if s == "Quli"
        ));

        let id = Uuid::new_v4().to_string();
        let cli = Cli::parse_from([
            "debtbook", "customer", "edit", "--as", "admin", id.as_str(), "--phone", "",
        ]);
        match cli.command {
            Command::Customer(CustomerCommand::Edit { phone, place, .. }) => {
                assert_eq!(phone.as_deref(), Some(""));
                assert!(place.is_none());
            }
            _ => panic!("expected customer edit"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_payment_method() {
        let id = Uuid::new_v4().to_string();
        let result = Cli::try_parse_from([
            "debtbook", "debt", "mark-paid", "--as", "kassir1", id.as_str(), "--method", "cheque",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_debt_list_filters() {
        let cli = Cli::parse_from([
            "debtbook", "debt", "list", "--as", "admin", "--unpaid", "--from", "2025-01-01",
        ]);
        match cli.command {
            Command::Debt(DebtCommand::List { unpaid, paid, from, include_deleted, .. }) => {
                assert!(unpaid);
                assert!(!paid);
                assert!(!include_deleted);
                assert_eq!(from, NaiveDate::from_ymd_opt(2025, 1, 1));
            }
            _ => panic!("expected debt list"),
        }
    }

    #[test]
    fn test_cli_reset_password_needs_username_or_list() {
        assert!(Cli::try_parse_from(["debtbook", "reset-password"]).is_err());
        assert!(Cli::try_parse_from(["debtbook", "reset-password", "--list"]).is_ok());
        assert!(Cli::try_parse_from(["debtbook", "reset-password", "--username", "kassir1"]).is_ok());
    }

    #[test]
    fn test_cli_check_overdue_optional_args() {
        let cli = Cli::parse_from(["debtbook", "check-overdue-debts", "--today", "2025-03-15"]);
        match cli.command {
            Command::CheckOverdueDebts { as_user, today } => {
                assert!(as_user.is_none());
                assert_eq!(today, NaiveDate::from_ymd_opt(2025, 3, 15));
            }
            _ => panic!("expected check-overdue-debts"),
        }
    }
}
