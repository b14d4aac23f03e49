//! Debt and payment types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a debt or payment was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Posterminal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Posterminal => "posterminal",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "posterminal" => Ok(PaymentMethod::Posterminal),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

/// Debt entity, with the sum of its partial payments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    pub id: Uuid,
    pub cashier_id: Uuid,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub date_given: DateTime<Utc>,
    pub promise_date: NaiveDate,
    pub description: Option<String>,
    pub is_paid: bool,
    pub paid_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Sum of partial payments (computed by the query)
    pub paid_amount: Decimal,
}

impl Debt {
    pub fn remaining_amount(&self) -> Decimal {
        self.amount - self.paid_amount
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_paid && self.promise_date < today
    }

    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        if self.is_overdue(today) {
            (today - self.promise_date).num_days()
        } else {
            0
        }
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method.as_deref().and_then(|m| m.parse().ok())
    }
}

/// Debt joined with customer and cashier display data
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DebtListItem {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub debt: Debt,
    pub customer_name: String,
    pub customer_surname: String,
    pub customer_place: String,
    pub cashier_username: String,
    pub cashier_name: String,
}

impl DebtListItem {
    pub fn customer_display(&self) -> String {
        let name = format!("{} {}", self.customer_name, self.customer_surname);
        format!("{} ({})", name.trim(), self.customer_place)
    }
}

/// Request to record a new debt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDebtRequest {
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub promise_date: NaiveDate,
    pub description: Option<String>,
}

/// Partial payment entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub debt_id: Uuid,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: String,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Request to record a partial payment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    /// Defaults to now
    pub payment_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Explicit listing filter. Deleted debts are only returned when asked for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtFilter {
    pub include_deleted: bool,
    /// `Some(false)` = unpaid only, `Some(true)` = paid only
    pub paid: Option<bool>,
    /// Inclusive lower bound on `date_given` (calendar date, UTC)
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on `date_given` (calendar date, UTC)
    pub to: Option<NaiveDate>,
    pub customer_id: Option<Uuid>,
}

/// Overdue debts of one cashier
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueGroup {
    pub cashier_id: Uuid,
    pub cashier_name: String,
    pub debts: Vec<DebtListItem>,
    pub total_remaining: Decimal,
}

/// Everything that happened on one calendar day
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyOperations {
    pub date: NaiveDate,
    pub debts_given: Vec<DebtListItem>,
    pub debts_paid: Vec<DebtListItem>,
    pub debts_deleted: Vec<DebtListItem>,
    pub payments: Vec<Payment>,
    pub total_given: Decimal,
    pub total_received: Decimal,
}


#[cfg(test)]
mod tests {
    use super::fixtures::debt;
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn remaining_amount_subtracts_payments() {
        let d = debt("100.00", "35.50", date(2025, 3, 1));
        assert_eq!(d.remaining_amount(), "64.50".parse::<Decimal>().unwrap());
    }

    #[test]
    fn overdue_counts_days_past_promise() {
        let d = debt("10", "0", date(2025, 3, 1));
        assert!(d.is_overdue(date(2025, 3, 4)));
        assert_eq!(d.days_overdue(date(2025, 3, 4)), 3);
    }

    #[test]
    fn not_overdue_on_promise_date() {
        let d = debt("10", "0", date(2025, 3, 1));
        assert!(!d.is_overdue(date(2025, 3, 1)));
        assert_eq!(d.days_overdue(date(2025, 3, 1)), 0);
    }

    #[test]
    fn paid_debt_is_never_overdue() {
        let mut d = debt("10", "0", date(2025, 3, 1));
        d.is_paid = true;
        assert!(!d.is_overdue(date(2025, 6, 1)));
        assert_eq!(d.days_overdue(date(2025, 6, 1)), 0);
    }

    #[test]
    fn payment_method_parses_case_insensitively() {
        assert_eq!("Card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!(PaymentMethod::Posterminal.to_string(), "posterminal");
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}
