//! `check-overdue-debts` and `operations` command handlers

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::auth::{self, Principal};
use crate::services::debts;
use crate::types::debt::{DailyOperations, DebtListItem, OverdueGroup};

const RULE_WIDTH: usize = 80;
const NOTES_PREVIEW_CHARS: usize = 50;

/// Handle `check-overdue-debts`
pub async fn handle_check_overdue(
    pool: &PgPool,
    as_user: Option<&str>,
    today: Option<NaiveDate>,
) -> Result<()> {
    let principal = match as_user {
        Some(username) => auth::resolve_principal(pool, username).await?,
        None => Principal::system(),
    };
    let today = today.unwrap_or_else(|| Utc::now().date_naive());

    let groups = debts::overdue_report(pool, &principal, today).await?;
    print!("{}", format_overdue_report(&groups, today));
    Ok(())
}

/// Handle `operations`
pub async fn handle_operations(pool: &PgPool, as_user: &str, date: Option<NaiveDate>) -> Result<()> {
    let principal = auth::resolve_principal(pool, as_user).await?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());

    let ops = debts::daily_operations(pool, &principal, date).await?;
    print!("{}", format_daily_operations(&ops));
    Ok(())
}

/// Reminder listing, one block per cashier
pub fn format_overdue_report(groups: &[OverdueGroup], today: NaiveDate) -> String {
    let total: usize = groups.iter().map(|g| g.debts.len()).sum();
    if total == 0 {
        return "No overdue debts found!\n".to_string();
    }

    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!("OVERDUE DEBT REMINDERS ({total} total)\n{rule}\n");

    for group in groups {
        out.push_str(&format!("\nCashier: {}\n", group.cashier_name));
        out.push_str(&format!("   Total Overdue Debts: {}\n", group.debts.len()));
        out.push_str(&format!("   Total Remaining: {}\n", money(group.total_remaining)));
        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');

        for item in &group.debts {
            let debt = &item.debt;
            out.push_str(&format!("   * {}\n", item.customer_display()));
            out.push_str(&format!(
                "     Remaining: {} | Promise Date: {} | Days Overdue: {}\n",
                money(debt.remaining_amount()),
                debt.promise_date,
                debt.days_overdue(today)
            ));
            if let Some(notes) = debt.description.as_deref().filter(|d| !d.trim().is_empty()) {
                out.push_str(&format!("     Notes: {}\n", preview(notes)));
            }
        }
    }

    out.push_str(&format!("{rule}\nPlease follow up with customers to collect overdue payments.\n"));
    out
}

/// Day summary with one section per event kind
pub fn format_daily_operations(ops: &DailyOperations) -> String {
    let mut out = format!("Operations on {}\n{}\n", ops.date, "=".repeat(RULE_WIDTH));

    push_section(&mut out, "Debts given", &ops.debts_given);
    push_section(&mut out, "Debts paid", &ops.debts_paid);
    push_section(&mut out, "Debts deleted", &ops.debts_deleted);

    out.push_str(&format!("\nPartial payments ({})\n", ops.payments.len()));
    for payment in &ops.payments {
        out.push_str(&format!(
            "   {} {} debt {} ({})\n",
            payment.payment_date.format("%H:%M"),
            money(payment.amount),
            payment.debt_id,
            payment.payment_method
        ));
    }

    out.push_str(&format!(
        "\nTotal given: {}\nTotal received: {}\nDeleted: {}\n",
        money(ops.total_given),
        money(ops.total_received),
        ops.debts_deleted.len()
    ));
    out
}

/// One-line debt summary shared by listings
pub fn format_debt_line(item: &DebtListItem) -> String {
    let debt = &item.debt;
    let status = if debt.is_deleted {
        "deleted"
    } else if debt.is_paid {
        "paid"
    } else {
        "open"
    };
    format!(
        "{} {} {:<30} {:>10} {:>10} due {} [{}] by {}",
        debt.id,
        debt.date_given.format("%Y-%m-%d"),
        item.customer_display(),
        money(debt.amount),
        money(debt.remaining_amount()),
        debt.promise_date,
        status,
        item.cashier_username
    )
}

fn push_section(out: &mut String, title: &str, items: &[DebtListItem]) {
    out.push_str(&format!("\n{} ({})\n", title, items.len()));
    for item in items {
        out.push_str("   ");
        out.push_str(&format_debt_line(item));
        out.push('\n');
    }
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn preview(text: &str) -> String {
    if text.chars().count() > NOTES_PREVIEW_CHARS {
        let cut: String = text.chars().take(NOTES_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::debts::{group_overdue, summarize_day};
    use crate::types::debt::fixtures::debt;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(amount: &str, paid: &str, promise: NaiveDate, description: Option<&str>) -> DebtListItem {
        let mut d = debt(amount, paid, promise);
        d.description = description.map(str::to_string);
        DebtListItem {
            debt: d,
            customer_name: "Elvin".to_string(),
            customer_surname: "Hüseynov".to_string(),
            customer_place: "Xırdalan".to_string(),
            cashier_username: "kassir1".to_string(),
            cashier_name: "Günel Abbasova".to_string(),
        }
    }

    #[test]
    fn empty_overdue_report() {
        assert_eq!(format_overdue_report(&[], date(2025, 4, 1)), "No overdue debts found!\n");
    }

    #[test]
    fn overdue_report_lists_remaining_and_days() {
        let long_note = "x".repeat(60);
        let groups = group_overdue(vec![item(
            "80.00",
            "30.00",
            date(2025, 3, 20),
            Some(&long_note),
        )]);
        let text = format_overdue_report(&groups, date(2025, 4, 1));

        assert!(text.starts_with("OVERDUE DEBT REMINDERS (1 total)"));
        assert!(text.contains("Cashier: Günel Abbasova"));
        assert!(text.contains("Total Remaining: 50.00"));
        assert!(text.contains("* Elvin Hüseynov (Xırdalan)"));
        assert!(text.contains("Days Overdue: 12"));
        assert!(text.contains(&format!("Notes: {}...", "x".repeat(50))));
    }

    #[test]
    fn daily_operations_shows_totals() {
        let day = date(2025, 4, 1);
        let ops = summarize_day(
            day,
            vec![item("25.00", "0", day, None)],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );
        let text = format_daily_operations(&ops);

        assert!(text.starts_with("Operations on 2025-04-01"));
        assert!(text.contains("Debts given (1)"));
        assert!(text.contains("Partial payments (0)"));
        assert!(text.contains("Total given: 25.00"));
        assert!(text.contains("Total received: 0.00"));
    }

    #[test]
    fn debt_line_shows_status() {
        let mut it = item("10", "0", date(2025, 4, 1), None);
        assert!(format_debt_line(&it).contains("[open]"));
        it.debt.is_paid = true;
        assert!(format_debt_line(&it).contains("[paid]"));
        it.debt.is_deleted = true;
        assert!(format_debt_line(&it).contains("[deleted]"));
    }

    #[test]
    fn preview_truncates_on_characters() {
        assert_eq!(preview("qısa"), "qısa");
        let long = "ə".repeat(51);
        assert_eq!(preview(&long), format!("{}...", "ə".repeat(50)));
    }
}
