//! Row importer: validate, de-duplicate and upsert normalized rows
//!
//! Rows are processed strictly in order, one store call at a time. Each
//! create/update is its own write; a failing row is recorded and the batch
//! moves on, so partial imports are normal.

use tracing::{debug, info, warn};

use crate::services::customer_store::{CustomerStore, StoreError};
use crate::types::{
    ContactBackfill, CreateCustomerRequest, CustomerIdentity, ImportField, ImportOptions,
    ImportResult, ImportRow,
};

use super::names::{is_usable_counterparty, parse_counterparty};

/// Source row number of the first data row (row 1 is the header)
pub const FIRST_DATA_ROW: usize = 2;

/// Max characters of the counterparty quoted in an error message
const COUNTERPARTY_PREVIEW_CHARS: usize = 50;

/// Max column names listed when a row has no counterparty column
const COLUMN_PREVIEW_COUNT: usize = 5;

/// Outcome of a single row
#[derive(Debug, Clone, PartialEq, Eq)]
enum RowOutcome {
    Created,
    /// Matched an existing customer; `true` when phone/address were filled
    Merged { backfilled: bool },
    Skipped,
}

/// Name fields resolved for one row
#[derive(Debug, Default)]
struct ResolvedName {
    name: Option<String>,
    surname: Option<String>,
    patronymic: Option<String>,
}

/// Import normalized rows into the customer store
pub async fn import_customers(
    store: &dyn CustomerStore,
    rows: &[ImportRow],
    options: &ImportOptions,
) -> ImportResult {
    let mut result = ImportResult::default();

    for (idx, row) in rows.iter().enumerate() {
        let row_number = idx + FIRST_DATA_ROW;

        match import_row(store, row, options).await {
            Ok(RowOutcome::Created) => {
                result.imported += 1;
                result.created_new += 1;
            }
            Ok(RowOutcome::Merged { backfilled }) => {
                result.imported += 1;
                if backfilled {
                    result.updated_existing += 1;
                }
            }
            Ok(RowOutcome::Skipped) => {
                debug!("Row {}: skipped", row_number);
                result.skipped += 1;
            }
            Err(message) => {
                debug!("Row {}: {}", row_number, message);
                result.errors.push(format!("Row {}: {}", row_number, message));
            }
        }
    }

    info!(
        "Customer import via {} store: {} imported ({} new, {} updated), {} skipped, {} errors",
        store.name(),
        result.imported,
        result.created_new,
        result.updated_existing,
        result.skipped,
        result.errors.len()
    );

    result
}

async fn import_row(
    store: &dyn CustomerStore,
    row: &ImportRow,
    options: &ImportOptions,
) -> Result<RowOutcome, String> {
    let resolved = resolve_name(row);

    let surname = match resolved.surname {
        Some(surname) => surname,
        None => {
            if options.skip_empty && row.get(ImportField::Counterparty).is_none() {
                return Ok(RowOutcome::Skipped);
            }
            return Err(format!("Surname is required{}", missing_surname_context(row)));
        }
    };

    let place = row
        .get(ImportField::Place)
        .map(str::to_string)
        .unwrap_or_else(|| options.default_place.clone());
    let phone = row.get(ImportField::Phone).map(str::to_string);
    let address = row.get(ImportField::Address).map(str::to_string);

    let identity = CustomerIdentity::new(
        resolved.name.as_deref().unwrap_or(""),
        &surname,
        resolved.patronymic.as_deref(),
        &place,
    );
    let request = CreateCustomerRequest {
        identity,
        phone,
        address,
    };

    if options.skip_duplicates {
        let existing = store
            .find_by_identity(&request.identity)
            .await
            .map_err(|e| format!("Could not check for duplicates: {}", e))?;
        if existing.is_some() {
            return Ok(RowOutcome::Skipped);
        }
    }

    match store.create(&request).await {
        Ok(_) => Ok(RowOutcome::Created),
        Err(StoreError::UniqueViolation(_)) if options.skip_duplicates => {
            // Lost a race with a concurrent import between lookup and insert
            Ok(RowOutcome::Skipped)
        }
        Err(StoreError::UniqueViolation(_)) => merge_into_existing(store, &request).await,
        Err(e) => Err(format!("Could not create customer: {}", e)),
    }
}

/// Resolve the conflict left by a unique violation: backfill contact fields
/// the existing customer lacks, never overwriting stored values
async fn merge_into_existing(
    store: &dyn CustomerStore,
    request: &CreateCustomerRequest,
) -> Result<RowOutcome, String> {
    let existing = store
        .find_by_identity(&request.identity)
        .await
        .map_err(|e| format!("Error updating existing customer: {}", e))?
        .ok_or_else(|| "Unique constraint violation but customer not found".to_string())?;

    let backfill = ContactBackfill::for_existing(
        &existing,
        request.phone.as_deref(),
        request.address.as_deref(),
    );
    if backfill.is_empty() {
        return Ok(RowOutcome::Merged { backfilled: false });
    }

    store
        .backfill_contact(existing.id, &backfill)
        .await
        .map_err(|e| {
            warn!("Backfill of customer {} failed: {}", existing.id, e);
            format!("Error updating existing customer: {}", e)
        })?;

    Ok(RowOutcome::Merged { backfilled: true })
}

/// Take name fields from the row, filling gaps from the counterparty
fn resolve_name(row: &ImportRow) -> ResolvedName {
    let mut resolved = ResolvedName {
        name: row.get(ImportField::Name).map(str::to_string),
        surname: row.get(ImportField::Surname).map(str::to_string),
        patronymic: row.get(ImportField::Patronymic).map(str::to_string),
    };

    let counterparty = match row.get(ImportField::Counterparty) {
        Some(value) if is_usable_counterparty(value) => value,
        _ => return resolved,
    };

    if resolved.name.is_none() || resolved.surname.is_none() {
        let parsed = parse_counterparty(counterparty);
        resolved.name = resolved.name.or(parsed.name);
        resolved.surname = resolved.surname.or(parsed.surname);
        resolved.patronymic = resolved.patronymic.or(parsed.patronymic);

        if resolved.surname.is_none() {
            resolved.surname = Some(counterparty.to_string());
        }
    }

    resolved
}

fn missing_surname_context(row: &ImportRow) -> String {
    if row.has_counterparty_column() {
        match row.get(ImportField::Counterparty) {
            Some(value) => {
                let preview: String = value.chars().take(COUNTERPARTY_PREVIEW_CHARS).collect();
                format!(" (counterparty: '{}')", preview)
            }
            None => " (counterparty is empty)".to_string(),
        }
    } else {
        let keys = row.keys();
        let shown: Vec<&str> = keys
            .iter()
            .take(COLUMN_PREVIEW_COUNT)
            .map(String::as_str)
            .collect();
        format!(" (available columns: {})", shown.join(", "))
    }
}
