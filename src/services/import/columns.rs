//! Header normalization for 1C customer exports
//!
//! Maps localized, free-form column headers onto [`ImportField`]s. A header
//! matches a field when it equals one of its aliases or contains one; fields
//! are tried in table order and the first match wins. English "Surname" and
//! "Last name" therefore land on `name`, which 1C exports never rely on.

use crate::types::{ImportColumn, ImportField};

/// Known header aliases, in matching priority order
const FIELD_ALIASES: &[(ImportField, &[&str])] = &[
    (
        ImportField::Name,
        &["имя", "name", "firstname", "first name", "имя клиента", "название"],
    ),
    (
        ImportField::Surname,
        &["фамилия", "surname", "lastname", "last name", "фамилия клиента", "last"],
    ),
    (
        ImportField::Place,
        &["место", "place", "город", "city", "location", "адрес", "address", "откуда"],
    ),
    (
        ImportField::Phone,
        &["телефон", "phone", "tel", "телефон клиента", "phone number"],
    ),
    (
        ImportField::Address,
        &["адрес", "address", "полный адрес", "full address", "адрес клиента"],
    ),
    (
        ImportField::Patronymic,
        &["отчество", "patronymic", "middle name"],
    ),
    (
        ImportField::Counterparty,
        &["контрагент", "counterparty", "клиент", "client", "customer", "покупатель"],
    ),
];

/// Map a raw header to its canonical field, if it is recognized
pub fn normalize_column_name(header: &str) -> Option<ImportField> {
    let header = header.trim().to_lowercase();
    if header.is_empty() {
        return None;
    }

    FIELD_ALIASES
        .iter()
        .find(|(_, aliases)| {
            aliases.contains(&header.as_str()) || aliases.iter().any(|alias| header.contains(alias))
        })
        .map(|(field, _)| *field)
}

/// Normalize a whole header row. Unrecognized headers pass through as
/// [`ImportColumn::Extra`] so their values are kept.
pub fn normalize_headers<S: AsRef<str>>(headers: &[S]) -> Vec<ImportColumn> {
    headers
        .iter()
        .map(|header| {
            let header = header.as_ref().trim();
            if header.is_empty() {
                ImportColumn::Ignored
            } else {
                match normalize_column_name(header) {
                    Some(field) => ImportColumn::Field(field),
                    None => ImportColumn::Extra(header.to_string()),
                }
            }
        })
        .collect()
}
