//! Customer import types

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::customer::DEFAULT_PLACE;

/// Canonical column of a customer import file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportField {
    Name,
    Surname,
    Patronymic,
    Place,
    Phone,
    Address,
    Counterparty,
}

impl ImportField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportField::Name => "name",
            ImportField::Surname => "surname",
            ImportField::Patronymic => "patronymic",
            ImportField::Place => "place",
            ImportField::Phone => "phone",
            ImportField::Address => "address",
            ImportField::Counterparty => "counterparty",
        }
    }
}

impl fmt::Display for ImportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A header cell after normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportColumn {
    Field(ImportField),
    /// Unrecognized header, kept under its original text
    Extra(String),
    /// Blank header, the column is ignored
    Ignored,
}

/// One source row with a fixed set of canonical fields.
///
/// Built once at the column-normalization boundary. A canonical column that
/// exists but is blank holds `Some("")`; a missing column is `None`. Reads go
/// through [`ImportRow::get`], which trims and treats blank as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
    pub place: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub counterparty: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl ImportRow {
    /// Build a row from normalized columns and the raw cell values.
    ///
    /// Cells beyond the header width are dropped. A later column mapped to
    /// the same field only wins when it is non-blank.
    pub fn from_cells<S: AsRef<str>>(columns: &[ImportColumn], cells: &[S]) -> Self {
        let mut row = ImportRow::default();
        for (column, cell) in columns.iter().zip(cells) {
            let value = cell.as_ref().trim();
            match column {
                ImportColumn::Field(field) => row.set(*field, value),
                ImportColumn::Extra(header) => {
                    if !value.is_empty() || !row.extra.contains_key(header) {
                        row.extra.insert(header.clone(), value.to_string());
                    }
                }
                ImportColumn::Ignored => {}
            }
        }
        row
    }

    /// Set a canonical field; blank values never overwrite existing ones but
    /// still mark the column as present
    pub fn set(&mut self, field: ImportField, value: &str) {
        let value = value.trim();
        let slot = self.slot_mut(field);
        if !value.is_empty() {
            *slot = Some(value.to_string());
        } else if slot.is_none() {
            *slot = Some(String::new());
        }
    }

    pub fn get(&self, field: ImportField) -> Option<&str> {
        let value = match field {
            ImportField::Name => &self.name,
            ImportField::Surname => &self.surname,
            ImportField::Patronymic => &self.patronymic,
            ImportField::Place => &self.place,
            ImportField::Phone => &self.phone,
            ImportField::Address => &self.address,
            ImportField::Counterparty => &self.counterparty,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    fn slot_mut(&mut self, field: ImportField) -> &mut Option<String> {
        match field {
            ImportField::Name => &mut self.name,
            ImportField::Surname => &mut self.surname,
            ImportField::Patronymic => &mut self.patronymic,
            ImportField::Place => &mut self.place,
            ImportField::Phone => &mut self.phone,
            ImportField::Address => &mut self.address,
            ImportField::Counterparty => &mut self.counterparty,
        }
    }

    pub fn has_counterparty_column(&self) -> bool {
        self.counterparty.is_some()
    }

    /// Every column key of this row, blank or not, canonical fields first
    pub fn keys(&self) -> Vec<String> {
        let canonical = [
            (ImportField::Name, &self.name),
            (ImportField::Surname, &self.surname),
            (ImportField::Patronymic, &self.patronymic),
            (ImportField::Place, &self.place),
            (ImportField::Phone, &self.phone),
            (ImportField::Address, &self.address),
            (ImportField::Counterparty, &self.counterparty),
        ];
        canonical
            .into_iter()
            .filter(|(_, value)| value.is_some())
            .map(|(field, _)| field.as_str().to_string())
            .chain(self.extra.keys().cloned())
            .collect()
    }
}

/// Knobs of a customer import run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Skip rows matching an existing customer instead of merging into it
    pub skip_duplicates: bool,
    /// Silently skip rows with neither surname nor counterparty
    pub skip_empty: bool,
    /// Place used for rows without one
    pub default_place: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skip_duplicates: true,
            skip_empty: true,
            default_place: DEFAULT_PLACE.to_string(),
        }
    }
}

/// Outcome of an import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub imported: u32,
    pub skipped: u32,
    pub created_new: u32,
    pub updated_existing: u32,
    /// Row-numbered messages in source order
    pub errors: Vec<String>,
}

impl ImportResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Plain-text summary listing at most `error_limit` errors
    pub fn summary(&self, error_limit: usize) -> String {
        let mut report = format!("Successfully imported {} customer(s)\n", self.imported);
        report.push_str(&format!(
            "  created: {}, updated: {}\n",
            self.created_new, self.updated_existing
        ));
        if self.skipped > 0 {
            report.push_str(&format!("Skipped {} row(s)\n", self.skipped));
        }

        if !self.errors.is_empty() {
            report.push_str(&format!("Encountered {} error(s):\n", self.errors.len()));
            for err in self.errors.iter().take(error_limit) {
                report.push_str(&format!("  - {}\n", err));
            }
            if self.errors.len() > error_limit {
                report.push_str(&format!(
                    "  ... and {} more errors\n",
                    self.errors.len() - error_limit
                ));
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ImportColumn> {
        vec![
            ImportColumn::Field(ImportField::Counterparty),
            ImportColumn::Field(ImportField::Place),
            ImportColumn::Extra("Сумма".to_string()),
            ImportColumn::Ignored,
        ]
    }

    #[test]
    fn from_cells_trims_and_keeps_extras() {
        let row = ImportRow::from_cells(&columns(), &["  Иванов Иван ", "Baku", " 12.50 ", "x"]);
        assert_eq!(row.counterparty.as_deref(), Some("Иванов Иван"));
        assert_eq!(row.place.as_deref(), Some("Baku"));
        assert_eq!(row.extra.get("Сумма").map(String::as_str), Some("12.50"));
        assert_eq!(row.extra.len(), 1);
    }

    #[test]
    fn blank_counterparty_column_is_present_but_empty() {
        let row = ImportRow::from_cells(&columns(), &["   ", "Baku"]);
        assert!(row.has_counterparty_column());
        assert_eq!(row.get(ImportField::Counterparty), None);
    }

    #[test]
    fn later_blank_column_does_not_clear_earlier_value() {
        let cols = vec![
            ImportColumn::Field(ImportField::Place),
            ImportColumn::Field(ImportField::Place),
        ];
        let row = ImportRow::from_cells(&cols, &["Gəncə", ""]);
        assert_eq!(row.place.as_deref(), Some("Gəncə"));

        let row = ImportRow::from_cells(&cols, &["Gəncə", "Sumqayıt"]);
        assert_eq!(row.place.as_deref(), Some("Sumqayıt"));
    }

    #[test]
    fn keys_lists_canonical_then_extra() {
        let row = ImportRow::from_cells(&columns(), &["", "Baku", "1"]);
        assert_eq!(row.keys(), vec!["place", "counterparty", "Сумма"]);
    }

    #[test]
    fn keys_include_blank_canonical_columns() {
        let cols = vec![
            ImportColumn::Field(ImportField::Phone),
            ImportColumn::Field(ImportField::Place),
            ImportColumn::Extra("Примечание".to_string()),
        ];
        let row = ImportRow::from_cells(&cols, &["", " ", ""]);
        assert_eq!(row.keys(), vec!["place", "phone", "Примечание"]);
        assert_eq!(row.get(ImportField::Place), None);
        assert!(!row.has_counterparty_column());
    }

    #[test]
    fn get_trims_values_set_directly() {
        let row = ImportRow {
            place: Some("  ".to_string()),
            counterparty: Some(" Иванов Иван ".to_string()),
            ..Default::default()
        };
        assert_eq!(row.get(ImportField::Place), None);
        assert_eq!(row.get(ImportField::Counterparty), Some("Иванов Иван"));
    }

    #[test]
    fn summary_caps_error_listing() {
        let result = ImportResult {
            imported: 3,
            skipped: 1,
            created_new: 2,
            updated_existing: 1,
            errors: (2..15).map(|i| format!("Row {i}: Surname is required")).collect(),
        };
        let text = result.summary(10);
        assert!(text.contains("Successfully imported 3 customer(s)"));
        assert!(text.contains("Skipped 1 row(s)"));
        assert!(text.contains("Row 11: Surname is required"));
        assert!(!text.contains("Row 12: Surname is required"));
        assert!(text.contains("... and 3 more errors"));
    }

    #[test]
    fn default_options_skip_duplicates_and_empty_rows() {
        let opts = ImportOptions::default();
        assert!(opts.skip_duplicates);
        assert!(opts.skip_empty);
        assert_eq!(opts.default_place, "Unknown");
    }
}
