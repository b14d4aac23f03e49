//! Customer import pipeline
//!
//! raw file bytes -> reader (CSV / spreadsheet) -> column normalizer ->
//! name parser (for rows without name fields) -> row importer -> result

pub mod columns;
pub mod importer;
pub mod names;
pub mod reader;

use std::path::Path;

use crate::services::customer_store::CustomerStore;
use crate::types::{ImportOptions, ImportResult};

pub use columns::{normalize_column_name, normalize_headers};
pub use importer::import_customers;
pub use names::{parse_counterparty, ParsedName};
pub use reader::{parse_bytes, read_import_file, FileKind, ImportError};

/// Read a file and import its rows. Fails only on batch-level problems;
/// row problems end up in [`ImportResult::errors`].
pub async fn import_file(
    store: &dyn CustomerStore,
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportResult, ImportError> {
    let rows = read_import_file(path)?;
    Ok(import_customers(store, &rows, options).await)
}

/// Import already-loaded file bytes (e.g. an upload)
pub async fn import_bytes(
    store: &dyn CustomerStore,
    kind: FileKind,
    bytes: &[u8],
    options: &ImportOptions,
) -> Result<ImportResult, ImportError> {
    let rows = parse_bytes(kind, bytes)?;
    Ok(import_customers(store, &rows, options).await)
}
