//! `import-customers` command handler

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::ImportArgs;
use crate::config::Config;
use crate::db;
use crate::services::customer_store::{CustomerStore, MemoryCustomerStore, PgCustomerStore};
use crate::services::import;
use crate::types::import::{ImportOptions, ImportResult};

/// Errors shown in the plain-text summary
const SUMMARY_ERROR_LIMIT: usize = 10;

/// Build import options from flags, falling back to configuration
pub fn options_from_args(args: &ImportArgs, config: &Config) -> ImportOptions {
    let default_place = args
        .default_place
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(&config.import_default_place)
        .to_string();

    ImportOptions {
        skip_duplicates: args.skip_duplicates,
        skip_empty: !args.keep_empty,
        default_place,
    }
}

/// Handle `import-customers`
pub async fn handle_import_customers(args: ImportArgs, config: &Config) -> Result<()> {
    let options = options_from_args(&args, config);
    info!(
        "Importing {} (skip_duplicates={}, skip_empty={}, default_place={}, dry_run={})",
        args.file.display(),
        options.skip_duplicates,
        options.skip_empty,
        options.default_place,
        args.dry_run
    );

    let result = if args.dry_run {
        let store = MemoryCustomerStore::new();
        run_import(&store, &args, &options).await?
    } else {
        let pool = db::connect(config).await?;
        let store = PgCustomerStore::new(pool);
        run_import(&store, &args, &options).await?
    };

    if result.has_errors() {
        warn!("{} row(s) of {} could not be imported", result.errors.len(), args.file.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if args.dry_run {
            println!("Dry run: nothing was written to the database");
        }
        print!("{}", result.summary(SUMMARY_ERROR_LIMIT));
    }

    Ok(())
}

async fn run_import(
    store: &dyn CustomerStore,
    args: &ImportArgs,
    options: &ImportOptions,
) -> Result<ImportResult> {
    import::import_file(store, &args.file, options)
        .await
        .with_context(|| format!("Failed to import {}", args.file.display()))
}
