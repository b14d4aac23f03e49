//! End-to-end import: file bytes -> rows -> importer -> in-memory store

use std::io::Write;

use debtbook::services::customer_store::MemoryCustomerStore;
use debtbook::services::import::{import_bytes, import_file, FileKind, ImportError};
use debtbook::types::ImportOptions;

fn options(skip_duplicates: bool) -> ImportOptions {
    ImportOptions {
        skip_duplicates,
        skip_empty: true,
        default_place: "Unknown".to_string(),
    }
}

fn write_temp(suffix: &str, bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(bytes).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

#[tokio::test]
async fn test_1c_export_in_windows_1251_is_imported() {
    let csv = "Контрагент;Место;Телефон клиента\n\
               Иванов Иван Петрович;Baku;+994501112233\n\
               ;Baku;\n\
               0.0;Sumgait;\n";
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1251.encode(csv);
    assert!(!had_errors);

    let store = MemoryCustomerStore::new();
    let result = import_bytes(&store, FileKind::Csv, &bytes, &options(true))
        .await
        .unwrap();

    assert_eq!(result.imported, 1);
    assert_eq!(result.created_new, 1);
    assert_eq!(result.skipped, 1);
    assert_eq!(
        result.errors,
        vec!["Row 4: Surname is required (counterparty: '0.0')".to_string()]
    );

    let customers = store.all();
    assert_eq!(customers.len(), 1);
    let ivanov = &customers[0];
    assert_eq!(ivanov.surname, "Иванов");
    assert_eq!(ivanov.name, "Иван");
    assert_eq!(ivanov.patronymic.as_deref(), Some("Петрович"));
    assert_eq!(ivanov.place, "Baku");
    assert_eq!(ivanov.phone.as_deref(), Some("+994501112233"));
}

#[tokio::test]
async fn test_reimport_with_skip_duplicates_is_idempotent() {
    let csv = "Фамилия,Имя,Место\nMəmmədov,Əli,Bakı\n";
    let store = MemoryCustomerStore::new();

    let first = import_bytes(&store, FileKind::Csv, csv.as_bytes(), &options(true))
        .await
        .unwrap();
    let second = import_bytes(&store, FileKind::Csv, csv.as_bytes(), &options(true))
        .await
        .unwrap();

    assert_eq!(first.created_new, 1);
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_reimport_without_skip_backfills_missing_phone() {
    let without_phone = "Контрагент,Место,Телефон\nHəsənov Rauf,Gəncə,\n";
    let with_phone = "Контрагент,Место,Телефон\nHəsənov Rauf,Gəncə,0551234567\n";
    let store = MemoryCustomerStore::new();

    let first = import_bytes(&store, FileKind::Csv, without_phone.as_bytes(), &options(false))
        .await
        .unwrap();
    let second = import_bytes(&store, FileKind::Csv, with_phone.as_bytes(), &options(false))
        .await
        .unwrap();

    assert_eq!(first.imported + second.imported, 2);
    assert_eq!(first.created_new + second.created_new, 1);
    assert_eq!(second.updated_existing, 1);
    assert_eq!(store.len(), 1);
    assert_eq!(store.all()[0].phone.as_deref(), Some("0551234567"));
}

#[tokio::test]
async fn test_row_errors_do_not_stop_the_batch() {
    let csv = "Имя,Место\nAysel,Bakı\nNigar,Şəki\n";
    let store = MemoryCustomerStore::new();
    let mut opts = options(true);
    opts.skip_empty = false;

    let result = import_bytes(&store, FileKind::Csv, csv.as_bytes(), &opts)
        .await
        .unwrap();

    assert_eq!(result.imported, 0);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors[0].starts_with("Row 2: Surname is required (available columns:"));
    assert!(result.errors[1].starts_with("Row 3: "));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_import_from_csv_file_on_disk() {
    let file = write_temp(".csv", "Фамилия\tИмя\tCity\nQuliyev\tAnar\tLənkəran\n".as_bytes());
    let store = MemoryCustomerStore::new();

    let result = import_file(&store, file.path(), &options(true)).await.unwrap();

    assert_eq!(result.created_new, 1);
    let customer = &store.all()[0];
    assert_eq!(customer.surname, "Quliyev");
    assert_eq!(customer.name, "Anar");
    assert_eq!(customer.place, "Lənkəran");
}

#[tokio::test]
async fn test_english_surname_header_is_claimed_by_name() {
    let csv = "Surname,Контрагент,Адрес клиента\nQuliyev,Həsənov Rauf,Gəncə\n";
    let store = MemoryCustomerStore::new();

    let result = import_bytes(&store, FileKind::Csv, csv.as_bytes(), &options(true))
        .await
        .unwrap();

    assert_eq!(result.created_new, 1);
    let customer = &store.all()[0];
    assert_eq!(customer.name, "Quliyev");
    assert_eq!(customer.surname, "Həsənov");
    assert_eq!(customer.place, "Gəncə");
    assert_eq!(customer.address, None);
}

#[tokio::test]
async fn test_header_only_file_is_rejected() {
    let file = write_temp(".csv", b"Name,Surname\n");
    let store = MemoryCustomerStore::new();

    let err = import_file(&store, file.path(), &options(true)).await.unwrap_err();
    assert!(matches!(err, ImportError::NoDataRows(FileKind::Csv)));
}

#[tokio::test]
async fn test_unsupported_extension_is_rejected() {
    let file = write_temp(".txt", b"Name\nAnar\n");
    let store = MemoryCustomerStore::new();

    let err = import_file(&store, file.path(), &options(true)).await.unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(ext) if ext == "txt"));
}

#[tokio::test]
async fn test_missing_file_is_rejected() {
    let store = MemoryCustomerStore::new();
    let path = std::env::temp_dir().join("debtbook-does-not-exist.csv");

    let err = import_file(&store, &path, &options(true)).await.unwrap_err();
    assert!(matches!(err, ImportError::NotFound(_)));
}
