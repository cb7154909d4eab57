mod common;

use common::{admin, id16, kadus, seed, test_state, warga};
use penduduk_api_server::models::Hamlet;
use penduduk_api_server::services::{ImportError, ServiceError};
use penduduk_api_server::spreadsheet::{read_first_sheet, write_workbook};
use penduduk_api_server::utils::files::Output;

const HEADERS: [&str; 7] = [
    "nik",
    "nomor_kk",
    "nama",
    "hubungan",
    "jenis_kelamin",
    "dusun",
    "agama",
];

fn row(nik: &str, kk: &str, nama: &str, hubungan: &str, dusun: &str) -> Vec<String> {
    vec![
        nik.to_string(),
        kk.to_string(),
        nama.to_string(),
        hubungan.to_string(),
        "L".to_string(),
        dusun.to_string(),
        "Islam".to_string(),
    ]
}

fn workbook(headers: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    write_workbook("Sheet1", headers, rows).expect("workbook")
}

#[tokio::test]
async fn test_import_counts_new_and_failed_rows() {
    let (state, _dir) = test_state().await;

    let bytes = workbook(
        &HEADERS,
        &[
            row(&id16(11), &id16(110), "BUDI", "Kepala Keluarga", "SATU"),
            row(&id16(12), &id16(110), "SITI", "Istri", "SATU"),
            row(&id16(13), &id16(130), "ANI", "Kepala Keluarga", "TIGA"),
            row(&id16(11), &id16(110), "BUDI LAGI", "Kepala Keluarga", "SATU"),
        ],
    );

    let summary = state
        .importer
        .import(&admin(), "penduduk.xlsx", &bytes)
        .await
        .unwrap();
    assert_eq!(summary.new_count, 3);
    assert_eq!(summary.update_count, 0);
    assert_eq!(summary.failed_count, 1);
    assert!(summary.failures[0].starts_with("Baris 5:"));

    let budi = state.residents.get(&admin(), &id16(11)).await.unwrap();
    assert_eq!(budi.nama, "BUDI");
}

#[tokio::test]
async fn test_import_updates_existing_nik() {
    let (state, _dir) = test_state().await;
    seed(&state).await;

    let bytes = workbook(
        &HEADERS,
        &[row(&id16(1), &id16(100), "BUDI SANTOSO", "Kepala Keluarga", "SATU")],
    );
    let summary = state
        .importer
        .import(&admin(), "update.XLSX", &bytes)
        .await
        .unwrap();
    assert_eq!(summary.new_count, 0);
    assert_eq!(summary.update_count, 1);
}

#[tokio::test]
async fn test_import_rejects_missing_columns() {
    let (state, _dir) = test_state().await;

    let bytes = workbook(
        &["nik", "nama"],
        &[vec![id16(11), "BUDI".to_string()]],
    );
    match state.importer.import(&admin(), "kurang.xlsx", &bytes).await {
        Err(ServiceError::Import(ImportError::MissingColumns(missing))) => {
            assert_eq!(
                missing,
                vec!["nomor_kk", "hubungan", "jenis_kelamin", "dusun"]
            );
        }
        other => panic!("expected missing columns, got {:?}", other),
    }
    assert!(matches!(
        state.residents.get(&admin(), &id16(11)).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_import_rejects_bad_files_and_roles() {
    let (state, _dir) = test_state().await;
    let bytes = workbook(&HEADERS, &[]);

    assert!(matches!(
        state.importer.import(&admin(), "data.csv", &bytes).await,
        Err(ServiceError::Import(ImportError::NotXlsx))
    ));
    assert!(matches!(
        state.importer.import(&admin(), "  ", &bytes).await,
        Err(ServiceError::Import(ImportError::NoFileName))
    ));
    assert!(matches!(
        state.importer.import(&admin(), "rusak.xlsx", b"not a zip").await,
        Err(ServiceError::Import(ImportError::Unreadable(_)))
    ));
    assert!(matches!(
        state.importer.import(&warga(&id16(1)), "data.xlsx", &bytes).await,
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_hamlet_head_import_skips_other_hamlets() {
    let (state, _dir) = test_state().await;

    let bytes = workbook(
        &HEADERS,
        &[
            row(&id16(21), &id16(210), "RINA", "Kepala Keluarga", "DUA"),
            row(&id16(22), &id16(220), "ADI", "Kepala Keluarga", "EMPAT"),
        ],
    );
    let summary = state
        .importer
        .import(&kadus(Hamlet::Dua), "dua.xlsx", &bytes)
        .await
        .unwrap();
    assert_eq!(summary.new_count, 1);
    assert_eq!(summary.failed_count, 1);
}

#[tokio::test]
async fn test_export_writes_visible_rows() {
    let (state, dir) = test_state().await;
    seed(&state).await;

    let output = state.exporter.export(&kadus(Hamlet::Satu)).await.unwrap();
    let file = match output {
        Output::File(file) => file,
        Output::Empty(msg) => panic!("unexpected empty export: {}", msg),
    };
    assert!(file.file_name.starts_with("data_penduduk_"));
    assert!(file.path.starts_with(dir.path()));

    let sheet = read_first_sheet(&file.bytes).unwrap();
    assert_eq!(sheet.rows.len(), 3);
    assert!(sheet.has_column("NIK"));
    assert!(sheet.rows.iter().all(|r| r.get("Dusun").map(String::as_str) == Some("SATU")));
}

#[tokio::test]
async fn test_export_of_empty_scope_is_a_message() {
    let (state, _dir) = test_state().await;

    match state.exporter.export(&admin()).await.unwrap() {
        Output::Empty(_) => {}
        Output::File(_) => panic!("expected nothing to export"),
    }
}
