//! Bulk upsert of residents from the first sheet of an `.xlsx` file.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::error::{ensure, ServiceResult};
use super::validation::{is_sixteen_digits, sanitize_name, MSG_HAMLET, MSG_KK, MSG_NIK};
use crate::database::{Repository, UpsertKind};
use crate::logging::{ActivityAction, ActivityLog, ActivityLogger};
use crate::models::{Hamlet, NewResident, Principal, Role};
use crate::security::authorization::can_import;
use crate::spreadsheet::read_first_sheet;
use crate::utils::clock;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "nik",
    "nomor_kk",
    "nama",
    "hubungan",
    "jenis_kelamin",
    "dusun",
];

pub const MSG_IMPORTED: &str = "Data berhasil diimpor!";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File tidak ditemukan.")]
    NoFile,

    #[error("Belum pilih file.")]
    NoFileName,

    #[error("Format harus .xlsx")]
    NotXlsx,

    #[error("Kolom tidak lengkap: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Error membaca file: {0}")]
    Unreadable(String),
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub new_count: usize,
    pub update_count: usize,
    pub failed_count: usize,
    /// `Baris <n>: <reason>` per rejected row, spreadsheet row numbers.
    pub failures: Vec<String>,
}

impl ImportSummary {
    fn fail(&mut self, row_number: usize, reason: impl AsRef<str>) {
        self.failed_count += 1;
        self.failures
            .push(format!("Baris {}: {}", row_number, reason.as_ref()));
    }
}

fn field(record: &HashMap<String, String>, name: &str) -> String {
    record.get(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Build the row to store, or the reason it is rejected.
fn parse_row(record: &HashMap<String, String>, timestamp: &str) -> Result<NewResident, String> {
    let nik = field(record, "nik");
    let nomor_kk = field(record, "nomor_kk");
    let mut errors = Vec::new();
    if !is_sixteen_digits(&nik) {
        errors.push(MSG_NIK);
    }
    if !is_sixteen_digits(&nomor_kk) {
        errors.push(MSG_KK);
    }
    let dusun = field(record, "dusun").parse::<Hamlet>().ok();
    if dusun.is_none() {
        errors.push(MSG_HAMLET);
    }
    let Some(dusun) = dusun.filter(|_| errors.is_empty()) else {
        return Err(errors.join(" "));
    };

    Ok(NewResident {
        nik,
        nomor_kk,
        nama: sanitize_name(&field(record, "nama")),
        hubungan: field(record, "hubungan"),
        jenis_kelamin: field(record, "jenis_kelamin"),
        tempat_lahir: field(record, "tempat_lahir"),
        tanggal_lahir: field(record, "tanggal_lahir"),
        agama: field(record, "agama"),
        status_perkawinan: field(record, "status_perkawinan"),
        pendidikan: field(record, "pendidikan"),
        pekerjaan: field(record, "pekerjaan"),
        alamat: field(record, "alamat"),
        rt_rw: field(record, "rt_rw"),
        dusun,
        golongan_darah: field(record, "golongan_darah"),
        kesejahteraan: field(record, "kesejahteraan"),
        tanggal_input: timestamp.to_string(),
        foto_ktp: field(record, "foto_ktp"),
    })
}

pub struct ImportService {
    repository: Arc<Repository>,
    activity: ActivityLogger,
}

impl ImportService {
    pub fn new(repository: Arc<Repository>, activity: ActivityLogger) -> Self {
        Self {
            repository,
            activity,
        }
    }

    /// Upsert every row keyed by NIK. A bad row is counted and skipped; a
    /// missing required column rejects the file before anything is written.
    pub async fn import(
        &self,
        principal: &Principal,
        file_name: &str,
        bytes: &[u8],
    ) -> ServiceResult<ImportSummary> {
        ensure(can_import(principal))?;

        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(ImportError::NoFileName.into());
        }
        if !file_name.to_lowercase().ends_with(".xlsx") {
            return Err(ImportError::NotXlsx.into());
        }

        let sheet = read_first_sheet(bytes).map_err(|e| ImportError::Unreadable(e.to_string()))?;
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !sheet.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            warn!(file = file_name, ?missing, "Import rejected, columns missing");
            return Err(ImportError::MissingColumns(missing).into());
        }

        let own_hamlet = match &principal.role {
            Role::KepalaDusun { dusun } => Some(*dusun),
            _ => None,
        };
        let timestamp = clock::now_timestamp();
        let mut seen = HashSet::new();
        let mut summary = ImportSummary::default();

        for (index, record) in sheet.rows.iter().enumerate() {
            let row_number = index + 2;
            let resident = match parse_row(record, &timestamp) {
                Ok(r) => r,
                Err(reason) => {
                    summary.fail(row_number, reason);
                    continue;
                }
            };
            if !seen.insert(resident.nik.clone()) {
                summary.fail(row_number, format!("NIK {} ganda di dalam file.", resident.nik));
                continue;
            }
            if let Some(own) = own_hamlet {
                if resident.dusun != own {
                    summary.fail(row_number, "Anda hanya bisa input data di dusun Anda.");
                    continue;
                }
            }

            match self.repository.upsert_resident(&resident).await {
                Ok(UpsertKind::Inserted) => summary.new_count += 1,
                Ok(UpsertKind::Updated) => summary.update_count += 1,
                Err(e) => {
                    warn!(nik = %resident.nik, "Import row failed: {}", e);
                    summary.fail(row_number, "Gagal menyimpan baris.");
                }
            }
        }

        info!(
            user = %principal.username,
            file = file_name,
            new = summary.new_count,
            updated = summary.update_count,
            failed = summary.failed_count,
            "Import finished"
        );
        self.activity.log(ActivityLog::new(
            &principal.username,
            ActivityAction::ImporExcel,
            format!(
                "Impor {}: baru {}, update {}, gagal {}",
                file_name, summary.new_count, summary.update_count, summary.failed_count
            ),
        ));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_row_defaults_optional_columns() {
        let r = parse_row(
            &record(&[
                ("nik", "1207010000000001"),
                ("nomor_kk", "1207019999999999"),
                ("nama", "BUDI<br>SANTOSO"),
                ("dusun", " SATU "),
            ]),
            "2025-01-01 00:00:00",
        )
        .unwrap();
        assert_eq!(r.nama, "BUDI SANTOSO");
        assert_eq!(r.dusun, Hamlet::Satu);
        assert_eq!(r.agama, "");
        assert_eq!(r.tanggal_input, "2025-01-01 00:00:00");
    }

    #[test]
    fn test_parse_row_rejects_malformed_identity() {
        let err = parse_row(
            &record(&[("nik", "123"), ("nomor_kk", "1207019999999999"), ("dusun", "LIMA")]),
            "",
        )
        .unwrap_err();
        assert!(err.contains(MSG_NIK));
        assert!(err.contains(MSG_HAMLET));
        assert!(!err.contains(MSG_KK));
    }

    #[test]
    fn test_missing_columns_message() {
        let e = ImportError::MissingColumns(vec!["dusun".into(), "nama".into()]);
        assert_eq!(e.to_string(), "Kolom tidak lengkap: dusun, nama");
    }
}
