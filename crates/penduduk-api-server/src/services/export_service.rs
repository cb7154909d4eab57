use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::error::ServiceResult;
use crate::database::{Repository, ResidentOrder};
use crate::logging::{ActivityAction, ActivityLog, ActivityLogger};
use crate::models::{Principal, Resident};
use crate::security::{ResidentFilter, Scope};
use crate::spreadsheet::write_workbook;
use crate::utils::clock;
use crate::utils::files::{sanitize_filename, Output, RenderedFile, XLSX_MIME};

pub const SHEET_NAME: &str = "Data Penduduk";
pub const MSG_NOTHING_TO_EXPORT: &str = "Tidak ada data untuk diekspor.";

pub const EXPORT_HEADERS: [&str; 18] = [
    "Nomor KK",
    "NIK",
    "Nama",
    "Hubungan",
    "Jenis Kelamin",
    "Tempat Lahir",
    "Tanggal Lahir",
    "Agama",
    "Status Perkawinan",
    "Pendidikan",
    "Pekerjaan",
    "Alamat",
    "RT/RW",
    "Dusun",
    "Gol. Darah",
    "Program Kesejahteraan",
    "Tanggal Input",
    "Foto KTP",
];

fn export_row(r: &Resident) -> Vec<String> {
    vec![
        r.nomor_kk.clone(),
        r.nik.clone(),
        r.nama.clone(),
        r.hubungan.clone(),
        r.jenis_kelamin.clone(),
        r.tempat_lahir.clone(),
        r.tanggal_lahir.clone(),
        r.agama.clone(),
        r.status_perkawinan.clone(),
        r.pendidikan.clone(),
        r.pekerjaan.clone(),
        r.alamat.clone(),
        r.rt_rw.clone(),
        r.dusun.clone(),
        r.golongan_darah.clone(),
        r.kesejahteraan.clone(),
        r.tanggal_input.clone(),
        r.foto_ktp.clone(),
    ]
}

pub struct ExportService {
    repository: Arc<Repository>,
    activity: ActivityLogger,
    export_dir: PathBuf,
}

impl ExportService {
    pub fn new(repository: Arc<Repository>, activity: ActivityLogger, export_dir: PathBuf) -> Self {
        Self {
            repository,
            activity,
            export_dir,
        }
    }

    /// Every visible resident in household order, one workbook per call.
    pub async fn export(&self, principal: &Principal) -> ServiceResult<Output> {
        let filter = ResidentFilter::new(&Scope::for_principal(principal));
        let residents = self
            .repository
            .list_residents(&filter, ResidentOrder::Household, None)
            .await?;
        if residents.is_empty() {
            return Ok(Output::empty(MSG_NOTHING_TO_EXPORT));
        }

        let rows: Vec<Vec<String>> = residents.iter().map(export_row).collect();
        let bytes = write_workbook(SHEET_NAME, &EXPORT_HEADERS, &rows)?;

        let file_name = sanitize_filename(&format!("data_penduduk_{}.xlsx", clock::file_stamp()));
        let path = self.export_dir.join(&file_name);
        tokio::fs::create_dir_all(&self.export_dir).await?;
        tokio::fs::write(&path, &bytes).await?;

        info!(user = %principal.username, rows = rows.len(), path = %path.display(), "Export written");
        self.activity.log(ActivityLog::new(
            &principal.username,
            ActivityAction::EksporExcel,
            format!("Ekspor {} baris ke {}", rows.len(), file_name),
        ));
        Ok(Output::File(RenderedFile {
            file_name,
            content_type: XLSX_MIME,
            path,
            bytes,
        }))
    }
}
