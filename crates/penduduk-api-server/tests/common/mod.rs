#![allow(dead_code)]

use tempfile::TempDir;

use penduduk_api_server::config::{
    AuthConfig, BackupConfig, DatabaseConfig, ProgressConfig, ReportConfig, ServerConfig,
    Settings, StorageConfig,
};
use penduduk_api_server::models::{Hamlet, NewUserForm, Principal, ResidentForm, Role};
use penduduk_api_server::state::AppState;

pub const ADMIN_PASSWORD: &str = "rahasia-admin";

/// App state over a fresh SQLite file; keep the `TempDir` alive for the test.
pub async fn test_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = settings_in(&dir);
    settings.storage.ensure_dirs().expect("dirs");
    let state = AppState::build(settings).await.expect("state");
    (state, dir)
}

pub fn settings_in(dir: &TempDir) -> Settings {
    Settings {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("desa.db").display()),
            max_connections: 4,
            acquire_timeout_seconds: 5,
        },
        auth: AuthConfig {
            jwt_secret: "test-secret-key-for-jwt-signing".to_string(),
            token_ttl_seconds: 3600,
            bootstrap_admin_password: ADMIN_PASSWORD.to_string(),
        },
        storage: StorageConfig::rooted_at(dir.path()),
        report: ReportConfig {
            village_name: "DESA SUKAMAJU".to_string(),
        },
        backup: BackupConfig {
            enabled: false,
            interval_hours: 24,
        },
        progress: ProgressConfig::default(),
    }
}

pub fn admin() -> Principal {
    Principal::new("admin", Role::Admin)
}

pub fn kadus(dusun: Hamlet) -> Principal {
    Principal::new(format!("kadus_{}", dusun.as_str().to_lowercase()), Role::KepalaDusun { dusun })
}

pub fn warga(nik: &str) -> Principal {
    Principal::new("warga", Role::Masyarakat { nik: nik.to_string() })
}

/// 16-digit identifier built from a short suffix.
pub fn id16(suffix: u32) -> String {
    format!("1207{:012}", suffix)
}

pub fn form(nik: &str, kk: &str, nama: &str, hubungan: &str, dusun: &str) -> ResidentForm {
    ResidentForm {
        nik: nik.to_string(),
        nomor_kk: kk.to_string(),
        nama: nama.to_string(),
        hubungan: hubungan.to_string(),
        jenis_kelamin: "L".to_string(),
        tempat_lahir: "medan".to_string(),
        tanggal_lahir: "1980-01-01".to_string(),
        agama: "Islam".to_string(),
        status_perkawinan: "Kawin".to_string(),
        pendidikan: "SMA".to_string(),
        pekerjaan: "petani".to_string(),
        alamat: "jl. kenanga".to_string(),
        rt_rw: "001/002".to_string(),
        dusun: dusun.to_string(),
        golongan_darah: "O".to_string(),
        kesejahteraan: vec!["PKH".to_string()],
    }
}

pub fn user_form(username: &str, role: &str, dusun: Option<&str>, nik: Option<&str>) -> NewUserForm {
    NewUserForm {
        username: username.to_string(),
        password: "sandi123".to_string(),
        role: role.to_string(),
        dusun: dusun.map(str::to_string),
        nik_masyarakat: nik.map(str::to_string),
    }
}

/// Two households in SATU and one in DUA.
pub async fn seed(state: &AppState) {
    let rows = [
        form(&id16(1), &id16(100), "BUDI SANTOSO", "Kepala Keluarga", "SATU"),
        form(&id16(2), &id16(100), "SITI AMINAH", "Istri", "SATU"),
        form(&id16(3), &id16(200), "JOKO WIDODO", "Kepala Keluarga", "SATU"),
        form(&id16(4), &id16(300), "ANI LESTARI", "Kepala Keluarga", "DUA"),
    ];
    for row in &rows {
        state.residents.create(&admin(), row).await.expect("seed row");
    }
}
