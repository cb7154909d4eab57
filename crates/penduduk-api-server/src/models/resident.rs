use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Relationship value marking the head of a household.
pub const HEAD_OF_HOUSEHOLD: &str = "Kepala Keluarga";

/// Accepted welfare programme tags.
pub const WELFARE_PROGRAMS: [&str; 7] = [
    "BPJS KIS",
    "BPJS Mandiri",
    "PKH",
    "Sembako",
    "PIP",
    "BLT",
    "Tidak Ada",
];

/// The four hamlets (dusun) of the village.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Hamlet {
    Satu,
    Dua,
    Tiga,
    Empat,
}

impl Hamlet {
    pub const ALL: [Hamlet; 4] = [Hamlet::Satu, Hamlet::Dua, Hamlet::Tiga, Hamlet::Empat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Satu => "SATU",
            Self::Dua => "DUA",
            Self::Tiga => "TIGA",
            Self::Empat => "EMPAT",
        }
    }
}

impl fmt::Display for Hamlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownHamlet(pub String);

impl fmt::Display for UnknownHamlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown hamlet '{}'", self.0)
    }
}

impl std::error::Error for UnknownHamlet {}

impl FromStr for Hamlet {
    type Err = UnknownHamlet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SATU" => Ok(Self::Satu),
            "DUA" => Ok(Self::Dua),
            "TIGA" => Ok(Self::Tiga),
            "EMPAT" => Ok(Self::Empat),
            other => Err(UnknownHamlet(other.to_string())),
        }
    }
}

/// A stored resident row (`penduduk`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Resident {
    pub id: i64,
    pub nik: String,
    pub nomor_kk: String,
    pub nama: String,
    pub hubungan: String,
    pub jenis_kelamin: String,
    pub tempat_lahir: String,
    pub tanggal_lahir: String,
    pub agama: String,
    pub status_perkawinan: String,
    pub pendidikan: String,
    pub pekerjaan: String,
    pub alamat: String,
    pub rt_rw: String,
    pub dusun: String,
    pub golongan_darah: String,
    pub kesejahteraan: String,
    pub tanggal_input: String,
    pub foto_ktp: String,
}

impl Resident {
    pub fn is_head(&self) -> bool {
        self.hubungan == HEAD_OF_HOUSEHOLD
    }

    /// Welfare tags as a display string, `-` when none.
    pub fn welfare_display(&self) -> String {
        if self.kesejahteraan.trim().is_empty() {
            return "-".to_string();
        }
        self.kesejahteraan
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Raw form input for create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidentForm {
    pub nik: String,
    pub nomor_kk: String,
    pub nama: String,
    pub hubungan: String,
    pub jenis_kelamin: String,
    pub tempat_lahir: String,
    pub tanggal_lahir: String,
    pub agama: String,
    pub status_perkawinan: String,
    pub pendidikan: String,
    pub pekerjaan: String,
    pub alamat: String,
    pub rt_rw: String,
    pub dusun: String,
    pub golongan_darah: String,
    pub kesejahteraan: Vec<String>,
}

/// Normalised values ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResident {
    pub nik: String,
    pub nomor_kk: String,
    pub nama: String,
    pub hubungan: String,
    pub jenis_kelamin: String,
    pub tempat_lahir: String,
    pub tanggal_lahir: String,
    pub agama: String,
    pub status_perkawinan: String,
    pub pendidikan: String,
    pub pekerjaan: String,
    pub alamat: String,
    pub rt_rw: String,
    pub dusun: Hamlet,
    pub golongan_darah: String,
    pub kesejahteraan: String,
    pub tanggal_input: String,
    pub foto_ktp: String,
}

/// Outcome of a write that may carry non-fatal remarks.
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub nik: String,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hamlet_parse() {
        assert_eq!("TIGA".parse::<Hamlet>().unwrap(), Hamlet::Tiga);
        assert_eq!(" EMPAT ".parse::<Hamlet>().unwrap(), Hamlet::Empat);
        assert!("tiga".parse::<Hamlet>().is_err());
        assert!("LIMA".parse::<Hamlet>().is_err());
    }

    #[test]
    fn test_welfare_display() {
        let mut r = sample();
        r.kesejahteraan = "PKH,BLT".to_string();
        assert_eq!(r.welfare_display(), "PKH, BLT");
        r.kesejahteraan = String::new();
        assert_eq!(r.welfare_display(), "-");
    }

    fn sample() -> Resident {
        Resident {
            id: 1,
            nik: "1234567890123456".into(),
            nomor_kk: "6543210987654321".into(),
            nama: "BUDI".into(),
            hubungan: HEAD_OF_HOUSEHOLD.into(),
            jenis_kelamin: "L".into(),
            tempat_lahir: String::new(),
            tanggal_lahir: String::new(),
            agama: String::new(),
            status_perkawinan: String::new(),
            pendidikan: String::new(),
            pekerjaan: String::new(),
            alamat: String::new(),
            rt_rw: String::new(),
            dusun: "SATU".into(),
            golongan_darah: String::new(),
            kesejahteraan: String::new(),
            tanggal_input: String::new(),
            foto_ktp: String::new(),
        }
    }
}
