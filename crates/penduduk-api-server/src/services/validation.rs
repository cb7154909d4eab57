//! Field rules shared by create, update and import.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::{Hamlet, NewResident, ResidentForm, WELFARE_PROGRAMS};

pub const MSG_NAME: &str = "Nama hanya boleh huruf kapital dan spasi.";
pub const MSG_NIK: &str = "NIK harus 16 digit angka.";
pub const MSG_KK: &str = "Nomor KK harus 16 digit angka.";
pub const MSG_HAMLET: &str = "Pilih satu dusun yang valid.";

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z\s]+$").expect("name pattern compiles"));
static SIXTEEN_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{16}$").expect("digit pattern compiles"));
static LINE_BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<br>|<br/>|\n|\r").expect("break pattern compiles"));
static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Itemised, user-facing validation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{}", .0.join(" "))]
pub struct ValidationError(pub Vec<String>);

impl ValidationError {
    pub fn single(msg: impl Into<String>) -> Self {
        Self(vec![msg.into()])
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

/// Replace HTML line breaks and CR/LF with spaces and collapse whitespace.
pub fn sanitize_name(raw: &str) -> String {
    let replaced = LINE_BREAK_RE.replace_all(raw, " ");
    WHITESPACE_RE.replace_all(&replaced, " ").trim().to_string()
}

pub fn is_sixteen_digits(value: &str) -> bool {
    SIXTEEN_DIGITS_RE.is_match(value)
}

pub fn is_valid_name(value: &str) -> bool {
    NAME_RE.is_match(value)
}

/// Capitalise the first letter of every alphabetic run, lowercase the rest.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_alpha = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Core identity checks. Returns the parsed hamlet when every rule passes.
pub fn check_identity(
    nama: &str,
    nik: &str,
    nomor_kk: &str,
    dusun: &str,
) -> Result<Hamlet, ValidationError> {
    let mut errors = Vec::new();
    if !is_valid_name(nama) {
        errors.push(MSG_NAME.to_string());
    }
    if !is_sixteen_digits(nik) {
        errors.push(MSG_NIK.to_string());
    }
    if !is_sixteen_digits(nomor_kk) {
        errors.push(MSG_KK.to_string());
    }
    let hamlet = dusun.parse::<Hamlet>().ok();
    if hamlet.is_none() {
        errors.push(MSG_HAMLET.to_string());
    }
    match hamlet {
        Some(h) if errors.is_empty() => Ok(h),
        _ => Err(ValidationError(errors)),
    }
}

/// Join welfare tags, rejecting anything outside the catalogue.
pub fn join_welfare(tags: &[String]) -> Result<String, ValidationError> {
    let tags: Vec<&str> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    let unknown: Vec<String> = tags
        .iter()
        .filter(|t| !WELFARE_PROGRAMS.contains(t))
        .map(|t| format!("Program kesejahteraan tidak dikenal: {}.", t))
        .collect();
    if !unknown.is_empty() {
        return Err(ValidationError(unknown));
    }
    Ok(tags.join(", "))
}

/// Validate and normalise a form. `tanggal_input` and `foto_ktp` are left
/// empty for the caller to stamp or carry over.
pub fn normalize_form(form: &ResidentForm) -> Result<NewResident, ValidationError> {
    let nama = sanitize_name(&form.nama);
    let nik = form.nik.trim().to_string();
    let nomor_kk = form.nomor_kk.trim().to_string();

    let identity = check_identity(&nama, &nik, &nomor_kk, form.dusun.trim());
    let welfare = join_welfare(&form.kesejahteraan);

    let (dusun, kesejahteraan) = match (identity, welfare) {
        (Ok(d), Ok(w)) => (d, w),
        (identity, welfare) => {
            let mut messages = Vec::new();
            if let Err(e) = identity {
                messages.extend(e.0);
            }
            if let Err(e) = welfare {
                messages.extend(e.0);
            }
            return Err(ValidationError(messages));
        }
    };

    Ok(NewResident {
        nik,
        nomor_kk,
        nama: nama.to_uppercase(),
        hubungan: form.hubungan.trim().to_string(),
        jenis_kelamin: form.jenis_kelamin.trim().to_string(),
        tempat_lahir: title_case(form.tempat_lahir.trim()),
        tanggal_lahir: form.tanggal_lahir.trim().to_string(),
        agama: form.agama.trim().to_string(),
        status_perkawinan: form.status_perkawinan.trim().to_string(),
        pendidikan: form.pendidikan.trim().to_string(),
        pekerjaan: title_case(form.pekerjaan.trim()),
        alamat: form.alamat.trim().to_uppercase(),
        rt_rw: form.rt_rw.trim().to_string(),
        dusun,
        golongan_darah: form.golongan_darah.trim().to_string(),
        kesejahteraan,
        tanggal_input: String::new(),
        foto_ktp: String::new(),
    })
}
