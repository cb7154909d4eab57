//! Row visibility per role, rendered as a parameterised WHERE fragment.

use crate::models::{Hamlet, Principal, Resident, Role};

/// Which resident rows a caller may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    ByHamlet(Hamlet),
    ByNik(String),
}

impl Scope {
    pub fn for_principal(principal: &Principal) -> Self {
        match &principal.role {
            Role::Admin => Self::All,
            Role::KepalaDusun { dusun } => Self::ByHamlet(*dusun),
            Role::Masyarakat { nik } => Self::ByNik(nik.clone()),
        }
    }

    /// In-memory check matching the SQL predicate.
    pub fn permits(&self, resident: &Resident) -> bool {
        match self {
            Self::All => true,
            Self::ByHamlet(h) => resident.dusun == h.as_str(),
            Self::ByNik(nik) => &resident.nik == nik,
        }
    }
}

/// Columns usable in equality filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Nik,
    NomorKk,
    Dusun,
    Agama,
    Pendidikan,
    TanggalInput,
}

impl Column {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Nik => "nik",
            Self::NomorKk => "nomor_kk",
            Self::Dusun => "dusun",
            Self::Agama => "agama",
            Self::Pendidikan => "pendidikan",
            Self::TanggalInput => "tanggal_input",
        }
    }
}

/// Accumulates AND-joined predicates over `penduduk` plus their bind values.
#[derive(Debug, Clone, Default)]
pub struct ResidentFilter {
    clauses: Vec<String>,
    params: Vec<String>,
}

impl ResidentFilter {
    pub fn new(scope: &Scope) -> Self {
        let mut filter = Self::default();
        match scope {
            Scope::All => {}
            Scope::ByHamlet(h) => {
                filter.clauses.push("dusun = ?".to_string());
                filter.params.push(h.as_str().to_string());
            }
            Scope::ByNik(nik) => {
                filter.clauses.push("nik = ?".to_string());
                filter.params.push(nik.clone());
            }
        }
        filter
    }

    /// Substring match over KK number, NIK and name.
    pub fn search(mut self, term: Option<&str>) -> Self {
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            let like = format!("%{}%", term);
            self.clauses
                .push("(nomor_kk LIKE ? OR nik LIKE ? OR nama LIKE ?)".to_string());
            self.params.extend([like.clone(), like.clone(), like]);
        }
        self
    }

    pub fn eq(mut self, column: Column, value: &str) -> Self {
        self.clauses.push(format!("{} = ?", column.as_sql()));
        self.params.push(value.to_string());
        self
    }

    pub fn non_blank(mut self, column: Column) -> Self {
        self.clauses.push(format!(
            "{col} IS NOT NULL AND {col} != ''",
            col = column.as_sql()
        ));
        self
    }

    /// ` WHERE ...` or an empty string when nothing restricts the rows.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_is_unrestricted() {
        let f = ResidentFilter::new(&Scope::All);
        assert_eq!(f.where_sql(), "");
        assert!(f.params().is_empty());
    }

    #[test]
    fn test_hamlet_head_with_search() {
        let f = ResidentFilter::new(&Scope::ByHamlet(Hamlet::Tiga)).search(Some(" budi "));
        assert_eq!(
            f.where_sql(),
            " WHERE dusun = ? AND (nomor_kk LIKE ? OR nik LIKE ? OR nama LIKE ?)"
        );
        assert_eq!(f.params(), &["TIGA", "%budi%", "%budi%", "%budi%"]);
    }

    #[test]
    fn test_resident_scope_and_eq() {
        let f = ResidentFilter::new(&Scope::ByNik("1111222233334444".into()))
            .eq(Column::NomorKk, "9999888877776666")
            .search(Some("   "));
        assert_eq!(f.where_sql(), " WHERE nik = ? AND nomor_kk = ?");
        assert_eq!(f.params(), &["1111222233334444", "9999888877776666"]);
    }

    #[test]
    fn test_non_blank() {
        let f = ResidentFilter::new(&Scope::All).non_blank(Column::Agama);
        assert_eq!(f.where_sql(), " WHERE agama IS NOT NULL AND agama != ''");
    }

    #[test]
    fn test_scope_for_principal() {
        let p = Principal::new("kadus2", Role::KepalaDusun { dusun: Hamlet::Dua });
        assert_eq!(Scope::for_principal(&p), Scope::ByHamlet(Hamlet::Dua));
        let p = Principal::new("warga", Role::Masyarakat { nik: "1".into() });
        assert_eq!(Scope::for_principal(&p), Scope::ByNik("1".into()));
    }
}
