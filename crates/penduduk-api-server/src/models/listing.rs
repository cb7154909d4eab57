use serde::{Deserialize, Serialize};

use super::resident::Resident;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
const PAGE_SIZES: [u32; 3] = [50, 100, 500];

/// Rows per page. Anything outside the accepted set falls back to 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    Rows(u32),
    All,
}

impl PageLimit {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim) else {
            return Self::Rows(DEFAULT_PAGE_SIZE);
        };
        if raw.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        match raw.parse::<u32>() {
            Ok(n) if PAGE_SIZES.contains(&n) => Self::Rows(n),
            _ => Self::Rows(DEFAULT_PAGE_SIZE),
        }
    }

    pub fn as_label(&self) -> String {
        match self {
            Self::Rows(n) => n.to_string(),
            Self::All => "all".to_string(),
        }
    }
}

/// Resolved limit and page, page counting from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: PageLimit,
    pub page: u32,
}

impl Pagination {
    pub fn parse(limit: Option<&str>, page: Option<&str>) -> Self {
        let limit = PageLimit::parse(limit);
        let page = match limit {
            PageLimit::All => 1,
            PageLimit::Rows(_) => page
                .and_then(|p| p.trim().parse::<u32>().ok())
                .filter(|p| *p >= 1)
                .unwrap_or(1),
        };
        Self { limit, page }
    }

    /// `(limit, offset)` for the SQL tail, `None` when every row is wanted.
    pub fn window(&self) -> Option<(i64, i64)> {
        match self.limit {
            PageLimit::All => None,
            PageLimit::Rows(n) => {
                let n = i64::from(n);
                Some((n, (i64::from(self.page) - 1) * n))
            }
        }
    }

    pub fn total_pages(&self, total_rows: i64) -> i64 {
        match self.limit {
            PageLimit::All => 1,
            PageLimit::Rows(n) => {
                let n = i64::from(n);
                ((total_rows + n - 1) / n).max(1)
            }
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: PageLimit::Rows(DEFAULT_PAGE_SIZE),
            page: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Grouped by household, head first.
    #[default]
    Kk,
    /// Flat, ordered by name.
    Nik,
}

impl ViewMode {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("nik") => Self::Nik,
            _ => Self::Kk,
        }
    }
}

/// Query string of the list endpoint, kept as raw text so malformed
/// values can fall back instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
    pub view: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub pagination: Pagination,
    pub view: ViewMode,
}

impl From<&ListParams> for ListQuery {
    fn from(p: &ListParams) -> Self {
        Self {
            search: p
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            pagination: Pagination::parse(p.limit.as_deref(), p.page.as_deref()),
            view: ViewMode::parse(p.view.as_deref()),
        }
    }
}

/// Members of one KK as shown in the grouped view.
#[derive(Debug, Clone, Serialize)]
pub struct Household {
    pub nomor_kk: String,
    pub kepala_keluarga: Option<String>,
    pub alamat: String,
    pub dusun: String,
    pub anggota: Vec<Resident>,
}

impl Household {
    /// Group rows that are already ordered by KK.
    pub fn group(rows: Vec<Resident>) -> Vec<Household> {
        let mut out: Vec<Household> = Vec::new();
        for row in rows {
            match out.last_mut() {
                Some(h) if h.nomor_kk == row.nomor_kk => {
                    if h.kepala_keluarga.is_none() && row.is_head() {
                        h.kepala_keluarga = Some(row.nama.clone());
                    }
                    h.anggota.push(row);
                }
                _ => out.push(Household {
                    nomor_kk: row.nomor_kk.clone(),
                    kepala_keluarga: row.is_head().then(|| row.nama.clone()),
                    alamat: row.alamat.clone(),
                    dusun: row.dusun.clone(),
                    anggota: vec![row],
                }),
            }
        }
        out
    }
}

/// Scoped header counters.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct HeaderCounts {
    pub total_penduduk: i64,
    pub total_kk: i64,
    pub total_dusun: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ListRows {
    Households(Vec<Household>),
    Residents(Vec<Resident>),
}

#[derive(Debug, Clone, Serialize)]
pub struct ResidentPage {
    pub view: ViewMode,
    pub limit: String,
    pub page: u32,
    pub total_rows: i64,
    pub total_pages: i64,
    pub counts: HeaderCounts,
    pub rows: ListRows,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_fallback() {
        assert_eq!(PageLimit::parse(None), PageLimit::Rows(50));
        assert_eq!(PageLimit::parse(Some("100")), PageLimit::Rows(100));
        assert_eq!(PageLimit::parse(Some("all")), PageLimit::All);
        assert_eq!(PageLimit::parse(Some("75")), PageLimit::Rows(50));
        assert_eq!(PageLimit::parse(Some("abc")), PageLimit::Rows(50));
    }

    #[test]
    fn test_page_fallback_and_window() {
        let p = Pagination::parse(Some("100"), Some("3"));
        assert_eq!(p.window(), Some((100, 200)));

        let p = Pagination::parse(Some("50"), Some("0"));
        assert_eq!(p.page, 1);
        let p = Pagination::parse(Some("50"), Some("x"));
        assert_eq!(p.page, 1);

        let p = Pagination::parse(Some("all"), Some("4"));
        assert_eq!(p.window(), None);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn test_total_pages() {
        let p = Pagination::parse(Some("50"), None);
        assert_eq!(p.total_pages(0), 1);
        assert_eq!(p.total_pages(50), 1);
        assert_eq!(p.total_pages(51), 2);
        assert_eq!(Pagination::parse(Some("all"), None).total_pages(999), 1);
    }
}
