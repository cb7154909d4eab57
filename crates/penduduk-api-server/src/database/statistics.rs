use serde::Serialize;
use sqlx::FromRow;

use super::Repository;
use crate::security::{Column, ResidentFilter};

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct CountRow {
    pub label: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct HamletBreakdown {
    pub dusun: String,
    pub total: i64,
    pub laki_laki: i64,
    pub perempuan: i64,
    pub total_kk: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct GrowthRow {
    pub bulan: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct ProgressRow {
    pub dusun: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct UserInputRow {
    pub username: String,
    pub role: String,
    pub jumlah_input: i64,
}

/// Optional filters of the per-user input table.
#[derive(Debug, Clone, Default)]
pub struct UserInputFilter {
    pub dusun: Option<String>,
    /// Inclusive `(start, end)` dates, `YYYY-MM-DD`.
    pub range: Option<(String, String)>,
}

impl Repository {
    /// `COUNT(*)` grouped by `column`, blanks skipped, largest first.
    pub async fn count_by(
        &self,
        filter: &ResidentFilter,
        column: Column,
    ) -> sqlx::Result<Vec<CountRow>> {
        let filter = filter.clone().non_blank(column);
        let sql = format!(
            "SELECT {col} AS label, COUNT(*) AS total FROM penduduk{w} \
             GROUP BY {col} ORDER BY total DESC, {col}",
            col = column.as_sql(),
            w = filter.where_sql()
        );
        let mut query = sqlx::query_as::<_, CountRow>(&sql);
        for param in filter.params() {
            query = query.bind(param.as_str());
        }
        query.fetch_all(self.pool.get_pool()).await
    }

    /// Residents, sex split and households per hamlet.
    pub async fn hamlet_breakdown(
        &self,
        filter: &ResidentFilter,
    ) -> sqlx::Result<Vec<HamletBreakdown>> {
        let filter = filter.clone().non_blank(Column::Dusun);
        let sql = format!(
            "SELECT dusun, COUNT(*) AS total, \
                    SUM(CASE WHEN jenis_kelamin = 'L' THEN 1 ELSE 0 END) AS laki_laki, \
                    SUM(CASE WHEN jenis_kelamin = 'P' THEN 1 ELSE 0 END) AS perempuan, \
                    COUNT(DISTINCT nomor_kk) AS total_kk \
             FROM penduduk{} GROUP BY dusun ORDER BY dusun",
            filter.where_sql()
        );
        let mut query = sqlx::query_as::<_, HamletBreakdown>(&sql);
        for param in filter.params() {
            query = query.bind(param.as_str());
        }
        query.fetch_all(self.pool.get_pool()).await
    }

    /// New rows per `YYYY-MM` of their input timestamp.
    pub async fn monthly_growth(&self, filter: &ResidentFilter) -> sqlx::Result<Vec<GrowthRow>> {
        let filter = filter.clone().non_blank(Column::TanggalInput);
        let sql = format!(
            "SELECT SUBSTR(tanggal_input, 1, 7) AS bulan, COUNT(*) AS total \
             FROM penduduk{} GROUP BY bulan ORDER BY bulan",
            filter.where_sql()
        );
        let mut query = sqlx::query_as::<_, GrowthRow>(&sql);
        for param in filter.params() {
            query = query.bind(param.as_str());
        }
        query.fetch_all(self.pool.get_pool()).await
    }

    /// Unfiltered resident count per hamlet for the progress view.
    pub async fn progress_by_hamlet(&self) -> sqlx::Result<Vec<ProgressRow>> {
        sqlx::query_as::<_, ProgressRow>(
            "SELECT dusun, COUNT(*) AS total FROM penduduk \
             WHERE TRIM(dusun) != '' GROUP BY dusun ORDER BY dusun",
        )
        .fetch_all(self.pool.get_pool())
        .await
    }

    /// Residents attributable to each user: a hamlet head owns their
    /// hamlet, a resident their own row. Filters sit in the join so users
    /// without matches still appear with zero.
    pub async fn input_per_user(&self, filter: &UserInputFilter) -> sqlx::Result<Vec<UserInputRow>> {
        let mut on = String::from("(p.dusun = u.dusun OR p.nik = u.nik_masyarakat)");
        let mut params: Vec<String> = Vec::new();
        if let Some(dusun) = &filter.dusun {
            on.push_str(" AND p.dusun = ?");
            params.push(dusun.clone());
        }
        if let Some((start, end)) = &filter.range {
            on.push_str(" AND p.tanggal_input BETWEEN ? AND ?");
            params.push(format!("{} 00:00:00", start));
            params.push(format!("{} 23:59:59", end));
        }
        let sql = format!(
            r#"SELECT u.username AS username, u.role AS role, COUNT(p.nik) AS jumlah_input
               FROM "user" u LEFT JOIN penduduk p ON {}
               GROUP BY u.id, u.username, u.role
               ORDER BY jumlah_input DESC, u.username"#,
            on
        );
        let mut query = sqlx::query_as::<_, UserInputRow>(&sql);
        for param in &params {
            query = query.bind(param.as_str());
        }
        query.fetch_all(self.pool.get_pool()).await
    }
}
