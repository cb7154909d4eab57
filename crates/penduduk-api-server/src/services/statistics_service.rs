use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{ServiceError, ServiceResult};
use crate::charts::{
    self, Captions, ChartError, CHART_NAMES, EDUCATION_CHART, GROWTH_CHART, POPULATION_CHART,
    RELIGION_CHART,
};
use crate::config::ProgressConfig;
use crate::database::{
    CountRow, GrowthRow, HamletBreakdown, Repository, UserInputFilter, UserInputRow,
};
use crate::models::{Hamlet, Principal};
use crate::security::authorization::can_view_breakdowns;
use crate::security::{Column, ResidentFilter, Scope};
use crate::utils::clock;
use crate::utils::files::{sanitize_filename, RenderedFile, PNG_MIME};

pub const MSG_PROGRESS_DENIED: &str = "Akses ditolak. Hanya admin yang bisa melihat progress.";
pub const MSG_BAD_DATE_RANGE: &str = "Format tanggal tidak valid. Gunakan format: YYYY-MM-DD";
pub const MSG_CHART_MISSING: &str = "Grafik tidak ditemukan. Buka dashboard terlebih dahulu.";

/// Authenticated route serving the caller's own chart images.
pub const CHART_URL_PREFIX: &str = "/api/dashboard/chart";

#[derive(Debug, Clone, Serialize)]
pub struct StatisticsView {
    pub total_jiwa: i64,
    pub total_kk: i64,
    pub agama: Vec<CountRow>,
    pub pendidikan: Vec<CountRow>,
    /// Admin only; empty for other roles.
    pub dusun: Vec<HamletBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub total_jiwa: i64,
    pub total_kk: i64,
    pub penduduk_dusun: Vec<CountRow>,
    pub agama: Vec<CountRow>,
    pub pendidikan: Vec<CountRow>,
    pub pertumbuhan: Vec<GrowthRow>,
    pub charts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HamletProgress {
    pub dusun: String,
    pub terinput: i64,
    pub target: i64,
    pub persen: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub progress: Vec<HamletProgress>,
    pub total_terinput: i64,
    pub total_target: i64,
    pub total_persen: i64,
    pub per_user: Vec<UserInputRow>,
    pub total_input: i64,
    pub semua_dusun: Vec<&'static str>,
    pub filter_dusun: Option<String>,
    pub filter_tanggal: Option<String>,
    #[serde(skip)]
    pub warnings: Vec<String>,
}

/// `done / target` as a whole percentage, capped at 100.
pub fn capped_percent(done: i64, target: i64) -> i64 {
    if target <= 0 {
        return 0;
    }
    ((done as f64 / target as f64) * 100.0).round().min(100.0) as i64
}

fn series(rows: &[CountRow]) -> Vec<(String, i64)> {
    rows.iter().map(|r| (r.label.clone(), r.total)).collect()
}

/// Per-account folder under the chart dir, so one caller's dashboard never
/// overwrites or exposes another's.
fn owner_folder(principal: &Principal) -> String {
    format!("u_{}", sanitize_filename(&principal.username))
}

pub struct StatisticsService {
    repository: Arc<Repository>,
    chart_dir: PathBuf,
    progress: ProgressConfig,
}

impl StatisticsService {
    pub fn new(repository: Arc<Repository>, chart_dir: PathBuf, progress: ProgressConfig) -> Self {
        Self {
            repository,
            chart_dir,
            progress,
        }
    }

    pub async fn statistics(&self, principal: &Principal) -> ServiceResult<StatisticsView> {
        let filter = ResidentFilter::new(&Scope::for_principal(principal));
        let counts = self.repository.header_counts(&filter).await?;

        let (agama, pendidikan) = if can_view_breakdowns(principal) {
            (
                self.repository.count_by(&filter, Column::Agama).await?,
                self.repository.count_by(&filter, Column::Pendidikan).await?,
            )
        } else {
            (Vec::new(), Vec::new())
        };
        let dusun = if principal.role.is_admin() {
            self.repository.hamlet_breakdown(&filter).await?
        } else {
            Vec::new()
        };

        Ok(StatisticsView {
            total_jiwa: counts.total_penduduk,
            total_kk: counts.total_kk,
            agama,
            pendidikan,
            dusun,
        })
    }

    /// Aggregates plus freshly drawn chart images. Breakdowns follow the
    /// same role rules as [`Self::statistics`]; withheld ones get no chart.
    pub async fn dashboard(&self, principal: &Principal) -> ServiceResult<DashboardView> {
        let filter = ResidentFilter::new(&Scope::for_principal(principal));
        let counts = self.repository.header_counts(&filter).await?;
        let penduduk_dusun = if principal.role.is_admin() {
            self.repository.count_by(&filter, Column::Dusun).await?
        } else {
            Vec::new()
        };
        let (agama, pendidikan) = if can_view_breakdowns(principal) {
            (
                self.repository.count_by(&filter, Column::Agama).await?,
                self.repository.count_by(&filter, Column::Pendidikan).await?,
            )
        } else {
            (Vec::new(), Vec::new())
        };
        let pertumbuhan = self.repository.monthly_growth(&filter).await?;

        let dir = self.chart_dir.join(owner_folder(principal));
        let by_hamlet = series(&penduduk_dusun);
        let by_religion = series(&agama);
        let by_education = series(&pendidikan);
        let growth: Vec<(String, i64)> = pertumbuhan
            .iter()
            .map(|g| (g.bulan.clone(), g.total))
            .collect();

        let written = tokio::task::spawn_blocking(move || -> Result<Vec<String>, ChartError> {
            std::fs::create_dir_all(&dir)?;
            charts::clear_previous(&dir)?;
            let mut names = Vec::new();
            if !by_hamlet.is_empty() {
                let captions = Captions {
                    title: "JUMLAH PENDUDUK PER DUSUN",
                    x_axis: "DUSUN",
                    y_axis: "JIWA",
                };
                charts::bar_chart(&dir, POPULATION_CHART, &captions, &by_hamlet, 0)?;
                names.push(POPULATION_CHART);
            }
            if !by_religion.is_empty() {
                let captions = Captions {
                    title: "KOMPOSISI AGAMA",
                    ..Captions::default()
                };
                charts::pie_chart(&dir, RELIGION_CHART, &captions, &by_religion)?;
                names.push(RELIGION_CHART);
            }
            if !by_education.is_empty() {
                let captions = Captions {
                    title: "TINGKAT PENDIDIKAN",
                    x_axis: "PENDIDIKAN",
                    y_axis: "JIWA",
                };
                charts::bar_chart(&dir, EDUCATION_CHART, &captions, &by_education, 2)?;
                names.push(EDUCATION_CHART);
            }
            if !growth.is_empty() {
                let captions = Captions {
                    title: "PERTUMBUHAN DATA PER BULAN",
                    x_axis: "BULAN",
                    y_axis: "JIWA",
                };
                charts::line_chart(&dir, GROWTH_CHART, &captions, &growth)?;
                names.push(GROWTH_CHART);
            }
            Ok(names
                .into_iter()
                .map(|n| format!("{}/{}", CHART_URL_PREFIX, n))
                .collect())
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("chart task failed: {}", e)))??;

        debug!(user = %principal.username, charts = written.len(), "Dashboard charts drawn");
        Ok(DashboardView {
            total_jiwa: counts.total_penduduk,
            total_kk: counts.total_kk,
            penduduk_dusun,
            agama,
            pendidikan,
            pertumbuhan,
            charts: written,
        })
    }

    /// One of the caller's own charts from their last dashboard visit.
    pub async fn chart_image(&self, principal: &Principal, name: &str) -> ServiceResult<RenderedFile> {
        let missing = || ServiceError::NotFound(MSG_CHART_MISSING.to_string());
        let name = CHART_NAMES
            .iter()
            .find(|known| **known == name)
            .ok_or_else(missing)?;
        let path = self.chart_dir.join(owner_folder(principal)).join(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing()),
            Err(e) => return Err(e.into()),
        };
        Ok(RenderedFile {
            file_name: name.to_string(),
            content_type: PNG_MIME,
            path,
            bytes,
        })
    }

    /// Admin-only entry progress. Hamlet and date filters narrow only the
    /// per-user table; a malformed range is ignored with a warning.
    pub async fn progress(
        &self,
        principal: &Principal,
        dusun: Option<&str>,
        tanggal: Option<&str>,
    ) -> ServiceResult<ProgressView> {
        if !principal.role.is_admin() {
            return Err(ServiceError::Forbidden(MSG_PROGRESS_DENIED.to_string()));
        }

        let mut warnings = Vec::new();
        let filter_dusun = dusun
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let filter_tanggal = tanggal
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let range = match filter_tanggal.as_deref() {
            Some(raw) => {
                let parsed = clock::parse_date_range(raw);
                if parsed.is_none() {
                    warn!(raw, "Ignoring malformed date range");
                    warnings.push(MSG_BAD_DATE_RANGE.to_string());
                }
                parsed
            }
            None => None,
        };

        let mut progress = Vec::new();
        let mut total_terinput = 0;
        for row in self.repository.progress_by_hamlet().await? {
            let target = self.progress.target_for(&row.dusun);
            total_terinput += row.total;
            progress.push(HamletProgress {
                persen: capped_percent(row.total, target),
                dusun: row.dusun,
                terinput: row.total,
                target,
            });
        }
        let total_target: i64 = self.progress.targets.values().sum();

        let per_user = self
            .repository
            .input_per_user(&UserInputFilter {
                dusun: filter_dusun.clone(),
                range,
            })
            .await?;
        let total_input = per_user.iter().map(|r| r.jumlah_input).sum();

        Ok(ProgressView {
            progress,
            total_terinput,
            total_target,
            total_persen: capped_percent(total_terinput, total_target),
            per_user,
            total_input,
            semua_dusun: Hamlet::ALL.iter().map(|h| h.as_str()).collect(),
            filter_dusun,
            filter_tanggal,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capped_percent() {
        assert_eq!(capped_percent(75, 150), 50);
        assert_eq!(capped_percent(300, 150), 100);
        assert_eq!(capped_percent(1, 3), 33);
        assert_eq!(capped_percent(2, 3), 67);
        assert_eq!(capped_percent(5, 0), 0);
    }

    #[test]
    fn test_owner_folder_stays_inside_chart_dir() {
        let admin = Principal::new("admin", crate::models::Role::Admin);
        assert_eq!(owner_folder(&admin), "u_admin");
        let odd = Principal::new("../x", crate::models::Role::Admin);
        assert_eq!(owner_folder(&odd), "u_.._x");
    }
}
