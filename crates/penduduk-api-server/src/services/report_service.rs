use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::error::{ensure, ServiceError, ServiceResult};
use crate::database::{Repository, ResidentOrder};
use crate::models::{Hamlet, Principal, Resident};
use crate::report::{FamilyCard, PrintContext, ReportRenderer, StatisticsSummary};
use crate::security::authorization::can_print_hamlet;
use crate::security::{Column, ResidentFilter, Scope};
use crate::utils::clock;
use crate::utils::files::{sanitize_filename, Output, RenderedFile, PDF_MIME};

pub const MSG_HAMLET_NOT_FOUND: &str = "Dusun tidak ditemukan.";

/// Split household-ordered rows into one card per KK.
fn group_cards(rows: Vec<Resident>) -> Vec<FamilyCard> {
    let mut cards: Vec<FamilyCard> = Vec::new();
    for row in rows {
        match cards.last_mut() {
            Some(card) if card.nomor_kk == row.nomor_kk => card.members.push(row),
            _ => cards.push(FamilyCard {
                nomor_kk: row.nomor_kk.clone(),
                members: vec![row],
            }),
        }
    }
    cards
}

fn parse_hamlet(raw: &str) -> ServiceResult<Hamlet> {
    raw.parse::<Hamlet>()
        .map_err(|_| ServiceError::NotFound(MSG_HAMLET_NOT_FOUND.to_string()))
}

pub struct ReportService {
    repository: Arc<Repository>,
    renderer: Arc<ReportRenderer>,
    reports_dir: PathBuf,
}

impl ReportService {
    pub fn new(repository: Arc<Repository>, renderer: Arc<ReportRenderer>, reports_dir: PathBuf) -> Self {
        Self {
            repository,
            renderer,
            reports_dir,
        }
    }

    fn context(principal: &Principal) -> PrintContext {
        PrintContext {
            printed_by: principal.username.clone(),
            printed_at: clock::footer_stamp(),
        }
    }

    async fn save(&self, principal: &Principal, name: &str, bytes: Vec<u8>) -> ServiceResult<Output> {
        let file_name = sanitize_filename(name);
        tokio::fs::create_dir_all(&self.reports_dir).await?;
        let path = self.reports_dir.join(&file_name);
        tokio::fs::write(&path, &bytes).await?;
        info!(user = %principal.username, path = %path.display(), size = bytes.len(), "Report written");
        Ok(Output::File(RenderedFile {
            file_name,
            content_type: PDF_MIME,
            path,
            bytes,
        }))
    }

    fn scoped(principal: &Principal) -> ResidentFilter {
        ResidentFilter::new(&Scope::for_principal(principal))
    }

    /// Hamlets with visible residents, for the print menu.
    pub async fn printable_hamlets(&self, principal: &Principal) -> ServiceResult<Vec<String>> {
        let filter = Self::scoped(principal).non_blank(Column::Dusun);
        Ok(self.repository.populated_hamlets(&filter).await?)
    }

    pub async fn family_card(&self, principal: &Principal, nomor_kk: &str) -> ServiceResult<Output> {
        let nomor_kk = nomor_kk.trim();
        let filter = Self::scoped(principal).eq(Column::NomorKk, nomor_kk);
        let members = self
            .repository
            .list_residents(&filter, ResidentOrder::Household, None)
            .await?;
        if members.is_empty() {
            return Ok(Output::empty("Data tidak ditemukan untuk nomor KK ini."));
        }

        let card = FamilyCard {
            nomor_kk: nomor_kk.to_string(),
            members,
        };
        let bytes = self.renderer.family_card(&card, &Self::context(principal))?;
        self.save(principal, &format!("kk_{}.pdf", nomor_kk), bytes).await
    }

    /// Every visible household, one card per page.
    pub async fn all_family_cards(&self, principal: &Principal) -> ServiceResult<Output> {
        let filter = Self::scoped(principal).non_blank(Column::NomorKk);
        let rows = self
            .repository
            .list_residents(&filter, ResidentOrder::Household, None)
            .await?;
        if rows.is_empty() {
            return Ok(Output::empty("Tidak ada data KK untuk dicetak."));
        }

        let cards = group_cards(rows);
        let bytes = self
            .renderer
            .family_cards(&cards, false, &Self::context(principal))?;
        self.save(principal, "semua_kk.pdf", bytes).await
    }

    /// Cards of one hamlet with wrapped name cells.
    pub async fn hamlet_family_cards(&self, principal: &Principal, dusun: &str) -> ServiceResult<Output> {
        let hamlet = parse_hamlet(dusun)?;
        ensure(can_print_hamlet(principal, hamlet, false))?;

        let filter = Self::scoped(principal)
            .eq(Column::Dusun, hamlet.as_str())
            .non_blank(Column::NomorKk);
        let rows = self
            .repository
            .list_residents(&filter, ResidentOrder::Household, None)
            .await?;
        if rows.is_empty() {
            return Ok(Output::empty(format!("Tidak ada data KK di Dusun {}.", hamlet)));
        }

        let cards = group_cards(rows);
        let bytes = self
            .renderer
            .family_cards(&cards, true, &Self::context(principal))?;
        self.save(principal, &format!("kk_dusun_{}.pdf", hamlet), bytes)
            .await
    }

    /// Roster of every visible resident, a page group per hamlet.
    pub async fn roster(&self, principal: &Principal) -> ServiceResult<Output> {
        let rows = self
            .repository
            .list_residents(&Self::scoped(principal), ResidentOrder::Roster, None)
            .await?;
        if rows.is_empty() {
            return Ok(Output::empty("Tidak ada data untuk dicetak."));
        }
        let bytes = self
            .renderer
            .roster(&rows, None, &Self::context(principal))?;
        self.save(principal, "daftar_semua_penduduk.pdf", bytes).await
    }

    pub async fn hamlet_roster(&self, principal: &Principal, dusun: &str) -> ServiceResult<Output> {
        let hamlet = parse_hamlet(dusun)?;
        ensure(can_print_hamlet(principal, hamlet, true))?;

        let filter = Self::scoped(principal).eq(Column::Dusun, hamlet.as_str());
        let rows = self
            .repository
            .list_residents(&filter, ResidentOrder::Household, None)
            .await?;
        if rows.is_empty() {
            return Ok(Output::empty(format!("Tidak ada data di Dusun {}.", hamlet)));
        }
        let bytes = self
            .renderer
            .roster(&rows, Some(hamlet), &Self::context(principal))?;
        self.save(principal, &format!("daftar_dusun_{}.pdf", hamlet), bytes)
            .await
    }

    pub async fn statistics(&self, principal: &Principal) -> ServiceResult<Output> {
        let filter = Self::scoped(principal);
        let counts = self.repository.header_counts(&filter).await?;
        let summary = StatisticsSummary {
            total_jiwa: counts.total_penduduk,
            total_kk: counts.total_kk,
            by_religion: self.repository.count_by(&filter, Column::Agama).await?,
            by_hamlet: self.repository.count_by(&filter, Column::Dusun).await?,
        };
        let bytes = self
            .renderer
            .statistics_summary(&summary, &Self::context(principal))?;
        self.save(principal, "statistik.pdf", bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resident(kk: &str, nik: &str) -> Resident {
        Resident {
            id: 0,
            nik: nik.into(),
            nomor_kk: kk.into(),
            nama: "X".into(),
            hubungan: String::new(),
            jenis_kelamin: String::new(),
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

    #[test]
    fn test_group_cards_by_consecutive_kk() {
        let cards = group_cards(vec![
            resident("A", "1"),
            resident("A", "2"),
            resident("B", "3"),
        ]);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].members.len(), 2);
        assert_eq!(cards[1].nomor_kk, "B");
    }

    #[test]
    fn test_unknown_hamlet() {
        assert!(matches!(parse_hamlet("LIMA"), Err(ServiceError::NotFound(_))));
        assert_eq!(parse_hamlet("DUA").unwrap(), Hamlet::Dua);
    }
}
