use std::path::PathBuf;

use super::canvas::{Align, FontStyle, LogoImage, Orientation, PageDecoration, PdfCanvas};
use super::ReportError;
use crate::database::CountRow;
use crate::models::{Hamlet, Resident};
use crate::services::validation::title_case;

const MIN_FONT: f32 = 6.0;
const ROW_H: f32 = 8.0;
const WRAP_LINE_H: f32 = 4.0;

/// A table column: header, width in mm, alignment and whether long
/// values shrink to fit.
struct Column {
    header: &'static str,
    width: f32,
    align: Align,
    shrink: bool,
}

const fn col(header: &'static str, width: f32, align: Align, shrink: bool) -> Column {
    Column {
        header,
        width,
        align,
        shrink,
    }
}

const CARD_COLUMNS: [Column; 12] = [
    col("No", 10.0, Align::Center, false),
    col("NIK", 28.0, Align::Left, false),
    col("Nama", 35.0, Align::Left, true),
    col("JK", 18.0, Align::Center, false),
    col("Tmpt Lahir", 25.0, Align::Left, true),
    col("Tgl Lahir", 25.0, Align::Left, false),
    col("Agama", 18.0, Align::Left, false),
    col("Status", 20.0, Align::Left, false),
    col("Pendidikan", 20.0, Align::Left, false),
    col("Pekerjaan", 25.0, Align::Left, true),
    col("Gol. Darah", 20.0, Align::Center, false),
    col("Hubungan", 20.0, Align::Left, false),
];

const ROSTER_COLUMNS: [Column; 11] = [
    col("No", 10.0, Align::Center, false),
    col("No. KK", 25.0, Align::Left, false),
    col("NIK", 28.0, Align::Left, false),
    col("Nama", 35.0, Align::Left, true),
    col("Hubungan", 25.0, Align::Left, false),
    col("JK", 18.0, Align::Left, false),
    col("Pendidikan", 20.0, Align::Left, false),
    col("Pekerjaan", 20.0, Align::Left, true),
    col("Dusun", 25.0, Align::Left, false),
    col("Alamat", 25.0, Align::Left, true),
    col("Kesejahteraan", 30.0, Align::Left, true),
];

const CARD_NAME_COLUMN: usize = 2;

/// Index of the Dusun column, dropped from single-hamlet rosters.
const ROSTER_HAMLET_COLUMN: usize = 8;

/// Who printed the document and when, rendered into footers.
#[derive(Debug, Clone)]
pub struct PrintContext {
    pub printed_by: String,
    pub printed_at: String,
}

impl PrintContext {
    pub fn footer(&self) -> String {
        format!("Dicetak oleh: {} | Tanggal: {}", self.printed_by, self.printed_at)
    }
}

/// One KK and its members, head first.
#[derive(Debug, Clone)]
pub struct FamilyCard {
    pub nomor_kk: String,
    pub members: Vec<Resident>,
}

#[derive(Debug, Clone, Default)]
pub struct StatisticsSummary {
    pub total_jiwa: i64,
    pub total_kk: i64,
    pub by_religion: Vec<CountRow>,
    pub by_hamlet: Vec<CountRow>,
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

pub struct ReportRenderer {
    village_name: String,
    logo_path: PathBuf,
}

impl ReportRenderer {
    pub fn new(village_name: impl Into<String>, logo_path: impl Into<PathBuf>) -> Self {
        Self {
            village_name: village_name.into(),
            logo_path: logo_path.into(),
        }
    }

    fn decorated(&self, ctx: &PrintContext) -> PdfCanvas {
        PdfCanvas::new(
            Orientation::Landscape,
            PageDecoration {
                watermark: Some(self.village_name.clone()),
                logo: LogoImage::load(&self.logo_path),
                footer: Some(ctx.footer()),
            },
        )
    }

    fn village_subtitle(&self) -> String {
        format!("Desa {}", title_case(&self.village_name))
    }

    /// Card for a single KK.
    pub fn family_card(&self, card: &FamilyCard, ctx: &PrintContext) -> Result<Vec<u8>, ReportError> {
        self.family_cards(std::slice::from_ref(card), false, ctx)
    }

    /// One card per household, each starting on a fresh page. With
    /// `wrap_names` long names break over several lines instead of shrinking.
    pub fn family_cards(
        &self,
        cards: &[FamilyCard],
        wrap_names: bool,
        ctx: &PrintContext,
    ) -> Result<Vec<u8>, ReportError> {
        let columns: Vec<&Column> = CARD_COLUMNS.iter().collect();
        let mut pdf = self.decorated(ctx);
        for card in cards {
            pdf.add_page();
            self.card_heading(&mut pdf, &card.nomor_kk);
            draw_header(&mut pdf, &columns, 9.0);

            pdf.set_font(FontStyle::Regular, 8.0);
            for (idx, member) in card.members.iter().enumerate() {
                let number = (idx + 1).to_string();
                let values = [
                    number.as_str(),
                    member.nik.as_str(),
                    member.nama.as_str(),
                    member.jenis_kelamin.as_str(),
                    member.tempat_lahir.as_str(),
                    member.tanggal_lahir.as_str(),
                    member.agama.as_str(),
                    member.status_perkawinan.as_str(),
                    member.pendidikan.as_str(),
                    member.pekerjaan.as_str(),
                    member.golongan_darah.as_str(),
                    member.hubungan.as_str(),
                ];
                if wrap_names {
                    draw_wrapped_card_row(&mut pdf, &columns, &values);
                } else {
                    draw_row(&mut pdf, &columns, &values, 8.0, 9.0);
                }
            }

            pdf.set_font(FontStyle::Bold, 8.0);
            let label_w = CARD_COLUMNS[0].width + CARD_COLUMNS[1].width;
            let rest_w: f32 = CARD_COLUMNS[2..].iter().map(|c| c.width).sum();
            pdf.cell(
                label_w,
                ROW_H,
                &format!("Total Anggota: {}", card.members.len()),
                true,
                Align::Center,
                false,
            );
            pdf.cell(rest_w, ROW_H, "", true, Align::Left, true);
        }
        pdf.finish()
    }

    fn card_heading(&self, pdf: &mut PdfCanvas, nomor_kk: &str) {
        pdf.set_font(FontStyle::Bold, 18.0);
        pdf.cell(0.0, 10.0, "KARTU KELUARGA", false, Align::Center, true);
        pdf.set_font(FontStyle::Regular, 14.0);
        pdf.cell(0.0, 8.0, &format!("No. KK: {}", nomor_kk), false, Align::Center, true);
        pdf.ln(10.0);
        let right = pdf.page_width() - pdf.margin();
        pdf.line(pdf.margin(), 40.0, right, 40.0);
        pdf.ln(5.0);
    }

    /// Roster of `rows` (already in hamlet/household order). Without a
    /// hamlet every hamlet starts on its own page; with one the Dusun
    /// column is dropped.
    pub fn roster(
        &self,
        rows: &[Resident],
        hamlet: Option<Hamlet>,
        ctx: &PrintContext,
    ) -> Result<Vec<u8>, ReportError> {
        let columns: Vec<&Column> = ROSTER_COLUMNS
            .iter()
            .enumerate()
            .filter(|(i, _)| hamlet.is_none() || *i != ROSTER_HAMLET_COLUMN)
            .map(|(_, c)| c)
            .collect();

        let mut pdf = self.decorated(ctx);
        let mut current_group: Option<&str> = None;
        let mut number = 0usize;

        for row in rows {
            if current_group != Some(row.dusun.as_str()) {
                current_group = Some(row.dusun.as_str());
                pdf.add_page();
                self.roster_heading(&mut pdf, hamlet, &row.dusun);
                draw_header(&mut pdf, &columns, 8.0);
                pdf.set_font(FontStyle::Regular, 7.0);
            }
            number += 1;
            let number_text = number.to_string();
            let welfare = row.welfare_display();
            let mut values = vec![
                number_text.as_str(),
                or_dash(&row.nomor_kk),
                row.nik.as_str(),
                row.nama.as_str(),
                or_dash(&row.hubungan),
                or_dash(&row.jenis_kelamin),
                or_dash(&row.pendidikan),
                or_dash(&row.pekerjaan),
                row.dusun.as_str(),
                or_dash(&row.alamat),
                welfare.as_str(),
            ];
            if hamlet.is_some() {
                values.remove(ROSTER_HAMLET_COLUMN);
            }
            draw_row(&mut pdf, &columns, &values, 7.0, 8.0);
        }

        pdf.set_font(FontStyle::Bold, 8.0);
        let label_w: f32 = columns.iter().take(4).map(|c| c.width).sum();
        let rest_w: f32 = columns.iter().skip(4).map(|c| c.width).sum();
        if pdf.needs_break(ROW_H) {
            pdf.add_page();
        }
        pdf.cell(
            label_w,
            ROW_H,
            &format!("TOTAL PENDUDUK: {}", rows.len()),
            true,
            Align::Center,
            false,
        );
        pdf.cell(rest_w, ROW_H, "", true, Align::Left, true);
        pdf.finish()
    }

    fn roster_heading(&self, pdf: &mut PdfCanvas, hamlet: Option<Hamlet>, group: &str) {
        pdf.set_font(FontStyle::Bold, 16.0);
        match hamlet {
            Some(h) => {
                pdf.cell(
                    0.0,
                    10.0,
                    &format!("DAFTAR PENDUDUK DUSUN {}", h),
                    false,
                    Align::Center,
                    true,
                );
                pdf.ln(10.0);
            }
            None => {
                pdf.cell(0.0, 10.0, "DAFTAR SEMUA PENDUDUK", false, Align::Center, true);
                pdf.set_font(FontStyle::Regular, 12.0);
                pdf.cell(0.0, 8.0, &self.village_subtitle(), false, Align::Center, true);
                pdf.ln(4.0);
                pdf.set_font(FontStyle::Bold, 11.0);
                pdf.cell(0.0, 8.0, &format!("Dusun {}", group), false, Align::Left, true);
                pdf.ln(2.0);
            }
        }
    }

    /// Plain portrait summary without watermark or logo.
    pub fn statistics_summary(
        &self,
        summary: &StatisticsSummary,
        ctx: &PrintContext,
    ) -> Result<Vec<u8>, ReportError> {
        let mut pdf = PdfCanvas::new(Orientation::Portrait, PageDecoration::default());
        pdf.add_page();

        pdf.set_font(FontStyle::Bold, 16.0);
        pdf.cell(0.0, 10.0, "STATISTIK KEPENDUDUKAN", false, Align::Center, true);
        pdf.set_font(FontStyle::Regular, 12.0);
        pdf.cell(0.0, 8.0, &self.village_subtitle(), false, Align::Center, true);
        pdf.ln(10.0);

        pdf.set_font(FontStyle::Bold, 12.0);
        pdf.cell(
            0.0,
            8.0,
            &format!(
                "Total Jiwa: {} | Total KK: {}",
                summary.total_jiwa, summary.total_kk
            ),
            false,
            Align::Left,
            true,
        );
        pdf.ln(5.0);

        pdf.cell(0.0, 8.0, "Berdasarkan Agama:", false, Align::Left, true);
        pdf.set_font(FontStyle::Regular, 10.0);
        for row in &summary.by_religion {
            pdf.cell(
                0.0,
                6.0,
                &format!("- {}: {} orang", row.label, row.total),
                false,
                Align::Left,
                true,
            );
        }
        pdf.ln(10.0);

        pdf.set_font(FontStyle::Bold, 12.0);
        pdf.cell(0.0, 8.0, "Berdasarkan Dusun:", false, Align::Left, true);
        pdf.set_font(FontStyle::Regular, 10.0);
        for row in &summary.by_hamlet {
            pdf.cell(
                0.0,
                6.0,
                &format!("- Dusun {}: {} jiwa", row.label, row.total),
                false,
                Align::Left,
                true,
            );
        }
        pdf.ln(10.0);

        pdf.set_font(FontStyle::Italic, 10.0);
        pdf.cell(
            0.0,
            6.0,
            &format!("Dicetak pada: {}", ctx.printed_at),
            false,
            Align::Left,
            true,
        );
        pdf.cell(0.0, 6.0, &format!("Oleh: {}", ctx.printed_by), false, Align::Left, true);
        pdf.finish()
    }
}

fn draw_header(pdf: &mut PdfCanvas, columns: &[&Column], size: f32) {
    pdf.set_font(FontStyle::Bold, size);
    for c in columns {
        pdf.cell(c.width, ROW_H, c.header, true, Align::Center, false);
    }
    pdf.ln(ROW_H);
}

/// One table row; a page break repeats the header first.
fn draw_row(pdf: &mut PdfCanvas, columns: &[&Column], values: &[&str], base: f32, header_size: f32) {
    if pdf.needs_break(ROW_H) {
        pdf.add_page();
        draw_header(pdf, columns, header_size);
    }
    pdf.set_font(FontStyle::Regular, base);
    for (c, value) in columns.iter().zip(values) {
        draw_value(pdf, c, value, base, ROW_H);
    }
    pdf.ln(ROW_H);
}

fn draw_value(pdf: &mut PdfCanvas, column: &Column, value: &str, base: f32, h: f32) {
    if column.shrink {
        pdf.fit_cell(column.width, h, value, base, MIN_FONT, column.align);
    } else {
        pdf.cell(column.width, h, value, true, column.align, false);
    }
}

/// Card row whose name column wraps; the row grows to fit the name.
fn draw_wrapped_card_row(pdf: &mut PdfCanvas, columns: &[&Column], values: &[&str]) {
    pdf.set_font(FontStyle::Regular, 8.0);
    let lines = pdf.word_wrap(values[CARD_NAME_COLUMN], columns[CARD_NAME_COLUMN].width - 2.0);
    let height = ROW_H.max(lines.len() as f32 * WRAP_LINE_H);

    if pdf.needs_break(height) {
        pdf.add_page();
        draw_header(pdf, columns, 9.0);
        pdf.set_font(FontStyle::Regular, 8.0);
    }
    for (i, (c, value)) in columns.iter().zip(values).enumerate() {
        if i == CARD_NAME_COLUMN {
            pdf.wrapped_cell(c.width, height, WRAP_LINE_H, &lines);
        } else {
            pdf.cell(c.width, height, value, true, c.align, false);
        }
    }
    pdf.ln(height);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_widths_fit_landscape() {
        let card: f32 = CARD_COLUMNS.iter().map(|c| c.width).sum();
        let roster: f32 = ROSTER_COLUMNS.iter().map(|c| c.width).sum();
        assert!(card <= 277.0);
        assert!(roster <= 277.0);
        assert_eq!(ROSTER_COLUMNS[ROSTER_HAMLET_COLUMN].header, "Dusun");
    }

    #[test]
    fn test_footer_text() {
        let ctx = PrintContext {
            printed_by: "admin".into(),
            printed_at: "01-02-2025 10:30".into(),
        };
        assert_eq!(ctx.footer(), "Dicetak oleh: admin | Tanggal: 01-02-2025 10:30");
    }
}
