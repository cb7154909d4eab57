//! PDF printouts: family cards, rosters and the statistics summary.

pub mod canvas;
pub mod fonts;
pub mod layouts;

use thiserror::Error;

pub use canvas::{Align, FontStyle, LogoImage, Orientation, PageDecoration, PdfCanvas};
pub use layouts::{FamilyCard, PrintContext, ReportRenderer, StatisticsSummary};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("pdf: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
