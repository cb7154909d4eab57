//! Minimal page-flow PDF writer on top of lopdf.
//!
//! Geometry is in millimetres with the origin at the top-left corner of the
//! page; conversion to PDF user space happens when operations are emitted.
//! Text is drawn with the base-14 Helvetica faces in WinAnsi encoding, so
//! no font program is embedded.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use std::path::Path;
use tracing::{debug, warn};

use super::fonts;
use super::ReportError;

/// Points per millimetre.
const K: f32 = 72.0 / 25.4;
const A4_SHORT: f32 = 210.0;
const A4_LONG: f32 = 297.0;
/// Inner padding of a cell.
const CELL_PADDING: f32 = 1.0;
const LINE_WIDTH: f32 = 0.2;

const WATERMARK_GRAY: f32 = 230.0 / 255.0;
const WATERMARK_SIZE: f32 = 60.0;
const WATERMARK_ANGLE_DEG: f32 = 30.0;

const LOGO_X: f32 = 10.0;
const LOGO_Y: f32 = 10.0;
const LOGO_W: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    fn resource_name(&self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
            Self::Italic => "F3",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Byte length of an RGB buffer, computed in `usize` so large logos
/// cannot wrap.
fn rgb_len(width_px: u32, height_px: u32) -> usize {
    width_px as usize * height_px as usize * 3
}

/// Decoded logo, alpha already composited onto white.
#[derive(Debug, Clone)]
pub struct LogoImage {
    pub width_px: u32,
    pub height_px: u32,
    pub rgb: Vec<u8>,
}

impl LogoImage {
    /// `None` when the file is absent or cannot be decoded.
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            debug!("Logo {} not found, skipping", path.display());
            return None;
        }
        let decoded = match image::open(path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                warn!("Cannot decode logo {}: {}", path.display(), e);
                return None;
            }
        };
        let (width_px, height_px) = decoded.dimensions();
        let mut rgb = Vec::with_capacity(rgb_len(width_px, height_px));
        for pixel in decoded.pixels() {
            let [r, g, b, a] = pixel.0;
            let alpha = u16::from(a);
            for channel in [r, g, b] {
                let blended = (u16::from(channel) * alpha + 255 * (255 - alpha)) / 255;
                rgb.push(blended as u8);
            }
        }
        Some(Self {
            width_px,
            height_px,
            rgb,
        })
    }
}

/// What gets stamped on every page.
#[derive(Debug, Clone, Default)]
pub struct PageDecoration {
    pub watermark: Option<String>,
    pub logo: Option<LogoImage>,
    pub footer: Option<String>,
}

pub struct PdfCanvas {
    page_w: f32,
    page_h: f32,
    margin: f32,
    break_margin: f32,
    pages: Vec<Vec<Operation>>,
    x: f32,
    y: f32,
    style: FontStyle,
    size_pt: f32,
    decoration: PageDecoration,
}

fn real(v: f32) -> Object {
    Object::Real((v * 100.0).round() / 100.0)
}

/// Encode to single-byte WinAnsi; characters outside Latin-1 become `?`.
fn encode_text(text: &str) -> Object {
    let bytes = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

impl PdfCanvas {
    pub fn new(orientation: Orientation, decoration: PageDecoration) -> Self {
        let (page_w, page_h) = match orientation {
            Orientation::Portrait => (A4_SHORT, A4_LONG),
            Orientation::Landscape => (A4_LONG, A4_SHORT),
        };
        Self {
            page_w,
            page_h,
            margin: 10.0,
            break_margin: 15.0,
            pages: Vec::new(),
            x: 10.0,
            y: 10.0,
            style: FontStyle::Regular,
            size_pt: 10.0,
            decoration,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_width(&self) -> f32 {
        self.page_w
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Usable width between the side margins.
    pub fn content_width(&self) -> f32 {
        self.page_w - 2.0 * self.margin
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_xy(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    pub fn add_page(&mut self) {
        self.close_page();
        self.pages.push(vec![Operation::new("w", vec![real(LINE_WIDTH * K)])]);
        self.x = self.margin;
        self.y = self.margin;

        let (style, size) = (self.style, self.size_pt);
        if let Some(text) = self.decoration.watermark.clone() {
            self.draw_watermark(&text);
        }
        if let Some((w, h)) = self
            .decoration
            .logo
            .as_ref()
            .map(|l| (l.width_px, l.height_px))
        {
            self.draw_logo(w, h);
        }
        self.set_font(style, size);
    }

    pub fn set_font(&mut self, style: FontStyle, size_pt: f32) {
        self.style = style;
        self.size_pt = size_pt;
    }

    pub fn font_size(&self) -> f32 {
        self.size_pt
    }

    pub fn font_style(&self) -> FontStyle {
        self.style
    }

    /// Width of `text` in mm with the current font.
    pub fn string_width(&self, text: &str) -> f32 {
        fonts::text_width_pt(self.style, self.size_pt, text) / K
    }

    /// Step the font down by 0.5 pt until `text` fits `max_width` or
    /// `min_pt` is reached. Starts from `base_pt`; returns the chosen size.
    pub fn shrink_to_fit(&mut self, text: &str, max_width: f32, base_pt: f32, min_pt: f32) -> f32 {
        self.set_font(self.style, base_pt);
        while self.string_width(text) > max_width && self.size_pt > min_pt {
            let next = (self.size_pt - 0.5).max(min_pt);
            self.set_font(self.style, next);
        }
        self.size_pt
    }

    /// Shrink-to-fit cell that restores `base_pt` afterwards.
    pub fn fit_cell(&mut self, w: f32, h: f32, text: &str, base_pt: f32, min_pt: f32, align: Align) {
        self.shrink_to_fit(text, w - 2.0 * CELL_PADDING, base_pt, min_pt);
        self.cell(w, h, text, true, align, false);
        self.set_font(self.style, base_pt);
    }

    /// True when a block of height `h` would cross the bottom margin.
    pub fn needs_break(&self, h: f32) -> bool {
        self.y + h > self.page_h - self.break_margin
    }

    /// Draw one cell at the cursor. `w == 0` spans to the right margin.
    /// With `ln` the cursor moves to the start of the next line, otherwise
    /// to the right of the cell.
    pub fn cell(&mut self, w: f32, h: f32, text: &str, border: bool, align: Align, ln: bool) {
        if self.pages.is_empty() {
            self.add_page();
        }
        if self.needs_break(h) {
            let x = self.x;
            self.add_page();
            self.x = x;
        }
        let w = if w <= 0.0 {
            self.page_w - self.margin - self.x
        } else {
            w
        };

        if border {
            self.rect(self.x, self.y, w, h);
        }
        if !text.is_empty() {
            let sw = self.string_width(text);
            let dx = match align {
                Align::Left => CELL_PADDING,
                Align::Center => (w - sw) / 2.0,
                Align::Right => w - CELL_PADDING - sw,
            };
            let baseline = self.y + 0.5 * h + 0.3 * self.size_pt / K;
            self.put_text(self.x + dx, baseline, text, 0.0);
        }

        if ln {
            self.x = self.margin;
            self.y += h;
        } else {
            self.x += w;
        }
    }

    /// Bordered box of height `h` holding pre-wrapped `lines`, each
    /// `line_h` tall, starting at the top. The cursor moves right.
    pub fn wrapped_cell(&mut self, w: f32, h: f32, line_h: f32, lines: &[String]) {
        if self.pages.is_empty() {
            self.add_page();
        }
        let (x, y) = (self.x, self.y);
        self.rect(x, y, w, h);
        for (i, line) in lines.iter().enumerate() {
            let baseline = y + (i as f32 + 0.5) * line_h + 0.3 * self.size_pt / K;
            self.put_text(x + CELL_PADDING, baseline, line, 0.0);
        }
        self.x = x + w;
    }

    /// Greedy word wrap against `max_width`; a single over-long word is
    /// truncated until it fits.
    pub fn word_wrap(&self, text: &str, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        for word in text.split(' ') {
            let candidate = format!("{} {}", current, word).trim().to_string();
            if self.string_width(&candidate) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
            while !current.is_empty() && self.string_width(&current) > max_width {
                current.pop();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    pub fn ln(&mut self, h: f32) {
        self.x = self.margin;
        self.y += h;
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let (ph, ops) = (self.page_h, self.current_ops());
        ops.push(Operation::new("m", vec![real(x1 * K), real((ph - y1) * K)]));
        ops.push(Operation::new("l", vec![real(x2 * K), real((ph - y2) * K)]));
        ops.push(Operation::new("S", vec![]));
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let ph = self.page_h;
        self.current_ops().push(Operation::new(
            "re",
            vec![real(x * K), real((ph - y - h) * K), real(w * K), real(h * K)],
        ));
        self.current_ops().push(Operation::new("S", vec![]));
    }

    fn put_text(&mut self, x: f32, baseline: f32, text: &str, gray: f32) {
        let (font, size, ph) = (self.style.resource_name(), self.size_pt, self.page_h);
        let ops = self.current_ops();
        ops.push(Operation::new("g", vec![real(gray)]));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), real(size)]));
        ops.push(Operation::new("Td", vec![real(x * K), real((ph - baseline) * K)]));
        ops.push(Operation::new("Tj", vec![encode_text(text)]));
        ops.push(Operation::new("ET", vec![]));
    }

    fn draw_watermark(&mut self, text: &str) {
        self.set_font(FontStyle::Bold, WATERMARK_SIZE);
        let width_pt = self.string_width(text) * K;
        let angle = WATERMARK_ANGLE_DEG.to_radians();
        let (sin, cos) = angle.sin_cos();
        let cx = self.page_w / 2.0 * K;
        let cy = self.page_h / 2.0 * K;
        let tx = cx - width_pt / 2.0 * cos;
        let ty = cy - width_pt / 2.0 * sin;

        let ops = self.current_ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("g", vec![real(WATERMARK_GRAY)]));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![Object::Name(b"F2".to_vec()), real(WATERMARK_SIZE)]));
        ops.push(Operation::new(
            "Tm",
            vec![real(cos), real(sin), real(-sin), real(cos), real(tx), real(ty)],
        ));
        ops.push(Operation::new("Tj", vec![encode_text(text)]));
        ops.push(Operation::new("ET", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    fn draw_logo(&mut self, width_px: u32, height_px: u32) {
        if width_px == 0 {
            return;
        }
        let h = LOGO_W * height_px as f32 / width_px as f32;
        let ph = self.page_h;
        let ops = self.current_ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                real(LOGO_W * K),
                real(0.0),
                real(0.0),
                real(h * K),
                real(LOGO_X * K),
                real((ph - LOGO_Y - h) * K),
            ],
        ));
        ops.push(Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]));
        ops.push(Operation::new("Q", vec![]));
    }

    /// Stamp the footer on the page being left.
    fn close_page(&mut self) {
        if self.pages.is_empty() {
            return;
        }
        if let Some(footer) = self.decoration.footer.clone() {
            let (style, size) = (self.style, self.size_pt);
            self.set_font(FontStyle::Italic, 8.0);
            let sw = self.string_width(&footer);
            let x = (self.page_w - sw) / 2.0;
            let baseline = self.page_h - 8.0;
            self.put_text(x, baseline, &footer, 0.0);
            self.set_font(style, size);
        }
    }

    fn current_ops(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Assemble the document. Content streams stay uncompressed.
    pub fn finish(mut self) -> Result<Vec<u8>, ReportError> {
        if self.pages.is_empty() {
            self.add_page();
        }
        self.close_page();

        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for (name, base) in [
            ("F1", "Helvetica"),
            ("F2", "Helvetica-Bold"),
            ("F3", "Helvetica-Oblique"),
        ] {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base,
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(name, id);
        }

        let mut xobjects = Dictionary::new();
        if let Some(logo) = &self.decoration.logo {
            let mut image = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(logo.width_px),
                    "Height" => i64::from(logo.height_px),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8_i64,
                },
                logo.rgb.clone(),
            );
            image.compress()?;
            let id = doc.add_object(image);
            xobjects.set("Im1", id);
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => fonts,
            "XObject" => xobjects,
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in std::mem::take(&mut self.pages) {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    real(self.page_w * K),
                    real(self.page_h * K),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> PdfCanvas {
        let mut c = PdfCanvas::new(Orientation::Landscape, PageDecoration::default());
        c.add_page();
        c
    }

    #[test]
    fn test_shrink_steps_down_until_fit() {
        let mut c = canvas();
        let text = "MUHAMMAD ABDURRAHMAN SIREGAR";
        let base_width = {
            c.set_font(FontStyle::Regular, 8.0);
            c.string_width(text)
        };
        let max = base_width * 0.85;
        let size = c.shrink_to_fit(text, max, 8.0, 6.0);
        assert!(size < 8.0);
        assert!(size >= 6.0);
        assert!(c.string_width(text) <= max || size == 6.0);
        // sizes are reached in 0.5 pt steps
        assert_eq!((size * 2.0).fract(), 0.0);
        // one step larger would not fit
        c.set_font(FontStyle::Regular, size + 0.5);
        assert!(c.string_width(text) > max);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_rgb_len_does_not_wrap() {
        assert_eq!(rgb_len(2, 3), 18);
        // 40000 * 40000 * 3 overflows u32
        assert_eq!(rgb_len(40_000, 40_000), 4_800_000_000usize);
    }

    #[test]
    fn test_shrink_stops_at_minimum() {
        let mut c = canvas();
        let size = c.shrink_to_fit("SANGAT PANJANG SEKALI NAMANYA", 5.0, 8.0, 6.0);
        assert_eq!(size, 6.0);
    }

    #[test]
    fn test_fit_cell_restores_base_size() {
        let mut c = canvas();
        c.set_font(FontStyle::Regular, 8.0);
        c.fit_cell(20.0, 8.0, "NAMA YANG CUKUP PANJANG UNTUK KOLOM", 8.0, 6.0, Align::Left);
        assert_eq!(c.font_size(), 8.0);
    }

    #[test]
    fn test_word_wrap() {
        let mut c = canvas();
        c.set_font(FontStyle::Regular, 8.0);
        let width = c.string_width("BUDI SANTOSO");
        let lines = c.word_wrap("BUDI SANTOSO SIREGAR", width);
        assert_eq!(lines, vec!["BUDI SANTOSO".to_string(), "SIREGAR".to_string()]);
        assert!(c.word_wrap("", 10.0).is_empty());
    }

    #[test]
    fn test_auto_page_break() {
        let mut c = canvas();
        for _ in 0..40 {
            c.cell(0.0, 8.0, "baris", true, Align::Left, true);
        }
        assert!(c.page_count() > 1);
    }

    #[test]
    fn test_finish_produces_loadable_pdf() {
        let mut c = PdfCanvas::new(
            Orientation::Portrait,
            PageDecoration {
                watermark: Some("DESA".into()),
                logo: None,
                footer: Some("Dicetak oleh: admin".into()),
            },
        );
        c.add_page();
        c.set_font(FontStyle::Bold, 12.0);
        c.cell(0.0, 10.0, "JUDUL", false, Align::Center, true);
        c.add_page();
        let bytes = c.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        let haystack = String::from_utf8_lossy(&bytes);
        assert!(haystack.contains("(JUDUL)"));
        assert!(haystack.contains("Dicetak oleh: admin"));
    }
}
