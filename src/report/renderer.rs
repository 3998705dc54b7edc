//! Letter-sized PDF layout of an [`AssembledReport`].

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Rect, Rgb,
};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{AssembledReport, ReportError, ReportRow};
use crate::constants::report::FILENAME_PREFIX;

const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN: f32 = 25.4;

const PT: f32 = 0.352_778;
const CELL_PADDING: f32 = 6.0 * PT;
const GRID_THICKNESS: f32 = 1.0;
const TABLE_FONT_SIZE: f32 = 10.0;
const TABLE_LEADING: f32 = 12.0 * PT;
const COLUMN_WIDTHS: [f32; 2] = [63.5, 101.6];
const LOGO_HEIGHT: f32 = 15.0;

const HEADER_BG: f32 = 0.3;
const STRIPE_BG: f32 = 0.95;

/// Patient fields printed above the event table.
#[derive(Debug, Clone, Default)]
pub struct PatientDetails {
    pub first_name: String,
    pub last_name: String,
    pub procedure: String,
    pub patient_id: String,
}

/// Optional branding on the first page.
#[derive(Debug, Clone, Default)]
pub struct Letterhead {
    pub logo_path: Option<PathBuf>,
    pub branding: String,
}

#[derive(Debug)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub pages: usize,
}

/// `surgery_report_<patient id>.pdf`, with anything outside `[A-Za-z0-9_-]`
/// replaced by `_`.
#[must_use]
pub fn report_filename(patient_id: &str) -> String {
    let sanitized: String = patient_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        format!("{FILENAME_PREFIX}unknown.pdf")
    } else {
        format!("{FILENAME_PREFIX}{sanitized}.pdf")
    }
}

pub fn render(
    patient: &PatientDetails,
    report: &AssembledReport,
    letterhead: &Letterhead,
) -> Result<RenderedReport, ReportError> {
    let mut page = Page::new("Surgery Report")?;

    page.letterhead(letterhead);

    page.line("Surgery Report", 18.0, true);
    page.advance(4.0);

    page.line(&format!("Patient First Name: {}", patient.first_name), 12.0, false);
    page.line(&format!("Patient Last Name: {}", patient.last_name), 12.0, false);
    page.line(&format!("Procedure: {}", patient.procedure), 12.0, false);
    page.line(&format!("Patient ID: {}", patient.patient_id), 12.0, false);
    page.line(
        &format!("Duration: {} seconds", format_duration(report.duration_secs)),
        12.0,
        false,
    );
    page.advance(4.0);

    page.line("Summary:", 14.0, true);
    let summary_chars = chars_per_line(PAGE_WIDTH - 2.0 * MARGIN, 11.0);
    for line in wrap_text(&report.summary, summary_chars) {
        page.line(&line, 11.0, false);
    }
    page.advance(4.0);

    page.line("Events:", 14.0, true);
    page.advance(2.0);
    page.table(&report.rows);

    let pages = page.pages;
    let bytes = page.finish()?;
    debug!(pages, bytes = bytes.len(), "Report rendered");

    Ok(RenderedReport {
        bytes,
        filename: report_filename(&patient.patient_id),
        pages,
    })
}

/// Cursor over the current page, measured in millimetres from the bottom edge.
struct Page {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl Page {
    fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Render(format!("PDF font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Render(format!("PDF font error: {e}")))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
        self.pages += 1;
    }

    /// Starts a new page unless `height` still fits above the bottom margin.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.y - height < MARGIN {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn advance(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn font(&self, bold: bool) -> &IndirectFontRef {
        if bold { &self.bold } else { &self.regular }
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool) {
        self.layer
            .use_text(winansi_safe(text), size, Mm(x), Mm(y), self.font(bold));
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        let leading = size * 1.2 * PT;
        self.ensure_space(leading);
        self.y -= leading;
        self.text(text, size, MARGIN, self.y, bold);
    }

    fn letterhead(&mut self, letterhead: &Letterhead) {
        let logo = letterhead.logo_path.as_deref().and_then(load_logo);
        let mut used = 0.0;

        if let Some(image) = logo {
            let px_height = image.image.height.0.max(1) as f32;
            let dpi = px_height * 25.4 / LOGO_HEIGHT;
            image.add_to_layer(
                self.layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(MARGIN)),
                    translate_y: Some(Mm(self.y - LOGO_HEIGHT)),
                    dpi: Some(dpi),
                    ..Default::default()
                },
            );
            used = LOGO_HEIGHT;
        }

        if !letterhead.branding.is_empty() {
            self.text(
                &letterhead.branding,
                9.0,
                PAGE_WIDTH - MARGIN - 60.0,
                self.y - 5.0,
                false,
            );
            used = f32::max(used, 6.0);
        }

        if used > 0.0 {
            self.y -= used + 4.0;
        }
    }

    fn table(&mut self, rows: &[ReportRow]) {
        self.header_row();
        let max_lines = max_lines_per_page();

        for (index, row) in rows.iter().enumerate() {
            let cells = [
                wrap_text(&row.timestamp, cell_chars(COLUMN_WIDTHS[0])),
                wrap_text(&row.event_value, cell_chars(COLUMN_WIDTHS[1])),
            ];
            let background = if index % 2 == 0 { 1.0 } else { STRIPE_BG };

            // A row longer than a page continues on the next one.
            for part in split_cells(&cells, max_lines) {
                let height = row_height(&part);
                if self.ensure_space(height) {
                    self.header_row();
                }
                self.row(&part, height, background, false);
            }
        }
    }

    fn header_row(&mut self) {
        let cells = [vec!["Timestamp".to_string()], vec!["Event Value".to_string()]];
        let height = row_height(&cells);
        self.ensure_space(height);
        self.row(&cells, height, HEADER_BG, true);
    }

    fn row(&mut self, cells: &[Vec<String>; 2], height: f32, background: f32, header: bool) {
        let top = self.y;
        let bottom = top - height;
        let mut x = MARGIN;

        for (lines, width) in cells.iter().zip(COLUMN_WIDTHS) {
            self.layer.set_fill_color(gray(background));
            self.layer.set_outline_color(gray(0.0));
            self.layer.set_outline_thickness(GRID_THICKNESS);
            self.layer.add_rect(
                Rect::new(Mm(x), Mm(bottom), Mm(x + width), Mm(top)).with_mode(PaintMode::FillStroke),
            );

            self.layer
                .set_fill_color(if header { gray(1.0) } else { gray(0.0) });
            let mut baseline = top - CELL_PADDING - TABLE_FONT_SIZE * PT;
            for line in lines {
                self.text(line, TABLE_FONT_SIZE, x + CELL_PADDING, baseline, header);
                baseline -= TABLE_LEADING;
            }

            x += width;
        }

        self.layer.set_fill_color(gray(0.0));
        self.y = bottom;
    }

    fn finish(self) -> Result<Vec<u8>, ReportError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ReportError::Render(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ReportError::Render(format!("PDF buffer error: {e}")))
    }
}

fn load_logo(path: &Path) -> Option<Image> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Report logo not available");
            return None;
        }
    };

    let decoder = printpdf::image_crate::codecs::png::PngDecoder::new(std::io::BufReader::new(file));
    match decoder.map_err(|e| e.to_string()).and_then(|d| Image::try_from(d).map_err(|e| e.to_string())) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Report logo could not be decoded, skipping");
            None
        }
    }
}

fn gray(level: f32) -> Color {
    Color::Rgb(Rgb::new(level, level, level, None))
}

fn row_height(cells: &[Vec<String>; 2]) -> f32 {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
    lines as f32 * TABLE_LEADING + 2.0 * CELL_PADDING
}

/// Body lines that fit on an empty page below the repeated header row.
fn max_lines_per_page() -> usize {
    let header = TABLE_LEADING + 2.0 * CELL_PADDING;
    let usable = PAGE_HEIGHT - 2.0 * MARGIN - header - 2.0 * CELL_PADDING;
    ((usable / TABLE_LEADING).floor() as usize).saturating_sub(1).max(1)
}

fn split_cells(cells: &[Vec<String>; 2], max_lines: usize) -> Vec<[Vec<String>; 2]> {
    let lines = cells.iter().map(Vec::len).max().unwrap_or(0);
    if lines <= max_lines {
        return vec![cells.clone()];
    }

    (0..lines)
        .step_by(max_lines)
        .map(|start| {
            let slice = |cell: &Vec<String>| -> Vec<String> {
                cell.iter().skip(start).take(max_lines).cloned().collect()
            };
            [slice(&cells[0]), slice(&cells[1])]
        })
        .collect()
}

/// Builtin fonts are WinAnsi encoded, which has no glyphs for most Central
/// European letters. Those are folded to their base letter; anything else
/// outside Latin-1 becomes `?`.
fn winansi_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            c if c.is_ascii() || ('\u{a0}'..='\u{ff}').contains(&c) => c,
            'ą' | 'ă' | 'ā' => 'a',
            'Ą' | 'Ă' | 'Ā' => 'A',
            'ć' | 'č' => 'c',
            'Ć' | 'Č' => 'C',
            'ď' | 'đ' => 'd',
            'Ď' | 'Đ' => 'D',
            'ę' | 'ě' | 'ē' => 'e',
            'Ę' | 'Ě' | 'Ē' => 'E',
            'ł' | 'ľ' | 'ĺ' => 'l',
            'Ł' | 'Ľ' | 'Ĺ' => 'L',
            'ń' | 'ň' => 'n',
            'Ń' | 'Ň' => 'N',
            'ő' => 'o',
            'Ő' => 'O',
            'ř' | 'ŕ' => 'r',
            'Ř' | 'Ŕ' => 'R',
            'ś' | 'š' | 'ş' => 's',
            'Ś' | 'Š' | 'Ş' => 'S',
            'ť' | 'ţ' => 't',
            'Ť' | 'Ţ' => 'T',
            'ů' | 'ű' => 'u',
            'Ů' | 'Ű' => 'U',
            'ź' | 'ż' | 'ž' => 'z',
            'Ź' | 'Ż' | 'Ž' => 'Z',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201c}' | '\u{201d}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            _ => '?',
        })
        .collect()
}

fn cell_chars(width: f32) -> usize {
    chars_per_line(width - 2.0 * CELL_PADDING, TABLE_FONT_SIZE)
}

/// Rough capacity for Helvetica, whose average glyph is about half an em.
fn chars_per_line(width_mm: f32, font_size: f32) -> usize {
    ((width_mm / (font_size * PT * 0.5)) as usize).max(1)
}

fn format_duration(secs: f64) -> String {
    if secs.fract() == 0.0 {
        format!("{secs:.0}")
    } else {
        secs.to_string()
    }
}

/// Greedy word wrap; words longer than a line are split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let word: String = word.into_iter().collect();
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> PatientDetails {
        PatientDetails {
            first_name: "Tomasz".to_string(),
            last_name: "Lis".to_string(),
            procedure: "Appendectomy".to_string(),
            patient_id: "90010112345".to_string(),
        }
    }

    fn report(rows: usize) -> AssembledReport {
        AssembledReport {
            rows: (0..rows)
                .map(|i| ReportRow {
                    timestamp: "2024-06-01 12:00:00".to_string(),
                    event_type: "medicine".to_string(),
                    event_value: format!("Event number {i}"),
                })
                .collect(),
            summary: "The appendix was removed without complications.".to_string(),
            duration_secs: 42.0,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_report_filename_sanitizes() {
        assert_eq!(report_filename("90010112345"), "surgery_report_90010112345.pdf");
        assert_eq!(report_filename("../etc/passwd"), "surgery_report____etc_passwd.pdf");
        assert_eq!(report_filename("A-1_b"), "surgery_report_A-1_b.pdf");
        assert_eq!(report_filename("  "), "surgery_report_unknown.pdf");
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("one two three", 7), ["one two", "three"]);
        assert_eq!(wrap_text("abcdefghij", 4), ["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("first\nsecond", 40), ["first", "second"]);
        assert!(wrap_text("", 10).is_empty());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42.0), "42");
        assert_eq!(format_duration(42.5), "42.5");
    }

    #[test]
    fn test_render_produces_pdf() {
        let rendered = render(&patient(), &report(2), &Letterhead::default()).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.filename, "surgery_report_90010112345.pdf");
        assert_eq!(rendered.pages, 1);
    }

    #[test]
    fn test_empty_event_list_still_renders() {
        let rendered = render(&patient(), &report(0), &Letterhead::default()).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.pages, 1);
    }

    #[test]
    fn test_long_table_breaks_across_pages() {
        let rendered = render(&patient(), &report(120), &Letterhead::default()).unwrap();
        assert!(rendered.pages > 1);
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    fn write_logo() -> PathBuf {
        use printpdf::image_crate::{ImageBuffer, Rgb as Pixel};

        let path = std::env::temp_dir().join(format!("ornotes-logo-{}.png", uuid::Uuid::new_v4()));
        ImageBuffer::from_pixel(8, 4, Pixel([200u8, 30, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_logo_is_embedded_and_pushes_content_down() {
        let path = write_logo();
        let letterhead = Letterhead {
            logo_path: Some(path.clone()),
            branding: String::new(),
        };

        let mut page = Page::new("Surgery Report").unwrap();
        let top = page.y;
        page.letterhead(&letterhead);
        assert!((top - page.y - (LOGO_HEIGHT + 4.0)).abs() < 0.001);

        let rendered = render(&patient(), &report(1), &letterhead).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert!(contains(&rendered.bytes, b"/Image"));
    }

    #[test]
    fn test_letterhead_without_logo_or_branding_takes_no_space() {
        let letterhead = Letterhead {
            logo_path: Some(PathBuf::from("/nonexistent/logo.png")),
            branding: String::new(),
        };
        let mut page = Page::new("Surgery Report").unwrap();
        let top = page.y;
        page.letterhead(&letterhead);
        assert!((top - page.y).abs() < f32::EPSILON);
    }

    #[test]
    fn test_winansi_safe_folds_polish_letters() {
        assert_eq!(winansi_safe("Zieliński"), "Zielinski");
        assert_eq!(winansi_safe("Dąbrowska"), "Dabrowska");
        assert_eq!(winansi_safe("Łukasz Żółć"), "Lukasz Zólc");
        assert_eq!(winansi_safe("Müller"), "Müller");
        assert_eq!(winansi_safe("dose → 5 mg"), "dose ? 5 mg");
    }

    #[test]
    fn test_split_cells() {
        let cells = [
            vec!["2024-06-01".to_string(), "12:00:00".to_string()],
            (0..5).map(|i| format!("line {i}")).collect(),
        ];
        assert_eq!(split_cells(&cells, 10).len(), 1);

        let parts = split_cells(&cells, 2);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0][0], ["2024-06-01", "12:00:00"]);
        assert_eq!(parts[0][1], ["line 0", "line 1"]);
        assert!(parts[1][0].is_empty());
        assert_eq!(parts[2][1], ["line 4"]);
    }

    #[test]
    fn test_oversized_row_stays_within_margins() {
        let row = ReportRow {
            timestamp: "2024-06-01 12:00:00".to_string(),
            event_type: "note".to_string(),
            event_value: "word ".repeat(3000),
        };
        let lines = wrap_text(&row.event_value, cell_chars(COLUMN_WIDTHS[1])).len();
        assert!(lines > max_lines_per_page());

        let mut page = Page::new("Surgery Report").unwrap();
        page.table(std::slice::from_ref(&row));
        assert!(page.pages > 1);
        assert!(page.y >= MARGIN);

        for part in split_cells(
            &[vec![row.timestamp.clone()], wrap_text(&row.event_value, cell_chars(COLUMN_WIDTHS[1]))],
            max_lines_per_page(),
        ) {
            let header = TABLE_LEADING + 2.0 * CELL_PADDING;
            assert!(row_height(&part) <= PAGE_HEIGHT - 2.0 * MARGIN - header);
        }
    }

    #[test]
    fn test_missing_logo_is_not_fatal() {
        let letterhead = Letterhead {
            logo_path: Some(PathBuf::from("/nonexistent/logo.png")),
            branding: "Operating Room Notes".to_string(),
        };
        let rendered = render(&patient(), &report(1), &letterhead).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }
}
