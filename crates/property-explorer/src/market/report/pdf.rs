use super::{DocumentWriter, ReportFormat, ReportGenerationError, ReportLayout};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const VALUE_COLUMN: f32 = 95.0;
const LINE_HEIGHT: f32 = 6.5;
/// Approximate characters per line at 10pt Helvetica in the value column.
const VALUE_WRAP: usize = 52;
const NOTE_WRAP: usize = 95;

/// A4 PDF using the builtin Helvetica faces.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfWriter;

impl DocumentWriter for PdfWriter {
    fn format(&self) -> ReportFormat {
        ReportFormat::Pdf
    }

    fn write(&self, layout: &ReportLayout) -> Result<Vec<u8>, ReportGenerationError> {
        let (doc, page, layer) =
            PdfDocument::new(&layout.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?;

        let mut cursor = Cursor {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT - MARGIN,
        };

        cursor.text(&layout.title, 18.0, MARGIN, &bold, heading());
        cursor.advance(9.0);
        cursor.text(&layout.subtitle, 10.0, MARGIN, &regular, muted());
        cursor.advance(LINE_HEIGHT);
        cursor.text(&layout.generated_at, 9.0, MARGIN, &regular, muted());
        cursor.advance(LINE_HEIGHT * 2.0);

        for section in &layout.sections {
            cursor.reserve(LINE_HEIGHT * 3.0);
            cursor.text(&section.title, 13.0, MARGIN, &bold, heading());
            cursor.advance(LINE_HEIGHT + 1.5);

            for field in &section.fields {
                let lines = wrap(&field.value, VALUE_WRAP);
                cursor.reserve(LINE_HEIGHT * lines.len() as f32);
                cursor.text(&field.label, 10.0, MARGIN, &bold, body());
                for line in lines {
                    cursor.text(&line, 10.0, VALUE_COLUMN, &regular, body());
                    cursor.advance(LINE_HEIGHT);
                }
            }
            for note in &section.notes {
                for line in wrap(note, NOTE_WRAP) {
                    cursor.reserve(LINE_HEIGHT);
                    cursor.text(&line, 8.0, MARGIN, &regular, muted());
                    cursor.advance(LINE_HEIGHT - 1.5);
                }
            }
            cursor.advance(LINE_HEIGHT);
        }

        for line in wrap(&layout.footer, NOTE_WRAP) {
            cursor.reserve(LINE_HEIGHT);
            cursor.text(&line, 8.0, MARGIN, &regular, muted());
            cursor.advance(LINE_HEIGHT - 1.5);
        }

        doc.save_to_bytes().map_err(render_error)
    }
}

struct Cursor<'d> {
    doc: &'d PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor<'_> {
    fn text(&self, text: &str, size: f32, x: f32, font: &IndirectFontRef, color: Color) {
        self.layer.set_fill_color(color);
        self.layer
            .use_text(printable(text), size, Mm(x), Mm(self.y), font);
    }

    fn advance(&mut self, by: f32) {
        self.y -= by;
    }

    /// Starts a new page unless `height` still fits above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.y - height >= MARGIN {
            return;
        }
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }
}

fn heading() -> Color {
    Color::Rgb(Rgb::new(0.2, 0.2, 0.47, None))
}

fn body() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

fn muted() -> Color {
    Color::Rgb(Rgb::new(0.47, 0.47, 0.47, None))
}

fn render_error(err: printpdf::Error) -> ReportGenerationError {
    ReportGenerationError::Render {
        format: ReportFormat::Pdf,
        detail: err.to_string(),
    }
}

/// Builtin fonts only cover Latin-1.
fn printable(text: &str) -> String {
    text.chars()
        .map(|ch| if u32::from(ch) < 0x100 { ch } else { '?' })
        .collect()
}

/// Greedy word wrap; words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::report::{ReportField, ReportSection};

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(
            wrap("one two three four", 9),
            vec!["one two".to_string(), "three".to_string(), "four".to_string()]
        );
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn non_latin_text_is_replaced() {
        assert_eq!(printable("Café ≥ 5"), "Café ? 5");
    }

    #[test]
    fn long_layouts_render_to_pdf_bytes() {
        let section = ReportSection {
            title: "Cultural Communities".to_string(),
            fields: (0..60)
                .map(|i| ReportField {
                    label: format!("Community {i}:"),
                    value: "1.0% (120 people)".to_string(),
                })
                .collect(),
            notes: vec!["Unavailable: no rows".to_string()],
        };
        let layout = ReportLayout {
            region: "Adelaide".to_string(),
            title: "Adelaide Property Report".to_string(),
            subtitle: "Subtitle".to_string(),
            generated_at: "Generated 2026-03-01 09:30 UTC".to_string(),
            sections: vec![section],
            footer: "Footer".to_string(),
        };

        let bytes = PdfWriter.write(&layout).expect("pdf");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
