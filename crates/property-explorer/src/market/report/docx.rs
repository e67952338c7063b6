use super::{DocumentWriter, ReportFormat, ReportGenerationError, ReportLayout};
use docx_rs::{AlignmentType, Docx, Paragraph, Run, Table, TableCell, TableRow};
use std::io::Cursor;

const HEADING_COLOR: &str = "333378";
const MUTED_COLOR: &str = "787878";

/// Word document with one two-column table per section.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxWriter;

impl DocumentWriter for DocxWriter {
    fn format(&self) -> ReportFormat {
        ReportFormat::Docx
    }

    fn write(&self, layout: &ReportLayout) -> Result<Vec<u8>, ReportGenerationError> {
        let mut docx = Docx::new()
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(&layout.title).bold().size(36))
                    .align(AlignmentType::Center),
            )
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(&layout.subtitle).size(20).color(MUTED_COLOR))
                    .align(AlignmentType::Center),
            )
            .add_paragraph(
                Paragraph::new()
                    .add_run(
                        Run::new()
                            .add_text(&layout.generated_at)
                            .size(18)
                            .color(MUTED_COLOR),
                    )
                    .align(AlignmentType::Center),
            );

        for section in &layout.sections {
            docx = docx.add_paragraph(
                Paragraph::new().add_run(
                    Run::new()
                        .add_text(&section.title)
                        .bold()
                        .size(28)
                        .color(HEADING_COLOR),
                ),
            );

            if !section.fields.is_empty() {
                let rows = section
                    .fields
                    .iter()
                    .map(|field| {
                        TableRow::new(vec![
                            TableCell::new().add_paragraph(
                                Paragraph::new()
                                    .add_run(Run::new().add_text(&field.label).bold()),
                            ),
                            TableCell::new().add_paragraph(
                                Paragraph::new().add_run(Run::new().add_text(&field.value)),
                            ),
                        ])
                    })
                    .collect();
                docx = docx.add_table(Table::new(rows));
            }

            for note in &section.notes {
                docx = docx.add_paragraph(
                    Paragraph::new().add_run(
                        Run::new()
                            .add_text(note)
                            .italic()
                            .size(16)
                            .color(MUTED_COLOR),
                    ),
                );
            }
        }

        docx = docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(&layout.footer).size(16).color(MUTED_COLOR))
                .align(AlignmentType::Center),
        );

        let mut buffer = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buffer)
            .map_err(|err| ReportGenerationError::Render {
                format: ReportFormat::Docx,
                detail: err.to_string(),
            })?;
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::report::{ReportField, ReportSection};

    #[test]
    fn writes_a_zip_container() {
        let layout = ReportLayout {
            region: "Norwood".to_string(),
            title: "Norwood Property Report".to_string(),
            subtitle: "Subtitle".to_string(),
            generated_at: "Generated 2026-03-01 09:30 UTC".to_string(),
            sections: vec![ReportSection {
                title: "Price Overview".to_string(),
                fields: vec![ReportField {
                    label: "Current Price:".to_string(),
                    value: "$1.10M".to_string(),
                }],
                notes: Vec::new(),
            }],
            footer: "Footer".to_string(),
        };

        let bytes = DocxWriter.write(&layout).expect("docx");
        assert!(bytes.starts_with(b"PK"));
    }
}
