//! Downloadable per-region reports built from the same metrics the views use.

mod docx;
mod layout;
mod pdf;

pub use docx::DocxWriter;
pub use layout::{build as build_layout, ReportField, ReportLayout, ReportSection};
pub use pdf::PdfWriter;

use crate::market::dataset::DatasetBundle;
use crate::market::metrics::{self, AggregationWindow};
use crate::market::resolver::{self, NotFound};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Docx,
}

impl ReportFormat {
    pub const fn ordered() -> [Self; 2] {
        [Self::Pdf, Self::Docx]
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" | "word" => Some(Self::Docx),
            _ => None,
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportGenerationError {
    #[error(transparent)]
    NotFound(#[from] NotFound),
    #[error("no data available for region '{region}'")]
    NoData { region: String },
    #[error("failed to render {format} report: {detail}")]
    Render { format: ReportFormat, detail: String },
}

impl ReportGenerationError {
    /// Rendering failures are transient from the caller's point of view;
    /// missing regions and empty data are not.
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Render { .. })
    }
}

/// Serializes a layout into one document format.
pub trait DocumentWriter: Debug {
    fn format(&self) -> ReportFormat;
    fn write(&self, layout: &ReportLayout) -> Result<Vec<u8>, ReportGenerationError>;
}

pub fn writer_for(format: ReportFormat) -> Box<dyn DocumentWriter> {
    match format {
        ReportFormat::Pdf => Box::new(PdfWriter),
        ReportFormat::Docx => Box::new(DocxWriter),
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub layout: ReportLayout,
}

/// Download name for a region's report. The stem is safe to quote inside a
/// `Content-Disposition` header.
pub fn file_name(region: &str, format: ReportFormat) -> String {
    let stem: String = region
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_whitespace() || ch.is_control() || matches!(ch, '/' | '\\' | '"') {
                '_'
            } else {
                ch
            }
        })
        .collect();
    format!("{stem}_report.{}", format.extension())
}

/// Resolves `region`, aggregates over the full history and renders one
/// document stamped with `generated_at`.
pub fn generate(
    bundle: &DatasetBundle,
    region: &str,
    format: ReportFormat,
    generated_at: DateTime<Utc>,
) -> Result<Document, ReportGenerationError> {
    generate_with(bundle, region, writer_for(format).as_ref(), generated_at)
}

pub fn generate_with(
    bundle: &DatasetBundle,
    region: &str,
    writer: &dyn DocumentWriter,
    generated_at: DateTime<Utc>,
) -> Result<Document, ReportGenerationError> {
    let resolved = resolver::resolve(bundle, region)?;
    if !resolved.has_any_data() {
        return Err(ReportGenerationError::NoData {
            region: resolved.name.to_string(),
        });
    }

    let metrics = metrics::aggregate(&resolved, &AggregationWindow::default());
    let layout = layout::build(&metrics, generated_at);
    let format = writer.format();
    let bytes = writer.write(&layout).map_err(|err| {
        warn!(region = %metrics.region, %format, error = %err, "report rendering failed");
        err
    })?;

    info!(
        region = %metrics.region,
        %format,
        bytes = bytes.len(),
        "generated region report"
    );

    Ok(Document {
        file_name: file_name(&metrics.region, format),
        content_type: format.content_type(),
        bytes,
        layout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::dataset::DatasetBuilder;
    use chrono::TimeZone;
    use std::io::Cursor;

    #[derive(Debug)]
    struct FailingWriter;

    impl DocumentWriter for FailingWriter {
        fn format(&self) -> ReportFormat {
            ReportFormat::Pdf
        }

        fn write(&self, _layout: &ReportLayout) -> Result<Vec<u8>, ReportGenerationError> {
            Err(ReportGenerationError::Render {
                format: ReportFormat::Pdf,
                detail: "disk full".to_string(),
            })
        }
    }

    fn bundle() -> DatasetBundle {
        DatasetBuilder::new()
            .master(Cursor::new(
                "Suburb,Current_Price_2025,First_Price_2019,Price_Growth_Percent\n\
GLEN OSMOND,1250000,900000,38.9\nEMPTY,,,\n",
            ))
            .time_series(Cursor::new(
                "Suburb,Year,Quarter,Median_Price\n\
GLEN OSMOND,2019,1,900000\nGLEN OSMOND,2025,4,1250000\n",
            ))
            .build()
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).single().expect("timestamp")
    }

    #[test]
    fn file_names_replace_whitespace() {
        assert_eq!(file_name("Glen Osmond", ReportFormat::Pdf), "Glen_Osmond_report.pdf");
        assert_eq!(file_name("MT BARKER", ReportFormat::Docx), "MT_BARKER_report.docx");
        assert_eq!(
            file_name("Kings \"Park\"\u{7}", ReportFormat::Pdf),
            "Kings__Park___report.pdf"
        );
    }

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!(ReportFormat::parse("PDF"), Some(ReportFormat::Pdf));
        assert_eq!(ReportFormat::parse(" word "), Some(ReportFormat::Docx));
        assert_eq!(ReportFormat::parse("xlsx"), None);
    }

    #[test]
    fn layout_is_deterministic_for_a_fixed_timestamp() {
        let bundle = bundle();
        let first = generate(&bundle, "glen osmond", ReportFormat::Docx, stamp()).expect("report");
        let second = generate(&bundle, "Glen Osmond", ReportFormat::Docx, stamp()).expect("report");
        assert_eq!(first.layout, second.layout);
        assert_eq!(first.layout.generated_at, "Generated 2026-03-01 09:30 UTC");
        assert_eq!(first.file_name, "GLEN_OSMOND_report.docx");
    }

    #[test]
    fn unknown_region_is_not_found() {
        let err = generate(&bundle(), "Atlantis", ReportFormat::Pdf, stamp()).unwrap_err();
        assert!(matches!(err, ReportGenerationError::NotFound(_)));
        assert!(!err.retryable());
    }

    #[test]
    fn map_only_region_has_no_data() {
        let bundle = DatasetBuilder::new()
            .master(Cursor::new("Suburb,Current_Price_2025\nGLEN OSMOND,1250000\n"))
            .coordinates(Cursor::new(r#"{"BEAUMONT": {"lat": -34.947, "lng": 138.661}}"#))
            .build();
        let err = generate(&bundle, "Beaumont", ReportFormat::Pdf, stamp()).unwrap_err();
        assert_eq!(
            err,
            ReportGenerationError::NoData {
                region: "BEAUMONT".to_string()
            }
        );
        assert!(!err.retryable());
    }

    #[test]
    fn render_failures_are_retryable() {
        let err = generate_with(&bundle(), "Glen Osmond", &FailingWriter, stamp()).unwrap_err();
        assert!(err.retryable());
        assert_eq!(err.to_string(), "failed to render pdf report: disk full");
    }
}
