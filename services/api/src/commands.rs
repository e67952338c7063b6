use crate::infra::{parse_format, parse_tab, parse_tier, parse_timestamp};
use chrono::{DateTime, Utc};
use clap::Args;
use property_explorer::config::AppConfig;
use property_explorer::error::AppError;
use property_explorer::market::dataset::{self, DatasetBundle};
use property_explorer::market::metrics::{PriceTier, YearRange};
use property_explorer::market::report::{self, ReportFormat};
use property_explorer::market::resolver;
use property_explorer::market::views::{self, BannerLevel, Tab, ViewFilters, ViewSpec};
use property_explorer::telemetry::{self, LogSink};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug, Default)]
pub(crate) struct DataArgs {
    /// Override the configured data directory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RegionsArgs {
    /// Substring to search for; lists every region when omitted
    #[arg(long, short)]
    pub(crate) query: Option<String>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ViewArgs {
    /// Region to show; the landing dashboard is printed when omitted
    #[arg(long)]
    pub(crate) region: Option<String>,
    /// overview, growth, demographics, crime, rental, predictions or culture
    #[arg(long, default_value = "overview", value_parser = parse_tab)]
    pub(crate) tab: Tab,
    /// Restrict to one price tier (budget, mid-range, upper-mid, premium)
    #[arg(long, value_parser = parse_tier)]
    pub(crate) tier: Option<PriceTier>,
    /// First year of the growth window
    #[arg(long)]
    pub(crate) from: Option<i32>,
    /// Last year of the growth window
    #[arg(long)]
    pub(crate) to: Option<i32>,
    /// Print the view specification as JSON
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Region to report on
    #[arg(long)]
    pub(crate) region: String,
    /// pdf or docx
    #[arg(long, default_value = "pdf", value_parser = parse_format)]
    pub(crate) format: ReportFormat,
    /// Destination file; defaults to <region>_report.<ext> in the working directory
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Timestamp printed in the report header (RFC 3339 or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) generated_at: Option<DateTime<Utc>>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DatasetArgs {
    /// Print the load summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

fn load_bundle(args: &DataArgs) -> Result<&'static DatasetBundle, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(data_dir) = &args.data_dir {
        config.data.data_dir = data_dir.clone();
    }
    telemetry::init(&config.telemetry, LogSink::Stderr)?;
    Ok(dataset::shared(&config.data))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_regions(args: RegionsArgs) -> Result<(), AppError> {
    let bundle = load_bundle(&args.data)?;
    let query = args.query.unwrap_or_default();
    let regions = resolver::search(bundle, &query);
    if regions.is_empty() {
        println!("No regions match '{query}'");
    }
    for region in regions {
        println!("{region}");
    }
    Ok(())
}

pub(crate) fn run_view(args: ViewArgs) -> Result<(), AppError> {
    let bundle = load_bundle(&args.data)?;
    let years = match (args.from, args.to) {
        (None, None) => None,
        (from, to) => Some(YearRange::new(from, to).map_err(AppError::bad_request)?),
    };
    let filters = ViewFilters {
        price_tier: args.tier,
        years,
    };

    let view = match &args.region {
        Some(region) => views::render_region(bundle, region, args.tab, &filters)?,
        None => views::render_dashboard(bundle, &filters),
    };

    if args.json {
        print_json(&view)
    } else {
        print_view(&view);
        Ok(())
    }
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let bundle = load_bundle(&args.data)?;
    let generated_at = args.generated_at.unwrap_or_else(Utc::now);
    let document = report::generate(bundle, &args.region, args.format, generated_at)?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&document.file_name));
    let guessed = mime_guess::from_path(&output).first_raw();
    if guessed != Some(document.content_type) {
        warn!(
            path = %output.display(),
            format = %args.format,
            "output extension does not match the report format"
        );
    }

    std::fs::write(&output, &document.bytes)?;
    println!(
        "Wrote {} ({} bytes, {})",
        output.display(),
        document.bytes.len(),
        document.layout.generated_at
    );
    Ok(())
}

pub(crate) fn run_dataset(args: DatasetArgs) -> Result<(), AppError> {
    let bundle = load_bundle(&args.data)?;
    let summary = bundle.summary();
    if args.json {
        return print_json(&summary);
    }

    println!("{} regions", summary.regions);
    for status in &summary.tables {
        match &status.error {
            None => println!("- {}: {} regions", status.label, status.regions),
            Some(error) => println!("- {}: unavailable ({error})", status.label),
        }
    }
    Ok(())
}

fn print_view(view: &ViewSpec) {
    println!("{}", view.title);
    if let Some(subtitle) = &view.subtitle {
        println!("{subtitle}");
    }
    for banner in &view.banners {
        let marker = match banner.level {
            BannerLevel::Info => "i",
            BannerLevel::Warning => "!",
        };
        println!("[{marker}] {}", banner.message);
    }

    if !view.cards.is_empty() {
        println!();
    }
    for card in &view.cards {
        match &card.delta {
            Some(delta) => println!("{}: {} ({delta})", card.label, card.value),
            None => println!("{}: {}", card.label, card.value),
        }
    }

    for table in &view.tables {
        println!("\n{}", table.title);
        println!("  {}", table.columns.join(" | "));
        for row in &table.rows {
            println!("  {}", row.join(" | "));
        }
    }

    for chart in &view.charts {
        let points: usize = chart.series.iter().map(|series| series.points.len()).sum();
        println!(
            "\nChart: {} ({} series, {points} points)",
            chart.title,
            chart.series.len()
        );
    }
    for map in &view.maps {
        println!("\nMap: {} ({} regions)", map.title, map.features.len());
    }

    for note in &view.notes {
        println!("\n{note}");
    }
}
