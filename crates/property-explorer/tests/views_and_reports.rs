use chrono::{TimeZone, Utc};
use property_explorer::config::DataConfig;
use property_explorer::market::dataset::DatasetBundle;
use property_explorer::market::format::NOT_AVAILABLE;
use property_explorer::market::metrics::PriceTier;
use property_explorer::market::report::{self, ReportFormat, ReportGenerationError};
use property_explorer::market::views::{self, BannerLevel, MapLayerKind, Tab, ViewFilters};
use property_explorer::market::DatasetBuilder;
use std::io::Cursor;

fn fixture_bundle() -> DatasetBundle {
    DatasetBundle::load(&DataConfig::new(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/data"
    )))
}

fn card<'v>(view: &'v views::ViewSpec, label: &str) -> &'v str {
    view.cards
        .iter()
        .find(|card| card.label == label)
        .map(|card| card.value.as_str())
        .unwrap_or_else(|| panic!("card {label} missing"))
}

#[test]
fn every_tab_renders_for_a_fully_populated_region() {
    let bundle = fixture_bundle();
    for tab in Tab::ordered() {
        let view = views::render_region(&bundle, "Adelaide", tab, &ViewFilters::default())
            .expect("region resolves");
        assert_eq!(view.title, format!("ADELAIDE: {}", tab.label()));
        assert!(
            view.banners
                .iter()
                .all(|banner| banner.level != BannerLevel::Warning),
            "{tab} raised {:?}",
            view.banners
        );
    }
}

#[test]
fn overview_cards_use_display_formatting() {
    let bundle = fixture_bundle();
    let view = views::render_region(&bundle, "Unley", Tab::Overview, &ViewFilters::default())
        .expect("region resolves");
    assert_eq!(card(&view, "Current Price"), "$1.25M");
    assert_eq!(card(&view, "Total Growth"), "31.6%");
}

#[test]
fn zero_population_renders_na_with_a_banner() {
    let bundle = fixture_bundle();
    let view = views::render_region(&bundle, "Para Hills", Tab::Crime, &ViewFilters::default())
        .expect("region resolves");

    assert_eq!(card(&view, "Total Offences"), "50");
    assert_eq!(card(&view, "Crime / 1,000 People"), NOT_AVAILABLE);
    assert!(view
        .banners
        .iter()
        .any(|banner| banner.message.starts_with("Crime rate unavailable")));
}

#[test]
fn tier_filter_flags_regions_outside_the_tier() {
    let bundle = fixture_bundle();
    let filters = ViewFilters {
        price_tier: Some(PriceTier::Premium),
        years: None,
    };
    let view = views::render_region(&bundle, "Adelaide", Tab::Overview, &filters)
        .expect("region resolves");
    assert_eq!(view.banners[0].level, BannerLevel::Info);
    assert!(view.banners[0].message.contains("Premium"));
}

#[test]
fn dashboard_ranks_and_maps_every_region() {
    let bundle = fixture_bundle();
    let view = views::render_dashboard(&bundle, &ViewFilters::default());

    let growth: Vec<&str> = view.tables[0].rows.iter().map(|row| row[1].as_str()).collect();
    assert_eq!(
        growth,
        vec![
            "ELIZABETH",
            "ADELAIDE",
            "PARA HILLS",
            "UNLEY",
            "MOUNT BARKER",
            "GLENELG",
            "NORTH ADELAIDE"
        ]
    );

    let risk: Vec<&str> = view.tables[1].rows.iter().map(|row| row[1].as_str()).collect();
    assert_eq!(risk[..2], ["ELIZABETH", "GLENELG"]);

    let layer = &view.maps[0];
    assert_eq!(layer.kind, MapLayerKind::Choropleth);
    assert_eq!(layer.features.len(), 6);
    assert!(layer.features.iter().all(|feature| feature.geometry.is_some()));
}

#[test]
fn report_layout_is_deterministic() {
    let bundle = fixture_bundle();
    let stamp = Utc
        .with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
        .single()
        .expect("timestamp");

    let first = report::generate(&bundle, "North Adelaide", ReportFormat::Pdf, stamp)
        .expect("pdf report");
    let second = report::generate(&bundle, "north-adelaide", ReportFormat::Docx, stamp)
        .expect("docx report");

    assert_eq!(first.layout, second.layout);
    assert_eq!(first.file_name, "NORTH_ADELAIDE_report.pdf");
    assert_eq!(second.file_name, "NORTH_ADELAIDE_report.docx");
    assert_eq!(first.content_type, "application/pdf");
    assert!(first.bytes.starts_with(b"%PDF"));
    assert!(second.bytes.starts_with(b"PK"));

    let titles: Vec<&str> = first
        .layout
        .sections
        .iter()
        .map(|section| section.title.as_str())
        .collect();
    assert_eq!(
        titles,
        vec![
            "Price Overview",
            "Price Growth",
            "Demographics",
            "Crime & Safety",
            "Rental & Yield",
            "Predictions & Risk",
            "Cultural Communities"
        ]
    );
}

#[test]
fn reports_for_unknown_regions_fail_without_retry() {
    let bundle = fixture_bundle();
    let error = report::generate(&bundle, "Atlantis", ReportFormat::Pdf, Utc::now())
        .expect_err("unknown region");
    assert!(matches!(error, ReportGenerationError::NotFound(_)));
    assert!(!error.retryable());
}

#[test]
fn regions_known_only_from_map_files_have_no_report() {
    let bundle = DatasetBuilder::new()
        .master(Cursor::new("Suburb,Current_Price_2025\nUNLEY,1250000\n"))
        .coordinates(Cursor::new(
            r#"{"UNLEY": {"lat": -34.95, "lng": 138.607}, "BRIGHTON": {"lat": -35.018, "lng": 138.523}}"#,
        ))
        .build();

    let view = views::render_region(&bundle, "Brighton", Tab::Overview, &ViewFilters::default())
        .expect("map-only region resolves");
    assert!(view
        .banners
        .iter()
        .any(|banner| banner.level == BannerLevel::Warning));

    let error = report::generate(&bundle, "Brighton", ReportFormat::Docx, Utc::now())
        .expect_err("no data to report");
    assert!(matches!(
        error,
        ReportGenerationError::NoData { ref region } if region == "BRIGHTON"
    ));
    assert!(!error.retryable());
}

#[test]
fn rescaled_community_shares_are_what_gets_shown() {
    let bundle = DatasetBuilder::new()
        .communities(Cursor::new(
            "Suburb,Community,Population,Share\nNORWOOD,Italian,900,0.9\nNORWOOD,Greek,300,0.3\n",
        ))
        .build();

    let view = views::render_region(&bundle, "Norwood", Tab::Culture, &ViewFilters::default())
        .expect("region resolves");
    assert!(view
        .banners
        .iter()
        .any(|banner| banner.level == BannerLevel::Info && banner.message.contains("rescaled")));
    let shares: Vec<&str> = view.tables[0].rows.iter().map(|row| row[2].as_str()).collect();
    assert_eq!(shares, vec!["75.0%", "25.0%"]);

    let document = report::generate(&bundle, "Norwood", ReportFormat::Pdf, Utc::now())
        .expect("report");
    let culture = document
        .layout
        .sections
        .iter()
        .find(|section| section.title == "Cultural Communities")
        .expect("culture section");
    assert_eq!(culture.fields[0].value, "75.0% (900 people)");
    assert!(culture.notes.iter().any(|note| note.contains("rescaled")));
}
