use property_explorer::config::DataConfig;
use property_explorer::market::dataset::{DatasetBundle, Scenario};
use property_explorer::market::metrics::diversity::diversity_index;
use property_explorer::market::metrics::{
    self, AggregationWindow, MetricUndefined, PriceTier, RegionMetrics, RentBand, RiskBand,
    SafetyLevel, YearRange,
};
use property_explorer::market::resolver;

fn fixture_bundle() -> DatasetBundle {
    DatasetBundle::load(&DataConfig::new(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/data"
    )))
}

fn metrics_for(bundle: &DatasetBundle, region: &str) -> RegionMetrics {
    let resolved = resolver::resolve(bundle, region).expect("region resolves");
    metrics::aggregate(&resolved, &AggregationWindow::default())
}

#[test]
fn adelaide_compound_growth_over_seven_years() {
    let bundle = fixture_bundle();
    let metrics = metrics_for(&bundle, "Adelaide");

    let growth = metrics.growth.value().expect("growth available");
    assert_eq!(growth.years, 7.0);
    let cagr = growth.cagr_percent.get().expect("cagr defined");
    assert!((cagr - 5.96).abs() < 0.01, "cagr was {cagr}");
    let total = growth.total_growth_percent.get().expect("total growth");
    assert!((total - 50.0).abs() < 1e-6);
    assert_eq!(growth.annual.len(), 7);
    assert_eq!(growth.annual.first().map(|point| point.year), Some(2019));

    let price = metrics.price.value().expect("price available");
    assert_eq!(price.tier, Some(PriceTier::MidRange));
}

#[test]
fn year_window_narrows_growth() {
    let bundle = fixture_bundle();
    let resolved = resolver::resolve(&bundle, "ADELAIDE").expect("region resolves");
    let window = AggregationWindow::years(YearRange::new(Some(2021), Some(2022)).expect("range"));
    let metrics = metrics::aggregate(&resolved, &window);

    let growth = metrics.growth.value().expect("growth available");
    assert_eq!(growth.quarterly.len(), 8);
    assert_eq!(growth.years, 2.0);
    assert_eq!(growth.annual.len(), 2);

    let window = AggregationWindow::years(YearRange::new(Some(2030), None).expect("range"));
    let metrics = metrics::aggregate(&resolved, &window);
    assert_eq!(metrics.growth.reason(), Some(&MetricUndefined::EmptyWindow));
}

#[test]
fn zero_population_leaves_crime_rate_unavailable() {
    let bundle = fixture_bundle();
    let metrics = metrics_for(&bundle, "Para Hills");

    let crime = metrics.crime.value().expect("crime family available");
    assert_eq!(crime.total, 50);
    assert_eq!(
        crime.rate_per_1000.reason(),
        Some(&MetricUndefined::MissingPopulation)
    );
    assert_eq!(crime.safety, None);
}

#[test]
fn crime_rate_and_top_categories() {
    let bundle = fixture_bundle();
    let metrics = metrics_for(&bundle, "Adelaide");

    let crime = metrics.crime.value().expect("crime available");
    assert_eq!(crime.total, 2200);
    assert_eq!(crime.rate_per_1000.get(), Some(110.0));
    assert_eq!(crime.safety, Some(SafetyLevel::Moderate));
    assert_eq!(
        crime.top_categories,
        vec!["Theft", "Assault", "Property Damage"]
    );
}

#[test]
fn typo_resolves_through_alias_and_unknown_region_is_not_found() {
    let bundle = fixture_bundle();
    let region = resolver::resolve(&bundle, "Adelaid").expect("alias resolves");
    assert_eq!(region.name, "ADELAIDE");

    let error = resolver::resolve(&bundle, "Atlantis").expect_err("unknown region");
    assert_eq!(error.query, "Atlantis");
    assert!(error.suggestions.is_empty());
}

#[test]
fn rental_gap_and_risk_bands() {
    let bundle = fixture_bundle();
    let metrics = metrics_for(&bundle, "Adelaide");

    let rental = metrics.rental.value().expect("rental available");
    let house = rental.headline().expect("house line");
    assert_eq!(house.property_type, "House");
    assert_eq!(house.gap, 60.0);
    assert_eq!(house.band, Some(RentBand::Overcharged));
    let unit = rental
        .lines
        .iter()
        .find(|line| line.property_type == "Unit")
        .expect("unit line");
    assert_eq!(unit.band, Some(RentBand::Fair));

    let risk = metrics.risk.value().expect("risk available");
    assert_eq!(risk.band, RiskBand::Moderate);

    let elizabeth = metrics_for(&bundle, "Elizabeth");
    let risk = elizabeth.risk.value().expect("risk available");
    assert_eq!(risk.band, RiskBand::VeryHigh);
}

#[test]
fn forecasts_never_replace_observed_years() {
    let bundle = fixture_bundle();
    let metrics = metrics_for(&bundle, "Adelaide");

    let predictions = metrics.predictions.value().expect("predictions available");
    assert_eq!(predictions.last_observed_year, Some(2025));
    let base = predictions.scenario(Scenario::Base).expect("base scenario");
    assert_eq!(base.in_sample.len(), 1);
    assert_eq!(base.in_sample[0].year, 2025);
    assert!(base.points.iter().all(|point| point.year > 2025));

    let next = predictions.next_forecast.expect("next forecast");
    assert_eq!(next.year, 2026);
    assert_eq!(next.predicted_price, 630000.0);
    assert!(predictions.expected_growth_percent.get().expect("expected growth") > 0.0);
}

#[test]
fn diversity_ignores_listing_order() {
    let bundle = fixture_bundle();
    let metrics = metrics_for(&bundle, "Adelaide");
    let culture = metrics.culture.value().expect("culture available");

    assert_eq!(culture.diversity.categories, 4);
    assert!((culture.diversity.other_share - 0.70).abs() < 1e-9);
    assert!(!culture.diversity.clamped);

    let forward = diversity_index([0.15, 0.10, 0.05]);
    let reversed = diversity_index([0.05, 0.10, 0.15]);
    assert_eq!(forward.index, reversed.index);
    assert_eq!(forward.index, culture.diversity.index);
}

#[test]
fn regions_missing_from_a_table_report_no_rows() {
    let bundle = fixture_bundle();
    let metrics = metrics_for(&bundle, "Glenelg");

    assert!(metrics.price.is_available());
    assert!(!metrics.growth.is_available());
    assert!(!metrics.rental.is_available());
    assert!(metrics
        .unavailable()
        .iter()
        .any(|(family, _)| *family == "Rental"));
}
