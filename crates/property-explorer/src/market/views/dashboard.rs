use super::spec::{Banner, MapFeature, MapLayer, MapLayerKind, MetricCard, Table, ViewSpec};
use super::ViewFilters;
use crate::market::dataset::{Coordinate, DatasetBundle, TableKind};
use crate::market::format::{fmt_count, fmt_num, fmt_pct, fmt_price, NOT_AVAILABLE};
use crate::market::metrics::growth::{self, median};
use crate::market::metrics::{PriceTier, RiskBand, YearRange};
use std::collections::HashMap;
use tracing::debug;

pub(super) const UNKNOWN_TIER_COLOR: &str = "#888888";
const TOP_N: usize = 10;
const SOURCES_NOTE: &str = "Property prices Q1 2019 to Q4 2025; demographics and rental from \
Census 2021; crime from SA Government offence records.";

/// Landing-page figures for one region.
#[derive(Debug)]
struct Snapshot<'a> {
    key: &'a str,
    name: &'a str,
    price: Option<f64>,
    growth: Option<f64>,
    tier: Option<PriceTier>,
    risk: Option<f64>,
    coordinate: Option<Coordinate>,
}

/// Rankings and map for the landing page, restricted by the filters.
pub fn render_dashboard(bundle: &DatasetBundle, filters: &ViewFilters) -> ViewSpec {
    let mut view = ViewSpec::new("Adelaide Property Market Explorer");
    view.subtitle = filters.describe_years();

    for (family, table, error) in [
        ("Prices", TableKind::Master, bundle.master.error()),
        ("Price history", TableKind::TimeSeries, bundle.time_series.error()),
        ("Risk rankings", TableKind::Risk, bundle.risk.error()),
    ] {
        if let Some(error) = error {
            debug!(table = %table, %error, "dashboard source unavailable");
            view.banners
                .push(Banner::warning(format!("{family} unavailable: {table} data unavailable")));
        }
    }

    let window = filters.years.filter(|years| !years.is_unbounded());
    let snapshots: Vec<Snapshot<'_>> = bundle
        .regions()
        .iter()
        .map(|(key, name)| snapshot(bundle, key, name, window.as_ref()))
        .filter(|snapshot| filters.price_tier.map_or(true, |tier| snapshot.tier == Some(tier)))
        .collect();

    if snapshots.is_empty() {
        view.banners
            .push(Banner::info("No suburbs match the selected filters"));
    }

    let prices: Vec<f64> = snapshots.iter().filter_map(|snapshot| snapshot.price).collect();
    view.cards.push(MetricCard::new("Suburbs", fmt_count(prices.len() as u64)));
    view.cards
        .push(MetricCard::new("Median Price", fmt_price(median(&prices))));
    view.cards.push(MetricCard::new(
        "Median Growth",
        fmt_pct(
            median(
                &snapshots
                    .iter()
                    .filter_map(|snapshot| snapshot.growth)
                    .collect::<Vec<_>>(),
            ),
            1,
        ),
    ));

    view.tables.push(top_growth(&snapshots));
    view.tables.push(top_risk(&snapshots));

    match map_layer(bundle, &snapshots, filters.price_tier.is_some()) {
        Some(layer) => view.maps.push(layer),
        None => view.banners.push(Banner::info(
            "Map data unavailable: neither suburb boundaries nor coordinates loaded",
        )),
    }

    view.notes.push(SOURCES_NOTE.to_string());
    view
}

fn snapshot<'a>(
    bundle: &'a DatasetBundle,
    key: &'a str,
    name: &'a str,
    window: Option<&YearRange>,
) -> Snapshot<'a> {
    let profile = bundle.master.lookup(key).available().copied();
    let series = bundle.time_series.lookup(key);

    let price = profile
        .and_then(|profile| profile.current_price)
        .or_else(|| {
            series
                .available()
                .and_then(|points| points.last().map(|point| point.median_price))
        });

    let growth = match window {
        Some(years) => growth::analyse(series, years)
            .ok()
            .and_then(|growth| growth.total_growth_percent.get()),
        None => profile
            .and_then(|profile| profile.growth_percent_or_derived())
            .or_else(|| {
                growth::analyse(series, &YearRange::default())
                    .ok()
                    .and_then(|growth| growth.total_growth_percent.get())
            }),
    };

    let risk = bundle
        .risk
        .lookup(key)
        .available()
        .map(|record| record.score)
        .filter(|score| score.is_finite() && *score >= 0.0);

    Snapshot {
        key,
        name,
        price,
        growth,
        tier: price.and_then(PriceTier::from_price),
        risk,
        coordinate: bundle.coordinates.lookup(key).available().map(|c| **c),
    }
}

/// Descending by value, ties alphabetical by name.
fn ranked<'s, 'a>(
    snapshots: &'s [Snapshot<'a>],
    value: impl Fn(&Snapshot<'a>) -> Option<f64>,
) -> Vec<(&'s Snapshot<'a>, f64)> {
    let mut ranked: Vec<(&Snapshot<'a>, f64)> = snapshots
        .iter()
        .filter_map(|snapshot| value(snapshot).map(|value| (snapshot, value)))
        .collect();
    ranked.sort_by(|(a, a_value), (b, b_value)| {
        b_value
            .total_cmp(a_value)
            .then_with(|| a.name.cmp(b.name))
    });
    ranked.truncate(TOP_N);
    ranked
}

fn top_growth(snapshots: &[Snapshot<'_>]) -> Table {
    let mut table = Table::new("Top 10 Growth Suburbs", &["Rank", "Suburb", "Price", "Growth %"]);
    for (rank, (snapshot, growth)) in ranked(snapshots, |snapshot| snapshot.growth)
        .into_iter()
        .enumerate()
    {
        table.row(vec![
            (rank + 1).to_string(),
            snapshot.name.to_string(),
            fmt_price(snapshot.price),
            fmt_pct(Some(growth), 1),
        ]);
    }
    table
}

fn top_risk(snapshots: &[Snapshot<'_>]) -> Table {
    let mut table = Table::new(
        "Top 10 Highest Risk Suburbs",
        &["Rank", "Suburb", "Price", "Risk Score", "Risk Category"],
    );
    for (rank, (snapshot, score)) in ranked(snapshots, |snapshot| snapshot.risk)
        .into_iter()
        .enumerate()
    {
        table.row(vec![
            (rank + 1).to_string(),
            snapshot.name.to_string(),
            fmt_price(snapshot.price),
            fmt_num(Some(score), 1),
            RiskBand::from_score(score)
                .map(|band| band.label())
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
        ]);
    }
    table
}

fn legend() -> Vec<(String, String)> {
    PriceTier::ordered()
        .into_iter()
        .map(|tier| {
            (
                format!("{} ({})", tier.label(), tier.range_label()),
                tier.color().to_string(),
            )
        })
        .collect()
}

fn tooltip(name: &str, snapshot: Option<&Snapshot<'_>>) -> Vec<(String, String)> {
    vec![
        ("Suburb".to_string(), name.to_string()),
        (
            "Current Price".to_string(),
            fmt_price(snapshot.and_then(|snapshot| snapshot.price)),
        ),
        (
            "Growth".to_string(),
            fmt_pct(snapshot.and_then(|snapshot| snapshot.growth), 1),
        ),
        (
            "Price Tier".to_string(),
            snapshot
                .and_then(|snapshot| snapshot.tier)
                .map_or(NOT_AVAILABLE, PriceTier::label)
                .to_string(),
        ),
    ]
}

fn tier_color(snapshot: Option<&Snapshot<'_>>) -> String {
    snapshot
        .and_then(|snapshot| snapshot.tier)
        .map_or(UNKNOWN_TIER_COLOR, PriceTier::color)
        .to_string()
}

/// Boundary choropleth when boundaries loaded, otherwise centroid points.
fn map_layer(
    bundle: &DatasetBundle,
    snapshots: &[Snapshot<'_>],
    filtered: bool,
) -> Option<MapLayer> {
    let by_key: HashMap<&str, &Snapshot<'_>> = snapshots
        .iter()
        .map(|snapshot| (snapshot.key, snapshot))
        .collect();

    if let Some(boundaries) = bundle.boundaries.table() {
        let features = boundaries
            .iter()
            .filter(|(key, _)| !filtered || by_key.contains_key(key))
            .map(|(key, feature)| {
                let snapshot = by_key.get(key).copied();
                let name = bundle
                    .region_name(key)
                    .or_else(|| boundaries.name(key))
                    .unwrap_or(key);
                MapFeature {
                    region: name.to_string(),
                    color: tier_color(snapshot),
                    tooltip: tooltip(name, snapshot),
                    coordinate: snapshot.and_then(|snapshot| snapshot.coordinate),
                    geometry: Some(feature.clone()),
                }
            })
            .collect();
        return Some(MapLayer {
            kind: MapLayerKind::Choropleth,
            title: "Price Tier by Suburb".to_string(),
            legend: legend(),
            features,
        });
    }

    bundle.coordinates.table()?;
    let features = snapshots
        .iter()
        .filter_map(|snapshot| {
            snapshot.coordinate.map(|coordinate| MapFeature {
                region: snapshot.name.to_string(),
                color: tier_color(Some(snapshot)),
                tooltip: tooltip(snapshot.name, Some(snapshot)),
                coordinate: Some(coordinate),
                geometry: None,
            })
        })
        .collect();
    Some(MapLayer {
        kind: MapLayerKind::Points,
        title: "Price Tier by Suburb".to_string(),
        legend: legend(),
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::dataset::DatasetBuilder;
    use std::io::Cursor;

    fn bundle() -> DatasetBundle {
        DatasetBuilder::new()
            .master(Cursor::new(
                "Suburb,Current_Price_2025,Price_Growth_Percent\n\
ALPHA,450000,30\nBRAVO,600000,45\nCHARLIE,900000,45\nDELTA,1200000,10\n",
            ))
            .risk(Cursor::new(
                "Suburb,Total_Risk_Score\nALPHA,80\nBRAVO,20\nCHARLIE,80\n",
            ))
            .coordinates(Cursor::new(
                r#"{"ALPHA": {"lat": -34.9, "lng": 138.6}, "DELTA": {"lat": -34.8, "lng": 138.5}}"#,
            ))
            .build()
    }

    fn column(table: &Table, index: usize) -> Vec<&str> {
        table.rows.iter().map(|row| row[index].as_str()).collect()
    }

    #[test]
    fn rankings_sort_descending_with_alphabetical_ties() {
        let view = render_dashboard(&bundle(), &ViewFilters::default());
        assert_eq!(column(&view.tables[0], 1), vec!["BRAVO", "CHARLIE", "ALPHA", "DELTA"]);
        assert_eq!(column(&view.tables[1], 1), vec!["ALPHA", "CHARLIE", "BRAVO"]);
        assert_eq!(column(&view.tables[1], 4), vec!["Very High", "Very High", "Low"]);
    }

    #[test]
    fn tier_filter_restricts_rankings_and_map() {
        let filters = ViewFilters {
            price_tier: Some(PriceTier::Premium),
            years: None,
        };
        let view = render_dashboard(&bundle(), &filters);
        assert_eq!(column(&view.tables[0], 1), vec!["DELTA"]);
        assert!(view.tables[1].rows.is_empty());

        let layer = &view.maps[0];
        assert_eq!(layer.kind, MapLayerKind::Points);
        assert_eq!(layer.features.len(), 1);
        assert_eq!(layer.features[0].color, PriceTier::Premium.color());
    }

    #[test]
    fn missing_map_sources_leave_a_banner() {
        let bundle = DatasetBuilder::new()
            .master(Cursor::new("Suburb,Current_Price_2025\nALPHA,450000\n"))
            .build();
        let view = render_dashboard(&bundle, &ViewFilters::default());
        assert!(view.maps.is_empty());
        assert!(view
            .banners
            .iter()
            .any(|banner| banner.message.starts_with("Map data unavailable")));
    }
}
