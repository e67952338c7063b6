use super::spec::{
    Banner, Chart, ChartKind, MapFeature, MapLayer, MapLayerKind, MetricCard, Series, Table, Tone,
    ViewSpec,
};
use crate::market::format::{
    fmt_count, fmt_dollar, fmt_num, fmt_pct, fmt_price, fmt_signed_pct, NOT_AVAILABLE,
};
use crate::market::metrics::{Metric, RegionMetrics};

const RENTAL_DISCLAIMER: &str = "Rental data is based on Census 2021, adjusted for inflation. \
Check current listings for today's asking rents.";
const CENSUS_NOTE: &str = "Demographics are from the 2021 Census, the most recent available.";
const IN_SAMPLE_NOTE: &str =
    "Model fits for observed years are shown separately and never replace recorded prices.";

fn metric_text<T>(metric: &Metric<T>, format: impl FnOnce(&T) -> String) -> String {
    metric
        .value()
        .map(format)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub(super) fn overview(metrics: &RegionMetrics) -> ViewSpec {
    let mut view = ViewSpec::new("Overview");
    view.flag("Price overview", &metrics.price);

    match metrics.price.value() {
        Some(price) => {
            view.cards.push(MetricCard::new("Current Price", fmt_price(price.current_price)));
            view.cards.push(
                MetricCard::new("Total Growth", fmt_pct(price.growth_percent, 1))
                    .with_delta(fmt_price(price.growth_amount), Tone::of_change(price.growth_amount)),
            );
            view.cards.push(MetricCard::new("First Price", fmt_price(price.first_price)));
            view.cards.push(MetricCard::new(
                "Market Tier",
                price
                    .tier
                    .map(|tier| format!("{} ({})", tier.label(), tier.range_label()))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ));
            view.cards.push(MetricCard::new("Price Volatility", fmt_num(price.volatility, 2)));
            view.cards.push(MetricCard::new(
                "Data Points",
                fmt_num(price.quarter_count.map(f64::from), 0),
            ));
        }
        None => {
            for label in ["Current Price", "Total Growth", "First Price", "Market Tier"] {
                view.cards.push(MetricCard::unavailable(label));
            }
        }
    }

    view.flag("Price history", &metrics.growth);
    if let Some(growth) = metrics.growth.value() {
        view.charts.push(
            Chart::new(ChartKind::Line, "Price History")
                .axes("Quarter", "Median price ($)")
                .series(Series::new(
                    "Median price",
                    growth
                        .quarterly
                        .iter()
                        .map(|point| (point.quarter.label(), point.median_price)),
                )),
        );
    }

    if let Some(coordinate) = metrics.location {
        view.maps.push(MapLayer {
            kind: MapLayerKind::Points,
            title: "Location".to_string(),
            legend: Vec::new(),
            features: vec![MapFeature {
                region: metrics.region.clone(),
                color: metrics
                    .price
                    .value()
                    .and_then(|price| price.tier)
                    .map_or(super::dashboard::UNKNOWN_TIER_COLOR, |tier| tier.color())
                    .to_string(),
                tooltip: vec![(
                    "Current Price".to_string(),
                    fmt_price(metrics.price.value().and_then(|price| price.current_price)),
                )],
                coordinate: Some(coordinate),
                geometry: None,
            }],
        });
    }
    view
}

pub(super) fn growth(metrics: &RegionMetrics) -> ViewSpec {
    let mut view = ViewSpec::new("Growth");
    view.flag("Price growth", &metrics.growth);

    let Some(growth) = metrics.growth.value() else {
        for label in ["CAGR", "Total Growth", "Best Year", "Worst Year"] {
            view.cards.push(MetricCard::unavailable(label));
        }
        return view;
    };

    view.flag("CAGR", &growth.cagr_percent);
    let cagr = growth.cagr_percent.get();
    view.cards.push(
        MetricCard::new("CAGR", fmt_pct(cagr, 1))
            .with_delta(format!("{:.2} years", growth.years), Tone::of_change(cagr)),
    );
    let total = growth.total_growth_percent.get();
    view.cards.push(
        MetricCard::new("Total Growth", fmt_pct(total, 1)).with_delta(
            format!("{} to {}", growth.start.label(), growth.end.label()),
            Tone::of_change(total),
        ),
    );
    for (label, change) in [("Best Year", growth.best_year), ("Worst Year", growth.worst_year)] {
        view.cards.push(match change {
            Some(change) => MetricCard::new(label, change.year.to_string()).with_delta(
                fmt_signed_pct(Some(change.change_percent), 1),
                Tone::of_change(Some(change.change_percent)),
            ),
            None => MetricCard::unavailable(label),
        });
    }

    view.charts.push(
        Chart::new(ChartKind::Bar, "Year-on-Year Growth")
            .axes("Year", "Change (%)")
            .series(Series::new(
                "YoY change",
                growth.annual.iter().filter_map(|point| {
                    point
                        .change_percent
                        .map(|change| (point.year.to_string(), change))
                }),
            ))
            .series(Series::new(
                "Annual median",
                growth
                    .annual
                    .iter()
                    .map(|point| (point.year.to_string(), point.median_price)),
            )),
    );

    let mut table = Table::new("Annual Breakdown", &["Year", "Median Price", "Change", "Change %"]);
    for point in growth.annual.iter().rev() {
        table.row(vec![
            point.year.to_string(),
            fmt_price(Some(point.median_price)),
            point
                .change
                .map(|change| fmt_price(Some(change)))
                .unwrap_or_else(|| "Base year".to_string()),
            fmt_signed_pct(point.change_percent, 1),
        ]);
    }
    view.tables.push(table);
    view
}

pub(super) fn demographics(metrics: &RegionMetrics) -> ViewSpec {
    let mut view = ViewSpec::new("Demographics");
    view.flag("Demographics", &metrics.demographics);

    let profile = metrics.demographics.value().cloned().unwrap_or_default();
    view.cards.extend([
        MetricCard::new("Population", fmt_num(profile.population, 0)),
        MetricCard::new("Median Age", fmt_num(profile.median_age, 1)),
        MetricCard::new("Household Size", fmt_num(profile.household_size, 1)),
        MetricCard::new("Household Income (wk)", fmt_dollar(profile.household_income_weekly)),
        MetricCard::new("Personal Income (wk)", fmt_dollar(profile.personal_income_weekly)),
        MetricCard::new("Mortgage (mth)", fmt_dollar(profile.mortgage_monthly)),
        MetricCard::new("Rent (wk)", fmt_dollar(profile.rent_weekly)),
    ]);
    view.notes.push(CENSUS_NOTE.to_string());
    view
}

pub(super) fn crime(metrics: &RegionMetrics) -> ViewSpec {
    let mut view = ViewSpec::new("Crime");
    view.flag("Crime", &metrics.crime);

    let Some(crime) = metrics.crime.value() else {
        for label in ["Total Offences", "Crime / 1,000 People", "Safety Level"] {
            view.cards.push(MetricCard::unavailable(label));
        }
        return view;
    };

    view.flag("Crime rate", &crime.rate_per_1000);
    view.cards.push(MetricCard::new("Total Offences", fmt_count(crime.total)));
    view.cards.push(MetricCard::new(
        "Crime / 1,000 People",
        fmt_num(crime.rate_per_1000.get(), 1),
    ));
    view.cards.push(MetricCard::new(
        "Safety Level",
        crime
            .safety
            .map(|level| level.label().to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    ));

    view.charts.push(
        Chart::new(ChartKind::HorizontalBar, "Offences by Category")
            .axes("Offences", "Category")
            .series(Series::new(
                "Offences",
                crime
                    .categories
                    .iter()
                    .map(|category| (category.category.clone(), category.count as f64)),
            )),
    );

    let mut table = Table::new(
        format!("Top Offence Types ({})", crime.top_categories.len()),
        &["Rank", "Category", "Count", "Share", "Per 1,000"],
    );
    for (rank, category) in crime
        .categories
        .iter()
        .take(crime.top_categories.len())
        .enumerate()
    {
        table.row(vec![
            (rank + 1).to_string(),
            category.category.clone(),
            fmt_count(category.count),
            fmt_pct(Some(category.share_percent), 1),
            fmt_num(category.rate_per_1000.get(), 1),
        ]);
    }
    view.tables.push(table);
    view
}

pub(super) fn rental(metrics: &RegionMetrics) -> ViewSpec {
    let mut view = ViewSpec::new("Rental");
    view.flag("Rental", &metrics.rental);
    view.notes.push(RENTAL_DISCLAIMER.to_string());

    let Some(rental) = metrics.rental.value() else {
        for label in ["Fair Rent (wk)", "Actual Rent (wk)", "Rent Gap", "Gross Yield"] {
            view.cards.push(MetricCard::unavailable(label));
        }
        return view;
    };

    if let Some(line) = rental.headline() {
        view.cards.push(MetricCard::new(
            format!("Fair {} Rent (wk)", line.property_type),
            fmt_dollar(Some(line.fair_rent)),
        ));
        view.cards.push(MetricCard::new(
            format!("Actual {} Rent (wk)", line.property_type),
            fmt_dollar(Some(line.actual_rent)),
        ));
        let gap_tone = if line.gap > 0.0 {
            Tone::Negative
        } else {
            Tone::Positive
        };
        view.cards.push(
            MetricCard::new("Rent Gap", fmt_signed_pct(line.gap_percent.get(), 1)).with_delta(
                line.band
                    .map(|band| band.label().to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                gap_tone,
            ),
        );
        view.flag("Gross yield", &line.gross_yield_percent);
        view.cards.push(MetricCard::new(
            "Gross Yield",
            fmt_pct(line.gross_yield_percent.get(), 2),
        ));
    }

    view.charts.push(
        Chart::new(ChartKind::Bar, "Fair vs Actual Weekly Rent")
            .axes("Property type", "Weekly rent ($)")
            .series(Series::new(
                "Fair rent",
                rental
                    .lines
                    .iter()
                    .map(|line| (line.property_type.clone(), line.fair_rent)),
            ))
            .series(Series::new(
                "Actual rent",
                rental
                    .lines
                    .iter()
                    .map(|line| (line.property_type.clone(), line.actual_rent)),
            )),
    );

    let mut table = Table::new(
        "Rent by Property Type",
        &["Property Type", "Fair Rent", "Actual Rent", "Gap", "Gap %", "Band", "Gross Yield"],
    );
    for line in &rental.lines {
        table.row(vec![
            line.property_type.clone(),
            fmt_dollar(Some(line.fair_rent)),
            fmt_dollar(Some(line.actual_rent)),
            fmt_dollar(Some(line.gap)),
            fmt_signed_pct(line.gap_percent.get(), 1),
            line.band
                .map(|band| band.label().to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            fmt_pct(line.gross_yield_percent.get(), 2),
        ]);
    }
    view.tables.push(table);
    view
}

pub(super) fn predictions(metrics: &RegionMetrics) -> ViewSpec {
    let mut view = ViewSpec::new("Predictions");
    view.flag("Predictions", &metrics.predictions);
    view.flag("Risk", &metrics.risk);

    match metrics.predictions.value() {
        Some(predictions) => {
            let next = predictions.next_forecast;
            view.cards.push(MetricCard::new(
                next.map_or_else(|| "Next Forecast".to_string(), |point| format!("Forecast {}", point.year)),
                fmt_price(next.map(|point| point.predicted_price)),
            ));
            let expected = predictions.expected_growth_percent.get();
            view.cards.push(
                MetricCard::new("Expected Growth", fmt_signed_pct(expected, 1))
                    .with_delta("Base scenario", Tone::of_change(expected)),
            );
        }
        None => {
            view.cards.push(MetricCard::unavailable("Next Forecast"));
            view.cards.push(MetricCard::unavailable("Expected Growth"));
        }
    }

    let risk = metrics.risk.value();
    view.cards.push(MetricCard::new(
        "Risk Score",
        fmt_num(risk.map(|risk| risk.score), 1),
    ));
    view.cards.push(MetricCard::new(
        "Risk Category",
        metric_text(&metrics.risk, |risk| risk.band_label.to_string()),
    ));
    view.cards.push(MetricCard::new(
        "Investment Strategy",
        risk.and_then(|risk| risk.investment_strategy.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    ));
    view.cards.push(MetricCard::new(
        "Risk-Adjusted Return",
        fmt_num(risk.and_then(|risk| risk.risk_adjusted_return), 2),
    ));
    view.cards.push(MetricCard::new(
        "Value Category",
        risk.and_then(|risk| risk.value_category.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    ));

    if let Some(predictions) = metrics.predictions.value() {
        let mut chart = Chart::new(ChartKind::Line, "Price Forecast").axes("Year", "Price ($)");
        if let Some(growth) = metrics.growth.value() {
            chart = chart.series(Series::new(
                "Observed",
                growth
                    .annual
                    .iter()
                    .map(|point| (point.year.to_string(), point.median_price)),
            ));
        }
        for forecast in &predictions.scenarios {
            chart = chart.series(Series::new(
                forecast.label,
                forecast
                    .points
                    .iter()
                    .map(|point| (point.year.to_string(), point.predicted_price)),
            ));
        }
        view.charts.push(chart);

        let mut fits = Table::new("In-Sample Model Fits", &["Year", "Scenario", "Predicted Price"]);
        for forecast in &predictions.scenarios {
            for point in &forecast.in_sample {
                fits.row(vec![
                    point.year.to_string(),
                    forecast.label.to_string(),
                    fmt_price(Some(point.predicted_price)),
                ]);
            }
        }
        if !fits.rows.is_empty() {
            view.tables.push(fits);
            view.notes.push(IN_SAMPLE_NOTE.to_string());
        }
    }
    view
}

pub(super) fn culture(metrics: &RegionMetrics) -> ViewSpec {
    let mut view = ViewSpec::new("Culture");
    view.flag("Cultural communities", &metrics.culture);

    let Some(culture) = metrics.culture.value() else {
        view.cards.push(MetricCard::unavailable("Cultural Diversity Index"));
        return view;
    };

    if culture.diversity.clamped {
        view.banners.push(Banner::info(
            "Community shares summed above 100% and were rescaled",
        ));
    }
    view.cards.push(
        MetricCard::new(
            "Cultural Diversity Index",
            fmt_num(Some(culture.diversity.index), 3),
        )
        .with_delta(
            format!("{} groups", culture.diversity.categories),
            Tone::Neutral,
        ),
    );
    for community in culture.communities.iter().take(5) {
        view.cards.push(
            MetricCard::new(&community.community, fmt_pct(Some(community.share * 100.0), 1))
                .with_delta(
                    format!("{} people", fmt_num(Some(community.population), 0)),
                    Tone::Neutral,
                ),
        );
    }

    let mut slices: Vec<(String, f64)> = culture
        .communities
        .iter()
        .map(|community| (community.community.clone(), community.share * 100.0))
        .collect();
    if culture.diversity.other_share > 0.0 {
        slices.push(("Other".to_string(), culture.diversity.other_share * 100.0));
    }
    view.charts
        .push(Chart::new(ChartKind::Pie, "Community Mix").series(Series::new("Share (%)", slices)));

    let mut table = Table::new("Communities", &["Community", "Population", "Share"]);
    for community in &culture.communities {
        table.row(vec![
            community.community.clone(),
            fmt_num(Some(community.population), 0),
            fmt_pct(Some(community.share * 100.0), 1),
        ]);
    }
    view.tables.push(table);
    view
}
