use super::{require, Metric, MetricUndefined, YearRange};
use crate::market::dataset::{Availability, Quarter, TableKind, TimeSeriesPoint};
use serde::Serialize;
use std::collections::BTreeMap;

/// Median of one calendar year's quarterly prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnualPoint {
    pub year: i32,
    pub median_price: f64,
    pub change: Option<f64>,
    /// `None` for the first year and when the prior year's median is zero.
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearChange {
    pub year: i32,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthMetrics {
    pub start: Quarter,
    pub end: Quarter,
    /// Quarters covered, inclusive, in years.
    pub years: f64,
    pub quarterly: Vec<TimeSeriesPoint>,
    pub annual: Vec<AnnualPoint>,
    pub cagr_percent: Metric<f64>,
    pub total_growth_percent: Metric<f64>,
    pub best_year: Option<YearChange>,
    pub worst_year: Option<YearChange>,
}

pub fn analyse(
    series: Availability<'_, &Vec<TimeSeriesPoint>>,
    years: &YearRange,
) -> Result<GrowthMetrics, MetricUndefined> {
    let points = require(series, TableKind::TimeSeries)?;
    if points.is_empty() {
        return Err(MetricUndefined::NoRows {
            table: TableKind::TimeSeries,
        });
    }

    let quarterly: Vec<TimeSeriesPoint> = points
        .iter()
        .filter(|point| years.contains(point.quarter.year))
        .copied()
        .collect();
    let (Some(first), Some(last)) = (quarterly.first().copied(), quarterly.last().copied()) else {
        return Err(MetricUndefined::EmptyWindow);
    };

    let span_years = span_in_years(first.quarter, last.quarter);
    let cagr_percent = if quarterly.len() < 2 {
        Err(MetricUndefined::InsufficientHistory {
            observations: quarterly.len(),
        })
    } else {
        cagr(first.median_price, last.median_price, span_years)
    };
    let total_growth_percent = if quarterly.len() < 2 {
        Err(MetricUndefined::InsufficientHistory {
            observations: quarterly.len(),
        })
    } else {
        percent_change(first.median_price, last.median_price, "start price")
    };

    let annual = annual_series(quarterly.iter().copied());
    let changes = annual.iter().filter_map(|point| {
        point.change_percent.map(|change_percent| YearChange {
            year: point.year,
            change_percent,
        })
    });
    let mut best_year: Option<YearChange> = None;
    let mut worst_year: Option<YearChange> = None;
    for change in changes {
        if best_year.map_or(true, |best| change.change_percent > best.change_percent) {
            best_year = Some(change);
        }
        if worst_year.map_or(true, |worst| change.change_percent < worst.change_percent) {
            worst_year = Some(change);
        }
    }

    Ok(GrowthMetrics {
        start: first.quarter,
        end: last.quarter,
        years: span_years,
        quarterly,
        annual,
        cagr_percent: cagr_percent.into(),
        total_growth_percent: total_growth_percent.into(),
        best_year,
        worst_year,
    })
}

/// Compound annual growth rate in percent.
pub fn cagr(start_price: f64, end_price: f64, years: f64) -> Result<f64, MetricUndefined> {
    if start_price == 0.0 {
        return Err(MetricUndefined::ZeroBase {
            field: "start price",
        });
    }
    if start_price < 0.0 || end_price < 0.0 {
        return Err(MetricUndefined::InvalidValue {
            field: "price",
            value: start_price.min(end_price),
        });
    }
    if years <= 0.0 {
        return Err(MetricUndefined::InsufficientHistory { observations: 1 });
    }
    Ok(((end_price / start_price).powf(1.0 / years) - 1.0) * 100.0)
}

/// Inclusive quarter span: 2019 Q1 through 2025 Q4 is seven years.
pub fn span_in_years(start: Quarter, end: Quarter) -> f64 {
    (end.ordinal() - start.ordinal() + 1) as f64 / 4.0
}

pub(crate) fn percent_change(
    base: f64,
    value: f64,
    field: &'static str,
) -> Result<f64, MetricUndefined> {
    if base == 0.0 {
        return Err(MetricUndefined::ZeroBase { field });
    }
    Ok((value - base) / base * 100.0)
}

/// Per-year medians with year-on-year change, oldest first.
pub fn annual_series(points: impl IntoIterator<Item = TimeSeriesPoint>) -> Vec<AnnualPoint> {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for point in points {
        by_year
            .entry(point.quarter.year)
            .or_default()
            .push(point.median_price);
    }

    let mut annual: Vec<AnnualPoint> = Vec::with_capacity(by_year.len());
    for (year, prices) in by_year {
        let Some(median_price) = median(&prices) else {
            continue;
        };
        let previous = annual.last().map(|point| point.median_price);
        let change = previous.map(|previous| median_price - previous);
        let change_percent = previous
            .and_then(|previous| percent_change(previous, median_price, "prior year median").ok());
        annual.push(AnnualPoint {
            year,
            median_price,
            change,
            change_percent,
        });
    }
    annual
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}
