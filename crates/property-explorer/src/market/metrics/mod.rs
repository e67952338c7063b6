//! Display-ready metrics derived from one resolved region.
//!
//! Each family is computed independently and lands in a [`Metric`], so a gap in
//! one source only blanks the cards that depend on it.

pub mod crime;
pub mod diversity;
pub mod growth;
pub mod predictions;
pub mod price;
pub mod rental;
pub mod risk;

pub use crime::{CategoryCount, CrimeMetrics, SafetyLevel};
pub use diversity::{CommunityShare, DiversityIndex, DiversityMetrics};
pub use growth::{AnnualPoint, GrowthMetrics, YearChange};
pub use predictions::{ForecastPoint, PredictionMetrics, ScenarioForecast};
pub use price::{PriceOverview, PriceTier};
pub use rental::{RentBand, RentalLine, RentalMetrics};
pub use risk::{RiskBand, RiskMetrics};

use crate::market::dataset::{Availability, Coordinate, DemographicProfile, TableKind};
use crate::market::resolver::ResolvedRegion;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why a metric could not be derived. Rendered inline as `N/A`.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricUndefined {
    #[error("{table} data unavailable")]
    TableUnavailable { table: TableKind },
    #[error("no {table} rows for this region")]
    NoRows { table: TableKind },
    #[error("{field} is missing")]
    MissingValue { field: &'static str },
    #[error("{field} is zero")]
    ZeroBase { field: &'static str },
    #[error("{field} of {value} is out of range")]
    InvalidValue { field: &'static str, value: f64 },
    #[error("population is zero or missing")]
    MissingPopulation,
    #[error("needs at least two observations, found {observations}")]
    InsufficientHistory { observations: usize },
    #[error("no observations fall inside the selected years")]
    EmptyWindow,
}

/// A derived value, or the reason it is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Metric<T> {
    Available { value: T },
    Unavailable { reason: MetricUndefined },
}

impl<T> Metric<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Metric::Available { value } => Some(value),
            Metric::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&MetricUndefined> {
        match self {
            Metric::Available { .. } => None,
            Metric::Unavailable { reason } => Some(reason),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Metric::Available { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metric<U> {
        match self {
            Metric::Available { value } => Metric::Available { value: f(value) },
            Metric::Unavailable { reason } => Metric::Unavailable { reason },
        }
    }
}

impl<T: Copy> Metric<T> {
    pub fn get(&self) -> Option<T> {
        self.value().copied()
    }
}

impl<T> From<Result<T, MetricUndefined>> for Metric<T> {
    fn from(result: Result<T, MetricUndefined>) -> Self {
        match result {
            Ok(value) => Metric::Available { value },
            Err(reason) => Metric::Unavailable { reason },
        }
    }
}

pub(crate) fn require<T>(
    availability: Availability<'_, T>,
    table: TableKind,
) -> Result<T, MetricUndefined> {
    match availability {
        Availability::Available(value) => Ok(value),
        Availability::Missing => Err(MetricUndefined::NoRows { table }),
        Availability::TableUnavailable(_) => Err(MetricUndefined::TableUnavailable { table }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("year range starts at {from} but ends at {to}")]
pub struct InvalidYearRange {
    pub from: i32,
    pub to: i32,
}

/// Inclusive calendar-year bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl YearRange {
    pub fn new(from: Option<i32>, to: Option<i32>) -> Result<Self, InvalidYearRange> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(InvalidYearRange { from, to });
            }
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, year: i32) -> bool {
        self.from.map_or(true, |from| year >= from) && self.to.map_or(true, |to| year <= to)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregationWindow {
    pub years: YearRange,
}

impl AggregationWindow {
    pub fn years(years: YearRange) -> Self {
        Self { years }
    }
}

/// Every metric family for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionMetrics {
    pub key: String,
    pub region: String,
    pub window: AggregationWindow,
    pub location: Option<Coordinate>,
    pub price: Metric<PriceOverview>,
    pub growth: Metric<GrowthMetrics>,
    pub demographics: Metric<DemographicProfile>,
    pub crime: Metric<CrimeMetrics>,
    pub rental: Metric<RentalMetrics>,
    pub predictions: Metric<PredictionMetrics>,
    pub risk: Metric<RiskMetrics>,
    pub culture: Metric<DiversityMetrics>,
}

impl RegionMetrics {
    /// Families that could not be derived, with their reasons.
    pub fn unavailable(&self) -> Vec<(&'static str, &MetricUndefined)> {
        let families = [
            ("Price overview", self.price.reason()),
            ("Price growth", self.growth.reason()),
            ("Demographics", self.demographics.reason()),
            ("Crime", self.crime.reason()),
            ("Rental", self.rental.reason()),
            ("Predictions", self.predictions.reason()),
            ("Risk", self.risk.reason()),
            ("Cultural communities", self.culture.reason()),
        ];
        families
            .into_iter()
            .filter_map(|(family, reason)| reason.map(|reason| (family, reason)))
            .collect()
    }
}

/// Derives every metric family for `region`. Never fails as a whole.
pub fn aggregate(region: &ResolvedRegion<'_>, window: &AggregationWindow) -> RegionMetrics {
    let price = Metric::from(price::overview(region.property, region.time_series));
    let growth = Metric::from(growth::analyse(region.time_series, &window.years));

    let demographics =
        Metric::from(require(region.demographics, TableKind::Demographics).cloned());
    let population = region
        .demographics
        .available()
        .and_then(|profile| profile.population);

    let current_price = price.value().and_then(|overview| overview.current_price);
    let latest_observed = region
        .time_series
        .available()
        .and_then(|points| growth::annual_series(points.iter().copied()).pop());

    let metrics = RegionMetrics {
        key: region.key.to_string(),
        region: region.name.to_string(),
        window: *window,
        location: region.coordinate.available().map(|coordinate| **coordinate),
        price,
        growth,
        demographics,
        crime: crime::analyse(region.crime, population).into(),
        rental: rental::analyse(region.rental, current_price).into(),
        predictions: predictions::analyse(region.predictions, latest_observed.as_ref()).into(),
        risk: risk::analyse(region.risk).into(),
        culture: diversity::analyse(region.communities, population).into(),
    };

    debug!(
        region = %metrics.region,
        unavailable = metrics.unavailable().len(),
        "aggregated region metrics"
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_range_rejects_inverted_bounds() {
        assert_eq!(
            YearRange::new(Some(2024), Some(2020)),
            Err(InvalidYearRange {
                from: 2024,
                to: 2020
            })
        );
        let range = YearRange::new(Some(2020), None).expect("open range");
        assert!(range.contains(2030));
        assert!(!range.contains(2019));
        assert!(YearRange::default().is_unbounded());
    }

    #[test]
    fn metric_serializes_with_state_tag() {
        let available: Metric<f64> = Ok(5.0).into();
        let json = serde_json::to_value(&available).expect("serialize");
        assert_eq!(json["state"], "available");
        assert_eq!(json["value"], 5.0);

        let missing: Metric<f64> = Err(MetricUndefined::MissingPopulation).into();
        let json = serde_json::to_value(&missing).expect("serialize");
        assert_eq!(json["state"], "unavailable");
        assert_eq!(json["reason"]["kind"], "missing_population");
    }
}
