use super::growth::{percent_change, AnnualPoint};
use super::{require, Metric, MetricUndefined};
use crate::market::dataset::{Availability, PredictionRecord, Scenario, TableKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub year: i32,
    pub predicted_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioForecast {
    pub scenario: Scenario,
    pub label: &'static str,
    /// Years after the last observed year, ascending.
    pub points: Vec<ForecastPoint>,
    /// Model fits for years that already have observations.
    pub in_sample: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionMetrics {
    pub last_observed_year: Option<i32>,
    pub latest_observed_price: Option<f64>,
    pub scenarios: Vec<ScenarioForecast>,
    pub next_forecast: Option<ForecastPoint>,
    /// Base scenario's first forecast year against the latest observed median.
    pub expected_growth_percent: Metric<f64>,
}

impl PredictionMetrics {
    pub fn scenario(&self, scenario: Scenario) -> Option<&ScenarioForecast> {
        self.scenarios
            .iter()
            .find(|forecast| forecast.scenario == scenario)
    }
}

/// Splits forecasts at the last observed year. Rows at or before it are kept
/// as in-sample fits and never stand in for observed prices.
pub fn analyse(
    predictions: Availability<'_, &Vec<PredictionRecord>>,
    latest_observed: Option<&AnnualPoint>,
) -> Result<PredictionMetrics, MetricUndefined> {
    let records = require(predictions, TableKind::Predictions)?;
    if records.is_empty() {
        return Err(MetricUndefined::NoRows {
            table: TableKind::Predictions,
        });
    }
    let last_observed_year = latest_observed.map(|point| point.year);

    let scenarios: Vec<ScenarioForecast> = Scenario::ordered()
        .into_iter()
        .filter_map(|scenario| {
            let mut points = Vec::new();
            let mut in_sample = Vec::new();
            for record in records.iter().filter(|record| record.scenario == scenario) {
                let point = ForecastPoint {
                    year: record.year,
                    predicted_price: record.predicted_price,
                };
                match last_observed_year {
                    Some(last) if record.year <= last => in_sample.push(point),
                    _ => points.push(point),
                }
            }
            if points.is_empty() && in_sample.is_empty() {
                return None;
            }
            points.sort_by_key(|point| point.year);
            in_sample.sort_by_key(|point| point.year);
            Some(ScenarioForecast {
                scenario,
                label: scenario.label(),
                points,
                in_sample,
            })
        })
        .collect();

    let next_forecast = scenarios
        .iter()
        .find(|forecast| forecast.scenario == Scenario::Base)
        .and_then(|forecast| forecast.points.first().copied());

    let expected_growth_percent = match (next_forecast, latest_observed) {
        (None, _) => Err(MetricUndefined::MissingValue {
            field: "base scenario forecast",
        }),
        (_, None) => Err(MetricUndefined::MissingValue {
            field: "observed price",
        }),
        (Some(forecast), Some(observed)) => percent_change(
            observed.median_price,
            forecast.predicted_price,
            "observed price",
        ),
    };

    Ok(PredictionMetrics {
        last_observed_year,
        latest_observed_price: latest_observed.map(|point| point.median_price),
        scenarios,
        next_forecast,
        expected_growth_percent: expected_growth_percent.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, scenario: Scenario, predicted_price: f64) -> PredictionRecord {
        PredictionRecord {
            year,
            scenario,
            predicted_price,
        }
    }

    fn observed(year: i32, median_price: f64) -> AnnualPoint {
        AnnualPoint {
            year,
            median_price,
            change: None,
            change_percent: None,
        }
    }

    #[test]
    fn overlapping_years_stay_in_sample() {
        let records = vec![
            record(2026, Scenario::Base, 630_000.0),
            record(2025, Scenario::Base, 590_000.0),
            record(2027, Scenario::Optimistic, 700_000.0),
        ];
        let latest = observed(2025, 600_000.0);
        let metrics =
            analyse(Availability::Available(&records), Some(&latest)).expect("predictions");

        let base = metrics.scenario(Scenario::Base).expect("base scenario");
        assert_eq!(base.points.len(), 1);
        assert_eq!(base.in_sample.len(), 1);
        assert_eq!(base.in_sample[0].year, 2025);
        assert_eq!(metrics.latest_observed_price, Some(600_000.0));
        assert!(metrics.scenario(Scenario::Conservative).is_none());

        let growth = metrics.expected_growth_percent.get().expect("expected growth");
        assert!((growth - 5.0).abs() < 1e-9);
    }

    #[test]
    fn missing_base_scenario_leaves_growth_undefined() {
        let records = vec![record(2026, Scenario::Optimistic, 700_000.0)];
        let latest = observed(2025, 600_000.0);
        let metrics =
            analyse(Availability::Available(&records), Some(&latest)).expect("predictions");
        assert!(!metrics.expected_growth_percent.is_available());
        assert_eq!(metrics.next_forecast, None);
    }
}
