use super::{require, Metric, MetricUndefined};
use crate::market::dataset::{Availability, CrimeRecord, TableKind};
use serde::Serialize;

const TOP_CATEGORIES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Low,
    Moderate,
    High,
}

impl SafetyLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Crime",
            Self::Moderate => "Moderate Crime",
            Self::High => "High Crime",
        }
    }

    pub fn from_rate(rate_per_1000: f64) -> Self {
        if rate_per_1000 < 50.0 {
            Self::Low
        } else if rate_per_1000 < 150.0 {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
    pub share_percent: f64,
    pub rate_per_1000: Metric<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrimeMetrics {
    pub total: u64,
    pub rate_per_1000: Metric<f64>,
    pub safety: Option<SafetyLevel>,
    /// Descending by count, ties alphabetical.
    pub categories: Vec<CategoryCount>,
    pub top_categories: Vec<String>,
}

pub fn analyse(
    crime: Availability<'_, &Vec<CrimeRecord>>,
    population: Option<f64>,
) -> Result<CrimeMetrics, MetricUndefined> {
    let records = require(crime, TableKind::Crime)?;
    let total = records
        .iter()
        .fold(0u64, |total, record| total.saturating_add(record.count));

    let mut categories: Vec<CategoryCount> = records
        .iter()
        .map(|record| CategoryCount {
            category: record.category.clone(),
            count: record.count,
            share_percent: if total == 0 {
                0.0
            } else {
                record.count as f64 / total as f64 * 100.0
            },
            rate_per_1000: rate_per_thousand(record.count, population).into(),
        })
        .collect();
    categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));

    let top_categories = categories
        .iter()
        .filter(|category| category.count > 0)
        .take(TOP_CATEGORIES)
        .map(|category| category.category.clone())
        .collect();

    let rate = rate_per_thousand(total, population);
    let safety = rate.as_ref().ok().map(|rate| SafetyLevel::from_rate(*rate));

    Ok(CrimeMetrics {
        total,
        rate_per_1000: rate.into(),
        safety,
        categories,
        top_categories,
    })
}

/// Offences per 1,000 residents.
pub fn rate_per_thousand(count: u64, population: Option<f64>) -> Result<f64, MetricUndefined> {
    match population {
        Some(population) if population.is_finite() && population > 0.0 => {
            Ok(count as f64 * 1000.0 / population)
        }
        _ => Err(MetricUndefined::MissingPopulation),
    }
}
