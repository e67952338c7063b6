use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar quarter; ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quarter {
    pub year: i32,
    pub quarter: u8,
}

impl Quarter {
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        (1..=4)
            .contains(&quarter)
            .then_some(Self { year, quarter })
    }

    /// Accepts `2019-Q1`, `2019 Q1`, `2019Q1`, and `Q1 2019`.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned: String = raw
            .trim()
            .to_ascii_uppercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_' | '/'))
            .collect();
        if !cleaned.is_ascii() {
            return None;
        }

        let (year_part, quarter_part) = if let Some(rest) = cleaned.strip_prefix('Q') {
            let (quarter, year) = rest.split_at(rest.len().min(1));
            (year, quarter)
        } else {
            let (year, rest) = cleaned.split_at(cleaned.len().min(4));
            (year, rest.strip_prefix('Q')?)
        };

        if year_part.len() != 4 || quarter_part.len() != 1 {
            return None;
        }
        let year = year_part.parse::<i32>().ok()?;
        let quarter = quarter_part.parse::<u8>().ok()?;
        Self::new(year, quarter)
    }

    /// Sequential index used for gap detection and elapsed-time arithmetic.
    pub fn ordinal(self) -> i64 {
        i64::from(self.year) * 4 + i64::from(self.quarter) - 1
    }

    pub fn label(self) -> String {
        format!("{} Q{}", self.year, self.quarter)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Q{}", self.year, self.quarter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub quarter: Quarter,
    pub median_price: f64,
}

/// Typed slice of the wide master table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyProfile {
    pub region: String,
    pub current_price: Option<f64>,
    pub first_price: Option<f64>,
    pub growth_amount: Option<f64>,
    pub growth_percent: Option<f64>,
    pub average_price: Option<f64>,
    pub median_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub volatility: Option<f64>,
    pub quarter_count: Option<u32>,
}

impl PropertyProfile {
    /// Growth percent from the table, or derived from first and current price.
    pub fn growth_percent_or_derived(&self) -> Option<f64> {
        self.growth_percent.or_else(|| match (self.first_price, self.current_price) {
            (Some(first), Some(current)) if first > 0.0 => Some((current - first) / first * 100.0),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DemographicProfile {
    pub population: Option<f64>,
    pub median_age: Option<f64>,
    pub household_size: Option<f64>,
    pub household_income_weekly: Option<f64>,
    pub personal_income_weekly: Option<f64>,
    pub mortgage_monthly: Option<f64>,
    pub rent_weekly: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Conservative,
    Base,
    Optimistic,
}

impl Scenario {
    pub const fn ordered() -> [Self; 3] {
        [Self::Conservative, Self::Base, Self::Optimistic]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Conservative => "Conservative",
            Self::Base => "Base",
            Self::Optimistic => "Optimistic",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "conservative" | "low" | "pessimistic" => Some(Self::Conservative),
            "base" | "baseline" | "expected" | "central" => Some(Self::Base),
            "optimistic" | "high" => Some(Self::Optimistic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub year: i32,
    pub scenario: Scenario,
    pub predicted_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskRecord {
    pub score: f64,
    pub investment_strategy: Option<String>,
    pub risk_adjusted_return: Option<f64>,
    pub value_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentalRecord {
    pub property_type: String,
    /// Weekly rent a suburb's incomes support.
    pub fair_rent: f64,
    /// Weekly rent observed in the market.
    pub actual_rent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrimeRecord {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityRecord {
    pub community: String,
    pub population: f64,
    /// Fraction of the suburb population in `[0, 1]` when the source provides one.
    pub share: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_parses_common_period_layouts() {
        let expected = Quarter::new(2019, 1).expect("valid quarter");
        for raw in ["2019-Q1", "2019 Q1", "2019Q1", "Q1 2019", " q1-2019 "] {
            assert_eq!(Quarter::parse(raw), Some(expected), "layout {raw}");
        }
        assert_eq!(Quarter::parse("2019-Q5"), None);
        assert_eq!(Quarter::parse("19-Q1"), None);
        assert_eq!(Quarter::parse(""), None);
    }

    #[test]
    fn quarters_order_chronologically() {
        let a = Quarter::new(2019, 4).unwrap();
        let b = Quarter::new(2020, 1).unwrap();
        assert!(a < b);
        assert_eq!(b.ordinal() - a.ordinal(), 1);
        assert_eq!(b.label(), "2020 Q1");
    }

    #[test]
    fn growth_percent_falls_back_to_price_delta() {
        let profile = PropertyProfile {
            region: "ADELAIDE".to_string(),
            first_price: Some(400_000.0),
            current_price: Some(600_000.0),
            ..PropertyProfile::default()
        };
        let growth = profile.growth_percent_or_derived().expect("derived");
        assert!((growth - 50.0).abs() < 1e-9);
    }
}
