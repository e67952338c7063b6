use super::{require, MetricUndefined};
use crate::market::dataset::{Availability, PropertyProfile, TableKind, TimeSeriesPoint};
use serde::{Deserialize, Serialize};

/// Market segment by current median price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Budget,
    MidRange,
    UpperMid,
    Premium,
}

impl PriceTier {
    pub const fn ordered() -> [Self; 4] {
        [Self::Budget, Self::MidRange, Self::UpperMid, Self::Premium]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Budget => "Budget",
            Self::MidRange => "Mid-Range",
            Self::UpperMid => "Upper-Mid",
            Self::Premium => "Premium",
        }
    }

    pub const fn range_label(self) -> &'static str {
        match self {
            Self::Budget => "<$500K",
            Self::MidRange => "$500K-$750K",
            Self::UpperMid => "$750K-$1M",
            Self::Premium => ">$1M",
        }
    }

    /// Fill colour for map layers.
    pub const fn color(self) -> &'static str {
        match self {
            Self::Budget => "#69f0ae",
            Self::MidRange => "#ffd740",
            Self::UpperMid => "#ff6e40",
            Self::Premium => "#ff4081",
        }
    }

    /// Lower bounds are inclusive: exactly $500,000 is Mid-Range.
    pub fn from_price(price: f64) -> Option<Self> {
        if !price.is_finite() || price < 0.0 {
            return None;
        }
        Some(if price < 500_000.0 {
            Self::Budget
        } else if price < 750_000.0 {
            Self::MidRange
        } else if price < 1_000_000.0 {
            Self::UpperMid
        } else {
            Self::Premium
        })
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let compact: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "budget" => Some(Self::Budget),
            "midrange" | "mid" => Some(Self::MidRange),
            "uppermid" | "upper" => Some(Self::UpperMid),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceOverview {
    pub current_price: Option<f64>,
    pub first_price: Option<f64>,
    pub growth_amount: Option<f64>,
    pub growth_percent: Option<f64>,
    pub volatility: Option<f64>,
    pub quarter_count: Option<u32>,
    pub average_price: Option<f64>,
    pub median_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub tier: Option<PriceTier>,
}

/// Master-table figures, with gaps filled from the quarterly series. A region
/// missing from the master table is summarised from its series alone.
pub fn overview(
    property: Availability<'_, &PropertyProfile>,
    series: Availability<'_, &Vec<TimeSeriesPoint>>,
) -> Result<PriceOverview, MetricUndefined> {
    let from_series = series
        .available()
        .filter(|points| !points.is_empty())
        .map(|points| summarise_series(points));

    let mut overview = match (property, from_series) {
        (Availability::Available(profile), derived) => {
            let derived = derived.unwrap_or_default();
            PriceOverview {
                current_price: profile.current_price.or(derived.current_price),
                first_price: profile.first_price.or(derived.first_price),
                growth_amount: profile.growth_amount,
                growth_percent: profile.growth_percent_or_derived(),
                volatility: profile.volatility,
                quarter_count: profile.quarter_count.or(derived.quarter_count),
                average_price: profile.average_price.or(derived.average_price),
                median_price: profile.median_price.or(derived.median_price),
                min_price: profile.min_price.or(derived.min_price),
                max_price: profile.max_price.or(derived.max_price),
                tier: None,
            }
        }
        (_, Some(derived)) => derived,
        (missing, None) => {
            require(missing, TableKind::Master)?;
            return Err(MetricUndefined::NoRows {
                table: TableKind::Master,
            });
        }
    };

    if overview.growth_amount.is_none() {
        if let (Some(first), Some(current)) = (overview.first_price, overview.current_price) {
            overview.growth_amount = Some(current - first);
        }
    }
    if overview.growth_percent.is_none() {
        if let (Some(first), Some(current)) = (overview.first_price, overview.current_price) {
            if first > 0.0 {
                overview.growth_percent = Some((current - first) / first * 100.0);
            }
        }
    }
    overview.tier = overview.current_price.and_then(PriceTier::from_price);
    Ok(overview)
}

fn summarise_series(points: &[TimeSeriesPoint]) -> PriceOverview {
    let prices: Vec<f64> = points.iter().map(|point| point.median_price).collect();
    let count = prices.len() as f64;
    let average = prices.iter().sum::<f64>() / count;
    let variance = prices
        .iter()
        .map(|price| (price - average).powi(2))
        .sum::<f64>()
        / count;

    PriceOverview {
        current_price: prices.last().copied(),
        first_price: prices.first().copied(),
        growth_amount: None,
        growth_percent: None,
        volatility: Some(variance.sqrt()),
        quarter_count: u32::try_from(prices.len()).ok(),
        average_price: Some(average),
        median_price: super::growth::median(&prices),
        min_price: prices.iter().copied().reduce(f64::min),
        max_price: prices.iter().copied().reduce(f64::max),
        tier: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::dataset::Quarter;

    #[test]
    fn tier_bounds_are_inclusive_below() {
        assert_eq!(PriceTier::from_price(499_999.0), Some(PriceTier::Budget));
        assert_eq!(PriceTier::from_price(500_000.0), Some(PriceTier::MidRange));
        assert_eq!(PriceTier::from_price(750_000.0), Some(PriceTier::UpperMid));
        assert_eq!(PriceTier::from_price(1_000_000.0), Some(PriceTier::Premium));
        assert_eq!(PriceTier::from_price(f64::NAN), None);
        assert_eq!(PriceTier::parse("Mid-Range"), Some(PriceTier::MidRange));
        assert_eq!(PriceTier::parse("upper_mid"), Some(PriceTier::UpperMid));
        assert_eq!(PriceTier::parse("luxury"), None);
    }

    #[test]
    fn master_gaps_are_filled_from_series() {
        let profile = PropertyProfile {
            region: "UNLEY".to_string(),
            first_price: Some(800_000.0),
            ..PropertyProfile::default()
        };
        let series = vec![
            TimeSeriesPoint {
                quarter: Quarter::new(2019, 1).expect("quarter"),
                median_price: 800_000.0,
            },
            TimeSeriesPoint {
                quarter: Quarter::new(2019, 2).expect("quarter"),
                median_price: 1_000_000.0,
            },
        ];

        let overview = overview(
            Availability::Available(&profile),
            Availability::Available(&series),
        )
        .expect("overview");
        assert_eq!(overview.current_price, Some(1_000_000.0));
        assert_eq!(overview.growth_amount, Some(200_000.0));
        assert_eq!(overview.tier, Some(PriceTier::Premium));
        assert_eq!(overview.quarter_count, Some(2));
    }

    #[test]
    fn no_rows_anywhere_is_unavailable() {
        let series: Vec<TimeSeriesPoint> = Vec::new();
        let error = overview(Availability::Missing, Availability::Available(&series))
            .expect_err("nothing to show");
        assert_eq!(
            error,
            MetricUndefined::NoRows {
                table: TableKind::Master
            }
        );
    }
}
