use super::{require, MetricUndefined};
use crate::market::dataset::{Availability, RiskRecord, TableKind};
use serde::Serialize;

/// Risk category. The band always comes from the score; the source file's own
/// category text is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl RiskBand {
    pub const fn ordered() -> [Self; 4] {
        [Self::Low, Self::Moderate, Self::High, Self::VeryHigh]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    /// Lower bounds are inclusive, so a score on a boundary takes the higher band.
    pub fn from_score(score: f64) -> Result<Self, MetricUndefined> {
        if !score.is_finite() || score < 0.0 {
            return Err(MetricUndefined::InvalidValue {
                field: "risk score",
                value: score,
            });
        }
        Ok(if score < 25.0 {
            Self::Low
        } else if score < 50.0 {
            Self::Moderate
        } else if score < 75.0 {
            Self::High
        } else {
            Self::VeryHigh
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMetrics {
    pub score: f64,
    pub band: RiskBand,
    pub band_label: &'static str,
    pub investment_strategy: Option<String>,
    pub risk_adjusted_return: Option<f64>,
    pub value_category: Option<String>,
}

pub fn analyse(risk: Availability<'_, &RiskRecord>) -> Result<RiskMetrics, MetricUndefined> {
    let record = require(risk, TableKind::Risk)?;
    let band = RiskBand::from_score(record.score)?;
    Ok(RiskMetrics {
        score: record.score,
        band,
        band_label: band.label(),
        investment_strategy: record.investment_strategy.clone(),
        risk_adjusted_return: record.risk_adjusted_return,
        value_category: record.value_category.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_resolve_to_the_higher_band() {
        assert_eq!(RiskBand::from_score(0.0), Ok(RiskBand::Low));
        assert_eq!(RiskBand::from_score(24.99), Ok(RiskBand::Low));
        assert_eq!(RiskBand::from_score(25.0), Ok(RiskBand::Moderate));
        assert_eq!(RiskBand::from_score(50.0), Ok(RiskBand::High));
        assert_eq!(RiskBand::from_score(75.0), Ok(RiskBand::VeryHigh));
        assert_eq!(RiskBand::from_score(140.0), Ok(RiskBand::VeryHigh));
    }

    #[test]
    fn negative_and_non_finite_scores_are_undefined() {
        assert!(RiskBand::from_score(-1.0).is_err());
        assert!(RiskBand::from_score(f64::NAN).is_err());
        assert!(RiskBand::from_score(f64::INFINITY).is_err());
    }
}
