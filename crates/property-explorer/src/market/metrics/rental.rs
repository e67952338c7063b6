use super::{require, Metric, MetricUndefined};
use crate::market::dataset::{Availability, RentalRecord, TableKind};
use serde::Serialize;

const WEEKS_PER_YEAR: f64 = 52.0;

/// How far the market rent sits above the rent local incomes support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RentBand {
    Fair,
    Elevated,
    Overcharged,
    SeverelyOvercharged,
}

impl RentBand {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fair => "Fair",
            Self::Elevated => "Elevated",
            Self::Overcharged => "Overcharged",
            Self::SeverelyOvercharged => "Severely Overcharged",
        }
    }

    /// Bands on the gap percent; lower bounds are inclusive.
    pub fn from_gap_percent(gap_percent: f64) -> Self {
        if gap_percent < 5.0 {
            Self::Fair
        } else if gap_percent < 10.0 {
            Self::Elevated
        } else if gap_percent < 20.0 {
            Self::Overcharged
        } else {
            Self::SeverelyOvercharged
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentalLine {
    pub property_type: String,
    pub fair_rent: f64,
    pub actual_rent: f64,
    /// Signed; negative when the market rent is below the fair rent.
    pub gap: f64,
    pub gap_percent: Metric<f64>,
    pub band: Option<RentBand>,
    pub gross_yield_percent: Metric<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentalMetrics {
    pub lines: Vec<RentalLine>,
}

impl RentalMetrics {
    /// The house line when present, otherwise the first property type listed.
    pub fn headline(&self) -> Option<&RentalLine> {
        self.lines
            .iter()
            .find(|line| line.property_type.eq_ignore_ascii_case("house"))
            .or_else(|| self.lines.first())
    }
}

pub fn analyse(
    rental: Availability<'_, &Vec<RentalRecord>>,
    current_price: Option<f64>,
) -> Result<RentalMetrics, MetricUndefined> {
    let records = require(rental, TableKind::Rental)?;
    if records.is_empty() {
        return Err(MetricUndefined::NoRows {
            table: TableKind::Rental,
        });
    }

    let lines = records
        .iter()
        .map(|record| {
            let gap = record.actual_rent - record.fair_rent;
            let gap_percent = gap_percent(record.fair_rent, gap);
            RentalLine {
                property_type: record.property_type.clone(),
                fair_rent: record.fair_rent,
                actual_rent: record.actual_rent,
                gap,
                band: gap_percent.as_ref().ok().map(|pct| RentBand::from_gap_percent(*pct)),
                gap_percent: gap_percent.into(),
                gross_yield_percent: gross_yield(record.actual_rent, current_price).into(),
            }
        })
        .collect();

    Ok(RentalMetrics { lines })
}

fn gap_percent(fair_rent: f64, gap: f64) -> Result<f64, MetricUndefined> {
    if fair_rent == 0.0 {
        return Err(MetricUndefined::ZeroBase { field: "fair rent" });
    }
    if fair_rent < 0.0 {
        return Err(MetricUndefined::InvalidValue {
            field: "fair rent",
            value: fair_rent,
        });
    }
    Ok(gap / fair_rent * 100.0)
}

/// Annualised weekly rent over price, in percent. Never negative.
pub fn gross_yield(weekly_rent: f64, price: Option<f64>) -> Result<f64, MetricUndefined> {
    let price = price.ok_or(MetricUndefined::MissingValue {
        field: "current price",
    })?;
    if price == 0.0 {
        return Err(MetricUndefined::ZeroBase {
            field: "current price",
        });
    }
    if price < 0.0 || weekly_rent < 0.0 {
        return Err(MetricUndefined::InvalidValue {
            field: "rent or price",
            value: price.min(weekly_rent),
        });
    }
    Ok(weekly_rent * WEEKS_PER_YEAR / price * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(property_type: &str, fair_rent: f64, actual_rent: f64) -> RentalRecord {
        RentalRecord {
            property_type: property_type.to_string(),
            fair_rent,
            actual_rent,
        }
    }

    #[test]
    fn gap_bands_use_inclusive_lower_bounds() {
        assert_eq!(RentBand::from_gap_percent(-3.0), RentBand::Fair);
        assert_eq!(RentBand::from_gap_percent(5.0), RentBand::Elevated);
        assert_eq!(RentBand::from_gap_percent(10.0), RentBand::Overcharged);
        assert_eq!(RentBand::from_gap_percent(20.0), RentBand::SeverelyOvercharged);
    }

    #[test]
    fn lines_carry_gap_and_yield() {
        let records = vec![record("Unit", 400.0, 420.0), record("House", 500.0, 600.0)];
        let metrics =
            analyse(Availability::Available(&records), Some(624_000.0)).expect("rental metrics");
        let house = metrics.headline().expect("house line");
        assert_eq!(house.property_type, "House");
        assert_eq!(house.gap, 100.0);
        assert_eq!(house.gap_percent.get(), Some(20.0));
        assert_eq!(house.band, Some(RentBand::SeverelyOvercharged));
        let gross = house.gross_yield_percent.get().expect("yield");
        assert!((gross - 5.0).abs() < 1e-9);
    }

    #[test]
    fn zero_fair_rent_and_missing_price_degrade_per_line() {
        let records = vec![record("House", 0.0, 450.0)];
        let metrics = analyse(Availability::Available(&records), None).expect("rental metrics");
        let line = &metrics.lines[0];
        assert!(!line.gap_percent.is_available());
        assert_eq!(line.band, None);
        assert_eq!(
            line.gross_yield_percent.reason(),
            Some(&MetricUndefined::MissingValue {
                field: "current price"
            })
        );
    }
}
