use crate::market::format::{
    fmt_count, fmt_dollar, fmt_num, fmt_pct, fmt_price, fmt_signed_pct, NOT_AVAILABLE,
};
use crate::market::metrics::{Metric, RegionMetrics};
use chrono::{DateTime, Utc};
use serde::Serialize;

const SUBTITLE: &str = "Adelaide Property Market Explorer | Data: 2019-2025";
const FOOTER: &str = "Generated by Adelaide Property Market Explorer | Data: ABS Census 2021, \
SA Govt Crime Data, Property Records 2019-2025";
const RENTAL_DISCLAIMER: &str = "Disclaimer: Rental data is based on Census 2021, adjusted for \
inflation. Check current listings for today's asking rents.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportField {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub title: String,
    pub fields: Vec<ReportField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl ReportSection {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            fields: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn field(&mut self, label: &str, value: impl Into<String>) {
        self.fields.push(ReportField {
            label: label.to_string(),
            value: value.into(),
        });
    }

    fn flag<T>(&mut self, metric: &Metric<T>) {
        if let Some(reason) = metric.reason() {
            self.notes.push(format!("Unavailable: {reason}"));
        }
    }
}

/// Format-independent document content. Identical metrics and timestamp
/// always give an identical layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLayout {
    pub region: String,
    pub title: String,
    pub subtitle: String,
    pub generated_at: String,
    pub sections: Vec<ReportSection>,
    pub footer: String,
}

pub fn build(metrics: &RegionMetrics, generated_at: DateTime<Utc>) -> ReportLayout {
    ReportLayout {
        region: metrics.region.clone(),
        title: format!("{} Property Report", metrics.region),
        subtitle: SUBTITLE.to_string(),
        generated_at: format!("Generated {}", generated_at.format("%Y-%m-%d %H:%M UTC")),
        sections: vec![
            price_section(metrics),
            growth_section(metrics),
            demographics_section(metrics),
            crime_section(metrics),
            rental_section(metrics),
            predictions_section(metrics),
            culture_section(metrics),
        ],
        footer: FOOTER.to_string(),
    }
}

fn price_section(metrics: &RegionMetrics) -> ReportSection {
    let mut section = ReportSection::new("Price Overview");
    section.flag(&metrics.price);
    let price = metrics.price.value();
    section.field("Current Price:", fmt_price(price.and_then(|p| p.current_price)));
    section.field("First Price:", fmt_price(price.and_then(|p| p.first_price)));
    section.field("Total Growth:", fmt_pct(price.and_then(|p| p.growth_percent), 1));
    section.field("Growth Amount:", fmt_price(price.and_then(|p| p.growth_amount)));
    section.field("Price Volatility:", fmt_num(price.and_then(|p| p.volatility), 2));
    section.field(
        "Price Tier:",
        price
            .and_then(|p| p.tier)
            .map(|tier| format!("{} ({})", tier.label(), tier.range_label()))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    );
    section
}

fn growth_section(metrics: &RegionMetrics) -> ReportSection {
    let mut section = ReportSection::new("Price Growth");
    section.flag(&metrics.growth);
    let growth = metrics.growth.value();
    section.field(
        "Period:",
        growth
            .map(|g| format!("{} to {}", g.start.label(), g.end.label()))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    );
    section.field("CAGR:", fmt_pct(growth.and_then(|g| g.cagr_percent.get()), 1));
    section.field(
        "Total Growth:",
        fmt_pct(growth.and_then(|g| g.total_growth_percent.get()), 1),
    );
    for (label, change) in [
        ("Best Year:", growth.and_then(|g| g.best_year)),
        ("Worst Year:", growth.and_then(|g| g.worst_year)),
    ] {
        section.field(
            label,
            change
                .map(|change| {
                    format!(
                        "{} ({})",
                        change.year,
                        fmt_signed_pct(Some(change.change_percent), 1)
                    )
                })
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        );
    }
    section
}

fn demographics_section(metrics: &RegionMetrics) -> ReportSection {
    let mut section = ReportSection::new("Demographics");
    section.flag(&metrics.demographics);
    let profile = metrics.demographics.value();
    section.field("Population:", fmt_num(profile.and_then(|p| p.population), 0));
    section.field("Median Age:", fmt_num(profile.and_then(|p| p.median_age), 1));
    section.field(
        "Median Household Income (weekly):",
        fmt_dollar(profile.and_then(|p| p.household_income_weekly)),
    );
    section.field(
        "Median Personal Income (weekly):",
        fmt_dollar(profile.and_then(|p| p.personal_income_weekly)),
    );
    section.field(
        "Median Mortgage Repayment (monthly):",
        fmt_dollar(profile.and_then(|p| p.mortgage_monthly)),
    );
    section
}

fn crime_section(metrics: &RegionMetrics) -> ReportSection {
    let mut section = ReportSection::new("Crime & Safety");
    section.flag(&metrics.crime);
    let crime = metrics.crime.value();
    section.field(
        "Total Offences:",
        crime.map_or_else(|| NOT_AVAILABLE.to_string(), |c| fmt_count(c.total)),
    );
    section.field(
        "Crime Rate (per 1,000):",
        fmt_num(crime.and_then(|c| c.rate_per_1000.get()), 1),
    );
    section.field(
        "Safety Level:",
        crime
            .and_then(|c| c.safety)
            .map_or(NOT_AVAILABLE, |level| level.label())
            .to_string(),
    );
    let ranks = ["Most Common:", "2nd Most Common:", "3rd Most Common:"];
    if let Some(crime) = crime {
        for (label, category) in ranks.iter().zip(&crime.top_categories) {
            section.field(label, category.clone());
        }
    }
    section
}

fn rental_section(metrics: &RegionMetrics) -> ReportSection {
    let mut section = ReportSection::new("Rental & Yield");
    section.flag(&metrics.rental);
    match metrics.rental.value() {
        Some(rental) => {
            for line in &rental.lines {
                section.field(
                    &format!("{} Rent (weekly):", line.property_type),
                    format!(
                        "{} fair / {} actual",
                        fmt_dollar(Some(line.fair_rent)),
                        fmt_dollar(Some(line.actual_rent))
                    ),
                );
                section.field(
                    &format!("{} Rent Gap:", line.property_type),
                    format!(
                        "{} ({})",
                        fmt_signed_pct(line.gap_percent.get(), 1),
                        line.band.map_or(NOT_AVAILABLE, |band| band.label())
                    ),
                );
                section.field(
                    &format!("{} Gross Yield:", line.property_type),
                    fmt_pct(line.gross_yield_percent.get(), 2),
                );
            }
        }
        None => {
            section.field("Rent (weekly):", NOT_AVAILABLE);
            section.field("Rent Gap:", NOT_AVAILABLE);
            section.field("Gross Yield:", NOT_AVAILABLE);
        }
    }
    section.notes.push(RENTAL_DISCLAIMER.to_string());
    section
}

fn predictions_section(metrics: &RegionMetrics) -> ReportSection {
    let mut section = ReportSection::new("Predictions & Risk");
    section.flag(&metrics.predictions);
    section.flag(&metrics.risk);
    let predictions = metrics.predictions.value();
    let next = predictions.and_then(|p| p.next_forecast);
    section.field(
        "Next Forecast:",
        next.map(|point| format!("{} in {}", fmt_price(Some(point.predicted_price)), point.year))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    );
    section.field(
        "Expected Growth:",
        fmt_signed_pct(predictions.and_then(|p| p.expected_growth_percent.get()), 1),
    );
    let risk = metrics.risk.value();
    section.field("Total Risk Score:", fmt_num(risk.map(|r| r.score), 1));
    section.field("Risk Category:", risk.map_or(NOT_AVAILABLE, |r| r.band_label));
    section.field(
        "Investment Strategy:",
        risk.and_then(|r| r.investment_strategy.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    );
    section
}

fn culture_section(metrics: &RegionMetrics) -> ReportSection {
    let mut section = ReportSection::new("Cultural Communities");
    section.flag(&metrics.culture);
    if let Some(culture) = metrics.culture.value() {
        if culture.diversity.clamped {
            section
                .notes
                .push("Community shares summed above 100% and were rescaled.".to_string());
        }
        for community in culture.communities.iter().take(5) {
            section.field(
                &format!("{}:", community.community),
                format!(
                    "{} ({} people)",
                    fmt_pct(Some(community.share * 100.0), 1),
                    fmt_num(Some(community.population), 0)
                ),
            );
        }
    }
    section.field(
        "Cultural Diversity Index:",
        fmt_num(metrics.culture.value().map(|c| c.diversity.index), 3),
    );
    section
}
