//! Turns aggregated metrics into renderer-agnostic view specifications.

mod dashboard;
mod spec;
mod tabs;

pub use dashboard::render_dashboard;
pub use spec::{
    Banner, BannerLevel, Chart, ChartKind, ChartPoint, MapFeature, MapLayer, MapLayerKind,
    MetricCard, Series, Table, Tone, ViewSpec,
};

use crate::market::dataset::DatasetBundle;
use crate::market::metrics::{self, AggregationWindow, PriceTier, RegionMetrics, YearRange};
use crate::market::resolver::{self, NotFound};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Overview,
    Growth,
    Demographics,
    Crime,
    Rental,
    Predictions,
    Culture,
}

impl Tab {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::Overview,
            Self::Growth,
            Self::Demographics,
            Self::Crime,
            Self::Rental,
            Self::Predictions,
            Self::Culture,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Growth => "Year-on-Year Growth",
            Self::Demographics => "Demographics",
            Self::Crime => "Crime & Safety",
            Self::Rental => "Rental & Yield",
            Self::Predictions => "Predictions & Risk",
            Self::Culture => "Cultural Communities",
        }
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Growth => "growth",
            Self::Demographics => "demographics",
            Self::Crime => "crime",
            Self::Rental => "rental",
            Self::Predictions => "predictions",
            Self::Culture => "culture",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, UnknownTab> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overview" => Ok(Self::Overview),
            "growth" | "yoy" => Ok(Self::Growth),
            "demographics" => Ok(Self::Demographics),
            "crime" => Ok(Self::Crime),
            "rental" => Ok(Self::Rental),
            "predictions" | "risk" => Ok(Self::Predictions),
            "culture" | "cultural" => Ok(Self::Culture),
            _ => Err(UnknownTab(raw.to_string())),
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tab '{0}'")]
pub struct UnknownTab(pub String);

/// Optional narrowing applied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilters {
    pub price_tier: Option<PriceTier>,
    pub years: Option<YearRange>,
}

impl ViewFilters {
    pub fn window(&self) -> AggregationWindow {
        AggregationWindow::years(self.years.unwrap_or_default())
    }

    fn describe_years(&self) -> Option<String> {
        let years = self.years?;
        match (years.from, years.to) {
            (Some(from), Some(to)) if from == to => Some(format!("Year {from}")),
            (Some(from), Some(to)) => Some(format!("Years {from}-{to}")),
            (Some(from), None) => Some(format!("From {from}")),
            (None, Some(to)) => Some(format!("Through {to}")),
            (None, None) => None,
        }
    }
}

/// Renders one tab for already-aggregated metrics.
pub fn render(tab: Tab, metrics: &RegionMetrics, filters: &ViewFilters) -> ViewSpec {
    let mut view = match tab {
        Tab::Overview => tabs::overview(metrics),
        Tab::Growth => tabs::growth(metrics),
        Tab::Demographics => tabs::demographics(metrics),
        Tab::Crime => tabs::crime(metrics),
        Tab::Rental => tabs::rental(metrics),
        Tab::Predictions => tabs::predictions(metrics),
        Tab::Culture => tabs::culture(metrics),
    };
    view.title = format!("{}: {}", metrics.region, tab.label());
    view.subtitle = filters.describe_years();

    if let Some(wanted) = filters.price_tier {
        let tier = metrics.price.value().and_then(|price| price.tier);
        if tier != Some(wanted) {
            view.banners.insert(
                0,
                Banner::info(format!(
                    "{} is outside the selected {} tier",
                    metrics.region,
                    wanted.label()
                )),
            );
        }
    }
    view
}

/// Resolves, aggregates and renders in one step.
pub fn render_region(
    bundle: &DatasetBundle,
    region: &str,
    tab: Tab,
    filters: &ViewFilters,
) -> Result<ViewSpec, NotFound> {
    let resolved = resolver::resolve(bundle, region)?;
    let metrics = metrics::aggregate(&resolved, &filters.window());
    Ok(render(tab, &metrics, filters))
}
