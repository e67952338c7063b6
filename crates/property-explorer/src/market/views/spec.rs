use crate::market::dataset::Coordinate;
use crate::market::format::NOT_AVAILABLE;
use crate::market::metrics::{Metric, MetricUndefined};
use serde::Serialize;
use serde_json::Value;

/// Declarative description of one screen, consumed by the chart/map renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewSpec {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub banners: Vec<Banner>,
    pub cards: Vec<MetricCard>,
    pub charts: Vec<Chart>,
    pub tables: Vec<Table>,
    pub maps: Vec<MapLayer>,
    pub notes: Vec<String>,
}

impl ViewSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Adds a warning banner when `metric` is unavailable.
    pub(crate) fn flag<T>(&mut self, family: &str, metric: &Metric<T>) {
        if let Some(reason) = metric.reason() {
            self.banners.push(Banner::unavailable(family, reason));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub level: BannerLevel,
    pub message: String,
}

impl Banner {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: BannerLevel::Warning,
            message: message.into(),
        }
    }

    pub fn unavailable(family: &str, reason: &MetricUndefined) -> Self {
        Self::warning(format!("{family} unavailable: {reason}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Positive,
    Negative,
}

impl Tone {
    pub fn of_change(value: Option<f64>) -> Self {
        match value {
            Some(value) if value > 0.0 => Self::Positive,
            Some(value) if value < 0.0 => Self::Negative,
            _ => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
    pub tone: Tone,
}

impl MetricCard {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            delta: None,
            tone: Tone::Neutral,
        }
    }

    pub fn unavailable(label: impl Into<String>) -> Self {
        Self::new(label, NOT_AVAILABLE)
    }

    pub fn with_delta(mut self, delta: impl Into<String>, tone: Tone) -> Self {
        self.delta = Some(delta.into());
        self.tone = tone;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    HorizontalBar,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            name: name.into(),
            points: points
                .into_iter()
                .map(|(x, y)| ChartPoint { x, y })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    pub series: Vec<Series>,
}

impl Chart {
    pub fn new(kind: ChartKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            x_axis: None,
            y_axis: None,
            series: Vec::new(),
        }
    }

    pub fn axes(mut self, x_axis: impl Into<String>, y_axis: impl Into<String>) -> Self {
        self.x_axis = Some(x_axis.into());
        self.y_axis = Some(y_axis.into());
        self
    }

    pub fn series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapLayerKind {
    Choropleth,
    Points,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFeature {
    pub region: String,
    pub color: String,
    pub tooltip: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,
    /// GeoJSON feature passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayer {
    pub kind: MapLayerKind,
    pub title: String,
    pub legend: Vec<(String, String)>,
    pub features: Vec<MapFeature>,
}
