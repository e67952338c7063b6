use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::dataset::DatasetBundle;
use super::metrics::{PriceTier, YearRange};
use super::report::{self, ReportFormat};
use super::resolver;
use super::views::{self, Tab, ViewFilters};
use crate::error::AppError;

type SharedBundle = Arc<DatasetBundle>;

/// Router builder exposing the read-only market endpoints.
pub fn market_router(bundle: SharedBundle) -> Router {
    Router::new()
        .route("/api/v1/dataset", get(dataset_handler))
        .route("/api/v1/regions", get(search_handler))
        .route("/api/v1/regions/nearest", get(nearest_handler))
        .route("/api/v1/dashboard", get(dashboard_handler))
        .route("/api/v1/regions/:name/views/:tab", get(view_handler))
        .route("/api/v1/regions/:name/report", get(report_handler))
        .with_state(bundle)
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub tier: Option<String>,
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl FilterQuery {
    pub fn into_filters(self) -> Result<ViewFilters, AppError> {
        let price_tier = match self.tier.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                PriceTier::parse(raw)
                    .ok_or_else(|| AppError::bad_request(format!("unknown price tier '{raw}'")))?,
            ),
        };
        let years = match (self.from, self.to) {
            (None, None) => None,
            (from, to) => Some(YearRange::new(from, to).map_err(AppError::bad_request)?),
        };
        Ok(ViewFilters { price_tier, years })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

pub(crate) async fn dataset_handler(State(bundle): State<SharedBundle>) -> Response {
    (StatusCode::OK, Json(bundle.summary())).into_response()
}

pub(crate) async fn search_handler(
    State(bundle): State<SharedBundle>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let regions = resolver::search(&bundle, &query.q);
    let payload = json!({
        "query": query.q,
        "regions": regions,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn nearest_handler(
    State(bundle): State<SharedBundle>,
    Query(query): Query<NearestQuery>,
) -> Result<Response, AppError> {
    match resolver::nearest(&bundle, query.lat, query.lng) {
        Some(region) => {
            let payload = json!({ "region": region });
            Ok((StatusCode::OK, Json(payload)).into_response())
        }
        None => Err(AppError::bad_request(
            "no region centroid available near the given point",
        )),
    }
}

pub(crate) async fn dashboard_handler(
    State(bundle): State<SharedBundle>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, AppError> {
    let filters = query.into_filters()?;
    let view = views::render_dashboard(&bundle, &filters);
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub(crate) async fn view_handler(
    State(bundle): State<SharedBundle>,
    Path((name, tab)): Path<(String, String)>,
    Query(query): Query<FilterQuery>,
) -> Result<Response, AppError> {
    let tab = Tab::parse(&tab).map_err(AppError::bad_request)?;
    let filters = query.into_filters()?;
    debug!(region = %name, %tab, "rendering region view");
    let view = views::render_region(&bundle, &name, tab, &filters)?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub(crate) async fn report_handler(
    State(bundle): State<SharedBundle>,
    Path(name): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let format = match query.format.as_deref() {
        None => ReportFormat::Pdf,
        Some(raw) => ReportFormat::parse(raw)
            .ok_or_else(|| AppError::bad_request(format!("unsupported report format '{raw}'")))?,
    };

    let document = report::generate(&bundle, &name, format, Utc::now())?;
    let disposition = format!("attachment; filename=\"{}\"", document.file_name);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}
