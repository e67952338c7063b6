//! Region name resolution across sources whose spellings disagree.

mod aliases;
mod normalizer;

pub use aliases::AliasTable;
pub use normalizer::normalize_name;

use crate::market::dataset::{
    Availability, CommunityRecord, Coordinate, CrimeRecord, DatasetBundle, DemographicProfile,
    PredictionRecord, PropertyProfile, RentalRecord, RiskRecord, TimeSeriesPoint,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("no region named '{query}'")]
pub struct NotFound {
    pub query: String,
    pub suggestions: Vec<String>,
}

/// How the query matched a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Normalized,
    Alias,
}

/// One region's view into every source table.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRegion<'a> {
    pub key: &'a str,
    pub name: &'a str,
    pub matched_by: MatchKind,
    pub property: Availability<'a, &'a PropertyProfile>,
    pub time_series: Availability<'a, &'a Vec<TimeSeriesPoint>>,
    pub predictions: Availability<'a, &'a Vec<PredictionRecord>>,
    pub risk: Availability<'a, &'a RiskRecord>,
    pub rental: Availability<'a, &'a Vec<RentalRecord>>,
    pub demographics: Availability<'a, &'a DemographicProfile>,
    pub communities: Availability<'a, &'a Vec<CommunityRecord>>,
    pub crime: Availability<'a, &'a Vec<CrimeRecord>>,
    pub coordinate: Availability<'a, &'a Coordinate>,
    pub boundary: Availability<'a, &'a Value>,
}

impl<'a> ResolvedRegion<'a> {
    fn new(bundle: &'a DatasetBundle, key: &'a str, name: &'a str, matched_by: MatchKind) -> Self {
        Self {
            key,
            name,
            matched_by,
            property: bundle.master.lookup(key),
            time_series: bundle.time_series.lookup(key),
            predictions: bundle.predictions.lookup(key),
            risk: bundle.risk.lookup(key),
            rental: bundle.rental.lookup(key),
            demographics: bundle.demographics.lookup(key),
            communities: bundle.communities.lookup(key),
            crime: bundle.crime.lookup(key),
            coordinate: bundle.coordinates.lookup(key),
            boundary: bundle.boundaries.lookup(key),
        }
    }

    /// True when at least one region-keyed table has rows for this region.
    pub fn has_any_data(&self) -> bool {
        self.property.is_available()
            || self.time_series.is_available()
            || self.predictions.is_available()
            || self.risk.is_available()
            || self.rental.is_available()
            || self.demographics.is_available()
            || self.communities.is_available()
            || self.crime.is_available()
    }
}

/// Resolves a user-supplied region name: exact display name, then normalized
/// key, then the alias table.
pub fn resolve<'a>(bundle: &'a DatasetBundle, query: &str) -> Result<ResolvedRegion<'a>, NotFound> {
    let regions = bundle.regions();

    if let Some((key, name)) = regions.iter().find(|(_, name)| name.as_str() == query) {
        return Ok(ResolvedRegion::new(bundle, key, name, MatchKind::Exact));
    }

    let normalized = normalize_name(query);
    if let Some((key, name)) = regions.get_key_value(&normalized) {
        debug!(query, region = %name, "region resolved after normalization");
        return Ok(ResolvedRegion::new(bundle, key, name, MatchKind::Normalized));
    }

    if let Some(target) = bundle.aliases().lookup(&normalized) {
        if let Some((key, name)) = regions.get_key_value(target) {
            debug!(query, region = %name, "region resolved through alias");
            return Ok(ResolvedRegion::new(bundle, key, name, MatchKind::Alias));
        }
    }

    let suggestions = if normalized.is_empty() {
        Vec::new()
    } else {
        search_normalized(bundle, &normalized)
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .collect()
    };
    debug!(query, suggestions = suggestions.len(), "region not found");
    Err(NotFound {
        query: query.to_string(),
        suggestions,
    })
}

/// Region display names containing the query, sorted alphabetically. An empty
/// query lists every region.
pub fn search(bundle: &DatasetBundle, query: &str) -> Vec<String> {
    search_normalized(bundle, &normalize_name(query))
}

/// Display name of the region whose centroid is closest to a map click.
/// Only regions with a price profile are candidates while the master table is
/// loaded; ties go to the alphabetically first key.
pub fn nearest(bundle: &DatasetBundle, lat: f64, lng: f64) -> Option<&str> {
    if !lat.is_finite() || !lng.is_finite() {
        return None;
    }
    let coordinates = bundle.coordinates.table()?;
    let master = bundle.master.table();

    coordinates
        .iter()
        .filter(|(key, _)| master.map_or(true, |master| master.get(key).is_some()))
        .filter_map(|(key, point)| {
            let distance = (point.lat - lat).powi(2) + (point.lng - lng).powi(2);
            bundle.region_name(key).map(|name| (name, distance))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(name, _)| name)
}

fn search_normalized(bundle: &DatasetBundle, normalized: &str) -> Vec<String> {
    let mut matches: Vec<String> = bundle
        .regions()
        .iter()
        .filter(|(key, _)| key.contains(normalized))
        .map(|(_, name)| name.clone())
        .collect();
    matches.sort();
    matches
}
