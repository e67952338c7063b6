use super::domain::Coordinate;
use super::table::{DataLoadError, TableKind};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;

/// Reads `{ "<suburb>": { "lat": .., "lng": .. } }`.
pub(crate) fn read_coordinates<R: Read>(
    reader: R,
) -> Result<BTreeMap<String, Coordinate>, DataLoadError> {
    serde_json::from_reader(reader).map_err(|source| DataLoadError::Json {
        table: TableKind::Coordinates,
        source,
    })
}

/// Reads a GeoJSON FeatureCollection into (suburb name, feature) pairs.
///
/// Features without a `Suburb` property are skipped; the geometry is kept
/// verbatim for the map renderer.
pub(crate) fn read_boundaries<R: Read>(reader: R) -> Result<Vec<(String, Value)>, DataLoadError> {
    let document: Value = serde_json::from_reader(reader).map_err(|source| DataLoadError::Json {
        table: TableKind::Boundaries,
        source,
    })?;

    let features = document
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| DataLoadError::Malformed {
            table: TableKind::Boundaries,
            record: 0,
            detail: "expected a FeatureCollection with a 'features' array".to_string(),
        })?;

    let mut named = Vec::with_capacity(features.len());
    for feature in features {
        let name = feature
            .get("properties")
            .and_then(|properties| properties.get("Suburb"))
            .and_then(Value::as_str);
        if let Some(name) = name {
            named.push((name.to_string(), feature.clone()));
        }
    }

    Ok(named)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn coordinates_parse_lat_lng_objects() {
        let json = r#"{"UNLEY": {"lat": -34.95, "lng": 138.6}}"#;
        let coordinates = read_coordinates(Cursor::new(json)).expect("coordinates parse");
        assert_eq!(coordinates["UNLEY"].lat, -34.95);
    }

    #[test]
    fn boundaries_require_feature_collection() {
        let error = read_boundaries(Cursor::new(r#"{"type": "Feature"}"#))
            .expect_err("not a collection");
        assert!(matches!(error, DataLoadError::Malformed { .. }));

        let json = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"Suburb":"UNLEY"},"geometry":null},
            {"type":"Feature","properties":{},"geometry":null}
        ]}"#;
        let features = read_boundaries(Cursor::new(json)).expect("boundaries parse");
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].0, "UNLEY");
    }
}
