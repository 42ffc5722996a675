use std::path::Path;

use geojson::{feature::Id, Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Number, Value as JsonValue};

use lot_common::{StallRecord, StallStatus};

use crate::error::{Result, StallError};

fn closed_ring(polygon: &[[i32; 2]; 4]) -> Vec<Vec<f64>> {
    polygon
        .iter()
        .chain(polygon.first())
        .map(|&[x, y]| vec![x as f64, y as f64])
        .collect()
}

fn stall_feature(stall: &StallRecord) -> Feature {
    let mut properties = Map::new();
    properties.insert("id".to_string(), JsonValue::String(stall.id.clone()));
    properties.insert("status".to_string(), JsonValue::String(stall.status.to_string()));
    properties.insert(
        "permit".to_string(),
        JsonValue::Array(stall.permit.iter().cloned().map(JsonValue::String).collect()),
    );
    properties.insert(
        "confidence".to_string(),
        Number::from_f64(stall.confidence)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Polygon(vec![closed_ring(&stall.polygon)]))),
        id: Some(Id::String(stall.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Export one lot as a FeatureCollection of stall polygons in pixel space
pub fn lot_to_geojson(lot_id: &str, stalls: &[StallRecord]) -> FeatureCollection {
    let mut foreign_members = Map::new();
    foreign_members.insert("lot_id".to_string(), JsonValue::String(lot_id.to_string()));
    foreign_members.insert("stall_count".to_string(), JsonValue::Number(Number::from(stalls.len())));

    FeatureCollection {
        bbox: None,
        features: stalls.iter().map(stall_feature).collect(),
        foreign_members: Some(foreign_members),
    }
}

/// Save a lot as pretty-printed GeoJSON, creating parent directories
pub fn save_lot_geojson(path: impl AsRef<Path>, lot_id: &str, stalls: &[StallRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let collection = lot_to_geojson(lot_id, stalls);
    std::fs::write(path, serde_json::to_string_pretty(&collection)?)?;
    Ok(())
}

/// Read stall records back from a FeatureCollection written by [`lot_to_geojson`]
pub fn stalls_from_geojson(geojson_str: &str) -> Result<Vec<StallRecord>> {
    let collection: FeatureCollection = geojson_str.parse()?;
    let mut stalls = Vec::with_capacity(collection.features.len());

    for feature in collection.features {
        let properties = feature.properties.unwrap_or_default();
        let id = properties
            .get("id")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| StallError::GeoJsonContent("feature without an id".to_string()))?
            .to_string();

        let ring = match feature.geometry.map(|g| g.value) {
            Some(Value::Polygon(rings)) => rings.into_iter().next().unwrap_or_default(),
            _ => {
                return Err(StallError::GeoJsonContent(format!("{id} is not a polygon")));
            }
        };
        if ring.len() < 4 {
            return Err(StallError::GeoJsonContent(format!(
                "{id} has {} ring positions",
                ring.len()
            )));
        }
        let mut polygon = [[0i32; 2]; 4];
        for (corner, position) in polygon.iter_mut().zip(&ring) {
            match position.as_slice() {
                [x, y, ..] => *corner = [x.round() as i32, y.round() as i32],
                _ => return Err(StallError::GeoJsonContent(format!("{id} has a short position"))),
            }
        }

        let confidence = properties
            .get("confidence")
            .and_then(JsonValue::as_f64)
            .unwrap_or(0.0);
        let mut stall = StallRecord::from_polygon(id, polygon, confidence);
        if let Some(status) = properties
            .get("status")
            .and_then(JsonValue::as_str)
            .and_then(|s| s.parse::<StallStatus>().ok())
        {
            stall.status = status;
        }
        if let Some(permit) = properties.get("permit").and_then(JsonValue::as_array) {
            stall.permit = permit
                .iter()
                .filter_map(JsonValue::as_str)
                .map(str::to_string)
                .collect();
        }
        stalls.push(stall);
    }

    Ok(stalls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lot_common::StallBox;

    fn sample_stalls() -> Vec<StallRecord> {
        let mut filled = StallRecord::from_box("S-002", &StallBox::new(40, 0, 60, 40).unwrap(), 0.6);
        filled.status = StallStatus::Filled;
        vec![
            StallRecord::from_box("S-001", &StallBox::new(0, 0, 20, 40).unwrap(), 0.7),
            filled,
        ]
    }

    #[test]
    fn test_features_have_closed_rings_and_properties() {
        let collection = lot_to_geojson("lot-a", &sample_stalls());

        assert_eq!(collection.features.len(), 2);
        let members = collection.foreign_members.as_ref().unwrap();
        assert_eq!(members["lot_id"], "lot-a");
        assert_eq!(members["stall_count"], 2);

        let feature = &collection.features[1];
        let Some(Value::Polygon(rings)) = feature.geometry.as_ref().map(|g| g.value.clone()) else {
            panic!("expected polygon geometry");
        };
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[0].first(), rings[0].last());
        assert_eq!(feature.property("status"), Some(&JsonValue::from("filled")));
    }

    #[test]
    fn test_stalls_read_back_from_saved_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("lot.geojson");
        let stalls = sample_stalls();

        save_lot_geojson(&path, "lot-a", &stalls).unwrap();
        let restored = stalls_from_geojson(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(restored, stalls);
    }

    #[test]
    fn test_non_polygon_feature_is_rejected() {
        let text = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"id": "S-001"},
             "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}}
        ]}"#;

        assert!(matches!(
            stalls_from_geojson(text),
            Err(StallError::GeoJsonContent(_))
        ));
    }
}
