//! Per-lot stall store backed by a single JSON object file.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use lot_common::{sort_reading_order, StallRecord};

use crate::error::{Result, StallError};

/// In-memory view of `stalls.json`: lot id to stall array.
///
/// Lots this process never touches are kept as raw JSON so they are written
/// back exactly as they were read, in their original key order.
#[derive(Debug, Clone)]
pub struct StallStore {
    path: PathBuf,
    lots: Map<String, Value>,
}

impl StallStore {
    /// Load the store at `path`. A missing file is an empty store; anything
    /// that is not a JSON object is [`StallError::StoreCorrupt`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            debug!(path = %path.display(), "no existing store, starting empty");
            return Ok(Self { path, lots: Map::new() });
        }

        let content = std::fs::read_to_string(&path)?;
        let value: Value =
            serde_json::from_str(&content).map_err(|e| StallError::StoreCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        let Value::Object(lots) = value else {
            return Err(StallError::StoreCorrupt {
                path,
                reason: "top-level value is not an object".to_string(),
            });
        };

        Ok(Self { path, lots })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lot_ids(&self) -> impl Iterator<Item = &str> {
        self.lots.keys().map(String::as_str)
    }

    /// Stalls stored for `lot_id`; an unknown lot has none
    pub fn lot(&self, lot_id: &str) -> Result<Vec<StallRecord>> {
        match self.lots.get(lot_id) {
            Some(value) => Ok(serde_json::from_value(value.clone())?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace every stall of `lot_id`, stored in reading order
    pub fn replace_lot(&mut self, lot_id: &str, mut stalls: Vec<StallRecord>) -> Result<Vec<StallRecord>> {
        sort_reading_order(&mut stalls);
        self.lots
            .insert(lot_id.to_string(), serde_json::to_value(&stalls)?);
        Ok(stalls)
    }

    /// Write the whole mapping, pretty-printed, via a temp file renamed over
    /// the target
    pub fn save(&self) -> Result<()> {
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let mut content = serde_json::to_string_pretty(&self.lots)?;
        content.push('\n');

        let mut temp = tempfile::NamedTempFile::new_in(&parent)?;
        std::io::Write::write_all(&mut temp, content.as_bytes())?;
        temp.persist(&self.path).map_err(|e| StallError::Io(e.error))?;

        debug!(path = %self.path.display(), lots = self.lots.len(), "store written");
        Ok(())
    }
}

/// Replace `lot_id`'s stalls in the store file and return them as written.
///
/// Nothing is written when the existing store cannot be read.
pub fn upsert_lot(
    store_path: impl AsRef<Path>,
    lot_id: &str,
    stalls: Vec<StallRecord>,
) -> Result<Vec<StallRecord>> {
    let mut store = StallStore::open(store_path)?;
    let written = store.replace_lot(lot_id, stalls)?;
    store.save()?;
    info!(
        lot_id,
        stalls = written.len(),
        path = %store.path().display(),
        "lot saved"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lot_common::{StallBox, StallStatus};
    use tempfile::TempDir;

    fn record(id: &str, x0: i32, y0: i32) -> StallRecord {
        let stall_box = StallBox::new(x0, y0, x0 + 20, y0 + 40).unwrap();
        StallRecord::from_box(id, &stall_box, 0.7)
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = StallStore::open(dir.path().join("stalls.json")).unwrap();

        assert_eq!(store.lot_ids().count(), 0);
        assert!(store.lot("lot-a").unwrap().is_empty());
    }

    #[test]
    fn test_upsert_creates_file_in_reading_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("stalls.json");

        let written = upsert_lot(
            &path,
            "lot-a",
            vec![record("S-001", 100, 50), record("S-002", 0, 50), record("S-003", 40, 0)],
        )
        .unwrap();

        let ids: Vec<&str> = written.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["S-003", "S-002", "S-001"]);

        let reopened = StallStore::open(&path).unwrap();
        assert_eq!(reopened.lot("lot-a").unwrap(), written);
    }

    #[test]
    fn test_replace_keeps_foreign_lots_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stalls.json");
        let foreign = r#"{
  "zeta": [{"id": "X-1", "custom": true}],
  "alpha": []
}"#;
        std::fs::write(&path, foreign).unwrap();

        upsert_lot(&path, "middle", vec![record("S-001", 0, 0)]).unwrap();

        let store = StallStore::open(&path).unwrap();
        let ids: Vec<&str> = store.lot_ids().collect();
        assert_eq!(ids, vec!["zeta", "alpha", "middle"]);

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["zeta"], serde_json::json!([{"id": "X-1", "custom": true}]));
    }

    #[test]
    fn test_rerun_replaces_previous_results() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stalls.json");

        upsert_lot(&path, "lot-a", vec![record("S-001", 0, 0), record("S-002", 30, 0)]).unwrap();
        upsert_lot(&path, "lot-a", vec![record("S-001", 200, 200)]).unwrap();

        let stalls = StallStore::open(&path).unwrap().lot("lot-a").unwrap();
        assert_eq!(stalls.len(), 1);
        assert_eq!(stalls[0].polygon[0], [200, 200]);
        assert_eq!(stalls[0].status, StallStatus::Open);
    }

    #[test]
    fn test_empty_detection_writes_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stalls.json");

        upsert_lot(&path, "lot-a", Vec::new()).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"lot-a": []}));
    }

    #[test]
    fn test_corrupt_store_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stalls.json");

        for content in ["{not json", "[1, 2, 3]"] {
            std::fs::write(&path, content).unwrap();
            let result = upsert_lot(&path, "lot-a", vec![record("S-001", 0, 0)]);

            assert!(matches!(result, Err(StallError::StoreCorrupt { .. })));
            assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
        }
    }

    #[test]
    fn test_identical_upserts_are_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stalls.json");
        let stalls = vec![record("S-001", 0, 0), record("S-002", 30, 0)];

        upsert_lot(&path, "lot-a", stalls.clone()).unwrap();
        let first = std::fs::read(&path).unwrap();
        upsert_lot(&path, "lot-a", stalls).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert!(String::from_utf8(first).unwrap().contains("\n  \"lot-a\": [\n"));
    }
}
