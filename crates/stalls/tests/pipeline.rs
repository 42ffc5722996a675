use image::{Rgb, RgbImage};
use tempfile::TempDir;

use stalls::{
    algorithms::ContourStallDetector, process_image, process_lot, StallError, StallStore, StructureAwareDetector,
};

fn save_image(dir: &TempDir, name: &str, image: &RgbImage) -> std::path::PathBuf {
    let path = dir.path().join(name);
    image.save(&path).unwrap();
    path
}

/// Light asphalt with two dark painted-out bays the contour detector can see
fn lot_with_bays() -> RgbImage {
    let mut image = RgbImage::from_pixel(220, 120, Rgb([200, 200, 200]));
    for ox in [20u32, 120] {
        for y in 30..70 {
            for x in ox..ox + 30 {
                image.put_pixel(x, y, Rgb([50, 50, 50]));
            }
        }
    }
    image
}

/// Dark lot with a bright aisle strip sloping at 3 degrees, crossed by three
/// bright stripe markings
fn striped_aisle_lot() -> RgbImage {
    let mut image = RgbImage::new(400, 200);
    let slope = 3.0f64.to_radians().tan();
    for x in 20..380u32 {
        let top = 90 + ((x - 20) as f64 * slope).round() as u32;
        for y in top..top + 8 {
            image.put_pixel(x, y, Rgb([255, 255, 255]));
        }
    }
    for center in [40u32, 200, 360] {
        for x in center - 2..=center + 2 {
            for y in 70..135 {
                image.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
    }
    image
}

#[test]
fn structure_detector_stores_striped_aisle() {
    let dir = TempDir::new().unwrap();
    let image = save_image(&dir, "aisle.png", &striped_aisle_lot());
    let store = dir.path().join("stalls.json");

    let detector = StructureAwareDetector::builder().build().unwrap();
    let detection = process_lot(&detector, &image, &store, "lot-a").unwrap();

    assert!(detection.horizontal_aisles >= 1);
    assert!(!detection.stalls.is_empty());
    for stall in &detection.stalls {
        let [tl, tr, br, bl] = stall.polygon;
        assert!(tr[0] > tl[0] && br[1] > tr[1]);
        assert_eq!((bl[0], bl[1]), (tl[0], br[1]));
        assert_eq!(stall.confidence, 0.7);
    }
    assert_eq!(StallStore::open(&store).unwrap().lot("lot-a").unwrap(), detection.stalls);
}

#[test]
fn structure_detector_runs_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let image = save_image(&dir, "aisle.png", &striped_aisle_lot());
    let first_store = dir.path().join("first.json");
    let second_store = dir.path().join("second.json");
    let detector = StructureAwareDetector::builder().build().unwrap();

    process_lot(&detector, &image, &first_store, "lot-a").unwrap();
    process_lot(&detector, &image, &second_store, "lot-a").unwrap();

    assert_eq!(
        std::fs::read(&first_store).unwrap(),
        std::fs::read(&second_store).unwrap()
    );
}

#[test]
fn structure_detector_rerun_keeps_only_newest_results() {
    let dir = TempDir::new().unwrap();
    let aisle = save_image(&dir, "aisle.png", &striped_aisle_lot());
    let blank = save_image(&dir, "blank.png", &RgbImage::new(400, 200));
    let store = dir.path().join("stalls.json");
    let detector = StructureAwareDetector::builder().build().unwrap();

    let first = process_lot(&detector, &aisle, &store, "lot-a").unwrap();
    process_lot(&detector, &aisle, &store, "lot-b").unwrap();
    assert!(!first.stalls.is_empty());

    process_lot(&detector, &blank, &store, "lot-a").unwrap();

    let reopened = StallStore::open(&store).unwrap();
    assert!(reopened.lot("lot-a").unwrap().is_empty());
    assert_eq!(reopened.lot("lot-b").unwrap(), first.stalls);
}

#[test]
fn process_image_skips_decoding() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("stalls.json");
    let detector = StructureAwareDetector::builder().build().unwrap();

    let direct = process_image(&detector, &striped_aisle_lot(), &store, "lot-a").unwrap();
    let image = save_image(&dir, "aisle.png", &striped_aisle_lot());
    let loaded = process_lot(&detector, &image, dir.path().join("other.json"), "lot-a").unwrap();

    assert_eq!(direct.stalls, loaded.stalls);
}

#[test]
fn blank_image_stores_empty_lot() {
    let dir = TempDir::new().unwrap();
    let image = save_image(&dir, "blank.png", &RgbImage::from_pixel(200, 150, Rgb([0, 0, 0])));
    let store = dir.path().join("stalls.json");

    let detector = StructureAwareDetector::builder().build().unwrap();
    let detection = process_lot(&detector, &image, &store, "empty-lot").unwrap();

    assert!(detection.stalls.is_empty());
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(raw, serde_json::json!({"empty-lot": []}));
}

#[test]
fn rerunning_a_lot_keeps_only_newest_results() {
    let dir = TempDir::new().unwrap();
    let bays = save_image(&dir, "bays.png", &lot_with_bays());
    let blank = save_image(&dir, "blank.png", &RgbImage::from_pixel(220, 120, Rgb([200, 200, 200])));
    let store = dir.path().join("stalls.json");
    let detector = ContourStallDetector::default();

    let first = process_lot(&detector, &bays, &store, "lot-a").unwrap();
    process_lot(&detector, &bays, &store, "lot-b").unwrap();
    assert_eq!(first.stalls.len(), 2);

    process_lot(&detector, &blank, &store, "lot-a").unwrap();

    let reopened = StallStore::open(&store).unwrap();
    assert!(reopened.lot("lot-a").unwrap().is_empty());
    assert_eq!(reopened.lot("lot-b").unwrap().len(), 2);
    assert_eq!(reopened.lot_ids().collect::<Vec<_>>(), vec!["lot-a", "lot-b"]);
}

#[test]
fn repeated_runs_write_identical_stores() {
    let dir = TempDir::new().unwrap();
    let image = save_image(&dir, "bays.png", &lot_with_bays());
    let first_store = dir.path().join("first.json");
    let second_store = dir.path().join("second.json");
    let detector = ContourStallDetector::default();

    process_lot(&detector, &image, &first_store, "lot-a").unwrap();
    process_lot(&detector, &image, &second_store, "lot-a").unwrap();

    assert_eq!(
        std::fs::read(&first_store).unwrap(),
        std::fs::read(&second_store).unwrap()
    );
}

#[test]
fn unreadable_image_fails_without_writing() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("stalls.json");
    let detector = StructureAwareDetector::builder().build().unwrap();

    let result = process_lot(&detector, dir.path().join("missing.png"), &store, "lot-a");

    assert!(matches!(result, Err(StallError::ImageLoad { .. })));
    assert!(!store.exists());
}

#[test]
fn corrupt_store_is_left_untouched() {
    let dir = TempDir::new().unwrap();
    let image = save_image(&dir, "bays.png", &lot_with_bays());
    let store = dir.path().join("stalls.json");
    std::fs::write(&store, "not json").unwrap();

    let result = process_lot(&ContourStallDetector::default(), &image, &store, "lot-a");

    assert!(matches!(result, Err(StallError::StoreCorrupt { .. })));
    assert_eq!(std::fs::read_to_string(&store).unwrap(), "not json");
}
