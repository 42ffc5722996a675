pub mod geojson;

pub use self::geojson::{lot_to_geojson, save_lot_geojson, stalls_from_geojson};
