use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StallError {
    #[error("Failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write image: {0}")]
    ImageWrite(#[from] image::ImageError),

    #[error("Stall store {path} is corrupt: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Unexpected GeoJSON content: {0}")]
    GeoJsonContent(String),
}

pub type Result<T> = std::result::Result<T, StallError>;
