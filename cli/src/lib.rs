use std::fs;
use std::path::Path;

use stalls::{DetectorConfig, StallError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("Invalid detector configuration: {0}")]
    InvalidConfig(#[from] StallError),
}

/// Detector settings given on the command line; each one that is set wins
/// over the configuration file
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TunableOverrides {
    pub horizontal_cluster_gap: Option<f64>,
    pub vertical_cluster_gap: Option<f64>,
    pub stripe_threshold: Option<f64>,
}

impl TunableOverrides {
    pub fn apply(&self, config: &mut DetectorConfig) {
        if let Some(gap) = self.horizontal_cluster_gap {
            config.aisles.horizontal_cluster_gap = gap;
        }
        if let Some(gap) = self.vertical_cluster_gap {
            config.aisles.vertical_cluster_gap = gap;
        }
        if let Some(threshold) = self.stripe_threshold {
            config.stripes.threshold = threshold;
        }
    }
}

/// Load a detector configuration from TOML string
pub fn config_from_toml(content: &str) -> Result<DetectorConfig, CliError> {
    Ok(toml::from_str(content)?)
}

/// Load a detector configuration from JSON string
pub fn config_from_json(content: &str) -> Result<DetectorConfig, CliError> {
    Ok(serde_json::from_str(content)?)
}

/// Load a detector configuration, picking the format from the file extension
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DetectorConfig, CliError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("toml") => config_from_toml(&fs::read_to_string(path)?),
        Some("json") => config_from_json(&fs::read_to_string(path)?),
        _ => Err(CliError::UnsupportedFileFormat),
    }
}

/// Resolve the effective configuration: defaults, then the optional file,
/// then command-line overrides. The result is validated.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: &TunableOverrides,
) -> Result<DetectorConfig, CliError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => DetectorConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Render a configuration as TOML, for writing a starter file
pub fn config_to_toml(config: &DetectorConfig) -> Result<String, CliError> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stalls::Orientation;
    use tempfile::TempDir;

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = config_from_toml(
            r#"
[aisles]
vertical_cluster_gap = 25.0

[stripes]
threshold = 0.5
"#,
        )
        .unwrap();

        assert_eq!(config.aisles.vertical_cluster_gap, 25.0);
        assert_eq!(config.aisles.horizontal_cluster_gap, 14.0);
        assert_eq!(config.aisles.vertical_window_scale, 2.0);
        assert_eq!(config.stripes.threshold, 0.5);
        assert_eq!(config.stripes.kernel_length, 31);
    }

    #[test]
    fn test_load_config_dispatches_on_extension() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("detector.json");
        fs::write(&json_path, r#"{"hough": {"vote_threshold": 60}}"#).unwrap();
        let yaml_path = dir.path().join("detector.yaml");
        fs::write(&yaml_path, "hough: {}").unwrap();

        assert_eq!(load_config(&json_path).unwrap().hough.vote_threshold, 60);
        assert!(matches!(
            load_config(&yaml_path),
            Err(CliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("detector.toml");
        fs::write(&path, "[aisles]\nhorizontal_cluster_gap = 30.0\nvertical_cluster_gap = 30.0\n").unwrap();
        let overrides = TunableOverrides {
            horizontal_cluster_gap: Some(12.0),
            ..Default::default()
        };

        let config = resolve_config(Some(&path), &overrides).unwrap();

        assert_eq!(config.aisle(Orientation::Horizontal).cluster_gap, 12.0);
        assert_eq!(config.aisle(Orientation::Vertical).cluster_gap, 30.0);
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let overrides = TunableOverrides {
            stripe_threshold: Some(1.5),
            ..Default::default()
        };

        assert!(matches!(
            resolve_config(None, &overrides),
            Err(CliError::InvalidConfig(StallError::InvalidParameter(_)))
        ));
    }

    #[test]
    fn test_default_config_survives_toml() {
        let config = DetectorConfig::default();
        let text = config_to_toml(&config).unwrap();
        assert_eq!(config_from_toml(&text).unwrap(), config);
    }
}
