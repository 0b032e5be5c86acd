use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MachineError, Result};

/// Largest accepted upload: 5 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Tunables of the preview machine.
///
/// Every field is optional in JSON; missing fields take their defaults.
///
/// # Example
/// ```
/// use machine::MachineConfig;
///
/// let config = MachineConfig::from_json_str(r#"{"tick_interval_ms": 16}"#)
///     .expect("valid config");
/// assert_eq!(config.tick_interval_ms, 16);
/// assert_eq!(config.max_file_size, 5 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub max_file_size: u64,
    pub accepted_extensions: Vec<String>,
    pub tick_interval_ms: u64,
    pub speed_presets: Vec<f64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            accepted_extensions: vec![String::from("lottie"), String::from("json")],
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            speed_presets: vec![0.5, 1.0, 1.5, 2.0],
        }
    }
}

impl MachineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| MachineError::FileIo {
            context: "read machine config",
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Cadence of the progress tracker. Never zero.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Size limit expressed in whole megabytes, as shown to the user.
    pub fn max_file_size_mb(&self) -> u64 {
        self.max_file_size / BYTES_PER_MB
    }

    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.accepted_extensions
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(extension))
    }

    pub fn is_speed_preset(&self, speed: f64) -> bool {
        self.speed_presets
            .iter()
            .any(|preset| (preset - speed).abs() < f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::MachineConfig;

    #[test]
    fn default_limit_is_five_megabytes() {
        let config = MachineConfig::default();

        assert_eq!(config.max_file_size, 5_242_880);
        assert_eq!(config.max_file_size_mb(), 5);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn extensions_match_case_insensitively() {
        let config = MachineConfig::default();

        assert!(config.accepts_extension("LOTTIE"));
        assert!(config.accepts_extension("json"));
        assert!(!config.accepts_extension("txt"));
    }

    #[test]
    fn zero_tick_interval_is_raised_to_one_millisecond() {
        let config = MachineConfig::from_json_str(r#"{"tick_interval_ms":0}"#)
            .expect("config should parse");

        assert_eq!(config.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn unknown_json_shape_is_a_config_error() {
        let error = MachineConfig::from_json_str(r#"{"speed_presets":"fast"}"#)
            .expect_err("presets must be a list");

        assert!(error.to_string().starts_with("invalid machine config"));
    }

    #[test]
    fn speed_presets_contain_common_multipliers() {
        let config = MachineConfig::default();

        assert!(config.is_speed_preset(1.5));
        assert!(!config.is_speed_preset(3.0));
    }
}
