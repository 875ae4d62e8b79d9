//! Race configuration: gates, detection thresholds, and display/announcement
//! toggles, loaded from a YAML document on disk.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::gate::DetectionParams;

/// Top-level configuration loaded from `--config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub frames_per_sec: f64,
    #[serde(default)]
    pub propeller_mask: PropellerMaskConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    pub gates: Vec<GateConfig>,
    #[serde(default)]
    pub announcements: AnnouncementsConfig,
    #[serde(default)]
    pub windows: WindowsConfig,
}

/// Dimensions of the two propeller-occlusion triangles painted over the
/// bottom corners of each segmented frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PropellerMaskConfig {
    #[serde(default = "default_propeller_width")]
    pub width: i32,
    #[serde(default = "default_propeller_height")]
    pub height: i32,
}

impl Default for PropellerMaskConfig {
    fn default() -> Self {
        Self {
            width: default_propeller_width(),
            height: default_propeller_height(),
        }
    }
}

fn default_propeller_width() -> i32 {
    60
}

fn default_propeller_height() -> i32 {
    60
}

/// Global segmentation parameters shared across gates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_erode")]
    pub erode: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            erode: default_erode(),
        }
    }
}

fn default_erode() -> u32 {
    4
}

/// Top-level announcement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementsConfig {
    #[serde(default = "default_pilot_name")]
    pub pilot_name: String,
    #[serde(default = "default_true")]
    pub say_laps: bool,
}

impl Default for AnnouncementsConfig {
    fn default() -> Self {
        Self {
            pilot_name: default_pilot_name(),
            say_laps: default_true(),
        }
    }
}

fn default_pilot_name() -> String {
    "pilot".to_string()
}

fn default_true() -> bool {
    true
}

/// Toggles for the optional debug windows (DVR playback, detection mask,
/// live plot). Out of core scope; carried through so the driver can decide
/// whether to construct the corresponding sinks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowsConfig {
    #[serde(default)]
    pub show_dvr: bool,
    #[serde(default)]
    pub show_detection: bool,
    #[serde(default)]
    pub show_plot: bool,
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            show_dvr: false,
            show_detection: false,
            show_plot: false,
        }
    }
}

/// HSV hue/saturation/value bounds identifying a gate's marker color.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GateColorConfig {
    pub lower_bound_hsv: (i32, i32, i32),
    pub upper_bound_hsv: (i32, i32, i32),
}

/// Per-gate detection thresholds. Mirrors [`DetectionParams`] field for
/// field; kept as a separate type so the YAML schema is independent of the
/// in-memory representation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GateDetectionConfig {
    #[serde(default = "default_lag_frames")]
    pub lag_frames: u64,
    #[serde(default = "default_min_frames_between_peaks")]
    pub min_frames_between_peaks: u64,
    #[serde(default = "default_min_active_value")]
    pub min_active_value: f64,
    #[serde(default = "default_min_active_frames")]
    pub min_active_frames: u32,
    #[serde(default = "default_min_inactive_frames")]
    pub min_inactive_frames: u32,
}

impl From<GateDetectionConfig> for DetectionParams {
    fn from(c: GateDetectionConfig) -> Self {
        DetectionParams {
            lag_frames: c.lag_frames,
            min_frames_between_peaks: c.min_frames_between_peaks,
            min_active_value: c.min_active_value,
            min_active_frames: c.min_active_frames,
            min_inactive_frames: c.min_inactive_frames,
        }
    }
}

impl Default for GateDetectionConfig {
    fn default() -> Self {
        Self {
            lag_frames: default_lag_frames(),
            min_frames_between_peaks: default_min_frames_between_peaks(),
            min_active_value: default_min_active_value(),
            min_active_frames: default_min_active_frames(),
            min_inactive_frames: default_min_inactive_frames(),
        }
    }
}

fn default_lag_frames() -> u64 {
    5
}

fn default_min_frames_between_peaks() -> u64 {
    10
}

fn default_min_active_value() -> f64 {
    50.0
}

fn default_min_active_frames() -> u32 {
    2
}

fn default_min_inactive_frames() -> u32 {
    3
}

/// Per-gate announcement toggles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GateAnnouncementsConfig {
    #[serde(default)]
    pub say_transitions: bool,
}

impl Default for GateAnnouncementsConfig {
    fn default() -> Self {
        Self {
            say_transitions: false,
        }
    }
}

/// One gate's full configuration, in the order gates are declared in the
/// file — declaration order is race position order, with position 0 the
/// start gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    pub name: String,
    pub color: GateColorConfig,
    #[serde(default)]
    pub detection: GateDetectionConfig,
    #[serde(default)]
    pub announcements: GateAnnouncementsConfig,
}

impl Config {
    /// Load and validate a configuration from a YAML file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_yaml::from_str(&raw).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic validation beyond what the YAML schema can express.
    pub fn validate(&self) -> Result<()> {
        if self.gates.is_empty() {
            return Err(Error::ConfigInvalid(
                "at least one gate must be configured".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for gate in &self.gates {
            if !seen.insert(gate.name.as_str()) {
                return Err(Error::ConfigInvalid(format!(
                    "duplicate gate name {:?}",
                    gate.name
                )));
            }

            let (ll, la, lv) = gate.color.lower_bound_hsv;
            let (ul, ua, uv) = gate.color.upper_bound_hsv;
            if ll > ul || la > ua || lv > uv {
                return Err(Error::ConfigInvalid(format!(
                    "gate {:?}: lower_bound_hsv must be <= upper_bound_hsv per channel",
                    gate.name
                )));
            }

            if gate.detection.min_active_value < 0.0 {
                return Err(Error::ConfigInvalid(format!(
                    "gate {:?}: min_active_value must be non-negative",
                    gate.name
                )));
            }
        }

        if self.detection.erode == 0 {
            return Err(Error::ConfigInvalid(
                "detection.erode must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
frames_per_sec: 30.0
detection:
  erode: 4
gates:
  - name: start
    color:
      lower_bound_hsv: [20, 100, 100]
      upper_bound_hsv: [30, 255, 255]
    detection:
      lag_frames: 5
      min_frames_between_peaks: 10
      min_active_value: 50.0
      min_active_frames: 2
      min_inactive_frames: 3
  - name: gate2
    color:
      lower_bound_hsv: [100, 100, 100]
      upper_bound_hsv: [120, 255, 255]
announcements:
  pilot_name: "jane"
  say_laps: true
"#
    }

    #[test]
    fn loads_well_formed_yaml_with_defaults_filled_in() {
        let config: Config = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.gates.len(), 2);
        assert_eq!(config.gates[1].detection.lag_frames, 5);
        assert_eq!(config.announcements.pilot_name, "jane");
        config.validate().unwrap();
    }

    #[test]
    fn rejects_empty_gate_list() {
        let config = Config {
            frames_per_sec: 30.0,
            propeller_mask: PropellerMaskConfig::default(),
            detection: DetectionConfig::default(),
            gates: vec![],
            announcements: AnnouncementsConfig::default(),
            windows: WindowsConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_gate_names() {
        let mut config: Config = serde_yaml::from_str(sample_yaml()).unwrap();
        config.gates[1].name = "start".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_hsv_bounds() {
        let mut config: Config = serde_yaml::from_str(sample_yaml()).unwrap();
        config.gates[0].color.upper_bound_hsv = (10, 255, 255);
        assert!(config.validate().is_err());
    }
}
