//! Planner configuration
//!
//! One [`Config`] holds every tunable of the pipeline, grouped by stage.
//! Files are JSON or TOML, chosen by extension; missing sections and keys
//! fall back to their defaults.

use crate::error::{SettingsError, SettingsResult};
use pastekit_gerber::{FiducialScoring, FiducialSelector, GerberResult, PadCombiner};
use pastekit_motion::{AxisLimits, GcodeEmitter, GcodeOptions, SafePathConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fiducial screening during extraction (mm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub fiducial_min_diameter: f64,
    pub fiducial_max_diameter: f64,
    pub preferred_min_diameter: f64,
    pub preferred_max_diameter: f64,
    pub dedup_distance: f64,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        let scoring = FiducialScoring::default();
        Self {
            fiducial_min_diameter: scoring.min_diameter,
            fiducial_max_diameter: scoring.max_diameter,
            preferred_min_diameter: scoring.preferred_min_diameter,
            preferred_max_diameter: scoring.preferred_max_diameter,
            dedup_distance: scoring.dedup_distance,
        }
    }
}

impl ExtractionSettings {
    pub fn scoring(&self) -> FiducialScoring {
        FiducialScoring {
            min_diameter: self.fiducial_min_diameter,
            max_diameter: self.fiducial_max_diameter,
            preferred_min_diameter: self.preferred_min_diameter,
            preferred_max_diameter: self.preferred_max_diameter,
            dedup_distance: self.dedup_distance,
        }
    }
}

/// Pad combiner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineSettings {
    /// Maximum structural-to-paste pad distance for a match (mm)
    pub match_threshold: f64,
}

impl Default for CombineSettings {
    fn default() -> Self {
        Self {
            match_threshold: pastekit_gerber::DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl CombineSettings {
    pub fn combiner(&self) -> GerberResult<PadCombiner> {
        PadCombiner::new(self.match_threshold)
    }
}

/// Fiducial merge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiducialSettings {
    pub merge_distance: f64,
    pub max_count: usize,
}

impl Default for FiducialSettings {
    fn default() -> Self {
        Self {
            merge_distance: 0.5,
            max_count: 6,
        }
    }
}

impl FiducialSettings {
    pub fn selector(&self) -> GerberResult<FiducialSelector> {
        FiducialSelector::new(self.merge_distance, self.max_count)
    }
}

/// Sequencer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SequencerSettings {
    /// Use collision-aware ordering
    pub safe_path: bool,
    #[serde(flatten)]
    pub heights: SafePathConfig,
}

/// Machine kinematics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    #[serde(flatten)]
    pub limits: AxisLimits,
    /// Profile sampling interval (s)
    pub time_step: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            limits: AxisLimits::default(),
            time_step: 0.01,
        }
    }
}

/// G-code output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GcodeSettings {
    #[serde(flatten)]
    pub options: GcodeOptions,
}

/// Complete planner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub extraction: ExtractionSettings,
    pub combine: CombineSettings,
    pub fiducials: FiducialSettings,
    pub sequencer: SequencerSettings,
    pub machine: MachineSettings,
    pub gcode: GcodeSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(SettingsError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

fn positive(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::invalid(key, format!("must be > 0, got {}", value)))
    }
}

fn non_negative(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::invalid(key, format!("must be >= 0, got {}", value)))
    }
}

impl Config {
    /// `<config dir>/pastekit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| SettingsError::ConfigDirectory("no config or home directory".to_string()))?;
        path.push("pastekit");
        path.push("config.toml");
        Ok(path)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` when it exists, otherwise defaults
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let e = &self.extraction;
        positive("extraction.fiducial_min_diameter", e.fiducial_min_diameter)?;
        positive("extraction.fiducial_max_diameter", e.fiducial_max_diameter)?;
        if e.fiducial_min_diameter > e.fiducial_max_diameter {
            return Err(SettingsError::invalid(
                "extraction.fiducial_min_diameter",
                "must not exceed fiducial_max_diameter",
            ));
        }
        if e.preferred_min_diameter > e.preferred_max_diameter {
            return Err(SettingsError::invalid(
                "extraction.preferred_min_diameter",
                "must not exceed preferred_max_diameter",
            ));
        }
        non_negative("extraction.dedup_distance", e.dedup_distance)?;

        positive("combine.match_threshold", self.combine.match_threshold)?;
        non_negative("fiducials.merge_distance", self.fiducials.merge_distance)?;

        let h = &self.sequencer.heights;
        positive("sequencer.clearance_height", h.clearance_height)?;
        positive("sequencer.safe_height", h.safe_height)?;
        positive("sequencer.sample_step", h.sample_step)?;
        positive("sequencer.obstacle_radius", h.obstacle_radius)?;
        non_negative("sequencer.dispense_height", h.dispense_height)?;
        non_negative("sequencer.obstacle_margin", h.obstacle_margin)?;
        if h.dispense_height >= h.clearance_height {
            return Err(SettingsError::invalid(
                "sequencer.dispense_height",
                "must be below clearance_height",
            ));
        }

        let l = &self.machine.limits;
        for (key, value) in [
            ("machine.vx", l.vx),
            ("machine.vy", l.vy),
            ("machine.vz", l.vz),
            ("machine.ax", l.ax),
            ("machine.ay", l.ay),
            ("machine.az", l.az),
            ("machine.time_step", self.machine.time_step),
        ] {
            positive(key, value)?;
        }

        non_negative("gcode.min_feed", self.gcode.options.min_feed)?;
        Ok(())
    }

    /// G-code emitter configured from the machine, sequencer and gcode sections
    pub fn emitter(&self) -> GcodeEmitter {
        GcodeEmitter::new(
            self.gcode.options,
            self.machine.limits,
            self.sequencer.heights,
            self.machine.time_step,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.combine.match_threshold, 0.5);
        assert_eq!(config.fiducials.max_count, 6);
        assert_eq!(config.sequencer.heights.clearance_height, 3.0);
        assert!(!config.sequencer.safe_path);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            "[combine]\nmatch_threshold = 0.25\n\n[machine]\nvx = 80.0\n\n[sequencer]\nsafe_path = true\nsafe_height = 15.0\n",
        )
        .unwrap();
        assert_eq!(config.combine.match_threshold, 0.25);
        assert_eq!(config.machine.limits.vx, 80.0);
        assert_eq!(config.machine.limits.vy, AxisLimits::default().vy);
        assert!(config.sequencer.safe_path);
        assert_eq!(config.sequencer.heights.safe_height, 15.0);
        assert_eq!(config.sequencer.heights.dispense_height, 0.1);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.combine.match_threshold = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));

        let mut config = Config::default();
        config.sequencer.heights.dispense_height = 5.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.extraction.fiducial_min_diameter = 6.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_stage_conversions() {
        let config = Config::default();
        assert_eq!(config.extraction.scoring(), FiducialScoring::default());
        assert_eq!(config.combine.combiner().unwrap().threshold(), 0.5);
        assert!(config.fiducials.selector().is_ok());
        assert_eq!(config.emitter().limits, AxisLimits::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = Config::default().save_to_file(Path::new("config.yaml"));
        assert!(matches!(result, Err(SettingsError::UnsupportedFormat(_))));
    }
}
