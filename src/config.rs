use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VdiffError};
use crate::figma::{validate_export_scale, DEFAULT_API_BASE};

/// When the engine persists a diff image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffImagePolicy {
    Never,
    #[default]
    OnFailure,
    Always,
}

impl DiffImagePolicy {
    pub fn wants_render(&self) -> bool {
        !matches!(self, DiffImagePolicy::Never)
    }

    pub fn should_write(&self, passed: bool) -> bool {
        match self {
            DiffImagePolicy::Never => false,
            DiffImagePolicy::OnFailure => !passed,
            DiffImagePolicy::Always => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Largest diff ratio that still passes.
    pub threshold: f64,
    pub api_base: String,
    pub export_scale: f32,
    pub artifacts_dir: PathBuf,
    pub diff_image: DiffImagePolicy,
    pub timeouts: Timeouts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    #[serde(with = "humantime_serde")]
    pub request: Duration,
    #[serde(with = "humantime_serde")]
    pub download: Duration,
    #[serde(with = "humantime_serde")]
    pub capture: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            download: Duration::from_secs(60),
            capture: Duration::from_secs(60),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            api_base: DEFAULT_API_BASE.to_string(),
            export_scale: 1.0,
            artifacts_dir: PathBuf::from("artifacts"),
            diff_image: DiffImagePolicy::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| {
            VdiffError::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        let cfg = Self::from_toml(&raw)
            .map_err(|e| VdiffError::Config(format!("invalid config ({}): {e}", path.display())))?;
        Ok(cfg)
    }

    pub fn from_toml(raw: &str) -> std::result::Result<Self, String> {
        let cfg: Self = toml::from_str(raw).map_err(|e| e.to_string())?;
        cfg.validate().map_err(|e| e.to_string())?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)?;
        validate_export_scale(self.export_scale)?;
        for (name, value) in [
            ("request", self.timeouts.request),
            ("download", self.timeouts.download),
            ("capture", self.timeouts.capture),
        ] {
            if value.is_zero() {
                return Err(VdiffError::Config(format!(
                    "timeouts.{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(VdiffError::Config(format!(
            "threshold must be within 0..=1, got {threshold}"
        )));
    }
    Ok(())
}
