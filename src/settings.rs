use std::path::{Path, PathBuf};

use tracing::debug;
use vdiff_lib::{EngineConfig, Result, VdiffError};

/// Values given explicitly on the command line.
#[derive(Debug, Default, Clone)]
pub struct EngineOverrides {
    pub threshold: Option<f64>,
    pub artifacts_dir: Option<PathBuf>,
}

/// Load the config file (or defaults) and apply CLI overrides on top.
pub fn resolve_engine_config(
    path: Option<&Path>,
    overrides: &EngineOverrides,
) -> Result<EngineConfig> {
    let mut config = EngineConfig::load(path)?;
    apply_overrides(&mut config, overrides)?;
    log_effective_config(path, &config);
    Ok(config)
}

pub fn apply_overrides(config: &mut EngineConfig, overrides: &EngineOverrides) -> Result<()> {
    if let Some(threshold) = overrides.threshold {
        config.threshold = threshold;
    }
    if let Some(dir) = &overrides.artifacts_dir {
        config.artifacts_dir = dir.clone();
    }
    config
        .validate()
        .map_err(|e| VdiffError::Config(format!("Invalid flags: {e}")))
}

fn log_effective_config(path: Option<&Path>, config: &EngineConfig) {
    let source = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());
    debug!(
        %source,
        threshold = config.threshold,
        api_base = %config.api_base,
        export_scale = config.export_scale,
        artifacts_dir = %config.artifacts_dir.display(),
        diff_image = ?config.diff_image,
        request_timeout = ?config.timeouts.request,
        download_timeout = ?config.timeouts.download,
        capture_timeout = ?config.timeouts.capture,
        "effective config"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_values_apply_when_flags_absent() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("vdiff.toml");
        std::fs::write(&path, "threshold = 0.2\nartifacts_dir = \"out\"\n").unwrap();

        let cfg = resolve_engine_config(Some(&path), &EngineOverrides::default()).unwrap();
        assert_eq!(cfg.threshold, 0.2);
        assert_eq!(cfg.artifacts_dir, PathBuf::from("out"));
    }

    #[test]
    fn flags_override_config_values() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("vdiff.toml");
        std::fs::write(&path, "threshold = 0.2\n").unwrap();

        let overrides = EngineOverrides {
            threshold: Some(0.05),
            artifacts_dir: Some(PathBuf::from("elsewhere")),
        };
        let cfg = resolve_engine_config(Some(&path), &overrides).unwrap();
        assert_eq!(cfg.threshold, 0.05);
        assert_eq!(cfg.artifacts_dir, PathBuf::from("elsewhere"));
    }

    #[test]
    fn out_of_range_flag_is_a_config_error() {
        let overrides = EngineOverrides {
            threshold: Some(2.0),
            ..EngineOverrides::default()
        };
        let err = resolve_engine_config(None, &overrides).unwrap_err();
        assert!(matches!(err, VdiffError::Config(_)));
        assert!(err.to_string().contains("threshold"), "got: {err}");
    }
}
