use std::path::{Path, PathBuf};
use std::process::ExitCode;

use vdiff_lib::{
    compare, raster, CompareOptions, ComparisonReport, PageInfo, Result, RunStatus,
};

use super::GlobalArgs;
use crate::formatting::{finish, render_error, CliOutput};
use crate::settings::{resolve_engine_config, EngineOverrides};

/// Run the diff command.
pub async fn run_diff(
    globals: &GlobalArgs,
    baseline: PathBuf,
    actual: PathBuf,
    threshold: Option<f64>,
    diff_out: Option<PathBuf>,
) -> ExitCode {
    match diff(globals, baseline, actual, threshold, diff_out).await {
        Ok(report) => {
            let status = if report.passed {
                RunStatus::Passed
            } else {
                RunStatus::Regressed
            };
            finish(
                &CliOutput::Diff(report),
                status,
                globals.format,
                globals.output.as_deref(),
            )
        }
        Err(err) => render_error(err, globals.format, globals.output.as_deref()),
    }
}

async fn diff(
    globals: &GlobalArgs,
    baseline: PathBuf,
    actual: PathBuf,
    threshold: Option<f64>,
    diff_out: Option<PathBuf>,
) -> Result<ComparisonReport> {
    let overrides = EngineOverrides {
        threshold,
        ..EngineOverrides::default()
    };
    let config = resolve_engine_config(globals.config.as_deref(), &overrides)?;

    let expected = raster::read_png(&baseline).await?;
    let captured = raster::read_png(&actual).await?;
    let options = CompareOptions::new(config.threshold).with_diff_image(diff_out.is_some());
    let result = compare(&expected, &captured, &options)?;

    if let (Some(path), Some(image)) = (&diff_out, &result.diff_image) {
        raster::write_png(path, image).await?;
    }

    Ok(ComparisonReport::new(page_for(&actual), None, &result)
        .with_baseline_path(Some(baseline))
        .with_diff_image_path(diff_out))
}

/// Files compared directly have no page identity; name them after the capture.
fn page_for(actual: &Path) -> PageInfo {
    let stem = actual
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "actual".to_string());
    PageInfo::new(stem.clone(), stem, actual.display().to_string())
}
