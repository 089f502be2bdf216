use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pixel::ComparisonResult;
use crate::raster;
use crate::Viewport;

/// Schema version for report payloads.
pub const REPORT_VERSION: &str = "0.1.0";

/// Identity of the page under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Unique per run; used to key artifact file names.
    pub id: String,
    pub name: String,
    pub url: String,
}

impl PageInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub version: String,
    pub page: PageInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_link: Option<String>,
    pub viewport: Viewport,
    pub diff_pixel_count: u64,
    pub antialiased_pixel_count: u64,
    pub total_pixels: u64,
    pub diff_ratio: f64,
    pub threshold: f64,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_image_path: Option<PathBuf>,
}

impl ComparisonReport {
    pub fn new(page: PageInfo, design_link: Option<String>, result: &ComparisonResult) -> Self {
        Self {
            version: REPORT_VERSION.to_string(),
            page,
            design_link,
            viewport: result.dimensions,
            diff_pixel_count: result.diff_pixel_count,
            antialiased_pixel_count: result.antialiased_pixel_count,
            total_pixels: result.total_pixels,
            diff_ratio: result.diff_ratio,
            threshold: result.threshold,
            passed: result.passed,
            baseline_path: None,
            diff_image_path: None,
        }
    }

    pub fn with_baseline_path(mut self, path: Option<PathBuf>) -> Self {
        self.baseline_path = path;
        self
    }

    pub fn with_diff_image_path(mut self, path: Option<PathBuf>) -> Self {
        self.diff_image_path = path;
        self
    }

    /// Serialize as pretty JSON to `path`, creating parent directories.
    pub async fn write_json(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_vec_pretty(self)?;
        raster::write_bytes(path, &body).await?;
        Ok(())
    }
}
