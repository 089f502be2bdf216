use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::RasterError;
use crate::Viewport;

#[derive(Debug, Error)]
pub enum VdiffError {
    #[error("Design link could not be parsed: {0}")]
    LinkParse(String),

    #[error("Design service unavailable (status: {status:?}): {message}")]
    RemoteUnavailable {
        status: Option<u16>,
        message: String,
    },

    #[error("Design service token missing")]
    MissingToken,

    #[error("Timed out after {after:?} during {operation}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Image size mismatch: {expected} vs {actual}. Ensure the capture viewport matches the design frame size.")]
    DimensionMismatch { expected: Viewport, actual: Viewport },

    #[error("Visual regression detected: diff ratio {diff_ratio:.6} exceeds threshold {threshold:.6} ({diff_pixel_count} pixels differ)")]
    RegressionDetected {
        diff_ratio: f64,
        threshold: f64,
        diff_pixel_count: u64,
        diff_image_path: Option<PathBuf>,
    },

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Screenshot capture failed: {0}")]
    Capture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// How a failure should be reported by the surrounding test harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// The comparison could not run; mark the check as skipped.
    Skip,
    /// The comparison ran (or its inputs were corrupt); mark the check as failed.
    Fail,
}

impl VdiffError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        VdiffError::RemoteUnavailable {
            status,
            message: message.into(),
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            VdiffError::LinkParse(_)
            | VdiffError::RemoteUnavailable { .. }
            | VdiffError::MissingToken
            | VdiffError::Timeout { .. } => Disposition::Skip,
            _ => Disposition::Fail,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            VdiffError::LinkParse(_) => ErrorPayload::new(
                ErrorCategory::Link,
                self.to_string(),
                "Use a share link like https://www.figma.com/design/<KEY>/<Name>?node-id=1-2.",
            ),
            VdiffError::RemoteUnavailable { status, .. } => {
                let remediation = match status {
                    Some(401) | Some(403) => "Check FIGMA_TOKEN (or FIGMA_OAUTH_TOKEN) and file access rights.",
                    Some(404) => "Verify the document key and node-id still exist.",
                    Some(429) => "Rate limited by the design service; retry after waiting.",
                    _ => "Check connectivity/proxy/VPN and retry.",
                };
                ErrorPayload::new(ErrorCategory::Remote, self.to_string(), remediation)
            }
            VdiffError::MissingToken => ErrorPayload::new(
                ErrorCategory::Remote,
                self.to_string(),
                "Set FIGMA_TOKEN (or FIGMA_OAUTH_TOKEN) before comparing against designs.",
            ),
            VdiffError::Timeout { .. } => ErrorPayload::new(
                ErrorCategory::Remote,
                self.to_string(),
                "Increase the timeouts in the config file or check the design service status.",
            ),
            VdiffError::DimensionMismatch { .. } => ErrorPayload::new(
                ErrorCategory::Geometry,
                self.to_string(),
                "Set the capture viewport to the resolved design dimensions before taking the screenshot.",
            ),
            VdiffError::RegressionDetected { diff_image_path, .. } => {
                let remediation = match diff_image_path {
                    Some(path) => format!("Inspect the diff image at {}.", path.display()),
                    None => "Re-run with diff images enabled to inspect the changed pixels.".to_string(),
                };
                ErrorPayload::new(ErrorCategory::Regression, self.to_string(), remediation)
            }
            VdiffError::Decode(_) => ErrorPayload::new(
                ErrorCategory::Image,
                self.to_string(),
                "Verify the screenshot/baseline is a complete PNG; the capture or download may be corrupt.",
            ),
            VdiffError::Capture(_) => ErrorPayload::new(
                ErrorCategory::Image,
                self.to_string(),
                "Check the capture harness output path and browser logs.",
            ),
            VdiffError::Io(_) => ErrorPayload::new(
                ErrorCategory::Config,
                self.to_string(),
                "Check file paths/permissions.",
            ),
            VdiffError::Serialization(_) => ErrorPayload::new(
                ErrorCategory::Config,
                self.to_string(),
                "Check JSON inputs; run with --verbose for details.",
            ),
            VdiffError::Config(_) => ErrorPayload::new(
                ErrorCategory::Config,
                self.to_string(),
                "Check flags and the config file (threshold must be within 0..=1).",
            ),
        }
    }
}

impl From<RasterError> for VdiffError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::Io(e) => VdiffError::Io(e),
            other => VdiffError::Decode(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for VdiffError {
    fn from(err: reqwest::Error) -> Self {
        VdiffError::remote(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VdiffError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Link,
    Remote,
    Geometry,
    Regression,
    Image,
    Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
