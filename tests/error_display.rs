use std::path::PathBuf;
use std::time::Duration;

use vdiff_lib::{Disposition, ErrorCategory, VdiffError, Viewport};

#[test]
fn config_error_display_includes_message() {
    let err = VdiffError::Config("threshold missing".to_string());

    assert_eq!(format!("{err}"), "Configuration error: threshold missing");
}

#[test]
fn io_error_display_wraps_source() {
    let io_err = std::io::Error::other("disk full");
    let err: VdiffError = io_err.into();
    let rendered = format!("{err}");

    assert!(rendered.starts_with("IO error: "));
    assert!(rendered.contains("disk full"));
    assert_eq!(err.disposition(), Disposition::Fail);
}

#[test]
fn remote_helper_includes_status_and_message() {
    let err = VdiffError::remote(Some(404), "Not found");

    assert_eq!(
        format!("{err}"),
        "Design service unavailable (status: Some(404)): Not found"
    );
    assert_eq!(err.disposition(), Disposition::Skip);
}

#[test]
fn remote_helper_handles_missing_status() {
    let err = VdiffError::remote(None, "connection reset");

    assert_eq!(
        format!("{err}"),
        "Design service unavailable (status: None): connection reset"
    );
}

#[test]
fn timeout_names_the_operation() {
    let err = VdiffError::Timeout {
        operation: "export lookup",
        after: Duration::from_secs(30),
    };

    let rendered = format!("{err}");
    assert!(rendered.contains("export lookup"), "got: {rendered}");
    assert!(rendered.contains("30s"), "got: {rendered}");
    assert_eq!(err.to_payload().category, ErrorCategory::Remote);
}

#[test]
fn dimension_mismatch_lists_both_sizes() {
    let err = VdiffError::DimensionMismatch {
        expected: Viewport::new(1440, 900),
        actual: Viewport::new(1440, 2400),
    };

    let rendered = format!("{err}");
    assert!(rendered.contains("1440x900 vs 1440x2400"), "got: {rendered}");
    assert_eq!(err.disposition(), Disposition::Fail);
}

#[test]
fn regression_payload_serializes_for_machines() {
    let err = VdiffError::RegressionDetected {
        diff_ratio: 0.0312,
        threshold: 0.01,
        diff_pixel_count: 312,
        diff_image_path: Some(PathBuf::from("artifacts/diff/home.png")),
    };

    let payload = serde_json::to_value(err.to_payload()).expect("serialize payload");
    assert_eq!(payload["category"], "regression");
    assert!(payload["message"]
        .as_str()
        .unwrap_or_default()
        .contains("0.031200"));
    assert!(payload["remediation"]
        .as_str()
        .unwrap_or_default()
        .contains("artifacts/diff/home.png"));
}
