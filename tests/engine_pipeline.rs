use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};
use tempfile::TempDir;
use vdiff_lib::{
    ComparisonReport, Engine, EngineConfig, FigmaAuth, HttpClient, HttpResponse, PageInfo,
    Result, RunState, RunStatus, ScreenshotSource, Stage, VdiffError, Viewport,
};

const LINK: &str = "https://www.figma.com/design/FILE123/Landing?node-id=12-34&t=x";
const EXPORT_URL: &str = "https://exports.example/FILE123-12-34.png";

/// Serves one design node and its export; records every URL requested.
struct DesignService {
    width: f64,
    height: f64,
    export: Vec<u8>,
    seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl DesignService {
    fn new(width: f64, height: f64, export: Vec<u8>) -> Self {
        Self {
            width,
            height,
            export,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for DesignService {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        self.seen
            .lock()
            .unwrap()
            .push((url.to_string(), headers.to_vec()));

        let json = |body: Value| HttpResponse {
            status: 200,
            body: body.to_string().into_bytes(),
        };
        if url.contains("/files/FILE123/nodes") {
            Ok(json(json!({
                "name": "Landing",
                "nodes": { "12:34": { "document": {
                    "id": "12:34",
                    "name": "Hero",
                    "absoluteBoundingBox": {
                        "x": -10.0, "y": 0.0, "width": self.width, "height": self.height
                    }
                } } }
            })))
        } else if url.contains("/images/FILE123") {
            Ok(json(json!({ "err": null, "images": { "12:34": EXPORT_URL } })))
        } else if url == EXPORT_URL {
            Ok(HttpResponse {
                status: 200,
                body: self.export.clone(),
            })
        } else {
            Err(VdiffError::remote(None, format!("unexpected url {url}")))
        }
    }
}

struct StaticCapture {
    png: Vec<u8>,
    requested: Mutex<Option<Viewport>>,
}

#[async_trait]
impl ScreenshotSource for StaticCapture {
    async fn capture(&self, _page: &PageInfo, viewport: Viewport) -> Result<Vec<u8>> {
        *self.requested.lock().unwrap() = Some(viewport);
        Ok(self.png.clone())
    }
}

fn png_with(width: u32, height: u32, paint: impl Fn(u32, u32) -> [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| Rgba(paint(x, y)));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

fn card(x: u32, y: u32) -> [u8; 4] {
    if (20..80).contains(&x) && (10..30).contains(&y) {
        [30, 60, 200, 255]
    } else {
        [250, 250, 250, 255]
    }
}

fn engine(service: &Arc<DesignService>, dir: &TempDir) -> Engine<Arc<DesignService>> {
    let config = EngineConfig {
        artifacts_dir: dir.path().to_path_buf(),
        ..EngineConfig::default()
    };
    Engine::new(
        Arc::clone(service),
        Some(FigmaAuth::PersonalAccessToken("figd_test".into())),
        config,
    )
    .expect("engine")
}

#[tokio::test]
async fn design_comparison_passes_for_faithful_page() {
    let dir = TempDir::new().unwrap();
    // 99.6 x 40.4 rounds to 100 x 40.
    let service = Arc::new(DesignService::new(99.6, 40.4, png_with(100, 40, card)));
    let capture = StaticCapture {
        png: png_with(100, 40, card),
        requested: Mutex::new(None),
    };
    let page = PageInfo::new("landing", "Landing", "https://example.com/");

    let outcome = engine(&service, &dir)
        .run_design_comparison(&page, LINK, &capture)
        .await;

    assert_eq!(outcome.status(), RunStatus::Passed, "{:?}", outcome.error);
    assert_eq!(*capture.requested.lock().unwrap(), Some(Viewport::new(100, 40)));

    let seen = service.seen();
    assert_eq!(seen.len(), 3, "dimensions, export, download");
    assert!(seen[0]
        .1
        .iter()
        .any(|(k, v)| k == "X-Figma-Token" && v == "figd_test"));
    assert!(seen[2].1.is_empty(), "export download is unauthenticated");

    let stored: ComparisonReport = serde_json::from_slice(
        &std::fs::read(dir.path().join("reports/landing.json")).expect("report written"),
    )
    .expect("report parses");
    assert_eq!(stored.viewport, Viewport::new(100, 40));
    assert_eq!(stored.diff_pixel_count, 0);
    assert!(stored.passed);
    assert!(!dir.path().join("diff/landing.png").exists());
}

#[tokio::test]
async fn shifted_card_is_reported_as_regression_with_diff_image() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(DesignService::new(100.0, 40.0, png_with(100, 40, card)));
    let shifted = png_with(100, 40, |x, y| card(x.saturating_sub(6), y));
    let capture = StaticCapture {
        png: shifted,
        requested: Mutex::new(None),
    };
    let page = PageInfo::new("landing", "Landing", "https://example.com/");

    let outcome = engine(&service, &dir)
        .run_design_comparison(&page, LINK, &capture)
        .await;

    assert_eq!(outcome.status(), RunStatus::Regressed);
    assert_eq!(outcome.state, RunState::Reached(Stage::Done));
    let report = outcome.report.as_ref().expect("report");
    // Two 6x20 strips (left edge gained, right edge lost) change colour.
    assert_eq!(report.diff_pixel_count, 240);
    assert_eq!(report.total_pixels, 4000);
    assert!((report.diff_ratio - 0.06).abs() < 1e-12);

    let diff = image::open(dir.path().join("diff/landing.png"))
        .expect("diff image written")
        .to_rgba8();
    assert_eq!(diff.dimensions(), (100, 40));
    assert_eq!(diff.get_pixel(22, 15).0, [255, 0, 0, 255]);
}

#[tokio::test]
async fn unreachable_design_service_skips_without_capturing() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(DesignService::new(100.0, 40.0, Vec::new()));
    let capture = StaticCapture {
        png: png_with(100, 40, card),
        requested: Mutex::new(None),
    };
    let page = PageInfo::new("other", "Other", "https://example.com/other");

    let outcome = engine(&service, &dir)
        .run_design_comparison(
            &page,
            "https://www.figma.com/design/UNKNOWN/Other?node-id=1-1",
            &capture,
        )
        .await;

    assert_eq!(outcome.status(), RunStatus::Skipped);
    assert_eq!(outcome.state, RunState::Failed(Stage::LinkParsed));
    assert!(capture.requested.lock().unwrap().is_none());
    let summary = serde_json::to_value(outcome.summary()).unwrap();
    assert_eq!(summary["status"], "skipped");
    assert_eq!(summary["error"]["category"], "remote");
}

#[tokio::test]
async fn stored_baseline_comparison_needs_no_design_service() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(DesignService::new(0.0, 0.0, Vec::new()));
    let page = PageInfo::new("stored", "Stored", "https://example.com/");

    let outcome = engine(&service, &dir)
        .compare_images(&page, &png_with(50, 20, card), &png_with(50, 20, card))
        .await;

    assert_eq!(outcome.status(), RunStatus::Passed);
    assert!(service.seen().is_empty());
    assert!(dir.path().join("reports/stored.json").exists());
}
