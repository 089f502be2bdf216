//! Comparison orchestrator.
//!
//! A design comparison walks a fixed sequence of stages:
//!
//! ```text
//! Idle -> LinkParsed -> DimensionsResolved -> ExportResolved
//!      -> BaselineDownloaded -> CaptureReady -> Compared -> Done
//! ```
//!
//! Any step may fail, which ends the run in [`RunState::Failed`] at the last
//! stage reached. Nothing is retried here; retry policy belongs to the
//! harness driving the engine. Runs share no mutable state, so callers may
//! drive many pages concurrently as long as page ids are unique.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn, Instrument};
use url::form_urlencoded;

use crate::config::EngineConfig;
use crate::error::{Disposition, ErrorPayload, Result, VdiffError};
use crate::figma::{parse_share_link, FigmaAuth, ReferenceResolver};
use crate::http::{with_deadline, HttpClient};
use crate::pixel::{self, CompareOptions};
use crate::raster;
use crate::report::{ComparisonReport, PageInfo};
use crate::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Idle,
    LinkParsed,
    DimensionsResolved,
    ExportResolved,
    BaselineDownloaded,
    CaptureReady,
    Compared,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "kebab-case")]
pub enum RunState {
    Reached(Stage),
    Failed(Stage),
}

impl RunState {
    pub fn stage(&self) -> Stage {
        match self {
            RunState::Reached(stage) | RunState::Failed(stage) => *stage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Passed,
    Regressed,
    Skipped,
    Failed,
}

impl RunStatus {
    /// Status of a run that ended with `err`.
    pub fn for_error(err: &VdiffError) -> Self {
        match err {
            VdiffError::RegressionDetected { .. } => RunStatus::Regressed,
            err if err.disposition() == Disposition::Skip => RunStatus::Skipped,
            _ => RunStatus::Failed,
        }
    }
}

/// Produces the live screenshot once the capture viewport is known.
///
/// Implementations own navigation, readiness and stabilization; the engine
/// only consumes the PNG bytes.
#[async_trait]
pub trait ScreenshotSource: Send + Sync {
    async fn capture(&self, page: &PageInfo, viewport: Viewport) -> Result<Vec<u8>>;
}

/// A screenshot already captured to disk by an external harness.
#[derive(Debug, Clone)]
pub struct FileScreenshot {
    path: PathBuf,
}

impl FileScreenshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScreenshotSource for FileScreenshot {
    async fn capture(&self, _page: &PageInfo, viewport: Viewport) -> Result<Vec<u8>> {
        debug!(path = %self.path.display(), %viewport, "reading pre-captured screenshot");
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| VdiffError::Capture(format!("{}: {e}", self.path.display())))
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub page: PageInfo,
    pub state: RunState,
    pub report: Option<ComparisonReport>,
    pub error: Option<VdiffError>,
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        self.error
            .as_ref()
            .map_or(RunStatus::Passed, RunStatus::for_error)
    }

    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            status: self.status(),
            state: self.state,
            page: self.page.clone(),
            report: self.report.clone(),
            error: self.error.as_ref().map(VdiffError::to_payload),
        }
    }

    /// The report of a passing run, or the error that ended it.
    pub fn into_result(self) -> Result<ComparisonReport> {
        match (self.error, self.report) {
            (Some(err), _) => Err(err),
            (None, Some(report)) => Ok(report),
            (None, None) => Err(VdiffError::Config(format!(
                "run for {} finished without a report",
                self.page.id
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeSummary {
    pub status: RunStatus,
    pub state: RunState,
    pub page: PageInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ComparisonReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

struct StageTracker {
    stage: Stage,
}

impl StageTracker {
    fn new() -> Self {
        Self { stage: Stage::Idle }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "stages only move forward");
        debug!(from = ?self.stage, to = ?next, "stage transition");
        self.stage = next;
    }
}

/// Everything needed to compare one capture against one baseline.
struct ComparisonInputs<'a> {
    page: &'a PageInfo,
    design_link: Option<&'a str>,
    baseline_path: Option<PathBuf>,
    baseline: &'a [u8],
    screenshot: &'a [u8],
}

#[derive(Debug)]
pub struct Engine<H> {
    resolver: ReferenceResolver<H>,
    config: EngineConfig,
}

impl<H: HttpClient> Engine<H> {
    pub fn new(http: H, auth: Option<FigmaAuth>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let resolver = ReferenceResolver::with_base_url(http, auth, &config.api_base)?
            .with_timeouts(&config.timeouts);
        Ok(Self { resolver, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ReferenceResolver<H> {
        &self.resolver
    }

    /// Resolve `design_link`, capture the page at the design's size and
    /// compare the two.
    pub async fn run_design_comparison(
        &self,
        page: &PageInfo,
        design_link: &str,
        capture: &dyn ScreenshotSource,
    ) -> RunOutcome {
        let span = tracing::info_span!("design_comparison", page = %page.id);
        async {
            let mut tracker = StageTracker::new();
            let result = self
                .design_steps(page, design_link, capture, &mut tracker)
                .await;
            self.finish(page, tracker, result)
        }
        .instrument(span)
        .await
    }

    /// Compare a capture against a stored baseline image.
    pub async fn compare_images(
        &self,
        page: &PageInfo,
        baseline: &[u8],
        screenshot: &[u8],
    ) -> RunOutcome {
        let span = tracing::info_span!("baseline_comparison", page = %page.id);
        async {
            let mut tracker = StageTracker::new();
            tracker.advance(Stage::BaselineDownloaded);
            tracker.advance(Stage::CaptureReady);
            let inputs = ComparisonInputs {
                page,
                design_link: None,
                baseline_path: None,
                baseline,
                screenshot,
            };
            let result = self.compare_steps(inputs, &mut tracker).await;
            self.finish(page, tracker, result)
        }
        .instrument(span)
        .await
    }

    async fn design_steps(
        &self,
        page: &PageInfo,
        design_link: &str,
        capture: &dyn ScreenshotSource,
        tracker: &mut StageTracker,
    ) -> Result<ComparisonReport> {
        let reference = parse_share_link(design_link)
            .ok_or_else(|| VdiffError::LinkParse(design_link.to_string()))?;
        tracker.advance(Stage::LinkParsed);

        let dimensions = self.resolver.fetch_dimensions(&reference).await?;
        tracker.advance(Stage::DimensionsResolved);

        let image_url = self
            .resolver
            .fetch_export_url(&reference, self.config.export_scale)
            .await?;
        tracker.advance(Stage::ExportResolved);

        let baseline_path = self.artifact_path("baseline", &page.id, "png");
        let baseline = self.resolver.download(&image_url, &baseline_path).await?;
        tracker.advance(Stage::BaselineDownloaded);

        let screenshot = with_deadline(
            "screenshot capture",
            self.config.timeouts.capture,
            capture.capture(page, dimensions),
        )
        .await?;
        tracker.advance(Stage::CaptureReady);

        let inputs = ComparisonInputs {
            page,
            design_link: Some(design_link),
            baseline_path: Some(baseline_path),
            baseline: &baseline,
            screenshot: &screenshot,
        };
        self.compare_steps(inputs, tracker).await
    }

    async fn compare_steps(
        &self,
        inputs: ComparisonInputs<'_>,
        tracker: &mut StageTracker,
    ) -> Result<ComparisonReport> {
        let baseline = raster::decode(inputs.baseline)?;
        let screenshot = raster::decode(inputs.screenshot)?;

        let policy = self.config.diff_image;
        let options =
            CompareOptions::new(self.config.threshold).with_diff_image(policy.wants_render());
        let result = pixel::compare(&baseline, &screenshot, &options)?;
        tracker.advance(Stage::Compared);

        let mut diff_image_path = None;
        if policy.should_write(result.passed) {
            if let Some(diff) = &result.diff_image {
                let path = self.artifact_path("diff", &inputs.page.id, "png");
                raster::write_png(&path, diff).await?;
                diff_image_path = Some(path);
            }
        }

        let report = ComparisonReport::new(
            inputs.page.clone(),
            inputs.design_link.map(str::to_owned),
            &result,
        )
        .with_baseline_path(inputs.baseline_path)
        .with_diff_image_path(diff_image_path);
        report
            .write_json(&self.artifact_path("reports", &inputs.page.id, "json"))
            .await?;
        tracker.advance(Stage::Done);

        Ok(report)
    }

    fn finish(
        &self,
        page: &PageInfo,
        tracker: StageTracker,
        result: Result<ComparisonReport>,
    ) -> RunOutcome {
        match result {
            Ok(report) => {
                let error = (!report.passed).then(|| regression(&report));
                info!(
                    passed = report.passed,
                    diff_ratio = report.diff_ratio,
                    threshold = report.threshold,
                    diff_pixels = report.diff_pixel_count,
                    "comparison finished"
                );
                RunOutcome {
                    page: page.clone(),
                    state: RunState::Reached(tracker.stage),
                    report: Some(report),
                    error,
                }
            }
            Err(err) => {
                match err.disposition() {
                    Disposition::Skip => warn!(stage = ?tracker.stage, error = %err, "comparison skipped"),
                    Disposition::Fail => warn!(stage = ?tracker.stage, error = %err, "comparison failed"),
                }
                RunOutcome {
                    page: page.clone(),
                    state: RunState::Failed(tracker.stage),
                    report: None,
                    error: Some(err),
                }
            }
        }
    }

    fn artifact_path(&self, kind: &str, page_id: &str, extension: &str) -> PathBuf {
        artifact_path(&self.config.artifacts_dir, kind, page_id, extension)
    }
}

fn regression(report: &ComparisonReport) -> VdiffError {
    VdiffError::RegressionDetected {
        diff_ratio: report.diff_ratio,
        threshold: report.threshold,
        diff_pixel_count: report.diff_pixel_count,
        diff_image_path: report.diff_image_path.clone(),
    }
}

/// `{root}/{kind}/{page_id}.{extension}`, with the page id percent-encoded
/// into a single file name component.
///
/// Distinct page ids always map to distinct paths. Leading dots are
/// encoded so `.` and `..` stay inside `{root}/{kind}`.
pub fn artifact_path(root: &Path, kind: &str, page_id: &str, extension: &str) -> PathBuf {
    let mut name: String = form_urlencoded::byte_serialize(page_id.as_bytes())
        .collect::<String>()
        .replace('*', "%2A");
    if name.is_empty() {
        // `%20` is never produced for a real id: spaces encode as `+`.
        name.push_str("%20");
    } else if name.starts_with('.') {
        name.replace_range(..1, "%2E");
    }
    root.join(kind).join(format!("{name}.{extension}"))
}
