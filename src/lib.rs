//! Visual Diff Engine Library
//!
//! Compares a live page screenshot against a design-service export of the
//! same frame and decides whether the page has visually regressed.
//!
//! # Module Overview
//!
//! - [`figma`] - share-link parsing and design export resolution
//! - [`raster`] - PNG decode/encode into RGBA buffers
//! - [`pixel`] - perceptual pixel comparator and diff image rendering
//! - [`engine`] - staged orchestration of one comparison run
//! - [`report`] - comparison report schema and persistence
//! - [`config`] - engine configuration file support
//! - [`http`] - HTTP seam used for remote calls
//!
//! # Example
//!
//! ```no_run
//! use vdiff_lib::{Engine, EngineConfig, FigmaAuth, FileScreenshot, PageInfo, ReqwestHttp};
//!
//! # async fn example() -> vdiff_lib::Result<()> {
//! let engine = Engine::new(ReqwestHttp::new()?, FigmaAuth::from_env(), EngineConfig::default())?;
//! let page = PageInfo::new("home", "Home", "https://example.com/");
//! let outcome = engine
//!     .run_design_comparison(
//!         &page,
//!         "https://www.figma.com/design/KEY/Home?node-id=1-2",
//!         &FileScreenshot::new("screenshots/home.png"),
//!     )
//!     .await;
//! println!("{:?}", outcome.status());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod figma;
pub mod http;
pub mod pixel;
pub mod raster;
pub mod report;
pub mod viewport;

#[cfg(test)]
mod test_support;

pub use config::{DiffImagePolicy, EngineConfig, Timeouts};
pub use engine::{
    Engine, FileScreenshot, OutcomeSummary, RunOutcome, RunState, RunStatus, ScreenshotSource,
    Stage,
};
pub use error::{Disposition, ErrorCategory, ErrorPayload, Result, VdiffError};
pub use figma::{parse_share_link, DesignExport, DesignReference, FigmaAuth, ReferenceResolver};
pub use http::{HttpClient, HttpResponse, ReqwestHttp};
pub use pixel::{compare, CompareOptions, ComparisonResult};
pub use raster::RasterImage;
pub use report::{ComparisonReport, PageInfo, REPORT_VERSION};
pub use viewport::Viewport;
