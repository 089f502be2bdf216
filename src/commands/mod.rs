mod compare;
mod diff;
mod resolve;

use std::path::PathBuf;

use vdiff_lib::{Engine, EngineConfig, FigmaAuth, ReqwestHttp, Result};

use crate::cli::OutputFormat;

pub use compare::{run_compare, CompareArgs};
pub use diff::run_diff;
pub use resolve::run_resolve;

/// Flags shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

/// Engine backed by the real HTTP client and the token from the environment.
fn build_engine(config: EngineConfig) -> Result<Engine<ReqwestHttp>> {
    let http = ReqwestHttp::with_timeout(config.timeouts.request.max(config.timeouts.download))?;
    Engine::new(http, FigmaAuth::from_env(), config)
}
