use std::path::PathBuf;
use std::process::ExitCode;

use vdiff_lib::{FileScreenshot, PageInfo, Result, RunOutcome};

use super::{build_engine, GlobalArgs};
use crate::formatting::{finish, render_error, CliOutput};
use crate::settings::{resolve_engine_config, EngineOverrides};

/// Arguments of the compare command.
#[derive(Debug)]
pub struct CompareArgs {
    pub page_id: String,
    pub page_name: Option<String>,
    pub page_url: String,
    pub link: String,
    pub screenshot: PathBuf,
    pub threshold: Option<f64>,
    pub artifacts_dir: Option<PathBuf>,
}

/// Run the compare command.
pub async fn run_compare(globals: &GlobalArgs, args: CompareArgs) -> ExitCode {
    match compare(globals, args).await {
        Ok(outcome) => finish(
            &CliOutput::Compare(outcome.summary()),
            outcome.status(),
            globals.format,
            globals.output.as_deref(),
        ),
        Err(err) => render_error(err, globals.format, globals.output.as_deref()),
    }
}

async fn compare(globals: &GlobalArgs, args: CompareArgs) -> Result<RunOutcome> {
    let overrides = EngineOverrides {
        threshold: args.threshold,
        artifacts_dir: args.artifacts_dir,
    };
    let config = resolve_engine_config(globals.config.as_deref(), &overrides)?;
    let engine = build_engine(config)?;

    let name = args.page_name.unwrap_or_else(|| args.page_id.clone());
    let page = PageInfo::new(args.page_id, name, args.page_url);
    let capture = FileScreenshot::new(args.screenshot);

    Ok(engine.run_design_comparison(&page, &args.link, &capture).await)
}
