use std::path::PathBuf;
use std::process::ExitCode;

use tracing::info;
use vdiff_lib::engine::artifact_path;
use vdiff_lib::{parse_share_link, Result, RunStatus, VdiffError};

use super::{build_engine, GlobalArgs};
use crate::formatting::{finish, render_error, CliOutput, ResolveOutput};
use crate::settings::{resolve_engine_config, EngineOverrides};

/// Run the resolve command.
pub async fn run_resolve(globals: &GlobalArgs, link: String, out: Option<PathBuf>) -> ExitCode {
    match resolve(globals, &link, out).await {
        Ok(body) => finish(
            &CliOutput::Resolve(body),
            RunStatus::Passed,
            globals.format,
            globals.output.as_deref(),
        ),
        Err(err) => render_error(err, globals.format, globals.output.as_deref()),
    }
}

async fn resolve(globals: &GlobalArgs, link: &str, out: Option<PathBuf>) -> Result<ResolveOutput> {
    let config = resolve_engine_config(globals.config.as_deref(), &EngineOverrides::default())?;
    let reference =
        parse_share_link(link).ok_or_else(|| VdiffError::LinkParse(link.to_string()))?;

    let baseline_path = out.unwrap_or_else(|| {
        let name = format!("{}-{}", reference.document_key, reference.share_node_id());
        artifact_path(&config.artifacts_dir, "baseline", &name, "png")
    });

    let engine = build_engine(config)?;
    let export = engine
        .resolver()
        .resolve(&reference, engine.config().export_scale)
        .await?;
    engine
        .resolver()
        .download(&export.image_url, &baseline_path)
        .await?;
    info!(reference = %reference, dimensions = %export.dimensions, "baseline stored");

    Ok(ResolveOutput {
        document_key: reference.document_key,
        node_id: reference.node_id,
        viewport: export.dimensions,
        image_url: export.image_url,
        baseline_path,
    })
}
