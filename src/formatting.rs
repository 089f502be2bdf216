use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;
use tracing::error;
use vdiff_lib::{
    ComparisonReport, Disposition, ErrorPayload, OutcomeSummary, RunStatus, VdiffError, Viewport,
    REPORT_VERSION,
};

use crate::cli::OutputFormat;

/// Everything the binary prints, tagged by `mode`.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum CliOutput {
    Resolve(ResolveOutput),
    Diff(ComparisonReport),
    Compare(OutcomeSummary),
    Error(ErrorOutput),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOutput {
    pub document_key: String,
    pub node_id: String,
    pub viewport: Viewport,
    pub image_url: String,
    pub baseline_path: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    pub disposition: Disposition,
    pub error: ErrorPayload,
}

/// Write output in the requested format.
pub fn write_output(
    body: &CliOutput,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output)?,
        OutputFormat::Pretty => write_pretty_output(body, output)?,
    };
    Ok(())
}

/// Render an error and return the matching exit code.
pub fn render_error(err: VdiffError, format: OutputFormat, output: Option<&Path>) -> ExitCode {
    let code = exit_code_for_status(RunStatus::for_error(&err));
    let payload = CliOutput::Error(ErrorOutput {
        version: REPORT_VERSION.to_string(),
        disposition: err.disposition(),
        error: err.to_payload(),
    });

    if let Err(write_err) = write_output(&payload, format, output) {
        error!(error = %write_err, "failed to write error output");
        if let Ok(content) = serde_json::to_string(&payload) {
            println!("{content}");
        }
    }
    code
}

/// Emit a command result and map its status to an exit code.
pub fn finish(
    body: &CliOutput,
    status: RunStatus,
    format: OutputFormat,
    output: Option<&Path>,
) -> ExitCode {
    match write_output(body, format, output) {
        Ok(()) => exit_code_for_status(status),
        Err(err) => render_error(
            VdiffError::Config(format!("Failed to write output: {err}")),
            format,
            None,
        ),
    }
}

/// 0 passed, 1 regression, 2 failure, 3 skipped.
pub fn exit_code_for_status(status: RunStatus) -> ExitCode {
    match status {
        RunStatus::Passed => ExitCode::SUCCESS,
        RunStatus::Regressed => ExitCode::from(1),
        RunStatus::Failed => ExitCode::from(2),
        RunStatus::Skipped => ExitCode::from(3),
    }
}

fn write_json_output(body: &CliOutput, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        write_file(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

fn write_pretty_output(body: &CliOutput, output: Option<&Path>) -> io::Result<()> {
    let use_human = output.is_none() && io::stdout().is_terminal();

    if use_human {
        println!("{}", format_pretty(body, true));
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content = serde_json::to_string_pretty(body).map_err(io::Error::other)?;
    if let Some(path) = output {
        write_file(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Write `--output`, creating missing parent directories first.
fn write_file(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &CliOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        CliOutput::Resolve(out) => {
            let header = color("[RESOLVE]", "36", colorize);
            writeln!(buf, "{header} {}#{} at {}", out.document_key, out.node_id, out.viewport).ok();
            writeln!(buf, "Export:   {}", out.image_url).ok();
            writeln!(buf, "Baseline: {}", out.baseline_path.display()).ok();
        }
        CliOutput::Diff(report) => {
            let status = if report.passed {
                RunStatus::Passed
            } else {
                RunStatus::Regressed
            };
            writeln!(buf, "{} Visual diff", status_label(status, colorize)).ok();
            write_report(&mut buf, report);
        }
        CliOutput::Compare(summary) => {
            writeln!(
                buf,
                "{} {} ({})",
                status_label(summary.status, colorize),
                summary.page.name,
                summary.page.id
            )
            .ok();
            writeln!(buf, "Stage: {:?}", summary.state.stage()).ok();
            if let Some(report) = &summary.report {
                write_report(&mut buf, report);
            }
            if let Some(err) = &summary.error {
                write_error(&mut buf, err);
            }
        }
        CliOutput::Error(out) => {
            let header = color("[ERROR]", "31", colorize);
            writeln!(buf, "{header} {}", out.error.message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {remediation}").ok();
            }
        }
    }
    buf
}

fn write_report(buf: &mut String, report: &ComparisonReport) {
    writeln!(
        buf,
        "Diff ratio: {:.6} (threshold {:.6})",
        report.diff_ratio, report.threshold
    )
    .ok();
    writeln!(
        buf,
        "Pixels: {} of {} differ at {} ({} anti-aliased ignored)",
        report.diff_pixel_count, report.total_pixels, report.viewport, report.antialiased_pixel_count
    )
    .ok();
    let paths = [
        ("baseline", report.baseline_path.as_ref()),
        ("diffImage", report.diff_image_path.as_ref()),
    ];
    for (label, path) in paths {
        if let Some(path) = path {
            writeln!(buf, "- {label:10} {}", path.display()).ok();
        }
    }
}

fn write_error(buf: &mut String, err: &ErrorPayload) {
    writeln!(buf, "Error: {}", err.message).ok();
    if let Some(remediation) = &err.remediation {
        writeln!(buf, "Hint: {remediation}").ok();
    }
}

fn status_label(status: RunStatus, colorize: bool) -> String {
    match status {
        RunStatus::Passed => color("PASS", "32", colorize),
        RunStatus::Regressed => color("FAIL", "31", colorize),
        RunStatus::Failed => color("ERROR", "31", colorize),
        RunStatus::Skipped => color("SKIP", "33", colorize),
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}
