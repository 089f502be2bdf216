use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vdiff")]
#[command(
    version,
    about = "Visual Diff Engine - compare captured pages against design exports",
    long_about = "Visual Diff Engine (vdiff)\n\nModes:\n- resolve: turn a design share link into dimensions, an export URL and a downloaded baseline.\n- diff: compare two PNG files pixel by pixel.\n- compare: full pipeline from a share link and an already-captured screenshot.\n\nExit codes: 0 passed, 1 regression, 2 failure, 3 skipped (design unavailable).\nThe design token is read from FIGMA_TOKEN or FIGMA_OAUTH_TOKEN."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable debug logging on stderr")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML) with threshold/artifacts/timeouts defaults; CLI flags override config"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "json", help = "Output format")]
    pub format: OutputFormat,

    #[arg(long, short, global = true, help = "Output file path (stdout if omitted)")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a design share link and download its baseline export
    Resolve {
        #[arg(long, help = "Design share link (must carry a node-id)")]
        link: String,

        #[arg(
            long,
            value_name = "PATH",
            help = "Where to store the baseline PNG (defaults to the artifacts baseline directory)"
        )]
        out: Option<PathBuf>,
    },

    /// Compare two PNG files of identical size
    Diff {
        #[arg(long, value_name = "PATH", help = "Reference image")]
        baseline: PathBuf,

        #[arg(long, value_name = "PATH", help = "Image under test")]
        actual: PathBuf,

        #[arg(
            long,
            help = "Largest passing fraction of differing pixels (0..=1)"
        )]
        threshold: Option<f64>,

        #[arg(long, value_name = "PATH", help = "Write a diff image to this path")]
        diff_out: Option<PathBuf>,
    },

    /// Compare an already-captured page screenshot against its design
    Compare {
        #[arg(long, help = "Unique page id; keys artifact file names")]
        page_id: String,

        #[arg(long, help = "Human readable page name (defaults to the id)")]
        page_name: Option<String>,

        #[arg(long, default_value = "", help = "URL the screenshot was taken from")]
        page_url: String,

        #[arg(long, help = "Design share link (must carry a node-id)")]
        link: String,

        #[arg(long, value_name = "PATH", help = "Screenshot PNG captured at the design size")]
        screenshot: PathBuf,

        #[arg(
            long,
            help = "Largest passing fraction of differing pixels (0..=1)"
        )]
        threshold: Option<f64>,

        #[arg(
            long,
            value_name = "PATH",
            help = "Directory for baselines, diff images and reports; created if missing"
        )]
        artifacts_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
