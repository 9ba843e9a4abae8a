use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a stored project to PDF
    Render(RenderArgs),

    /// Render caller-supplied preview data against a design
    Preview(PreviewArgs),

    /// Initialize a .reportforge.toml config file in the current directory
    Init,
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// Project JSON (report data, findings, members)
    #[arg(long)]
    pub project: PathBuf,

    /// Design JSON (field schemas, template, styles, assets)
    #[arg(long)]
    pub design: PathBuf,

    /// Where to write the rendered PDF
    #[arg(short, long, default_value = "report.pdf")]
    pub out: PathBuf,

    /// Encrypt the PDF with this password
    #[arg(long)]
    pub password: Option<String>,

    /// Template file overriding the design's report template
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Stylesheet file overriding the design's report styles
    #[arg(long)]
    pub styles: Option<PathBuf>,

    /// Spool directory shared with the rendering worker
    #[arg(long)]
    pub spool: Option<PathBuf>,

    /// Job readiness poll interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Fail distinctly when the worker returns neither pdf nor messages
    #[arg(long)]
    pub strict_empty_result: bool,
}

#[derive(clap::Args, Debug)]
pub struct PreviewArgs {
    /// Design JSON (field schemas, template, styles, assets)
    #[arg(long)]
    pub design: PathBuf,

    /// Preview data JSON (report/finding-shaped tree)
    #[arg(long)]
    pub data: PathBuf,

    /// Where to write the rendered PDF
    #[arg(short, long, default_value = "preview.pdf")]
    pub out: PathBuf,

    /// Template file overriding the design's report template
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Stylesheet file overriding the design's report styles
    #[arg(long)]
    pub styles: Option<PathBuf>,

    /// Spool directory shared with the rendering worker
    #[arg(long)]
    pub spool: Option<PathBuf>,

    /// Job readiness poll interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
}
