mod cli;
mod config;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Map, Value};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::ForgeConfig;
use reportforge::{
    Project, ProjectType, RenderError, RenderOptions, RenderOverrides, RenderPipeline,
    SpoolTransport,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("reportforge=debug")
    } else if cli.quiet {
        EnvFilter::new("reportforge=error")
    } else {
        EnvFilter::new("reportforge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    info!("Reportforge v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        cli::Commands::Render(args) => {
            let settings = load_settings(
                args.spool.as_deref(),
                args.poll_interval_ms,
                args.strict_empty_result,
            )?;

            let design: ProjectType = read_json(&args.design)
                .with_context(|| format!("failed to load design {}", args.design.display()))?;
            let project: Project = read_json(&args.project)
                .with_context(|| format!("failed to load project {}", args.project.display()))?;
            let template = read_override(args.template.as_deref())?;
            let styles = read_override(args.styles.as_deref())?;

            let transport = SpoolTransport::new(&settings.spool);
            let pipeline = RenderPipeline::new(&transport, settings.options);
            let overrides = RenderOverrides {
                template: template.as_deref(),
                styles: styles.as_deref(),
            };

            let pdf = pipeline
                .render_project(&project, &design, overrides, args.password.as_deref())
                .await;
            write_pdf(pdf, &args.out)?;
        }
        cli::Commands::Preview(args) => {
            let settings = load_settings(args.spool.as_deref(), args.poll_interval_ms, false)?;

            let design: ProjectType = read_json(&args.design)
                .with_context(|| format!("failed to load design {}", args.design.display()))?;
            let data: Map<String, Value> = read_json(&args.data)
                .with_context(|| format!("failed to load preview data {}", args.data.display()))?;
            let template = read_override(args.template.as_deref())?;
            let styles = read_override(args.styles.as_deref())?;

            let transport = SpoolTransport::new(&settings.spool);
            let pipeline = RenderPipeline::new(&transport, settings.options);
            let overrides = RenderOverrides {
                template: template.as_deref(),
                styles: styles.as_deref(),
            };

            let pdf = pipeline.render_preview(&design, overrides, data).await;
            write_pdf(pdf, &args.out)?;
        }
        cli::Commands::Init => {
            config::init_config()?;
        }
    }

    Ok(())
}

struct Settings {
    spool: std::path::PathBuf,
    options: RenderOptions,
}

/// Merge CLI flags over the config file: flags win
fn load_settings(
    spool: Option<&Path>,
    poll_interval_ms: Option<u64>,
    strict_empty_result: bool,
) -> Result<Settings> {
    let config = ForgeConfig::load(&std::env::current_dir()?).unwrap_or_default();
    Ok(Settings {
        spool: spool
            .map(Path::to_path_buf)
            .unwrap_or(config.render.spool),
        options: RenderOptions {
            poll_interval: Duration::from_millis(
                poll_interval_ms.unwrap_or(config.render.poll_interval_ms),
            ),
            strict_empty_result: strict_empty_result || config.render.strict_empty_result,
        },
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn read_override(path: Option<&Path>) -> Result<Option<String>> {
    match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            Ok(Some(content))
        }
        None => Ok(None),
    }
}

/// Write the rendered document, or surface every worker diagnostic before
/// failing; a broken render usually has more than one problem.
fn write_pdf(result: Result<Vec<u8>, RenderError>, out: &Path) -> Result<()> {
    match result {
        Ok(bytes) => {
            std::fs::write(out, &bytes)?;
            info!("Wrote {} ({} bytes)", out.display(), bytes.len());
            Ok(())
        }
        Err(RenderError::Rendering { messages }) => {
            for m in &messages {
                error!("[{}] {}: {}", m.level, m.location.name, m.message);
                if let Some(details) = &m.details {
                    error!("        {details}");
                }
            }
            anyhow::bail!("pdf rendering failed with {} diagnostic(s)", messages.len())
        }
        Err(e) => Err(e.into()),
    }
}
