//! `fieldpull` binary: one export run per invocation.
//!
//! Loads the run configuration, wires up the session (including the optional
//! trust-anchor certificate from disk), drives the pipeline, and persists
//! the artifact. Everything version-specific happens inside
//! `fieldpull-export`; this layer only does I/O at the edges.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use fieldpull_common::observability::{LogConfig, init_logging};
use fieldpull_config::{FieldpullConfig, FieldpullConfigLoader};
use fieldpull_export::acf::{AddonFlags, Credentials, ExportPipeline, ExportRequest};
use fieldpull_http::{Certificate, HttpSession};

#[derive(Parser)]
#[command(name = "fieldpull", about = "Export ACF field groups from a remote admin UI")]
struct Cli {
    /// Path to the run configuration file.
    #[arg(short, long, default_value = "fieldpull.yaml")]
    config: PathBuf,

    /// Destination file for the exported artifact.
    #[arg(short, long)]
    out: PathBuf,

    /// Export structured JSON instead of PHP source (overrides the config).
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg: FieldpullConfig = FieldpullConfigLoader::new()
        .with_file(&cli.config)
        .load()
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    init_logging(LogConfig {
        app_name: "fieldpull",
        emit_stderr: true,
        ..LogConfig::default()
    })?;

    let origin = format!("{}://{}", cfg.target.transport.scheme, cfg.target.host);
    let trust_anchor = match &cfg.target.transport.trust_anchor {
        Some(path) => {
            let pem = std::fs::read(path)
                .with_context(|| format!("failed to read trust anchor {}", path.display()))?;
            Some(Certificate::from_pem(&pem).context("trust anchor is not valid PEM")?)
        }
        None => None,
    };

    let request = ExportRequest {
        structured: cfg.export.structured || cli.json,
        addons: AddonFlags {
            repeater: cfg.export.addons.repeater,
            gallery: cfg.export.addons.gallery,
            flexible_content: cfg.export.addons.flexible_content,
            options_page: cfg.export.addons.options_page,
        },
        extra_condition: cfg.export.extra_condition.clone(),
    };
    let credentials = Credentials {
        identifier: cfg.credential.identifier.clone(),
        secret: cfg.credential.secret.clone(),
    };

    let pipeline = ExportPipeline::new(
        HttpSession::with_trust_anchor(&origin, trust_anchor)?,
        credentials,
        request,
    )
    .with_route_prefix(cfg.target.route_prefix.as_deref())
    .with_login_referer()?;

    let artifact = pipeline.run().await?;

    std::fs::write(&cli.out, &artifact.text)
        .with_context(|| format!("failed to write {}", cli.out.display()))?;
    tracing::info!(
        path = %cli.out.display(),
        lines = artifact.line_count,
        "export.persisted"
    );
    println!("wrote {} lines to {}", artifact.line_count, cli.out.display());

    Ok(())
}
