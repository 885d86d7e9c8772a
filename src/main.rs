use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use traceline_dispatch::{Level, ManagerBuilder, SinkDescriptor, SinkKind, TraceManager};

/// Traceline - emit trace events through configured sinks
///
/// A small driver around the traceline engine: resolves sink descriptors
/// from an optional TOML file (console only when absent), then emits a batch
/// of events through one writer.
#[derive(Parser, Debug)]
#[command(name = "traceline")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML sink configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Logical source name to emit under
    #[arg(long, default_value = "traceline-demo")]
    source: String,

    /// Severity level for the emitted events
    #[arg(long, default_value = "information")]
    level: String,

    /// Message text
    #[arg(default_value = "hello from traceline")]
    message: String,

    /// Number of events to emit
    #[arg(long, default_value = "1")]
    count: u32,
}

/// TOML shape of the demo configuration
///
/// This lives on the application side of the configuration boundary; the
/// library only sees the resolved descriptors.
#[derive(Debug, Default, Deserialize)]
struct DemoConfig {
    #[serde(default)]
    auto_flush: bool,

    #[serde(default)]
    throw_on_error: bool,

    #[serde(default = "default_flush_on_exit")]
    flush_on_exit: bool,

    #[serde(default)]
    sinks: Vec<SinkDescriptor>,
}

fn default_flush_on_exit() -> bool {
    true
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Internal diagnostics (sink write failures land here)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let level = Level::parse(&args.level)
        .with_context(|| format!("unknown level '{}'", args.level))?;

    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => DemoConfig::default(),
    };

    let manager = build_manager(config)?;
    let writer = manager.get_writer(&args.source);

    for i in 0..args.count {
        writer
            .write_entry(level, i, format!("{} #{i}", args.message))
            .context("dispatch failed")?;
    }
    writer
        .write_data(
            Level::Debug,
            0,
            "run complete",
            serde_json::json!({ "emitted": args.count }),
        )
        .context("dispatch failed")?;

    drop(writer);
    manager.shutdown();

    Ok(())
}

fn build_manager(config: DemoConfig) -> Result<TraceManager> {
    let mut builder = ManagerBuilder::new()
        .auto_flush(config.auto_flush)
        .throw_on_error(config.throw_on_error)
        .flush_on_exit(config.flush_on_exit);

    if config.sinks.is_empty() {
        // No configuration: a single console sink with the default template
        let fallback = SinkDescriptor {
            name: "console".to_string(),
            kind: SinkKind::Console,
            path: None,
            format: None,
            stderr_from: None,
            filters: Vec::new(),
        };
        builder = builder.descriptor(&fallback)?;
    } else {
        for descriptor in &config.sinks {
            builder = builder
                .descriptor(descriptor)
                .with_context(|| format!("resolving sink '{}'", descriptor.name))?;
        }
    }

    Ok(builder.build()?)
}
