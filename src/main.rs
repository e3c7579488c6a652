mod app;
mod args;
mod input;
mod term;

use anyhow::{Context, Result};
use clap::Parser;
use std::{fs::File, path::Path};

fn main() -> Result<()> {
    let args = args::Args::parse();
    init_logging(args.log_file.as_deref())?;
    let cfg = args.effect_config().context("invalid configuration")?;
    app::run(&cfg)
}

/// Logs go to a file when asked; stderr would scribble over the canvas, so
/// without a file nothing is logged unless RUST_LOG says otherwise.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let default_filter = if path.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = path {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("failed to initialise logging")?;
    Ok(())
}
