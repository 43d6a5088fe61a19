//! Main entry point for the anypath CLI.
//!
//! Resolves one URL, optionally joins extra segments, and copies the bytes to
//! stdout. Logs go to stderr.

use std::io::{self, Seek, SeekFrom, Write};

use anyhow::{Context, Result};
use clap::Parser;

use anypath::cli::Cli;
use anypath::{Path, Resolver, config, logging};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    let settings = match &cli.config {
        Some(path) => config::load(path)?,
        None => config::load_default()?,
    };
    let resolver = Resolver::with_settings(settings);

    let path = cli
        .segments
        .iter()
        .fold(resolver.resolve(&cli.url), |path, segment| path.map(|p| p / segment.as_str()))
        .with_context(|| format!("cannot resolve {}", cli.url))?;

    if cli.show {
        println!("{path:?}");
        return Ok(());
    }

    let data = read(&path, &cli).with_context(|| format!("cannot read {path}"))?;
    tracing::info!(path = %path, bytes = data.len(), "read {}", format_size(data.len() as u64));

    let mut stdout = io::stdout().lock();
    if cli.text {
        let text = String::from_utf8(data).with_context(|| format!("{path} is not valid UTF-8"))?;
        stdout.write_all(text.as_bytes())?;
    } else {
        stdout.write_all(&data)?;
    }
    stdout.flush()?;
    Ok(())
}

/// The requested byte range of `path`.
fn read(path: &Path, cli: &Cli) -> anypath::Result<Vec<u8>> {
    if cli.offset.is_none() && cli.length.is_none() {
        return path.read_bytes();
    }

    let mut file = path.open()?;
    if let Some(offset) = cli.offset {
        file.seek(SeekFrom::Start(offset))?;
    }
    file.read_chunk(cli.length)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
