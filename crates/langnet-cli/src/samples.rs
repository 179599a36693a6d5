//! # Write-Samples Subcommand
//!
//! Writes every fixture of the LangNet suite as `<name>.bin` and
//! `<name>.json` so other implementations can read them from disk. Always
//! uses the built-in LangNet schema.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use langnet_conformance::{Format, Implementation, NativeImplementation, Suite};
use langnet_text::TextOptions;

use crate::EXIT_SUCCESS;

#[derive(Args, Debug, Clone)]
pub struct WriteSamplesArgs {
    /// Directory to write into. Created if missing.
    #[arg(long, short)]
    pub output_dir: PathBuf,
}

pub fn run_write_samples(args: &WriteSamplesArgs) -> Result<u8> {
    let written = write_samples(&args.output_dir)?;
    println!(
        "wrote {} files to {}",
        written.len(),
        args.output_dir.display()
    );
    Ok(EXIT_SUCCESS)
}

/// Write the samples and return the paths written.
pub fn write_samples(dir: &Path) -> Result<Vec<PathBuf>> {
    let suite = Suite::langnet().context("built-in schema is invalid")?;
    let native = NativeImplementation::new(suite.registry.clone());
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for fixture in &suite.fixtures {
        for format in Format::ALL {
            let payload = match format {
                Format::Binary => native.write(fixture, format)?,
                // Indented so the files are readable.
                Format::Json => {
                    let mut text = langnet_text::encode_string(
                        &suite.registry,
                        &fixture.message,
                        &TextOptions::pretty(),
                    )?;
                    text.push('\n');
                    text.into_bytes()
                }
            };
            let path = dir.join(format!("{}.{}", fixture.name, format.extension()));
            std::fs::write(&path, &payload)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = payload.len(), "wrote sample");
            written.push(path);
        }
    }
    Ok(written)
}
