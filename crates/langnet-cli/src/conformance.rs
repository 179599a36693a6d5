//! # Conformance Subcommand
//!
//! Runs the built-in suites against this workspace's codecs and every
//! `--peer`. Peers receive each suite's schema as a YAML descriptor written
//! to the work directory and passed with `--schema`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use langnet_conformance::{
    ConformanceReport, ExternalImplementation, Format, Harness, Implementation,
    NativeImplementation, Suite,
};

use crate::{FormatArg, EXIT_FAILURE, EXIT_SUCCESS};

/// Which built-in suites to run.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteArg {
    Langnet,
    Scalars,
    All,
}

#[derive(Args, Debug, Clone)]
pub struct ConformanceArgs {
    /// Command line of another implementation. Repeatable.
    #[arg(long = "peer", value_name = "CMD")]
    pub peers: Vec<String>,

    #[arg(long, value_enum, default_value = "all")]
    pub suite: SuiteArg,

    /// Limit the run to one payload format.
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Also fail when writers produce different canonical payloads.
    #[arg(long)]
    pub strict: bool,

    /// Where peer schema descriptors are written. Defaults to a directory
    /// under the system temp dir.
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

pub fn run_conformance(args: &ConformanceArgs) -> Result<u8> {
    let suites = match args.suite {
        SuiteArg::Langnet => vec![Suite::langnet()?],
        SuiteArg::Scalars => vec![Suite::scalars()?],
        SuiteArg::All => Suite::all()?,
    };
    let formats: Vec<Format> = match args.format {
        Some(format) => vec![format.into()],
        None => Format::ALL.to_vec(),
    };
    let work_dir = args
        .work_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("langnet-conformance"));

    let mut total = ConformanceReport::default();
    for suite in &suites {
        let report = run_suite(suite, &args.peers, &formats, &work_dir)?;
        println!("suite {}: {report}", suite.name);
        total.merge(report);
    }

    let ok = if args.strict {
        total.is_strict_success()
    } else {
        total.is_success()
    };
    if suites.len() > 1 {
        println!("total: {}/{} cases passed", total.passed, total.total);
    }
    Ok(if ok { EXIT_SUCCESS } else { EXIT_FAILURE })
}

fn run_suite(
    suite: &Suite,
    peers: &[String],
    formats: &[Format],
    work_dir: &std::path::Path,
) -> Result<ConformanceReport> {
    let native = NativeImplementation::new(suite.registry.clone());

    let mut externals = Vec::with_capacity(peers.len());
    if !peers.is_empty() {
        let schema_path = work_dir.join(format!("{}.schema.yaml", suite.name));
        std::fs::create_dir_all(work_dir)
            .with_context(|| format!("failed to create {}", work_dir.display()))?;
        std::fs::write(&schema_path, suite.schema.to_yaml_string()?)
            .with_context(|| format!("failed to write {}", schema_path.display()))?;
        for peer in peers {
            let external = ExternalImplementation::from_command_line(peer, suite.registry.clone())
                .with_context(|| format!("empty peer command line '{peer}'"))?
                .with_schema(&schema_path);
            externals.push(external);
        }
    }

    let mut harness = Harness::new(&suite.registry)
        .with_formats(formats)
        .with_implementation(&native);
    for external in &externals {
        harness = harness.with_implementation(external as &dyn Implementation);
    }
    tracing::info!(
        suite = suite.name,
        fixtures = suite.fixtures.len(),
        peers = externals.len(),
        "running conformance suite"
    );
    Ok(harness.run_suite(suite))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_only_run_succeeds() {
        let args = ConformanceArgs {
            peers: Vec::new(),
            suite: SuiteArg::All,
            format: None,
            strict: true,
            work_dir: None,
        };
        assert_eq!(run_conformance(&args).unwrap(), EXIT_SUCCESS);
    }

    #[test]
    fn unreachable_peer_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let args = ConformanceArgs {
            peers: vec!["/nonexistent/langnet-peer".into()],
            suite: SuiteArg::Langnet,
            format: Some(FormatArg::Binary),
            strict: false,
            work_dir: Some(dir.path().to_path_buf()),
        };
        assert_eq!(run_conformance(&args).unwrap(), EXIT_FAILURE);
        assert!(dir.path().join("langnet.schema.yaml").exists());
    }
}
