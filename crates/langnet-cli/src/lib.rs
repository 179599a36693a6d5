//! # langnet-cli: the `langnet` command
//!
//! ```bash
//! langnet encode --message User --format binary --input user.json --output user.bin
//! langnet decode --message User --format binary --input user.bin --pretty
//! langnet inspect --input user.bin --nested
//! langnet write-samples --output-dir out/
//! langnet conformance --peer "python3 peer.py"
//! ```
//!
//! `encode` and `decode` read stdin and write stdout when no files are
//! given, which is also the protocol the conformance harness uses to drive
//! other implementations.
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |---|---|
//! | 0 | success |
//! | 1 | the input failed to decode, or conformance cases failed |
//! | 2 | operational error: unreadable files, invalid schema, bad arguments |

pub mod codec;
pub mod conformance;
pub mod inspect;
pub mod samples;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use langnet_conformance::Format;
use langnet_runtime::langnet;
use langnet_schema::{Registry, SchemaDescription};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_ERROR: u8 = 2;

/// Payload format flag.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Binary,
    Json,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Binary => Format::Binary,
            FormatArg::Json => Format::Json,
        }
    }
}

/// The schema descriptor at `path`, or the built-in LangNet schema.
pub fn load_schema(path: Option<&Path>) -> Result<SchemaDescription> {
    match path {
        Some(path) => SchemaDescription::load(path)
            .with_context(|| format!("failed to load schema {}", path.display())),
        None => Ok(langnet::schema()),
    }
}

pub fn load_registry(path: Option<&Path>) -> Result<Registry> {
    let schema = load_schema(path)?;
    tracing::debug!(
        package = %schema.package,
        messages = schema.messages.len(),
        "building registry"
    );
    Registry::new(schema).context("invalid schema")
}

/// Read `path`, or all of stdin when `None`.
pub fn read_input(path: Option<&PathBuf>) -> Result<Vec<u8>> {
    match path {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Write to `path`, or to stdout when `None`.
pub fn write_output(path: Option<&PathBuf>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes).context("failed to write stdout")?;
            stdout.flush().context("failed to flush stdout")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_schema_is_the_default() {
        let registry = load_registry(None).unwrap();
        assert_eq!(registry.package(), "langnet");
    }

    #[test]
    fn schema_file_is_loaded_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.json");
        std::fs::write(
            &path,
            r#"{"package":"tiny","messages":[{"name":"Ping","fields":[{"name":"seq","number":1,"type":"uint32"}]}]}"#,
        )
        .unwrap();
        let registry = load_registry(Some(&path)).unwrap();
        assert!(registry.message_by_name("Ping").is_some());
    }

    #[test]
    fn missing_schema_file_names_the_path() {
        let err = load_registry(Some(Path::new("/nonexistent/schema.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/schema.yaml"));
    }

    #[test]
    fn output_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_output(Some(&path), &[1, 2, 3]).unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), vec![1, 2, 3]);
    }
}
