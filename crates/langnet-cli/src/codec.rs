//! # Encode and Decode Subcommands
//!
//! Both commands move between the JSON text form and a payload:
//! `encode` reads JSON and writes the payload, `decode` reads a payload and
//! writes JSON. With `--format json` the payload is itself JSON, so the
//! commands normalize field names, defaults and number spellings.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use langnet_core::MessageValue;
use langnet_schema::Registry;
use langnet_text::TextOptions;

use crate::{read_input, write_output, FormatArg, EXIT_FAILURE, EXIT_SUCCESS};

/// Arguments shared by `encode` and `decode`.
#[derive(Args, Debug, Clone)]
pub struct CodecArgs {
    /// Message type name, as declared in the schema.
    #[arg(long, short)]
    pub message: String,

    /// Payload format.
    #[arg(long, short, value_enum, default_value = "binary")]
    pub format: FormatArg,

    /// Input file. Reads stdin when omitted.
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Output file. Writes stdout when omitted.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Write implicit-presence fields that hold their zero value.
    #[arg(long)]
    pub emit_defaults: bool,

    /// Indent JSON output.
    #[arg(long)]
    pub pretty: bool,
}

impl CodecArgs {
    fn text_options(&self) -> TextOptions {
        TextOptions {
            emit_defaults: self.emit_defaults,
            pretty: self.pretty,
        }
    }
}

/// Execute `encode`: JSON text in, payload out.
pub fn run_encode(args: &CodecArgs, registry: &Registry) -> Result<u8> {
    let input = read_input(args.input.as_ref())?;
    let text = String::from_utf8(input).context("input is not UTF-8 text")?;

    let value = match langnet_text::decode(registry, &args.message, &text) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!("input is not a valid {} in JSON form: {err}", args.message);
            return Ok(EXIT_FAILURE);
        }
    };
    let payload = match render(registry, &value, args) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::error!("{err}");
            return Ok(EXIT_FAILURE);
        }
    };
    write_output(args.output.as_ref(), &payload)?;
    Ok(EXIT_SUCCESS)
}

/// Execute `decode`: payload in, JSON text out.
pub fn run_decode(args: &CodecArgs, registry: &Registry) -> Result<u8> {
    let input = read_input(args.input.as_ref())?;

    let decoded = match args.format {
        FormatArg::Binary => {
            langnet_wire::decode(registry, &args.message, &input).map_err(anyhow::Error::from)
        }
        FormatArg::Json => std::str::from_utf8(&input)
            .context("payload is not UTF-8 text")
            .and_then(|text| Ok(langnet_text::decode(registry, &args.message, text)?)),
    };
    let value = match decoded {
        Ok(value) => value,
        Err(err) => {
            tracing::error!("payload is not a valid {}: {err:#}", args.message);
            return Ok(EXIT_FAILURE);
        }
    };

    let mut text = langnet_text::encode_string(registry, &value, &args.text_options())
        .context("failed to render decoded value")?;
    text.push('\n');
    write_output(args.output.as_ref(), text.as_bytes())?;
    Ok(EXIT_SUCCESS)
}

fn render(registry: &Registry, value: &MessageValue, args: &CodecArgs) -> Result<Vec<u8>> {
    Ok(match args.format {
        FormatArg::Binary => langnet_wire::encode(registry, value)?,
        FormatArg::Json => {
            let mut text = langnet_text::encode_string(registry, value, &args.text_options())?;
            text.push('\n');
            text.into_bytes()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_registry;

    fn args(dir: &std::path::Path, format: FormatArg, input: &str, output: &str) -> CodecArgs {
        CodecArgs {
            message: "SearchRequest".into(),
            format,
            input: Some(dir.join(input)),
            output: Some(dir.join(output)),
            emit_defaults: false,
            pretty: false,
        }
    }

    #[test]
    fn encode_then_decode_through_files() {
        let registry = load_registry(None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("req.json"),
            r#"{"query": "zig", "pageNumber": 3}"#,
        )
        .unwrap();

        let code = run_encode(
            &args(dir.path(), FormatArg::Binary, "req.json", "req.bin"),
            &registry,
        )
        .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
        let bytes = std::fs::read(dir.path().join("req.bin")).unwrap();
        assert_eq!(bytes, [0x0a, 0x03, b'z', b'i', b'g', 0x10, 0x03]);

        let code = run_decode(
            &args(dir.path(), FormatArg::Binary, "req.bin", "back.json"),
            &registry,
        )
        .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
        let text = std::fs::read_to_string(dir.path().join("back.json")).unwrap();
        assert_eq!(text, "{\"page_number\":3,\"query\":\"zig\"}\n");
    }

    #[test]
    fn invalid_payload_is_a_check_failure() {
        let registry = load_registry(None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.bin"), [0x0a, 0x09, b'z']).unwrap();
        let code = run_decode(
            &args(dir.path(), FormatArg::Binary, "bad.bin", "out.json"),
            &registry,
        )
        .unwrap();
        assert_eq!(code, EXIT_FAILURE);
        assert!(!dir.path().join("out.json").exists());
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let registry = load_registry(None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = run_encode(
            &args(dir.path(), FormatArg::Json, "missing.json", "out.json"),
            &registry,
        );
        assert!(result.is_err());
    }

    #[test]
    fn emit_defaults_writes_zero_fields() {
        let registry = load_registry(None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("req.json"), "{}").unwrap();
        let mut args = args(dir.path(), FormatArg::Json, "req.json", "out.json");
        args.emit_defaults = true;
        assert_eq!(run_encode(&args, &registry).unwrap(), EXIT_SUCCESS);
        let text = std::fs::read_to_string(dir.path().join("out.json")).unwrap();
        assert_eq!(
            text,
            "{\"page_number\":0,\"query\":\"\",\"results_per_page\":0}\n"
        );
    }
}
