//! # Inspect Subcommand
//!
//! Schema-less dump of a binary payload: one line per field with its byte
//! offset, number, wire type and value. Useful when a payload from another
//! implementation fails to decode.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use langnet_wire::{RawField, RawValue};

use crate::{read_input, write_output, EXIT_FAILURE, EXIT_SUCCESS};

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Payload file. Reads stdin when omitted.
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Also walk length-delimited payloads that parse as nested messages.
    #[arg(long)]
    pub nested: bool,
}

pub fn run_inspect(args: &InspectArgs) -> Result<u8> {
    let input = read_input(args.input.as_ref())?;
    let fields = match langnet_wire::inspect(&input) {
        Ok(fields) => fields,
        Err(err) => {
            tracing::error!("payload is not well-formed: {err}");
            return Ok(EXIT_FAILURE);
        }
    };
    let mut out = String::new();
    render(&fields, args.nested, 0, &mut out);
    write_output(None, out.as_bytes())?;
    Ok(EXIT_SUCCESS)
}

/// Render `fields` one per line, indenting nested levels by two spaces.
pub fn render(fields: &[RawField], nested: bool, depth: usize, out: &mut String) {
    for field in fields {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{:indent$}{field}", "", indent = depth * 2);
        match &field.value {
            RawValue::Group(inner) => render(inner, nested, depth + 1, out),
            RawValue::LengthDelimited(bytes) if nested && !bytes.is_empty() => {
                if let Ok(inner) = langnet_wire::inspect(bytes) {
                    render(&inner, nested, depth + 1, out);
                }
            }
            _ => {}
        }
    }
}
