//! Implementations running in another process.
//!
//! A peer is any program that speaks the `langnet` CLI protocol:
//!
//! ```text
//! <program> [args..] [--schema PATH] encode --message M --format binary|json
//!     stdin:  the fixture in JSON text form
//!     stdout: the payload
//! <program> [args..] [--schema PATH] decode --message M --format binary|json
//!     stdin:  a payload
//!     stdout: the decoded value in JSON text form
//! ```
//!
//! The `langnet` binary of this workspace is such a program, so a
//! Python or Zig peer only has to wrap its generated code in the same
//! two commands.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use langnet_core::MessageValue;
use langnet_schema::Registry;
use langnet_text::TextOptions;

use crate::error::ConformanceError;
use crate::fixtures::Fixture;
use crate::implementation::{Format, Implementation};

#[derive(Debug, Clone)]
pub struct ExternalImplementation {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    schema: Option<PathBuf>,
    registry: Arc<Registry>,
}

impl ExternalImplementation {
    /// `registry` renders fixtures for the peer's stdin and parses what it
    /// prints back; it must describe the same schema the peer uses.
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>, registry: Arc<Registry>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            schema: None,
            registry,
        }
    }

    /// Build from a shell-style command line such as `"python3 peer.py"`.
    /// Words are split on whitespace; no quoting is interpreted.
    pub fn from_command_line(command: &str, registry: Arc<Registry>) -> Option<Self> {
        let mut words = command.split_whitespace();
        let program = words.next()?;
        Some(Self::new(command, program, registry).with_args(words.map(str::to_string)))
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    /// Pass `--schema PATH` to the peer on every call.
    pub fn with_schema(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema = Some(path.into());
        self
    }

    fn command(&self, subcommand: &str, message: &str, format: Format) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(schema) = &self.schema {
            command.arg("--schema").arg(schema);
        }
        command
            .arg(subcommand)
            .args(["--message", message, "--format", format.as_str()]);
        command
    }

    fn run(&self, mut command: Command, input: &[u8]) -> Result<Vec<u8>, ConformanceError> {
        let program = self.program.display().to_string();
        let process_error = |source| ConformanceError::Process {
            program: program.clone(),
            source,
        };

        tracing::trace!(peer = %self.name, ?command, "spawning peer");
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(process_error)?;

        // Feed stdin from a second thread so a peer that starts writing
        // before it has read everything cannot deadlock us.
        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            scope.spawn(move || {
                if let Some(mut pipe) = stdin {
                    // A peer that exits early closes the pipe; its exit
                    // status reports the failure.
                    let _ = pipe.write_all(input);
                }
            });
            child.wait_with_output()
        })
        .map_err(process_error)?;

        if !output.status.success() {
            return Err(ConformanceError::PeerFailed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

impl Implementation for ExternalImplementation {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, fixture: &Fixture, format: Format) -> Result<Vec<u8>, ConformanceError> {
        let input =
            langnet_text::encode_string(&self.registry, &fixture.message, &TextOptions::default())?;
        let command = self.command("encode", fixture.message.message(), format);
        self.run(command, input.as_bytes())
    }

    fn read(
        &self,
        message: &str,
        payload: &[u8],
        format: Format,
    ) -> Result<MessageValue, ConformanceError> {
        let output = self.run(self.command("decode", message, format), payload)?;
        let value = langnet_text::parse(&output)?;
        Ok(langnet_text::decode_value(&self.registry, message, &value)?)
    }
}
