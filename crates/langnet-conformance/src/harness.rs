//! # Conformance Harness
//!
//! For every fixture and format, each implementation writes a payload and
//! every implementation (the writer included) reads each payload back. A
//! case passes when the decoded value is equivalent to the fixture under
//! [`Registry::equivalent`].
//!
//! Independently of reading, the canonical payloads of all writers are
//! compared. The binary form is a byte-exact contract; the JSON form is
//! compared after JCS canonicalization. Disagreements are reported as
//! [`Divergence`]s with the digest each writer produced.
//!
//! ## Design
//!
//! A failing writer or reader never aborts the run: every error becomes a
//! [`CaseFailure`] so one report covers the whole matrix.

use std::fmt;

use langnet_schema::Registry;

use crate::canonical::{CanonicalPayload, PayloadDigest};
use crate::fixtures::{Fixture, Suite};
use crate::implementation::{Format, Implementation};

/// Runs fixtures across a set of implementations.
pub struct Harness<'a> {
    registry: &'a Registry,
    implementations: Vec<&'a dyn Implementation>,
    formats: Vec<Format>,
}

impl<'a> Harness<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            implementations: Vec::new(),
            formats: Format::ALL.to_vec(),
        }
    }

    pub fn with_implementation(mut self, implementation: &'a dyn Implementation) -> Self {
        self.implementations.push(implementation);
        self
    }

    /// Restrict the run to `formats`.
    pub fn with_formats(mut self, formats: &[Format]) -> Self {
        self.formats = formats.to_vec();
        self
    }

    /// Run every fixture of `suite`.
    pub fn run_suite(&self, suite: &Suite) -> ConformanceReport {
        self.run(&suite.fixtures)
    }

    pub fn run(&self, fixtures: &[Fixture]) -> ConformanceReport {
        let mut report = ConformanceReport::default();
        for fixture in fixtures {
            for &format in &self.formats {
                self.run_case(fixture, format, &mut report);
            }
        }
        tracing::info!(
            total = report.total,
            passed = report.passed,
            divergences = report.divergences.len(),
            "conformance run finished"
        );
        report
    }

    fn run_case(&self, fixture: &Fixture, format: Format, report: &mut ConformanceReport) {
        let message = fixture.message.message();
        let mut written: Vec<(&str, CanonicalPayload, Vec<u8>)> = Vec::new();

        for writer in &self.implementations {
            let payload = writer
                .write(fixture, format)
                .and_then(|payload| Ok((CanonicalPayload::new(format, &payload)?, payload)));
            match payload {
                Ok((canonical, payload)) => written.push((writer.name(), canonical, payload)),
                Err(err) => {
                    tracing::debug!(writer = writer.name(), fixture = %fixture.name, %format, error = %err, "write failed");
                    // Every pair with this writer fails.
                    for reader in &self.implementations {
                        report.record_failure(CaseFailure {
                            fixture: fixture.name.clone(),
                            format,
                            writer: writer.name().to_string(),
                            reader: reader.name().to_string(),
                            reason: format!("write failed: {err}"),
                        });
                    }
                }
            }
        }

        if let Some((_, first, _)) = written.first() {
            if written.iter().any(|(_, canonical, _)| canonical != first) {
                report.divergences.push(Divergence {
                    fixture: fixture.name.clone(),
                    format,
                    digests: written
                        .iter()
                        .map(|(name, canonical, _)| (name.to_string(), canonical.digest()))
                        .collect(),
                });
            }
        }

        for (writer, _, payload) in &written {
            for reader in &self.implementations {
                let reason = match reader.read(message, payload, format) {
                    Ok(value) if self.registry.equivalent(&value, &fixture.message) => {
                        report.record_pass();
                        continue;
                    }
                    Ok(value) => format!("decoded value differs: {value:?}"),
                    Err(err) => format!("read failed: {err}"),
                };
                tracing::debug!(writer, reader = reader.name(), fixture = %fixture.name, %format, %reason, "case failed");
                report.record_failure(CaseFailure {
                    fixture: fixture.name.clone(),
                    format,
                    writer: writer.to_string(),
                    reader: reader.name().to_string(),
                    reason,
                });
            }
        }
    }
}

/// One failed (writer, reader, fixture, format) case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseFailure {
    pub fixture: String,
    pub format: Format,
    pub writer: String,
    pub reader: String,
    pub reason: String,
}

/// Writers that produced different canonical payloads for one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    pub fixture: String,
    pub format: Format,
    /// Writer name and the digest of its canonical payload.
    pub digests: Vec<(String, PayloadDigest)>,
}

/// Outcome of a harness run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConformanceReport {
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<CaseFailure>,
    pub divergences: Vec<Divergence>,
}

impl ConformanceReport {
    fn record_pass(&mut self) {
        self.total += 1;
        self.passed += 1;
    }

    fn record_failure(&mut self, failure: CaseFailure) {
        self.total += 1;
        self.failures.push(failure);
    }

    /// Every case decoded to an equivalent value. Divergent payloads do not
    /// count against success; see [`Self::is_strict_success`].
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Success, and every writer produced identical canonical payloads.
    pub fn is_strict_success(&self) -> bool {
        self.is_success() && self.divergences.is_empty()
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: ConformanceReport) {
        self.total += other.total;
        self.passed += other.passed;
        self.failures.extend(other.failures);
        self.divergences.extend(other.divergences);
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}/{} cases passed", self.passed, self.total)?;
        for failure in &self.failures {
            writeln!(
                f,
                "  FAIL {} [{:<6}] {} -> {}: {}",
                failure.fixture, failure.format, failure.writer, failure.reader, failure.reason
            )?;
        }
        for divergence in &self.divergences {
            writeln!(f, "  DIVERGE {} [{:<6}]", divergence.fixture, divergence.format)?;
            for (writer, digest) in &divergence.digests {
                writeln!(f, "    {writer}: {}", digest.short())?;
            }
        }
        Ok(())
    }
}
