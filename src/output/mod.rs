pub mod console;
pub mod json;
pub mod sarif;

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::engine::RunResult;
use crate::error::Result;
use crate::rules::policy::PolicyVerdict;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Sarif,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Some(Self::Console),
            "json" => Some(Self::Json),
            "sarif" => Some(Self::Sarif),
            _ => None,
        }
    }
}

/// Render a run into the specified format.
pub fn render(
    result: &RunResult,
    verdict: &PolicyVerdict,
    format: OutputFormat,
    target_name: &str,
) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render(result, verdict, target_name)),
        OutputFormat::Json => json::render(result, verdict),
        OutputFormat::Sarif => sarif::render(result, target_name),
    }
}

/// Consumes a finished run. Implementations only read the result.
pub trait Reporter {
    fn report(&mut self, result: &RunResult, verdict: &PolicyVerdict) -> Result<()>;
}

/// Writes a rendered report to any writer (stdout, a file).
pub struct WriterReporter<W: Write> {
    writer: W,
    format: OutputFormat,
    target_name: String,
}

impl<W: Write> WriterReporter<W> {
    pub fn new(writer: W, format: OutputFormat, target_name: impl Into<String>) -> Self {
        Self {
            writer,
            format,
            target_name: target_name.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for WriterReporter<W> {
    fn report(&mut self, result: &RunResult, verdict: &PolicyVerdict) -> Result<()> {
        let rendered = render(result, verdict, self.format, &self.target_name)?;
        self.writer.write_all(rendered.as_bytes())?;
        if !rendered.ends_with('\n') {
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
