//! Per-object results and how they are printed.

use std::io::Write;
use std::str::FromStr;

use colored::*;
use serde::Serialize;

use crate::detector::Finding;
use crate::error::Result;

/// Result of inspecting one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectReport {
    pub bucket: String,
    pub key: String,
    pub findings: Vec<Finding>,
    pub truncated: bool,
    pub bytes_read: u64,
    /// Set when the object could not be fetched or read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ObjectReport {
    pub fn failed(bucket: &str, key: &str, message: String) -> Self {
        ObjectReport {
            bucket: bucket.to_string(),
            key: key.to_string(),
            findings: Vec::new(),
            truncated: false,
            bytes_read: 0,
            error: Some(message),
        }
    }

    pub fn url(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/**
    Writes one report in the requested format.

    # Arguments

    * `out` - Destination, usually stdout.
    * `report` - The report to write.
    * `format` - Text or JSON lines.
    * `color` - Highlight headers and info types. Only applies to text.
*/
pub fn write_report<W: Write>(
    out: &mut W,
    report: &ObjectReport,
    format: OutputFormat,
    color: bool,
) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(out, report, color)?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_text<W: Write>(out: &mut W, report: &ObjectReport, color: bool) -> std::io::Result<()> {
    let mut header = report.url();
    if report.truncated {
        header.push_str(&format!(" (truncated after {} bytes)", report.bytes_read));
    }
    let header = if color {
        header.bold().to_string()
    } else {
        header
    };

    if let Some(message) = &report.error {
        return writeln!(out, "{}: error: {}", header, message);
    }
    if report.findings.is_empty() {
        return writeln!(out, "{}: No findings.", header);
    }

    writeln!(out, "{}:", header)?;
    for finding in &report.findings {
        if let Some(quote) = &finding.quote {
            writeln!(out, "  Quote: {}", quote)?;
        }
        let info_type = if color {
            finding.info_type.name().yellow().to_string()
        } else {
            finding.info_type.name().to_string()
        };
        writeln!(out, "  Info type: {}", info_type)?;
        writeln!(out, "  Likelihood: {}", finding.likelihood)?;
    }
    Ok(())
}
