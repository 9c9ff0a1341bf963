use crate::error::{CompressionError, FailureKind};
use crate::formats::ResolvedFormat;
use std::path::PathBuf;

/// Percentage of bytes saved, rounded to one decimal.
///
/// Negative when the output grew. An empty original reports 0.
pub fn savings_percent(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let ratio = 1.0 - compressed_size as f64 / original_size as f64;
    (ratio * 1000.0).round() / 10.0
}

/// One-decimal rendering used by the HTTP responses
pub fn format_savings(percent: f64) -> String {
    format!("{:.1}", percent)
}

/// Where a successful job put its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutput {
    Path(PathBuf),
    Data(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobError {
    pub kind: FailureKind,
    pub message: String,
}

impl From<CompressionError> for JobError {
    fn from(err: CompressionError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOutcome {
    /// File name or batch entry name
    pub identifier: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub savings_percent: f64,
    pub format: Option<ResolvedFormat>,
    pub output: Option<JobOutput>,
    pub error: Option<JobError>,
}

impl CompressionOutcome {
    pub fn succeeded(
        identifier: impl Into<String>,
        original_size: u64,
        compressed_size: u64,
        format: ResolvedFormat,
        output: JobOutput,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            original_size,
            compressed_size,
            savings_percent: savings_percent(original_size, compressed_size),
            format: Some(format),
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(identifier: impl Into<String>, error: impl Into<JobError>) -> Self {
        Self {
            identifier: identifier.into(),
            original_size: 0,
            compressed_size: 0,
            savings_percent: 0.0,
            format: None,
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

/// Ordered outcomes of one batch plus totals over the successful items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<CompressionOutcome>,
    pub total_original: u64,
    pub total_compressed: u64,
    pub success_count: usize,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: Vec<CompressionOutcome>) -> Self {
        let mut report = Self::default();
        for outcome in &outcomes {
            if outcome.is_success() {
                report.total_original += outcome.original_size;
                report.total_compressed += outcome.compressed_size;
                report.success_count += 1;
            }
        }
        report.outcomes = outcomes;
        report
    }

    pub fn total_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failure_count(&self) -> usize {
        self.total_count() - self.success_count
    }

    /// Size-weighted savings across the successful items
    pub fn total_savings_percent(&self) -> f64 {
        savings_percent(self.total_original, self.total_compressed)
    }
}
