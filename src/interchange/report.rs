//! JSON export of validation findings.

use serde::Serialize;

use super::InterchangeError;
use crate::diagnostics::{Finding, Severity};

#[derive(Serialize)]
struct FindingReport<'a> {
    errors: usize,
    warnings: usize,
    findings: &'a [Finding],
}

/// Render findings as a pretty-printed JSON object with error and warning
/// counts.
pub fn findings_to_json(findings: &[Finding]) -> Result<String, InterchangeError> {
    let count = |severity| findings.iter().filter(|f| f.severity == severity).count();
    let report = FindingReport {
        errors: count(Severity::Error),
        warnings: count(Severity::Warning),
        findings,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|e| InterchangeError::json(format!("Serialization error: {e}")))
}
