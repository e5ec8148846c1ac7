//! Evidence submission: every audit category posts a multipart form to its own route and
//! gets back either a spreadsheet or an error body. One client covers all of them.

pub mod disposition;

#[cfg(not(target_arch = "wasm32"))]
mod client;

#[cfg(not(target_arch = "wasm32"))]
pub use client::EvidenceClient;
pub use disposition::{disposition_filename, error_message, report_filename, GENERIC_FAILURE};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("failed to read evidence file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("unable to reach the server: {0}")]
    Network(String),
    #[error("evidence submission timed out")]
    Timeout,
    #[error("evidence submission has no fields or files")]
    Empty,
    #[error("report generation failed ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// One file attached to a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceFile {
    /// Multipart field name the server route expects.
    pub field: String,
    pub path: PathBuf,
}

/// A single evidence form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceSubmission {
    pub route: String,
    pub fields: Vec<(String, String)>,
    pub files: Vec<EvidenceFile>,
    /// Download name used when the server does not supply one.
    pub fallback_name: String,
}

impl EvidenceSubmission {
    #[must_use]
    pub fn new(route: impl Into<String>, fallback_name: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            fields: Vec::new(),
            files: Vec::new(),
            fallback_name: fallback_name.into(),
        }
    }

    /// A form without parts cannot be encoded as multipart.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn file(mut self, field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.files.push(EvidenceFile {
            field: field.into(),
            path: path.into(),
        });
        self
    }
}

/// Generated report returned by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_form_order() {
        let submission = EvidenceSubmission::new("/process_firewall_evidence", "Firewall.xlsx")
            .field("branch", "HQ")
            .field("auditor", "A. Auditor")
            .file("evidence_file", "/tmp/firewall.xlsx");

        assert_eq!(submission.route, "/process_firewall_evidence");
        assert_eq!(
            submission.fields,
            vec![
                ("branch".to_string(), "HQ".to_string()),
                ("auditor".to_string(), "A. Auditor".to_string()),
            ]
        );
        assert_eq!(submission.files[0].field, "evidence_file");
        assert_eq!(submission.fallback_name, "Firewall.xlsx");
        assert!(!submission.is_empty());
    }

    #[test]
    fn submission_without_parts_is_empty() {
        let submission = EvidenceSubmission::new("/process_vapt_evidence", "VAPT.xlsx");
        assert!(submission.is_empty());
        assert!(!submission.clone().field("branch", "HQ").is_empty());
        assert!(!submission.file("evidence_file", "scan.xlsx").is_empty());
    }
}
