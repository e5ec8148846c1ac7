use super::{
    disposition::{error_message, report_filename},
    EvidenceError, EvidenceSubmission, Report,
};
use crate::config::{build_url_with_base, parse_absolute};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::{debug, instrument};

/// Posts evidence forms to the dashboard and collects generated reports.
#[derive(Debug, Clone)]
pub struct EvidenceClient {
    client: reqwest::Client,
    base_url: String,
}

impl EvidenceClient {
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EvidenceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .map_err(|err| EvidenceError::Client(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Submits one evidence form.
    ///
    /// # Errors
    ///
    /// Returns an error if the submission has no parts, a file cannot be read, the
    /// server is unreachable, or the server answers with a non-success status.
    #[instrument(skip_all, fields(route = %submission.route))]
    pub async fn submit(&self, submission: &EvidenceSubmission) -> Result<Report, EvidenceError> {
        if submission.is_empty() {
            return Err(EvidenceError::Empty);
        }
        let url = parse_absolute(&build_url_with_base(&self.base_url, &submission.route))?;
        let form = build_form(submission).await?;

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvidenceError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let headers = response.headers();
        let filename = report_filename(
            headers.get("x-filename").and_then(|value| value.to_str().ok()),
            headers
                .get(reqwest::header::CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok()),
            &submission.fallback_name,
        );

        let bytes = response.bytes().await.map_err(map_request_error)?.to_vec();
        debug!(size = bytes.len(), %filename, "report received");

        Ok(Report { filename, bytes })
    }
}

async fn build_form(submission: &EvidenceSubmission) -> Result<Form, EvidenceError> {
    let mut form = Form::new();

    for (name, value) in &submission.fields {
        form = form.text(name.clone(), value.clone());
    }

    for file in &submission.files {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| EvidenceError::Read {
                path: file.path.display().to_string(),
                source,
            })?;
        let name = file
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.field.clone());
        form = form.part(file.field.clone(), Part::bytes(bytes).file_name(name));
    }

    Ok(form)
}

fn map_request_error(err: reqwest::Error) -> EvidenceError {
    if err.is_timeout() {
        EvidenceError::Timeout
    } else {
        EvidenceError::Network(err.to_string())
    }
}
