//! Server-side fingerprint check. The fingerprint travels only in the JSON body of
//! `POST /validate_fingerprint`, never in the URL, so it cannot leak through access
//! logs or referrer headers.

use crate::{config::ConfigError, fingerprint::Fingerprint};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ValidationRequest<'a> {
    pub browser_fingerprint: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
}

/// Server answer for one fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
    /// 403/404; the body is not read.
    Forbidden { status: u16 },
}

impl From<ValidationResponse> for Verdict {
    fn from(response: ValidationResponse) -> Self {
        if response.valid {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("unable to reach the server: {0}")]
    Network(String),
    #[error("validation request timed out")]
    Timeout,
    #[error("unexpected status {status}")]
    Http { status: u16 },
    #[error("failed to decode validation response: {0}")]
    Parse(String),
}

/// How a response status is handled before any body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Forbidden,
    Body,
    Unexpected,
}

#[must_use]
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        403 | 404 => StatusClass::Forbidden,
        200..=299 => StatusClass::Body,
        _ => StatusClass::Unexpected,
    }
}

/// Asks the server whether a fingerprint is authorized. One call per page load.
pub trait FingerprintValidator {
    fn validate(
        &self,
        fingerprint: &Fingerprint,
    ) -> impl Future<Output = Result<Verdict, ValidationError>>;
}

#[cfg(not(target_arch = "wasm32"))]
pub use http::HttpValidator;

#[cfg(not(target_arch = "wasm32"))]
mod http {
    use super::{
        classify_status, FingerprintValidator, StatusClass, ValidationError, ValidationRequest,
        ValidationResponse, Verdict,
    };
    use crate::{config::GateConfig, fingerprint::Fingerprint};
    use tracing::{debug, instrument};
    use url::Url;

    /// `reqwest` validator with a bounded timeout.
    #[derive(Debug, Clone)]
    pub struct HttpValidator {
        client: reqwest::Client,
        endpoint: Url,
    }

    impl HttpValidator {
        /// # Errors
        ///
        /// Returns an error if the endpoint is not absolute or the client cannot be built.
        pub fn new(config: &GateConfig) -> Result<Self, ValidationError> {
            let endpoint = config.validate_url()?;
            let client = reqwest::Client::builder()
                .timeout(config.timeout)
                .user_agent(crate::APP_USER_AGENT)
                .build()
                .map_err(|err| ValidationError::Client(err.to_string()))?;

            Ok(Self { client, endpoint })
        }

        #[must_use]
        pub fn endpoint(&self) -> &Url {
            &self.endpoint
        }
    }

    impl FingerprintValidator for HttpValidator {
        #[instrument(skip_all, fields(endpoint = %self.endpoint))]
        async fn validate(&self, fingerprint: &Fingerprint) -> Result<Verdict, ValidationError> {
            let response = self
                .client
                .post(self.endpoint.clone())
                .json(&ValidationRequest {
                    browser_fingerprint: fingerprint.as_str(),
                })
                .send()
                .await
                .map_err(map_request_error)?;

            let status = response.status().as_u16();
            debug!(status, "validation response");

            match classify_status(status) {
                StatusClass::Forbidden => Ok(Verdict::Forbidden { status }),
                StatusClass::Unexpected => Err(ValidationError::Http { status }),
                StatusClass::Body => response
                    .json::<ValidationResponse>()
                    .await
                    .map(Verdict::from)
                    .map_err(map_request_error),
            }
        }
    }

    fn map_request_error(err: reqwest::Error) -> ValidationError {
        if err.is_timeout() {
            ValidationError::Timeout
        } else if err.is_decode() {
            ValidationError::Parse(err.to_string())
        } else {
            ValidationError::Network(err.to_string())
        }
    }
}
