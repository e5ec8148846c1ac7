use crate::{
    config::GateConfig,
    fingerprint::Fingerprint,
    gate::validator::{
        classify_status, FingerprintValidator, StatusClass, ValidationError, ValidationRequest,
        ValidationResponse, Verdict,
    },
};
use gloo_net::http::Request;
use gloo_timers::callback::Timeout;
use web_sys::AbortController;

/// Browser validator using `fetch` with an abort timeout so the hidden page cannot hang.
pub struct FetchValidator {
    endpoint: String,
    timeout_ms: u32,
}

impl FetchValidator {
    #[must_use]
    pub fn new(config: &GateConfig) -> Self {
        Self {
            endpoint: config.validate_endpoint(),
            timeout_ms: u32::try_from(config.timeout.as_millis()).unwrap_or(u32::MAX),
        }
    }
}

impl FingerprintValidator for FetchValidator {
    async fn validate(&self, fingerprint: &Fingerprint) -> Result<Verdict, ValidationError> {
        let controller = AbortController::new()
            .map_err(|_| ValidationError::Client("failed to initialize abort controller".to_string()))?;
        let signal = controller.signal();
        let timeout_controller = controller.clone();
        let _timeout = Timeout::new(self.timeout_ms, move || timeout_controller.abort());

        let request = Request::post(&self.endpoint)
            .abort_signal(Some(&signal))
            .json(&ValidationRequest {
                browser_fingerprint: fingerprint.as_str(),
            })
            .map_err(|err| ValidationError::Client(err.to_string()))?;

        let response = request.send().await.map_err(map_request_error)?;
        let status = response.status();

        match classify_status(status) {
            StatusClass::Forbidden => Ok(Verdict::Forbidden { status }),
            StatusClass::Unexpected => Err(ValidationError::Http { status }),
            StatusClass::Body => response
                .json::<ValidationResponse>()
                .await
                .map(Verdict::from)
                .map_err(|err| ValidationError::Parse(err.to_string())),
        }
    }
}

fn map_request_error(err: gloo_net::Error) -> ValidationError {
    let message = err.to_string();
    let lowered = message.to_lowercase();

    if lowered.contains("timeout") || lowered.contains("abort") {
        ValidationError::Timeout
    } else {
        ValidationError::Network(message)
    }
}
