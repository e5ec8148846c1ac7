use crate::{
    cli::globals::GlobalArgs,
    config::GateConfig,
    fingerprint::{DigestAlgorithm, FingerprintGenerator, SignalProfile},
    gate::{
        FingerprintValidator, Gate, GateState, HeadlessPage, HttpValidator, MemorySessionStore,
        PageKind, SessionContext, SessionStore,
    },
};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub profile: PathBuf,
    pub otp_profile: Option<PathBuf>,
    pub digest: DigestAlgorithm,
}

/// What one page load ended up as.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PageReport {
    pub page: String,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Whether the page reused the fingerprint cached at login.
    pub reused: bool,
    pub content_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirected_to: Option<String>,
}

impl PageReport {
    fn new(kind: PageKind, state: &GateState, page: &HeadlessPage, reused: bool) -> Self {
        let reason = match state {
            GateState::Rejected(reason) => Some(reason.to_string()),
            _ => None,
        };

        Self {
            page: kind.to_string(),
            accepted: state.is_accepted(),
            reason,
            fingerprint: state.fingerprint().map(ToString::to_string),
            reused,
            content_visible: page.is_content_visible(),
            redirected_to: page.redirected_to().map(str::to_string),
        }
    }
}

/// Login followed by verification, sharing one session.
#[derive(Debug, Serialize)]
pub struct FlowReport {
    pub base_url: String,
    pub digest: String,
    pub login: PageReport,
    /// Absent when login was rejected, since the client never reaches verification.
    pub verification: Option<PageReport>,
}

impl FlowReport {
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.login.accepted
            && self
                .verification
                .as_ref()
                .is_some_and(|report| report.accepted)
    }
}

/// Drive both gated pages the way a browser would and print the outcome as JSON.
/// # Errors
/// Returns an error if a profile cannot be loaded, the endpoint is invalid, or any page
/// was rejected.
pub async fn execute(args: Args) -> Result<()> {
    let mut config = args.globals.gate_config();
    config.digest = args.digest;

    let login_profile = SignalProfile::from_path(&args.profile)
        .with_context(|| format!("could not load profile {}", args.profile.display()))?;
    let otp_profile = match &args.otp_profile {
        Some(path) => SignalProfile::from_path(path)
            .with_context(|| format!("could not load profile {}", path.display()))?,
        None => login_profile.clone(),
    };

    let validator = HttpValidator::new(&config)?;
    info!(endpoint = %validator.endpoint(), "validating against dashboard");

    let gate = Gate::new(validator, &config);
    let session =
        SessionContext::new(MemorySessionStore::new()).with_key(config.session_key.clone());
    let report = run_flow(&gate, &config, &session, login_profile, otp_profile).await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.accepted() {
        bail!("fingerprint rejected");
    }

    Ok(())
}

/// Runs the two page loads against one session, hashing with `config.digest`.
pub async fn run_flow<V: FingerprintValidator, S: SessionStore>(
    gate: &Gate<V>,
    config: &GateConfig,
    session: &SessionContext<S>,
    login_profile: SignalProfile,
    otp_profile: SignalProfile,
) -> FlowReport {
    let digest = config.digest;

    let mut login_page = HeadlessPage::new();
    let login_state = gate
        .guard(PageKind::Login, &mut login_page, session, || {
            Some(FingerprintGenerator::new(login_profile).with_algorithm(digest).generate())
        })
        .await;
    let login = PageReport::new(PageKind::Login, &login_state, &login_page, false);

    let verification = if login_state.is_accepted() {
        let reused = session.cached_fingerprint().is_some();
        let mut otp_page = HeadlessPage::new();
        let otp_state = gate
            .guard(PageKind::Verification, &mut otp_page, session, || {
                Some(FingerprintGenerator::new(otp_profile).with_algorithm(digest).generate())
            })
            .await;
        Some(PageReport::new(
            PageKind::Verification,
            &otp_state,
            &otp_page,
            reused,
        ))
    } else {
        None
    };

    FlowReport {
        base_url: config.base_url.clone(),
        digest: digest.to_string(),
        login,
        verification,
    }
}
