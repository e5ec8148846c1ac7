//! Page-load gate for fingerprint-bound pages.
//!
//! ```text
//! Start --no fingerprint--------------------------> Rejected
//!   |
//!   +--generated--> Pending (content hidden, one POST)
//!                     |-- 403 / 404 ---------------> Rejected
//!                     |-- {"valid": false} --------> Rejected
//!                     |-- network error / timeout -> Rejected
//!                     +-- {"valid": true} ---------> Accepted
//! ```
//!
//! `Accepted` reveals content, fills the hidden form field and caches the fingerprint
//! for the next page of the flow. `Rejected` always redirects to the same page; the
//! reason is logged but never shown to the client.

pub mod page;
pub mod session;
pub mod validator;

pub use page::{HeadlessPage, PageSurface};
pub use session::{MemorySessionStore, SessionContext, SessionError, SessionStore};
pub use validator::{FingerprintValidator, ValidationError, Verdict};

#[cfg(not(target_arch = "wasm32"))]
pub use validator::HttpValidator;

use crate::{config::GateConfig, fingerprint::Fingerprint};
use std::fmt;
use tracing::{info, instrument, warn};

/// Which page of the login flow is loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Login,
    /// One-time-passcode verification; reuses the fingerprint accepted at login.
    Verification,
}

impl fmt::Display for PageKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageKind::Login => formatter.write_str("login"),
            PageKind::Verification => formatter.write_str("verification"),
        }
    }
}

/// Why a page load was rejected. For logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoFingerprint,
    Forbidden,
    Invalid,
    Unreachable,
}

impl fmt::Display for Rejection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Rejection::NoFingerprint => "no_fingerprint",
            Rejection::Forbidden => "forbidden",
            Rejection::Invalid => "invalid",
            Rejection::Unreachable => "unreachable",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Pending,
    Accepted(Fingerprint),
    Rejected(Rejection),
}

impl GateState {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateState::Accepted(_))
    }

    #[must_use]
    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        match self {
            GateState::Accepted(fingerprint) => Some(fingerprint),
            _ => None,
        }
    }
}

/// Runs the validation handshake for one page load.
#[derive(Debug, Clone)]
pub struct Gate<V> {
    validator: V,
    rejection_target: String,
    field_name: String,
}

impl<V: FingerprintValidator> Gate<V> {
    #[must_use]
    pub fn new(validator: V, config: &GateConfig) -> Self {
        Self {
            validator,
            rejection_target: config.rejection_path.clone(),
            field_name: config.field_name.clone(),
        }
    }

    #[must_use]
    pub fn validator(&self) -> &V {
        &self.validator
    }

    /// Guards one page load and returns its terminal state.
    ///
    /// `generate` runs at most once, and not at all when a verification page finds a
    /// cached fingerprint. `None` from it means no fingerprint could be produced.
    #[instrument(skip_all, fields(page = %kind))]
    pub async fn guard<P, T, F>(
        &self,
        kind: PageKind,
        page: &mut P,
        session: &SessionContext<T>,
        generate: F,
    ) -> GateState
    where
        P: PageSurface,
        T: SessionStore,
        F: FnOnce() -> Option<Fingerprint>,
    {
        if kind == PageKind::Verification {
            if let Some(cached) = session.cached_fingerprint() {
                info!("reusing fingerprint accepted earlier in this session");
                let state = GateState::Accepted(cached);
                self.render(&state, page);
                return state;
            }
        }

        let Some(fingerprint) = generate() else {
            let state = GateState::Rejected(Rejection::NoFingerprint);
            self.render(&state, page);
            return state;
        };

        self.render(&GateState::Pending, page);
        let state = self.resolve(fingerprint).await;
        self.render(&state, page);

        if let GateState::Accepted(fingerprint) = &state {
            if let Err(err) = session.remember(fingerprint) {
                warn!("accepted fingerprint not cached: {err}");
            }
        }

        state
    }

    /// Pending -> terminal transition for a freshly generated fingerprint.
    async fn resolve(&self, fingerprint: Fingerprint) -> GateState {
        match self.validator.validate(&fingerprint).await {
            Ok(Verdict::Valid) => {
                info!("fingerprint accepted");
                GateState::Accepted(fingerprint)
            }
            Ok(Verdict::Invalid) => {
                info!("fingerprint rejected by server");
                GateState::Rejected(Rejection::Invalid)
            }
            Ok(Verdict::Forbidden { status }) => {
                info!(status, "fingerprint forbidden");
                GateState::Rejected(Rejection::Forbidden)
            }
            Err(err) => {
                warn!("fingerprint validation failed: {err}");
                GateState::Rejected(Rejection::Unreachable)
            }
        }
    }

    fn render<P: PageSurface>(&self, state: &GateState, page: &mut P) {
        match state {
            GateState::Pending => page.hide_content(),
            GateState::Accepted(fingerprint) => {
                page.set_hidden_field(&self.field_name, fingerprint.as_str());
                page.reveal_content();
            }
            GateState::Rejected(reason) => {
                info!(?reason, location = %self.rejection_target, "redirecting rejected client");
                page.hide_content();
                page.redirect(&self.rejection_target);
            }
        }
    }

    /// Fills the hidden field right before a form submits. Prefers the session copy and
    /// only generates when nothing is cached; never writes the session.
    pub fn prepare_submission<P, T, F>(
        &self,
        page: &mut P,
        session: &SessionContext<T>,
        generate: F,
    ) -> Option<Fingerprint>
    where
        P: PageSurface,
        T: SessionStore,
        F: FnOnce() -> Option<Fingerprint>,
    {
        let fingerprint = session.cached_fingerprint().or_else(generate)?;
        page.set_hidden_field(&self.field_name, fingerprint.as_str());
        Some(fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::{
        DigestAlgorithm, FingerprintGenerator, ScreenGeometry, SignalProfile,
    };
    use std::{
        cell::{Cell, RefCell},
        collections::VecDeque,
    };

    /// Replays scripted verdicts and records what it was asked.
    struct ScriptedValidator {
        replies: RefCell<VecDeque<Result<Verdict, ValidationError>>>,
        seen: RefCell<Vec<String>>,
    }

    impl ScriptedValidator {
        fn new(replies: Vec<Result<Verdict, ValidationError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.borrow().len()
        }
    }

    impl FingerprintValidator for ScriptedValidator {
        async fn validate(&self, fingerprint: &Fingerprint) -> Result<Verdict, ValidationError> {
            self.seen.borrow_mut().push(fingerprint.as_str().to_string());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(ValidationError::Network("no scripted reply".to_string())))
        }
    }

    fn profile(width: u32) -> SignalProfile {
        SignalProfile {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4)".to_string(),
            screen: Some(ScreenGeometry {
                width,
                height: 900,
                color_depth: 30,
            }),
            time_zone: "America/New_York".to_string(),
            utc_offset_minutes: 240,
            language: "en-US".to_string(),
            languages: vec!["en-US".to_string()],
            platform: "MacIntel".to_string(),
            hardware_concurrency: Some(10),
            canvas: Some("data:image/png;base64,AAAA".to_string()),
            ..SignalProfile::default()
        }
    }

    fn gate(validator: ScriptedValidator) -> Gate<ScriptedValidator> {
        Gate::new(validator, &GateConfig::default())
    }

    #[tokio::test]
    async fn valid_reply_reveals_page_and_fills_field() {
        let gate = gate(ScriptedValidator::new(vec![Ok(Verdict::Valid)]));
        let generator = FingerprintGenerator::new(profile(1440));
        let session = SessionContext::new(MemorySessionStore::new());
        let mut page = HeadlessPage::new();

        let state = gate
            .guard(PageKind::Login, &mut page, &session, || {
                Some(generator.generate())
            })
            .await;

        let expected = generator.generate();
        assert_eq!(state, GateState::Accepted(expected.clone()));
        assert!(page.was_hidden());
        assert!(page.is_content_visible());
        assert_eq!(page.hidden_field("browser_fingerprint"), Some(expected.as_str()));
        assert_eq!(gate.validator().seen.borrow().as_slice(), [expected.as_str()]);
        assert_eq!(session.cached_fingerprint(), Some(expected));
        assert_eq!(page.redirected_to(), None);
    }

    #[tokio::test]
    async fn forbidden_reply_redirects_without_reveal() {
        let gate = gate(ScriptedValidator::new(vec![Ok(Verdict::Forbidden {
            status: 403,
        })]));
        let session = SessionContext::new(MemorySessionStore::new());
        let mut page = HeadlessPage::new();

        let state = gate
            .guard(PageKind::Login, &mut page, &session, || {
                Some(FingerprintGenerator::new(profile(1440)).generate())
            })
            .await;

        assert_eq!(state, GateState::Rejected(Rejection::Forbidden));
        assert!(!page.is_content_visible());
        assert_eq!(page.redirected_to(), Some("/fingerprint_error"));
        assert_eq!(page.hidden_field("browser_fingerprint"), None);
        assert_eq!(session.cached_fingerprint(), None);
    }

    #[tokio::test]
    async fn invalid_and_unreachable_redirect_like_forbidden() {
        for reply in [
            Ok(Verdict::Invalid),
            Err(ValidationError::Network("offline".to_string())),
            Err(ValidationError::Timeout),
            Err(ValidationError::Parse("bad json".to_string())),
        ] {
            let gate = gate(ScriptedValidator::new(vec![reply]));
            let session = SessionContext::new(MemorySessionStore::new());
            let mut page = HeadlessPage::new();

            let state = gate
                .guard(PageKind::Login, &mut page, &session, || {
                    Some(FingerprintGenerator::new(profile(1440)).generate())
                })
                .await;

            assert!(matches!(state, GateState::Rejected(_)));
            assert!(!page.is_content_visible());
            assert_eq!(page.redirected_to(), Some("/fingerprint_error"));
            assert_eq!(session.cached_fingerprint(), None);
        }
    }

    #[tokio::test]
    async fn missing_fingerprint_rejects_without_network() {
        let gate = gate(ScriptedValidator::new(vec![Ok(Verdict::Valid)]));
        let session = SessionContext::new(MemorySessionStore::new());
        let mut page = HeadlessPage::new();

        let state = gate
            .guard(PageKind::Login, &mut page, &session, || None)
            .await;

        assert_eq!(state, GateState::Rejected(Rejection::NoFingerprint));
        assert_eq!(gate.validator().calls(), 0);
        assert_eq!(page.redirected_to(), Some("/fingerprint_error"));
    }

    #[tokio::test]
    async fn verification_reuses_cached_fingerprint_when_signals_change() {
        let store = MemorySessionStore::new();
        let gate = gate(ScriptedValidator::new(vec![Ok(Verdict::Valid)]));

        let login_generator = FingerprintGenerator::new(profile(1440));
        let mut login_page = HeadlessPage::new();
        let login = gate
            .guard(
                PageKind::Login,
                &mut login_page,
                &SessionContext::new(store.clone()),
                || Some(login_generator.generate()),
            )
            .await;
        let accepted = login.fingerprint().cloned().unwrap();

        // Hardened browsers can report different probe values on the next page.
        let drifted = FingerprintGenerator::new(profile(1280));
        assert_ne!(drifted.generate(), accepted);

        let generated = Cell::new(false);
        let mut verify_page = HeadlessPage::new();
        let verify = gate
            .guard(
                PageKind::Verification,
                &mut verify_page,
                &SessionContext::new(store),
                || {
                    generated.set(true);
                    Some(drifted.generate())
                },
            )
            .await;

        assert_eq!(verify, GateState::Accepted(accepted.clone()));
        assert!(!generated.get());
        assert_eq!(gate.validator().calls(), 1);
        assert!(verify_page.is_content_visible());
        assert_eq!(
            verify_page.hidden_field("browser_fingerprint"),
            Some(accepted.as_str())
        );
    }

    #[tokio::test]
    async fn verification_without_cache_runs_full_handshake() {
        let gate = gate(ScriptedValidator::new(vec![Ok(Verdict::Valid)]));
        let session = SessionContext::new(MemorySessionStore::new());
        let mut page = HeadlessPage::new();

        let state = gate
            .guard(PageKind::Verification, &mut page, &session, || {
                Some(FingerprintGenerator::new(profile(1440)).generate())
            })
            .await;

        assert!(state.is_accepted());
        assert_eq!(gate.validator().calls(), 1);
        assert!(session.cached_fingerprint().is_some());
    }

    #[tokio::test]
    async fn login_always_regenerates_even_with_cache() {
        let store = MemorySessionStore::new();
        let stale = Fingerprint::from_joined("stale", DigestAlgorithm::Sha256);
        store.set("browser_fingerprint", stale.as_str()).unwrap();

        let gate = gate(ScriptedValidator::new(vec![Ok(Verdict::Valid)]));
        let fresh = FingerprintGenerator::new(profile(1440)).generate();
        let session = SessionContext::new(store);
        let mut page = HeadlessPage::new();

        let state = gate
            .guard(PageKind::Login, &mut page, &session, || Some(fresh.clone()))
            .await;

        assert_eq!(state, GateState::Accepted(fresh.clone()));
        assert_eq!(session.cached_fingerprint(), Some(fresh));
    }

    #[test]
    fn prepare_submission_prefers_session_copy() {
        let gate = gate(ScriptedValidator::new(Vec::new()));
        let session = SessionContext::new(MemorySessionStore::new());
        let cached = Fingerprint::from_joined("login", DigestAlgorithm::Sha256);
        session.remember(&cached).unwrap();

        let mut page = HeadlessPage::new();
        let submitted = gate.prepare_submission(&mut page, &session, || {
            Some(Fingerprint::from_joined("other", DigestAlgorithm::Sha256))
        });

        assert_eq!(submitted, Some(cached.clone()));
        assert_eq!(page.hidden_field("browser_fingerprint"), Some(cached.as_str()));
    }

    #[test]
    fn prepare_submission_generates_without_caching() {
        let gate = gate(ScriptedValidator::new(Vec::new()));
        let session = SessionContext::new(MemorySessionStore::new());
        let fresh = Fingerprint::from_joined("fresh", DigestAlgorithm::Legacy);

        let mut page = HeadlessPage::new();
        let submitted = gate.prepare_submission(&mut page, &session, || Some(fresh.clone()));

        assert_eq!(submitted, Some(fresh.clone()));
        assert_eq!(page.hidden_field("browser_fingerprint"), Some(fresh.as_str()));
        assert_eq!(session.cached_fingerprint(), None);

        let mut empty_page = HeadlessPage::new();
        assert_eq!(gate.prepare_submission(&mut empty_page, &session, || None), None);
        assert_eq!(empty_page.hidden_field("browser_fingerprint"), None);
    }

    #[test]
    fn pending_render_hides_content() {
        let gate = gate(ScriptedValidator::new(Vec::new()));
        let mut page = HeadlessPage::new();
        gate.render(&GateState::Pending, &mut page);
        assert!(!page.is_content_visible());
        assert_eq!(page.redirected_to(), None);
    }
}
