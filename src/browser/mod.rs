//! In-page bindings. The dashboard templates load the wasm bundle and call
//! `guardPage("login")` or `guardPage("verification")` on load, then
//! `prepareSubmission(...)` from the form's submit handler.

mod dom;
mod fetch;
mod signals;

pub use dom::{BrowserSession, DomPage, PageSelectors};
pub use fetch::FetchValidator;
pub use signals::BrowserSignals;

use crate::{
    config::GateConfig,
    fingerprint::{Fingerprint, FingerprintGenerator},
    gate::{Gate, PageKind, SessionContext},
};
use tracing::warn;
use wasm_bindgen::prelude::*;

fn page_kind(kind: &str) -> PageKind {
    match kind {
        "verification" | "otp" => PageKind::Verification,
        _ => PageKind::Login,
    }
}

fn selectors(kind: PageKind) -> PageSelectors {
    match kind {
        PageKind::Login => PageSelectors::login(),
        PageKind::Verification => PageSelectors::verification(),
    }
}

fn generate(config: &GateConfig) -> Option<Fingerprint> {
    let signals = BrowserSignals::detect()?;
    Some(
        FingerprintGenerator::new(signals)
            .with_algorithm(config.digest)
            .generate(),
    )
}

/// Guards the current page. Resolves to `true` once the content is revealed.
#[wasm_bindgen(js_name = guardPage)]
pub async fn guard_page(kind: String) -> bool {
    let kind = page_kind(&kind);
    let config = GateConfig::load();

    let Some(window) = web_sys::window() else {
        return false;
    };
    let Some(mut page) = DomPage::new(window.clone(), selectors(kind)) else {
        warn!("no document to guard");
        return false;
    };
    let session = SessionContext::new(BrowserSession::new(&window)).with_key(config.session_key.clone());

    let gate = Gate::new(FetchValidator::new(&config), &config);
    gate.guard(kind, &mut page, &session, || generate(&config))
        .await
        .is_accepted()
}

/// Fills the hidden fingerprint field ahead of a form submit and returns its value.
#[wasm_bindgen(js_name = prepareSubmission)]
pub fn prepare_submission(kind: String) -> Option<String> {
    let kind = page_kind(&kind);
    let config = GateConfig::load();

    let window = web_sys::window()?;
    let mut page = DomPage::new(window.clone(), selectors(kind))?;
    let session = SessionContext::new(BrowserSession::new(&window)).with_key(config.session_key.clone());

    let gate = Gate::new(FetchValidator::new(&config), &config);
    gate.prepare_submission(&mut page, &session, || generate(&config))
        .map(|fingerprint| fingerprint.as_str().to_string())
}
