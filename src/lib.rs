//! # Auditgate (browser session binding)
//!
//! `auditgate` binds a dashboard login to the browser that started it. Each gated page
//! derives a fingerprint from browser signals, asks the server whether that fingerprint
//! is authorized, and only renders on an explicit yes.
//!
//! ## Login -> OTP flow
//!
//! 1. **Login page:** signals are collected in a fixed order, joined with `|` and hashed.
//!    Content stays hidden while `POST /validate_fingerprint` is in flight.
//! 2. **Accepted:** content is revealed, the hidden `browser_fingerprint` form field is
//!    populated and the value is cached in tab-scoped session storage.
//! 3. **Verification page:** the cached value is reused as-is, so randomized probes from
//!    hardened browsers cannot cause a mismatch between the two steps.
//!
//! Every other outcome redirects to the rejection page without telling the client why.
//! The trust decision itself lives on the server.

pub mod config;
pub mod evidence;
pub mod fingerprint;
pub mod gate;

#[cfg(target_arch = "wasm32")]
pub mod browser;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub use config::GateConfig;
pub use fingerprint::{
    DigestAlgorithm, Fingerprint, FingerprintComponents, FingerprintGenerator, SignalProfile,
    SignalSource,
};
pub use gate::{Gate, GateState, PageKind, Rejection};
