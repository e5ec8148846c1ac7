use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("fingerprint is empty")]
    Empty,
    #[error("fingerprint must be {expected} hex characters, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("fingerprint contains non-hex characters")]
    NotHex,
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Hash applied to the joined components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    /// 32-bit multiply-add rolling hash. Weak, kept to match fingerprints already on
    /// file that were produced without a real digest.
    Legacy,
}

impl DigestAlgorithm {
    /// Width of the hex digest in characters.
    #[must_use]
    pub fn width(self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 64,
            DigestAlgorithm::Legacy => 32,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Legacy => "legacy",
        }
    }

    /// Picks the requested algorithm, or the legacy hash when this build does not
    /// provide it.
    #[must_use]
    pub fn negotiate(requested: &str) -> Self {
        requested.parse().unwrap_or_else(|err| {
            warn!("{err}; falling back to the legacy rolling hash");
            DigestAlgorithm::Legacy
        })
    }

    #[must_use]
    pub fn hash(self, input: &str) -> String {
        match self {
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(input.as_bytes())),
            DigestAlgorithm::Legacy => legacy_hash(input),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = FingerprintError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            "legacy" | "rolling" => Ok(DigestAlgorithm::Legacy),
            other => Err(FingerprintError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// `h = h * 31 + unit` over UTF-16 code units with 32-bit wrap, absolute value,
/// zero-padded to 32 hex characters.
fn legacy_hash(input: &str) -> String {
    let hash = input
        .encode_utf16()
        .fold(0_i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        });
    format!("{:032x}", hash.unsigned_abs())
}

/// Hex digest identifying a browser. Always non-empty and fixed-width for its algorithm.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint {
    value: String,
    #[serde(skip)]
    algorithm: DigestAlgorithm,
}

impl Fingerprint {
    /// Hashes already-joined components.
    #[must_use]
    pub fn from_joined(joined: &str, algorithm: DigestAlgorithm) -> Self {
        Self {
            value: algorithm.hash(joined),
            algorithm,
        }
    }

    /// Accepts a previously issued digest of either width, e.g. from session storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty, not hex, or of an unknown width.
    pub fn parse(value: &str) -> Result<Self, FingerprintError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(FingerprintError::Empty);
        }
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(FingerprintError::NotHex);
        }
        let algorithm = match value.len() {
            64 => DigestAlgorithm::Sha256,
            32 => DigestAlgorithm::Legacy,
            actual => {
                return Err(FingerprintError::Length {
                    expected: DigestAlgorithm::Sha256.width(),
                    actual,
                })
            }
        };

        Ok(Self {
            value: value.to_ascii_lowercase(),
            algorithm,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.value)
    }
}

// Keep full identifiers out of logs.
impl fmt::Debug for Fingerprint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.value.chars().take(8).collect();
        write!(formatter, "Fingerprint({}:{prefix}…)", self.algorithm)
    }
}
