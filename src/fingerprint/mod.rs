//! Fingerprint generation: collect signals in a fixed order, join them with `|`, hash.
//!
//! Generation never fails. Each probe that cannot run is replaced by its sentinel, and
//! even an empty component list hashes to a full-width digest, so callers can treat the
//! returned [`Fingerprint`] as always present.

pub mod components;
pub mod digest;
pub mod profile;

pub use components::{
    ComponentError, FingerprintComponents, GpuInfo, ScreenGeometry, Signal, SignalSource,
    DELIMITER,
};
pub use digest::{DigestAlgorithm, Fingerprint, FingerprintError};
pub use profile::{ProfileError, SignalProfile};

use tracing::{debug, instrument};

/// Turns a [`SignalSource`] into a [`Fingerprint`].
#[derive(Debug, Clone)]
pub struct FingerprintGenerator<S> {
    source: S,
    algorithm: DigestAlgorithm,
}

impl<S: SignalSource> FingerprintGenerator<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            algorithm: DigestAlgorithm::default(),
        }
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub fn components(&self) -> FingerprintComponents {
        FingerprintComponents::collect(&self.source)
    }

    #[instrument(skip_all, fields(algorithm = %self.algorithm))]
    #[must_use]
    pub fn generate(&self) -> Fingerprint {
        let components = self.components();
        debug!(count = components.len(), "collected fingerprint components");
        Fingerprint::from_joined(&components.joined(), self.algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop_profile() -> SignalProfile {
        SignalProfile {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            screen: Some(ScreenGeometry {
                width: 1920,
                height: 1080,
                color_depth: 24,
            }),
            time_zone: "Asia/Kolkata".to_string(),
            utc_offset_minutes: -330,
            language: "en-US".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
            platform: "Win32".to_string(),
            hardware_concurrency: Some(8),
            device_memory: Some(8.0),
            canvas: Some("data:image/png;base64,iVBORw0KGgo".to_string()),
            gpu: Some(GpuInfo {
                vendor: "Google Inc. (NVIDIA)".to_string(),
                renderer: "ANGLE (NVIDIA GeForce GTX 1650)".to_string(),
            }),
            audio: Some("1024".to_string()),
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let generator = FingerprintGenerator::new(desktop_profile());
        let first = generator.generate();
        let second = generator.generate();
        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
    }

    #[test]
    fn digest_matches_hash_of_joined_components() {
        let generator = FingerprintGenerator::new(desktop_profile());
        let joined = generator.components().joined();
        assert!(joined.starts_with("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36|1920x1080x24|Asia/Kolkata|-330|en-US|en-US,en|Win32|8|8|"));
        assert!(joined.ends_with("|Google Inc. (NVIDIA)|ANGLE (NVIDIA GeForce GTX 1650)|1024"));
        assert_eq!(
            generator.generate().as_str(),
            DigestAlgorithm::Sha256.hash(&joined)
        );
    }

    #[test]
    fn all_sentinels_still_produce_full_width_digest() {
        for algorithm in [DigestAlgorithm::Sha256, DigestAlgorithm::Legacy] {
            let fingerprint =
                FingerprintGenerator::new(SignalProfile::default()).with_algorithm(algorithm);
            let digest = fingerprint.generate();
            assert_eq!(digest.as_str().len(), algorithm.width());
            assert!(digest.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn empty_component_list_still_hashes() {
        let empty = FingerprintComponents::default();
        assert!(empty.is_empty());
        let digest = Fingerprint::from_joined(&empty.joined(), DigestAlgorithm::Sha256);
        assert!(!digest.as_str().is_empty());
    }

    #[test]
    fn reordering_components_changes_digest() {
        let generator = FingerprintGenerator::new(desktop_profile());
        let ordered: Vec<String> = generator.components().iter().map(str::to_string).collect();
        let mut swapped = ordered.clone();
        swapped.swap(0, 1);

        let ordered = Fingerprint::from_joined(
            &FingerprintComponents::from_values(ordered).joined(),
            DigestAlgorithm::Sha256,
        );
        let reordered = Fingerprint::from_joined(
            &FingerprintComponents::from_values(swapped).joined(),
            DigestAlgorithm::Sha256,
        );
        assert_ne!(ordered, reordered);
        assert_eq!(ordered, generator.generate());
    }

    #[test]
    fn legacy_fallback_is_deterministic() {
        let generator =
            FingerprintGenerator::new(desktop_profile()).with_algorithm(DigestAlgorithm::Legacy);
        assert_eq!(generator.generate(), generator.generate());
        assert_eq!(generator.generate().as_str().len(), 32);
        assert_eq!(generator.generate().algorithm(), DigestAlgorithm::Legacy);
    }

    #[test]
    fn any_signal_change_changes_digest() {
        let baseline = FingerprintGenerator::new(desktop_profile()).generate();
        let mut moved = desktop_profile();
        moved.utc_offset_minutes = 60;
        assert_ne!(baseline, FingerprintGenerator::new(moved).generate());
    }
}
