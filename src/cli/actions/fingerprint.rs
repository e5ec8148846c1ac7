use crate::fingerprint::{DigestAlgorithm, FingerprintGenerator, SignalProfile};
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug)]
pub struct Args {
    pub profile: PathBuf,
    pub digest: DigestAlgorithm,
    pub components: bool,
}

/// Print the digest for a recorded profile, optionally preceded by its components.
/// # Errors
/// Returns an error if the profile cannot be loaded.
pub fn execute(args: &Args) -> Result<()> {
    let profile = SignalProfile::from_path(&args.profile)
        .with_context(|| format!("could not load profile {}", args.profile.display()))?;

    println!("{}", render(profile, args.digest, args.components));

    Ok(())
}

fn render(profile: SignalProfile, digest: DigestAlgorithm, components: bool) -> String {
    let generator = FingerprintGenerator::new(profile).with_algorithm(digest);
    let fingerprint = generator.generate();

    if !components {
        return fingerprint.to_string();
    }

    let mut lines: Vec<String> = generator
        .components()
        .iter()
        .enumerate()
        .map(|(index, value)| format!("{index:>2} {value}"))
        .collect();
    lines.push(format!("{digest} {fingerprint}"));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_digest_only() {
        let output = render(SignalProfile::default(), DigestAlgorithm::Sha256, false);
        assert_eq!(output.len(), 64);
        assert!(output.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_render_with_components() {
        let output = render(SignalProfile::default(), DigestAlgorithm::Legacy, true);
        let lines: Vec<&str> = output.lines().collect();

        // eleven components without a gpu entry, plus the digest line
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[3], " 3 0");
        assert_eq!(lines[9], " 9 canvas-error");
        assert!(lines[11].starts_with("legacy "));
    }
}
