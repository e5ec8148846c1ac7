use crate::{
    cli::{
        actions::{fingerprint, submit, validate, Action},
        commands::{DEFAULT_BASE_URL, DEFAULT_FALLBACK_NAME},
        globals::GlobalArgs,
    },
    evidence::EvidenceSubmission,
    fingerprint::DigestAlgorithm,
};
use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use std::{path::PathBuf, time::Duration};

fn globals(matches: &ArgMatches) -> GlobalArgs {
    let base_url = matches
        .get_one::<String>("base-url")
        .cloned()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout = matches.get_one::<u64>("timeout").copied().unwrap_or(10);

    GlobalArgs::new(base_url, Duration::from_secs(timeout))
}

fn digest(matches: &ArgMatches) -> DigestAlgorithm {
    matches
        .get_one::<DigestAlgorithm>("digest")
        .copied()
        .unwrap_or_default()
}

fn profile(matches: &ArgMatches) -> Result<PathBuf> {
    matches
        .get_one::<PathBuf>("profile")
        .cloned()
        .context("missing required argument: --profile")
}

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some(("fingerprint", sub)) => Ok(Action::Fingerprint(fingerprint::Args {
            profile: profile(sub)?,
            digest: digest(sub),
            components: sub.get_flag("components"),
        })),
        Some(("validate", sub)) => Ok(Action::Validate(validate::Args {
            globals: globals(sub),
            profile: profile(sub)?,
            otp_profile: sub.get_one::<PathBuf>("otp-profile").cloned(),
            digest: digest(sub),
        })),
        Some(("submit", sub)) => {
            let route = sub
                .get_one::<String>("route")
                .cloned()
                .context("missing required argument: --route")?;
            let fallback_name = sub
                .get_one::<String>("fallback-name")
                .cloned()
                .unwrap_or_else(|| DEFAULT_FALLBACK_NAME.to_string());

            let mut submission = EvidenceSubmission::new(route, fallback_name);
            for (name, value) in sub
                .get_many::<(String, String)>("field")
                .into_iter()
                .flatten()
            {
                submission = submission.field(name.clone(), value.clone());
            }
            for (field, path) in sub
                .get_many::<(String, PathBuf)>("file")
                .into_iter()
                .flatten()
            {
                submission = submission.file(field.clone(), path.clone());
            }

            Ok(Action::Submit(submit::Args {
                globals: globals(sub),
                submission,
                output: sub
                    .get_one::<PathBuf>("output")
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from(".")),
            }))
        }
        _ => Err(anyhow!("no subcommand given")),
    }
}
