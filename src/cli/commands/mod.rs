use crate::fingerprint::DigestAlgorithm;
use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ArgGroup, ColorChoice, Command,
};
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_FALLBACK_NAME: &str = "report.xlsx";

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 4 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn validator_digest() -> ValueParser {
    ValueParser::from(move |digest: &str| -> std::result::Result<DigestAlgorithm, String> {
        digest.parse::<DigestAlgorithm>().map_err(|err| err.to_string())
    })
}

/// `name=value` pairs for `--field`.
pub fn validator_key_value() -> ValueParser {
    ValueParser::from(move |pair: &str| -> std::result::Result<(String, String), String> {
        split_pair(pair).map(|(key, value)| (key.to_string(), value.to_string()))
    })
}

/// `field=path` pairs for `--file`.
pub fn validator_file_part() -> ValueParser {
    ValueParser::from(move |pair: &str| -> std::result::Result<(String, PathBuf), String> {
        split_pair(pair).map(|(key, value)| (key.to_string(), PathBuf::from(value)))
    })
}

fn split_pair(pair: &str) -> std::result::Result<(&str, &str), String> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => Err(format!("expected name=value, got '{pair}'")),
    }
}

fn digest_arg() -> Arg {
    Arg::new("digest")
        .long("digest")
        .help("Digest algorithm: sha256 or legacy")
        .default_value("sha256")
        .value_parser(validator_digest())
}

fn profile_arg() -> Arg {
    Arg::new("profile")
        .long("profile")
        .help("Recorded browser signals (JSON)")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
}

fn fingerprint_command() -> Command {
    Command::new("fingerprint")
        .about("Compute the fingerprint a browser profile produces")
        .arg(profile_arg())
        .arg(digest_arg())
        .arg(
            Arg::new("components")
                .long("components")
                .help("Also print the ordered components")
                .action(ArgAction::SetTrue),
        )
}

fn validate_command() -> Command {
    Command::new("validate")
        .about("Run the login and verification page gates against the server")
        .arg(profile_arg())
        .arg(
            Arg::new("otp-profile")
                .long("otp-profile")
                .help("Profile for the verification page, defaults to --profile")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(digest_arg())
}

fn submit_command() -> Command {
    Command::new("submit")
        .about("Submit an evidence form and save the generated report")
        .arg(
            Arg::new("route")
                .long("route")
                .help("Evidence route, example: /process_firewall_evidence")
                .required(true),
        )
        .arg(
            Arg::new("field")
                .long("field")
                .help("Form field as name=value, repeatable")
                .action(ArgAction::Append)
                .value_parser(validator_key_value()),
        )
        .arg(
            Arg::new("file")
                .long("file")
                .help("File part as field=path, repeatable")
                .action(ArgAction::Append)
                .value_parser(validator_file_part()),
        )
        .arg(
            Arg::new("fallback-name")
                .long("fallback-name")
                .help("Report name used when the server does not send one")
                .default_value(DEFAULT_FALLBACK_NAME),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Directory the report is written to")
                .default_value(".")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .group(
            ArgGroup::new("parts")
                .args(["field", "file"])
                .multiple(true)
                .required(true),
        )
}

pub fn new() -> Command {
    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("auditgate")
        .about("Browser fingerprint session binding for the audit evidence dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .help("Dashboard origin")
                .default_value(DEFAULT_BASE_URL)
                .env("AUDITGATE_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .help("Request timeout in seconds")
                .default_value("10")
                .env("AUDITGATE_TIMEOUT")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("AUDITGATE_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(fingerprint_command())
        .subcommand(validate_command())
        .subcommand(submit_command())
}
