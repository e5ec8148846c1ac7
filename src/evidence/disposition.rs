//! Report naming and error extraction for evidence responses.

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Shown when the server gives no usable error text.
pub const GENERIC_FAILURE: &str = "An error occurred during report generation. Please try again.";

fn filename_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"filename[^;]*=([^;]*)").ok())
        .as_ref()
}

/// Filename from a `Content-Disposition` value: the first `filename...=` parameter,
/// trimmed, with one surrounding quote stripped on each side.
#[must_use]
pub fn disposition_filename(header: &str) -> Option<String> {
    let captures = filename_pattern()?.captures(header)?;
    let raw = captures.get(1)?.as_str().trim();
    let raw = raw
        .strip_prefix(['"', '\''])
        .unwrap_or(raw);
    let raw = raw.strip_suffix(['"', '\'']).unwrap_or(raw).trim();

    if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Picks the download name: `X-Filename`, then `Content-Disposition`, then `fallback`.
#[must_use]
pub fn report_filename(
    x_filename: Option<&str>,
    content_disposition: Option<&str>,
    fallback: &str,
) -> String {
    x_filename
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| content_disposition.and_then(disposition_filename))
        .unwrap_or_else(|| fallback.to_string())
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Error text from a failed submission. Non-JSON bodies (HTML flash pages) are not
/// shown to the user.
#[must_use]
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error.or(body.message))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_and_bare_filenames() {
        assert_eq!(
            disposition_filename(r#"attachment; filename="Network Review.xlsx""#),
            Some("Network Review.xlsx".to_string())
        );
        assert_eq!(
            disposition_filename("attachment; filename=Network Review.xlsx"),
            Some("Network Review.xlsx".to_string())
        );
        assert_eq!(
            disposition_filename("attachment; filename='Firewall.xlsx'; size=10"),
            Some("Firewall.xlsx".to_string())
        );
    }

    #[test]
    fn missing_or_blank_filename() {
        assert_eq!(disposition_filename("attachment"), None);
        assert_eq!(disposition_filename(r#"attachment; filename="""#), None);
        assert_eq!(disposition_filename("attachment; filename=   "), None);
    }

    #[test]
    fn first_parameter_wins() {
        assert_eq!(
            disposition_filename(r#"attachment; filename="SAN.xlsx"; filename*=UTF-8''SAN%20Review.xlsx"#),
            Some("SAN.xlsx".to_string())
        );
    }

    #[test]
    fn report_filename_precedence() {
        assert_eq!(
            report_filename(
                Some("combined_scan_results.xlsx"),
                Some(r#"attachment; filename="ignored.xlsx""#),
                "fallback.xlsx"
            ),
            "combined_scan_results.xlsx"
        );
        assert_eq!(
            report_filename(Some("  "), Some(r#"attachment; filename="ATM.xlsx""#), "fallback.xlsx"),
            "ATM.xlsx"
        );
        assert_eq!(
            report_filename(None, Some("inline"), "Disaster Recovery Review.xlsx"),
            "Disaster Recovery Review.xlsx"
        );
        assert_eq!(report_filename(None, None, "Router.xlsx"), "Router.xlsx");
    }

    #[test]
    fn error_message_prefers_error_then_message() {
        assert_eq!(
            error_message(r#"{"error": "Missing evidence file"}"#),
            "Missing evidence file"
        );
        assert_eq!(
            error_message(r#"{"message": "Unsupported sheet"}"#),
            "Unsupported sheet"
        );
        assert_eq!(
            error_message(r#"{"error": "first", "message": "second"}"#),
            "first"
        );
    }

    #[test]
    fn error_message_falls_back_to_generic() {
        assert_eq!(error_message("<html>error</html>"), GENERIC_FAILURE);
        assert_eq!(error_message(r#"{"error": ""}"#), GENERIC_FAILURE);
        assert_eq!(error_message(r#"{"status": "failed"}"#), GENERIC_FAILURE);
        assert_eq!(error_message(""), GENERIC_FAILURE);
    }
}
