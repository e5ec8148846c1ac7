use crate::cli::actions::{fingerprint, submit, validate, Action};
use anyhow::Result;

/// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Fingerprint(args) => fingerprint::execute(&args),
        Action::Validate(args) => validate::execute(args).await,
        Action::Submit(args) => submit::execute(args).await,
    }
}
