pub mod fingerprint;
pub mod submit;
pub mod validate;

mod run;

#[derive(Debug)]
pub enum Action {
    Fingerprint(fingerprint::Args),
    Validate(validate::Args),
    Submit(submit::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
