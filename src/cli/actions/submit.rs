use crate::{
    cli::globals::GlobalArgs,
    evidence::{EvidenceClient, EvidenceSubmission},
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub submission: EvidenceSubmission,
    pub output: PathBuf,
}

/// Submit one evidence form and write the returned report into the output directory.
/// # Errors
/// Returns an error if the submission fails or the report cannot be written.
pub async fn execute(args: Args) -> Result<()> {
    let client = EvidenceClient::new(args.globals.base_url.clone(), args.globals.timeout)?;
    let report = client.submit(&args.submission).await?;

    let path = args
        .output
        .join(local_name(&report.filename, &args.submission.fallback_name));

    tokio::fs::create_dir_all(&args.output)
        .await
        .with_context(|| format!("could not create {}", args.output.display()))?;
    tokio::fs::write(&path, &report.bytes)
        .await
        .with_context(|| format!("could not write {}", path.display()))?;

    info!(size = report.bytes.len(), path = %path.display(), "report saved");
    println!("{}", path.display());

    Ok(())
}

/// Server-supplied names may carry directories; only the last component is kept.
fn local_name<'a>(filename: &'a str, fallback: &'a str) -> &'a str {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback)
}
