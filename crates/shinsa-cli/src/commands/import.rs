//! The `shinsa import` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub async fn execute(file: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read roster: {}", file.display()))?;
    let service = super::open_service(config)?;

    let outcome = service
        .import_roster(&text)
        .await
        .context("roster import failed, no students were stored")?;

    println!(
        "Imported {} student(s), skipped {} row(s).",
        outcome.students.len(),
        outcome.skipped
    );
    for warning in &outcome.warnings {
        println!("  line {}: WARNING: {}", warning.line, warning.message);
    }
    Ok(())
}
