//! The `shinsa score`, `shinsa clear` and `shinsa present` commands.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use shinsa_core::model::Registration;
use shinsa_core::scoring::ScoreField;
use shinsa_core::service::GradingService;

async fn load_registration(service: &GradingService, id: &str) -> Result<Registration> {
    let snapshot = service.load().await?;
    snapshot
        .registration(id)
        .cloned()
        .ok_or_else(|| anyhow!("registration not found: {id}"))
}

pub async fn record(
    registration: String,
    field: String,
    value: String,
    config: Option<PathBuf>,
) -> Result<()> {
    let field: ScoreField = field.parse()?;
    let service = super::open_service(config)?;
    let mut reg = load_registration(&service, &registration).await?;

    let grade = service.record_score(&mut reg, field, &value).await?;
    if reg.scores().is_blank() {
        println!("{field} cleared; registration {} has no scores.", reg.id);
    } else {
        let verdict = if grade.pass { "PASS" } else { "FAIL" };
        println!(
            "{field} = {}; average {} ({verdict})",
            super::format_score(reg.scores().get(field)),
            grade.average
        );
    }
    Ok(())
}

pub async fn clear(registration: String, config: Option<PathBuf>) -> Result<()> {
    let service = super::open_service(config)?;
    let mut reg = load_registration(&service, &registration).await?;
    service.clear_scores(&mut reg).await?;
    println!("Cleared scores of registration {}", reg.id);
    Ok(())
}

pub async fn mark_present(exam: String, config: Option<PathBuf>) -> Result<()> {
    let service = super::open_service(config)?;
    let snapshot = service.load().await?;
    if snapshot.exam(&exam).is_none() {
        anyhow::bail!("exam not found: {exam}");
    }

    let outcome = service.mark_all_present(&snapshot, &exam).await;
    println!(
        "Marked {} of {} registration(s) present.",
        outcome.succeeded.len(),
        outcome.total()
    );
    for failure in &outcome.failed {
        println!("  {}: FAILED: {}", failure.id, failure.error);
    }
    if !outcome.is_complete() {
        anyhow::bail!("{} registration(s) were not updated", outcome.failed.len());
    }
    Ok(())
}
