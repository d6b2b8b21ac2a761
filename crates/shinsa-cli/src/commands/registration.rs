//! The `shinsa registration` commands.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

pub async fn retarget(id: String, target: String, config: Option<PathBuf>) -> Result<()> {
    let service = super::open_service(config)?;
    let target = super::parse_rank(service.ranks(), &target)?;
    let mut reg = service
        .load()
        .await?
        .registration(&id)
        .cloned()
        .ok_or_else(|| anyhow!("registration not found: {id}"))?;

    service.retarget(&mut reg, target).await?;
    println!("Registration {} now attempts {}", reg.id, reg.target_rank);
    Ok(())
}

pub async fn delete(ids: Vec<String>, config: Option<PathBuf>) -> Result<()> {
    let service = super::open_service(config)?;
    let outcome = service.delete_registrations(ids).await;
    println!(
        "Deleted {} of {} registration(s).",
        outcome.succeeded.len(),
        outcome.total()
    );
    for failure in &outcome.failed {
        println!("  {}: FAILED: {}", failure.id, failure.error);
    }
    if !outcome.is_complete() {
        anyhow::bail!("{} registration(s) were not deleted", outcome.failed.len());
    }
    Ok(())
}
