//! The `shinsa enroll` command.

use std::path::PathBuf;

use anyhow::Result;

pub async fn execute(
    exam: String,
    student: String,
    target: Option<String>,
    config: Option<PathBuf>,
) -> Result<()> {
    let service = super::open_service(config)?;
    let target = target
        .map(|raw| super::parse_rank(service.ranks(), &raw))
        .transpose()?;

    let snapshot = service.load().await?;
    let registration = service.enroll(&snapshot, &student, &exam, target).await?;
    println!(
        "Enrolled {} for {} (registration {})",
        registration.student_id, registration.target_rank, registration.id
    );
    Ok(())
}
