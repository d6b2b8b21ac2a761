//! The `shinsa student` commands.

use std::path::PathBuf;

use anyhow::Result;

use shinsa_core::model::StudentPatch;
use shinsa_core::normalize::normalize_sex;

pub struct EditArgs {
    pub id: String,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<String>,
    pub rank: Option<String>,
    pub sensei: Option<String>,
    pub no_sensei: bool,
}

pub async fn edit(args: EditArgs, config: Option<PathBuf>) -> Result<()> {
    let service = super::open_service(config)?;
    let snapshot = service.load().await?;

    let sensei_id = match (args.sensei, args.no_sensei) {
        (_, true) => Some(None),
        (Some(raw), false) => Some(Some(super::resolve_sensei_id(&snapshot, &raw)?)),
        (None, false) => None,
    };
    let patch = StudentPatch {
        name: args.name,
        cpf: args.cpf,
        sex: args.sex.as_deref().map(normalize_sex),
        birth_date: args.birth_date,
        current_rank: args
            .rank
            .map(|raw| super::parse_rank(service.ranks(), &raw))
            .transpose()?,
        sensei_id,
    };
    if patch == StudentPatch::default() {
        anyhow::bail!("nothing to change; pass at least one field");
    }

    let student = service.edit_student(&args.id, patch).await?;
    println!(
        "Updated student {} ({}, {})",
        student.name, student.id, student.current_rank
    );
    Ok(())
}

pub async fn delete(ids: Vec<String>, config: Option<PathBuf>) -> Result<()> {
    let service = super::open_service(config)?;
    let outcome = service.delete_students(ids).await;
    println!(
        "Deleted {} of {} student(s) and their registrations.",
        outcome.succeeded.len(),
        outcome.total()
    );
    for failure in &outcome.failed {
        println!("  {}: FAILED: {}", failure.id, failure.error);
    }
    if !outcome.is_complete() {
        anyhow::bail!("{} student(s) were not deleted", outcome.failed.len());
    }
    Ok(())
}
