//! The `shinsa sensei` and `shinsa exam` commands.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use shinsa_core::model::ExamPatch;
use shinsa_core::query::RosterQueryEngine;

pub async fn add_sensei(name: String, config: Option<PathBuf>) -> Result<()> {
    let service = super::open_service(config)?;
    let sensei = service.add_sensei(&name).await?;
    println!("Added sensei {} ({})", sensei.name, sensei.id);
    Ok(())
}

pub async fn list_senseis(config: Option<PathBuf>) -> Result<()> {
    let service = super::open_service(config)?;
    let snapshot = service.load().await?;
    let engine = RosterQueryEngine::new(&snapshot, service.ranks());

    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Students"]);
    for sensei in engine.senseis() {
        let students = snapshot
            .students
            .iter()
            .filter(|s| s.sensei_id.as_deref() == Some(sensei.id.as_str()))
            .count();
        table.add_row(vec![
            Cell::new(&sensei.id),
            Cell::new(&sensei.name),
            Cell::new(students),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn add_exam(
    date: String,
    time: String,
    location: String,
    config: Option<PathBuf>,
) -> Result<()> {
    let service = super::open_service(config)?;
    let exam = service.schedule_exam(&date, &time, &location).await?;
    println!(
        "Scheduled exam {} on {} at {} ({})",
        exam.id, exam.date, exam.location, exam.time
    );
    Ok(())
}

pub async fn edit_exam(id: String, patch: ExamPatch, config: Option<PathBuf>) -> Result<()> {
    if patch == ExamPatch::default() {
        anyhow::bail!("nothing to change; pass --date, --time or --location");
    }
    let service = super::open_service(config)?;
    let exam = service.edit_exam(&id, patch).await?;
    println!(
        "Updated exam {} on {} at {} ({})",
        exam.id, exam.date, exam.location, exam.time
    );
    Ok(())
}

pub async fn list_exams(config: Option<PathBuf>) -> Result<()> {
    let service = super::open_service(config)?;
    let snapshot = service.load().await?;
    let engine = RosterQueryEngine::new(&snapshot, service.ranks());

    let mut table = Table::new();
    table.set_header(vec!["Id", "Date", "Time", "Location", "Enrolled"]);
    for exam in engine.exams() {
        let enrolled = snapshot.registrations_for_exam(&exam.id).count();
        table.add_row(vec![
            Cell::new(&exam.id),
            Cell::new(&exam.date),
            Cell::new(&exam.time),
            Cell::new(&exam.location),
            Cell::new(enrolled),
        ]);
    }
    println!("{table}");
    Ok(())
}
