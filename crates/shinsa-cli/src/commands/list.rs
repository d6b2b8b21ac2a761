//! The `shinsa grades`, `shinsa students` and `shinsa summary` commands.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use comfy_table::{Cell, Table};

use shinsa_core::query::{
    RegistrationQuery, RegistrationSortKey, RosterQueryEngine, SortDirection, SortSpec,
    StudentQuery, StudentSortKey,
};

pub struct GradesArgs {
    pub exam: Option<String>,
    pub rank: Option<String>,
    pub sensei: Option<String>,
    pub name: Option<String>,
    pub sort: String,
    pub desc: bool,
}

pub struct StudentsArgs {
    pub name: Option<String>,
    pub sensei: Option<String>,
    pub rank: Option<String>,
    pub not_in: Option<String>,
    pub sort: String,
    pub desc: bool,
}

fn direction(desc: bool) -> SortDirection {
    if desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    }
}

pub async fn grades(args: GradesArgs, config: Option<PathBuf>) -> Result<()> {
    let key: RegistrationSortKey = args.sort.parse().map_err(|e: String| anyhow!(e))?;
    let service = super::open_service(config)?;
    let snapshot = service.load().await?;
    let ranks = service.ranks();

    let query = RegistrationQuery {
        exam_id: args.exam,
        rank: args
            .rank
            .map(|raw| super::parse_rank(ranks, &raw))
            .transpose()?,
        sensei_id: args
            .sensei
            .map(|raw| super::resolve_sensei_id(&snapshot, &raw))
            .transpose()?,
        name_contains: args.name,
        sort: SortSpec {
            key,
            direction: direction(args.desc),
        },
    };
    let rows = RosterQueryEngine::new(&snapshot, ranks).registrations(&query);

    let mut table = Table::new();
    table.set_header(vec![
        "Registration",
        "Student",
        "Sensei",
        "Current",
        "Target",
        "Kihon",
        "Kata 1",
        "Kata 2",
        "Kumite",
        "Average",
        "Result",
        "Present",
    ]);
    for row in &rows {
        let reg = &row.registration;
        let scores = reg.scores();
        let result = match reg.average() {
            None => "",
            Some(_) if reg.passed() => "PASS",
            Some(_) => "FAIL",
        };
        table.add_row(vec![
            Cell::new(&reg.id),
            Cell::new(&row.student_name),
            Cell::new(row.sensei_name.as_deref().unwrap_or("")),
            Cell::new(row.current_rank),
            Cell::new(reg.target_rank),
            Cell::new(super::format_score(scores.kihon)),
            Cell::new(super::format_score(scores.kata1)),
            Cell::new(super::format_score(scores.kata2)),
            Cell::new(super::format_score(scores.kumite)),
            Cell::new(super::format_score(reg.average())),
            Cell::new(result),
            Cell::new(if reg.is_present() { "yes" } else { "" }),
        ]);
    }
    println!("{table}");
    println!("{} registration(s)", rows.len());
    Ok(())
}

pub async fn students(args: StudentsArgs, config: Option<PathBuf>) -> Result<()> {
    let key: StudentSortKey = args.sort.parse().map_err(|e: String| anyhow!(e))?;
    let service = super::open_service(config)?;
    let snapshot = service.load().await?;
    let ranks = service.ranks();

    let query = StudentQuery {
        name_contains: args.name,
        sensei_id: args
            .sensei
            .map(|raw| super::resolve_sensei_id(&snapshot, &raw))
            .transpose()?,
        rank: args
            .rank
            .map(|raw| super::parse_rank(ranks, &raw))
            .transpose()?,
        not_enrolled_in: args.not_in,
        sort: SortSpec {
            key,
            direction: direction(args.desc),
        },
    };
    let rows = RosterQueryEngine::new(&snapshot, ranks).students(&query);

    let mut table = Table::new();
    table.set_header(vec!["Id", "Name", "Rank", "Sensei", "Birth date"]);
    for row in &rows {
        table.add_row(vec![
            Cell::new(&row.student.id),
            Cell::new(&row.student.name),
            Cell::new(row.student.current_rank),
            Cell::new(row.sensei_name.as_deref().unwrap_or("")),
            Cell::new(row.student.birth_date.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}");
    println!("{} student(s)", rows.len());
    Ok(())
}

pub async fn summary(exam: String, json: bool, config: Option<PathBuf>) -> Result<()> {
    let service = super::open_service(config)?;
    let snapshot = service.load().await?;
    let exam = snapshot
        .exam(&exam)
        .ok_or_else(|| anyhow!("exam not found: {exam}"))?;
    let summary = RosterQueryEngine::new(&snapshot, service.ranks()).summarize_exam(&exam.id);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Exam {} on {} at {}", exam.id, exam.date, exam.location);
    let mut table = Table::new();
    table.set_header(vec![
        "Enrolled", "Present", "Graded", "Passed", "Failed", "Mean",
    ]);
    table.add_row(vec![
        Cell::new(summary.enrolled),
        Cell::new(summary.present),
        Cell::new(summary.graded),
        Cell::new(summary.passed),
        Cell::new(summary.failed),
        Cell::new(super::format_score(summary.mean_average)),
    ]);
    println!("{table}");
    Ok(())
}
