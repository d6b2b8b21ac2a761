//! shinsa CLI — the operator's command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use shinsa_core::model::ExamPatch;

mod commands;

#[derive(Parser)]
#[command(
    name = "shinsa",
    version,
    about = "Dojo roster import and promotion exam grading"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and a sample roster
    Init,

    /// Import students from a comma- or semicolon-separated roster
    Import {
        /// Roster file (first line is a header)
        #[arg(long)]
        file: PathBuf,
    },

    /// Manage senseis
    Sensei {
        #[command(subcommand)]
        action: SenseiAction,
    },

    /// Edit or delete students
    Student {
        #[command(subcommand)]
        action: StudentAction,
    },

    /// Manage exams
    Exam {
        #[command(subcommand)]
        action: ExamAction,
    },

    /// Retarget or delete registrations
    Registration {
        #[command(subcommand)]
        action: RegistrationAction,
    },

    /// Enroll a student in an exam
    Enroll {
        /// Exam id
        #[arg(long)]
        exam: String,

        /// Student id
        #[arg(long)]
        student: String,

        /// Target rank (defaults to the rank after the student's current one)
        #[arg(long)]
        target: Option<String>,
    },

    /// Record one score of a registration (empty value clears it)
    Score {
        /// Registration id
        #[arg(long)]
        registration: String,

        /// kihon, kata1, kata2 or kumite
        #[arg(long)]
        field: String,

        /// Score between 0 and 10
        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },

    /// Clear every score of a registration
    Clear {
        /// Registration id
        #[arg(long)]
        registration: String,
    },

    /// Mark every registration of an exam present
    Present {
        /// Exam id
        #[arg(long)]
        exam: String,
    },

    /// Show the grading view
    Grades {
        /// Only this exam
        #[arg(long)]
        exam: Option<String>,

        /// Only this target rank
        #[arg(long)]
        rank: Option<String>,

        /// Only students of this sensei (id or name)
        #[arg(long)]
        sensei: Option<String>,

        /// Student name contains
        #[arg(long)]
        name: Option<String>,

        /// Sort key: name, rank, average
        #[arg(long, default_value = "name")]
        sort: String,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Show the enrollment view
    Students {
        /// Student name contains
        #[arg(long)]
        name: Option<String>,

        /// Only students of this sensei (id or name)
        #[arg(long)]
        sensei: Option<String>,

        /// Only this current rank
        #[arg(long)]
        rank: Option<String>,

        /// Only students not enrolled in this exam
        #[arg(long)]
        not_in: Option<String>,

        /// Sort key: name, rank
        #[arg(long, default_value = "name")]
        sort: String,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Summarize an exam
    Summary {
        /// Exam id
        #[arg(long)]
        exam: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SenseiAction {
    /// Add a sensei
    Add {
        #[arg(long)]
        name: String,
    },
    /// List senseis
    List,
}

#[derive(Subcommand)]
enum ExamAction {
    /// Schedule an exam
    Add {
        /// YYYY-MM-DD or DD/MM/YYYY
        #[arg(long)]
        date: String,

        #[arg(long, default_value = "")]
        time: String,

        #[arg(long)]
        location: String,
    },
    /// Edit a scheduled exam
    Edit {
        /// Exam id
        #[arg(long)]
        id: String,

        /// YYYY-MM-DD or DD/MM/YYYY
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        time: Option<String>,

        #[arg(long)]
        location: Option<String>,
    },
    /// List exams by date
    List,
}

#[derive(Subcommand)]
enum StudentAction {
    /// Edit a student's record
    Edit {
        /// Student id
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        cpf: Option<String>,

        /// M, F or Other
        #[arg(long)]
        sex: Option<String>,

        /// YYYY-MM-DD or DD/MM/YYYY
        #[arg(long)]
        birth_date: Option<String>,

        /// Current rank
        #[arg(long)]
        rank: Option<String>,

        /// Sensei id or name
        #[arg(long, conflicts_with = "no_sensei")]
        sensei: Option<String>,

        /// Remove the assigned sensei
        #[arg(long)]
        no_sensei: bool,
    },
    /// Delete students and their registrations
    Delete {
        /// Student id (repeatable)
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum RegistrationAction {
    /// Change the rank a registration attempts
    Retarget {
        /// Registration id
        #[arg(long)]
        id: String,

        #[arg(long)]
        target: String,
    },
    /// Delete registrations
    Delete {
        /// Registration id (repeatable)
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shinsa=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Import { file } => commands::import::execute(file, config).await,
        Commands::Sensei { action } => match action {
            SenseiAction::Add { name } => commands::roster::add_sensei(name, config).await,
            SenseiAction::List => commands::roster::list_senseis(config).await,
        },
        Commands::Exam { action } => match action {
            ExamAction::Add {
                date,
                time,
                location,
            } => commands::roster::add_exam(date, time, location, config).await,
            ExamAction::Edit {
                id,
                date,
                time,
                location,
            } => {
                let patch = ExamPatch {
                    date,
                    time,
                    location,
                };
                commands::roster::edit_exam(id, patch, config).await
            }
            ExamAction::List => commands::roster::list_exams(config).await,
        },
        Commands::Student { action } => match action {
            StudentAction::Edit {
                id,
                name,
                cpf,
                sex,
                birth_date,
                rank,
                sensei,
                no_sensei,
            } => commands::student::edit(
                commands::student::EditArgs {
                    id,
                    name,
                    cpf,
                    sex,
                    birth_date,
                    rank,
                    sensei,
                    no_sensei,
                },
                config,
            )
            .await,
            StudentAction::Delete { ids } => commands::student::delete(ids, config).await,
        },
        Commands::Registration { action } => match action {
            RegistrationAction::Retarget { id, target } => {
                commands::registration::retarget(id, target, config).await
            }
            RegistrationAction::Delete { ids } => {
                commands::registration::delete(ids, config).await
            }
        },
        Commands::Enroll {
            exam,
            student,
            target,
        } => commands::enroll::execute(exam, student, target, config).await,
        Commands::Score {
            registration,
            field,
            value,
        } => commands::score::record(registration, field, value, config).await,
        Commands::Clear { registration } => commands::score::clear(registration, config).await,
        Commands::Present { exam } => commands::score::mark_present(exam, config).await,
        Commands::Grades {
            exam,
            rank,
            sensei,
            name,
            sort,
            desc,
        } => commands::list::grades(
            commands::list::GradesArgs {
                exam,
                rank,
                sensei,
                name,
                sort,
                desc,
            },
            config,
        )
        .await,
        Commands::Students {
            name,
            sensei,
            rank,
            not_in,
            sort,
            desc,
        } => commands::list::students(
            commands::list::StudentsArgs {
                name,
                sensei,
                rank,
                not_in,
                sort,
                desc,
            },
            config,
        )
        .await,
        Commands::Summary { exam, json } => commands::list::summary(exam, json, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
