use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use student_score_dashboard::config::{RecordSource, SourceArgs, DEFAULT_LOG_FILTER};
use student_score_dashboard::{
    db, identity, report, RecordStore, Session, StudentLookup, StudentViewModel,
};

#[derive(Parser)]
#[command(name = "student-score-dashboard")]
#[command(about = "Per-student score dashboard built from assessment exports", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the Postgres mirror schema
    InitDb,
    /// Replace the Postgres mirror with the given CSV exports
    Import,
    /// Check whether an identifier appears in either feed
    Check {
        #[arg(long)]
        email: String,
    },
    /// Print the dashboard view model for a student
    View {
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Write a markdown dashboard report for a student
    Report {
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Show question-level detail for one assessment attempt
    Detail {
        #[arg(long)]
        email: String,
        #[arg(long)]
        assessment: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },
}

async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

async fn load_session(source: SourceArgs) -> anyhow::Result<Session> {
    let store = match source.resolve()? {
        RecordSource::Csv {
            assessments,
            questions,
        } => RecordStore::load_csv(&assessments, &questions)
            .await
            .context("failed to load dashboard exports")?,
        RecordSource::Postgres { database_url } => {
            let pool = connect(&database_url).await?;
            db::fetch_store(&pool)
                .await
                .context("failed to load dashboard feeds from Postgres")?
        }
    };
    Ok(Session::new(store))
}

fn require_view(session: &Session, student_id: &str) -> Option<Box<StudentViewModel>> {
    match session.lookup(student_id) {
        StudentLookup::Found(view) => Some(view),
        StudentLookup::NoData => {
            println!("No data found for {student_id}.");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let database_url = cli
                .source
                .database_url
                .context("DATABASE_URL must be set to a Postgres instance")?;
            let pool = connect(&database_url).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Import => {
            let (Some(assessments), Some(questions)) =
                (cli.source.assessments.as_deref(), cli.source.questions.as_deref())
            else {
                anyhow::bail!("import needs both --assessments and --questions");
            };
            let database_url = cli
                .source
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set to a Postgres instance")?;
            let pool = connect(database_url).await?;
            let summary = db::import_csv(&pool, assessments, questions).await?;
            println!(
                "Imported {} assessment rows and {} question rows.",
                summary.assessments, summary.questions
            );
        }
        Commands::Check { email } => {
            let student_id = identity::validate_identifier(&email)?;
            let session = load_session(cli.source).await?;
            if identity::identifier_exists(session.store(), &student_id) {
                println!("{student_id} found.");
            } else {
                println!("{student_id} not found in our records.");
            }
        }
        Commands::View { email, format } => {
            let student_id = identity::validate_identifier(&email)?;
            let session = load_session(cli.source).await?;
            let Some(view) = require_view(&session, &student_id) else {
                return Ok(());
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                OutputFormat::Markdown => print!("{}", report::build_report(&view)),
            }
        }
        Commands::Report { email, out } => {
            let student_id = identity::validate_identifier(&email)?;
            let session = load_session(cli.source).await?;
            let Some(view) = require_view(&session, &student_id) else {
                return Ok(());
            };
            std::fs::write(&out, report::build_report(&view))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Detail {
            email,
            assessment,
            format,
        } => {
            let student_id = identity::validate_identifier(&email)?;
            let session = load_session(cli.source).await?;
            let detail = session.assessment_detail(&student_id, &assessment);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&detail)?),
                OutputFormat::Markdown => print!("{}", report::build_detail_report(&detail)),
            }
        }
    }

    Ok(())
}
