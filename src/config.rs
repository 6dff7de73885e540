use std::path::PathBuf;

use clap::Args;
use thiserror::Error;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "student_score_dashboard=info";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no record source configured: pass --assessments and --questions, or set DATABASE_URL")]
    NoSource,
}

/// Where the two feeds come from. CSV paths win over the database.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Aggregated assessment export
    #[arg(long, env = "DASHBOARD_ASSESSMENTS_CSV", requires = "questions")]
    pub assessments: Option<PathBuf>,
    /// Per-question detail export
    #[arg(long, env = "DASHBOARD_QUESTIONS_CSV", requires = "assessments")]
    pub questions: Option<PathBuf>,
    /// Postgres mirror populated by `import`
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSource {
    Csv {
        assessments: PathBuf,
        questions: PathBuf,
    },
    Postgres {
        database_url: String,
    },
}

impl SourceArgs {
    pub fn resolve(self) -> Result<RecordSource, ConfigError> {
        match (self.assessments, self.questions, self.database_url) {
            (Some(assessments), Some(questions), _) => Ok(RecordSource::Csv {
                assessments,
                questions,
            }),
            (_, _, Some(database_url)) => Ok(RecordSource::Postgres { database_url }),
            _ => Err(ConfigError::NoSource),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_paths_take_precedence() {
        let args = SourceArgs {
            assessments: Some("a.csv".into()),
            questions: Some("q.csv".into()),
            database_url: Some("postgres://localhost/dash".to_string()),
        };
        assert_eq!(
            args.resolve(),
            Ok(RecordSource::Csv {
                assessments: "a.csv".into(),
                questions: "q.csv".into()
            })
        );
    }

    #[test]
    fn falls_back_to_database_then_errors() {
        let args = SourceArgs {
            database_url: Some("postgres://localhost/dash".to_string()),
            ..SourceArgs::default()
        };
        assert!(matches!(args.resolve(), Ok(RecordSource::Postgres { .. })));
        assert_eq!(SourceArgs::default().resolve(), Err(ConfigError::NoSource));
    }
}
