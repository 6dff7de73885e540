use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{IngestError, LoadError};
use crate::filter::filter_by_student;
use crate::ingest;
use crate::models::{AssessmentRecord, QuestionRecord};

/// The two feeds as loaded for one session. Cloning shares the snapshot.
#[derive(Debug, Clone)]
pub struct RecordStore {
    assessments: Arc<[AssessmentRecord]>,
    questions: Arc<[QuestionRecord]>,
}

impl RecordStore {
    pub fn new(assessments: Vec<AssessmentRecord>, questions: Vec<QuestionRecord>) -> Self {
        Self {
            assessments: assessments.into(),
            questions: questions.into(),
        }
    }

    pub fn from_readers<A: Read, Q: Read>(assessments: A, questions: Q) -> Result<Self, IngestError> {
        Ok(Self::new(
            ingest::read_assessments(assessments)?,
            ingest::read_questions(questions)?,
        ))
    }

    /// Parses both exports concurrently on the blocking pool.
    pub async fn load_csv(assessments: &Path, questions: &Path) -> Result<Self, LoadError> {
        let assessments_path = assessments.to_path_buf();
        let questions_path = questions.to_path_buf();

        let (assessments, questions) = tokio::try_join!(
            tokio::task::spawn_blocking(move || {
                read_file(assessments_path, ingest::read_assessments)
            }),
            tokio::task::spawn_blocking(move || read_file(questions_path, ingest::read_questions)),
        )?;
        let store = Self::new(assessments?, questions?);

        tracing::info!(
            assessments = store.assessments.len(),
            questions = store.questions.len(),
            "loaded dashboard feeds from csv"
        );
        Ok(store)
    }

    pub fn assessments(&self) -> &[AssessmentRecord] {
        &self.assessments
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    pub fn student_assessments(&self, student_id: &str) -> Vec<&AssessmentRecord> {
        filter_by_student(self.assessments(), student_id)
    }

    pub fn student_questions(&self, student_id: &str) -> Vec<&QuestionRecord> {
        filter_by_student(self.questions(), student_id)
    }
}

fn read_file<T>(
    path: PathBuf,
    parse: fn(BufReader<File>) -> Result<Vec<T>, IngestError>,
) -> Result<Vec<T>, LoadError> {
    let parsed = File::open(&path)
        .map_err(|err| IngestError::Csv(err.into()))
        .and_then(|file| parse(BufReader::new(file)));
    parsed.map_err(|source| LoadError::Ingest { path, source })
}
