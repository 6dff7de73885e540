//! Postgres mirror of the two dashboard feeds. Each import replaces the
//! previous snapshot wholesale, matching how the exports are published.

use std::path::Path;

use anyhow::Context;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::LoadError;
use crate::ingest::{self, AssessmentRow, QuestionRow};
use crate::models::{AssessmentRecord, QuestionRecord};
use crate::store::RecordStore;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub assessments: usize,
    pub questions: usize,
}

pub async fn import_csv(
    pool: &PgPool,
    assessments_csv: &Path,
    questions_csv: &Path,
) -> anyhow::Result<ImportSummary> {
    let assessments = std::fs::File::open(assessments_csv)
        .map_err(anyhow::Error::from)
        .and_then(|file| Ok(ingest::read_assessment_rows(file)?))
        .with_context(|| format!("failed to read {}", assessments_csv.display()))?;
    let questions = std::fs::File::open(questions_csv)
        .map_err(anyhow::Error::from)
        .and_then(|file| Ok(ingest::read_question_rows(file)?))
        .with_context(|| format!("failed to read {}", questions_csv.display()))?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM student_dashboard.assessment_rows")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM student_dashboard.question_rows")
        .execute(&mut *tx)
        .await?;

    for (row_number, row) in assessments.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO student_dashboard.assessment_rows
            (id, row_number, student_id, student_name, source, name, attempt_date,
             scaled_total, scaled_verbal, scaled_quant, raw_combined,
             points_possible_combined, score_percentage)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row_number as i64)
        .bind(&row.student_id)
        .bind(&row.student_name)
        .bind(&row.source)
        .bind(&row.name)
        .bind(&row.attempt_date)
        .bind(&row.scaled_total)
        .bind(&row.scaled_verbal)
        .bind(&row.scaled_quant)
        .bind(&row.raw_combined)
        .bind(&row.points_possible_combined)
        .bind(&row.score_percentage)
        .execute(&mut *tx)
        .await?;
    }

    for (row_number, row) in questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO student_dashboard.question_rows
            (id, row_number, student_id, assessment_name, skill_tag, is_correct,
             student_answer, points_earned, points_possible, sequence_in_quiz,
             question_text_metadata, question_text_full, class_average_points)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row_number as i64)
        .bind(&row.student_id)
        .bind(&row.assessment_name)
        .bind(&row.skill_tag)
        .bind(&row.is_correct)
        .bind(&row.student_answer)
        .bind(&row.points_earned)
        .bind(&row.points_possible)
        .bind(&row.sequence_in_quiz)
        .bind(&row.question_text_metadata)
        .bind(&row.question_text_full)
        .bind(&row.class_average_points)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let summary = ImportSummary {
        assessments: assessments.len(),
        questions: questions.len(),
    };
    tracing::info!(
        assessments = summary.assessments,
        questions = summary.questions,
        "replaced dashboard snapshot"
    );
    Ok(summary)
}

pub async fn fetch_store(pool: &PgPool) -> Result<RecordStore, LoadError> {
    let (assessment_rows, question_rows) = tokio::try_join!(
        sqlx::query(
            "SELECT student_id, student_name, source, name, attempt_date, \
             scaled_total, scaled_verbal, scaled_quant, raw_combined, \
             points_possible_combined, score_percentage \
             FROM student_dashboard.assessment_rows ORDER BY row_number",
        )
        .fetch_all(pool),
        sqlx::query(
            "SELECT student_id, assessment_name, skill_tag, is_correct, student_answer, \
             points_earned, points_possible, sequence_in_quiz, question_text_metadata, \
             question_text_full, class_average_points \
             FROM student_dashboard.question_rows ORDER BY row_number",
        )
        .fetch_all(pool),
    )?;

    let mut assessments = Vec::with_capacity(assessment_rows.len());
    for row in assessment_rows {
        assessments.push(AssessmentRecord::from(AssessmentRow {
            student_id: row.get("student_id"),
            student_name: row.get("student_name"),
            source: row.get("source"),
            name: row.get("name"),
            attempt_date: row.get("attempt_date"),
            scaled_total: row.get("scaled_total"),
            scaled_verbal: row.get("scaled_verbal"),
            scaled_quant: row.get("scaled_quant"),
            raw_combined: row.get("raw_combined"),
            points_possible_combined: row.get("points_possible_combined"),
            score_percentage: row.get("score_percentage"),
        }));
    }

    let mut questions = Vec::with_capacity(question_rows.len());
    for row in question_rows {
        questions.push(QuestionRecord::from(QuestionRow {
            student_id: row.get("student_id"),
            assessment_name: row.get("assessment_name"),
            skill_tag: row.get("skill_tag"),
            is_correct: row.get("is_correct"),
            student_answer: row.get("student_answer"),
            points_earned: row.get("points_earned"),
            points_possible: row.get("points_possible"),
            sequence_in_quiz: row.get("sequence_in_quiz"),
            question_text_metadata: row.get("question_text_metadata"),
            question_text_full: row.get("question_text_full"),
            class_average_points: row.get("class_average_points"),
        }));
    }

    tracing::info!(
        assessments = assessments.len(),
        questions = questions.len(),
        "loaded dashboard feeds from postgres"
    );
    Ok(RecordStore::new(assessments, questions))
}
