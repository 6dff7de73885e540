//! Header-driven CSV ingestion for the two dashboard feeds.
//!
//! Rows are read as loosely typed strings first ([`AssessmentRow`],
//! [`QuestionRow`]) and converted once into the typed records the rest of the
//! crate works with. The Postgres mirror stores the same raw columns.

use std::io::Read;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::models::{
    AssessmentRecord, AssessmentSource, AttemptDate, Correctness, QuestionRecord, SkillTag,
    I64_BOUND,
};

const STUDENT_ID: &str = "StudentGmailID";
const ASSESSMENT_NAME: &str = "AssessmentName";
const ASSESSMENT_SOURCE: &str = "AssessmentSource";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AssessmentRow {
    #[serde(rename = "StudentGmailID")]
    pub student_id: Option<String>,
    #[serde(rename = "StudentName_Full")]
    pub student_name: Option<String>,
    #[serde(rename = "AssessmentSource")]
    pub source: Option<String>,
    #[serde(rename = "AssessmentName")]
    pub name: Option<String>,
    #[serde(rename = "AttemptDate")]
    pub attempt_date: Option<String>,
    #[serde(rename = "Score_Scaled_Total")]
    pub scaled_total: Option<String>,
    #[serde(rename = "ScaledScore_RW")]
    pub scaled_verbal: Option<String>,
    #[serde(rename = "ScaledScore_Math")]
    pub scaled_quant: Option<String>,
    #[serde(rename = "Score_Raw_Combined")]
    pub raw_combined: Option<String>,
    #[serde(rename = "PointsPossible_Combined")]
    pub points_possible_combined: Option<String>,
    #[serde(rename = "Score_Percentage")]
    pub score_percentage: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QuestionRow {
    #[serde(rename = "StudentGmailID")]
    pub student_id: Option<String>,
    #[serde(rename = "AssessmentName")]
    pub assessment_name: Option<String>,
    #[serde(rename = "SAT_Skill_Tag")]
    pub skill_tag: Option<String>,
    #[serde(rename = "IsCorrect")]
    pub is_correct: Option<String>,
    #[serde(rename = "StudentAnswer")]
    pub student_answer: Option<String>,
    #[serde(rename = "PointsEarned")]
    pub points_earned: Option<String>,
    #[serde(rename = "PointsPossible_Question")]
    pub points_possible: Option<String>,
    #[serde(rename = "QuestionSequenceInQuiz")]
    pub sequence_in_quiz: Option<String>,
    #[serde(rename = "QuestionText_fromMetadata")]
    pub question_text_metadata: Option<String>,
    #[serde(rename = "QuestionText_Full")]
    pub question_text_full: Option<String>,
    #[serde(rename = "ClassAveragePoints_Question")]
    pub class_average_points: Option<String>,
}

/// Trimmed cell contents, `None` when blank.
fn cell(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn owned_cell(value: Option<&String>) -> Option<String> {
    cell(value).map(str::to_string)
}

/// Numeric cell, `None` unless finite and within `i64` range.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.abs() < I64_BOUND)
}

/// Parses an `"NN%"` cell; a bare number is accepted too.
pub fn parse_percentage(raw: &str) -> Option<f64> {
    parse_number(raw.trim().trim_end_matches('%'))
}

pub fn normalize_student_id(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl From<AssessmentRow> for AssessmentRecord {
    fn from(row: AssessmentRow) -> Self {
        let number = |value: Option<&String>| cell(value).and_then(parse_number);

        AssessmentRecord {
            student_id: cell(row.student_id.as_ref())
                .map(normalize_student_id)
                .unwrap_or_default(),
            display_name: owned_cell(row.student_name.as_ref()),
            source: AssessmentSource::from_tag(cell(row.source.as_ref()).unwrap_or_default()),
            name: cell(row.name.as_ref()).unwrap_or_default().to_string(),
            attempt_date: AttemptDate::parse(cell(row.attempt_date.as_ref()).unwrap_or_default()),
            scaled_total: number(row.scaled_total.as_ref()),
            scaled_verbal: number(row.scaled_verbal.as_ref()),
            scaled_quant: number(row.scaled_quant.as_ref()),
            raw_combined: number(row.raw_combined.as_ref()),
            points_possible_combined: number(row.points_possible_combined.as_ref()),
            score_percentage: cell(row.score_percentage.as_ref()).and_then(parse_percentage),
        }
    }
}

impl From<QuestionRow> for QuestionRecord {
    fn from(row: QuestionRow) -> Self {
        let number = |value: Option<&String>| cell(value).and_then(parse_number);

        QuestionRecord {
            student_id: cell(row.student_id.as_ref())
                .map(normalize_student_id)
                .unwrap_or_default(),
            assessment_name: cell(row.assessment_name.as_ref())
                .unwrap_or_default()
                .to_string(),
            skill_tag: SkillTag::parse(cell(row.skill_tag.as_ref()).unwrap_or_default()),
            correctness: Correctness::parse(cell(row.is_correct.as_ref()).unwrap_or_default()),
            student_answer: owned_cell(row.student_answer.as_ref()),
            points_earned: number(row.points_earned.as_ref()),
            points_possible: number(row.points_possible.as_ref()),
            sequence_in_quiz: owned_cell(row.sequence_in_quiz.as_ref()),
            question_text: owned_cell(row.question_text_metadata.as_ref())
                .or_else(|| owned_cell(row.question_text_full.as_ref())),
            class_average_points: owned_cell(row.class_average_points.as_ref()),
        }
    }
}

fn require_columns(headers: &StringRecord, required: &[&'static str]) -> Result<(), IngestError> {
    for column in required {
        if !headers.iter().any(|header| header.trim() == *column) {
            return Err(IngestError::MissingColumn(*column));
        }
    }
    Ok(())
}

fn read_rows<R, T>(reader: R, required: &[&'static str]) -> Result<Vec<T>, IngestError>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    require_columns(&headers, required)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        rows.push(record.deserialize(Some(&headers))?);
    }

    Ok(rows)
}

pub fn read_assessment_rows<R: Read>(reader: R) -> Result<Vec<AssessmentRow>, IngestError> {
    read_rows(reader, &[STUDENT_ID, ASSESSMENT_SOURCE, ASSESSMENT_NAME])
}

pub fn read_question_rows<R: Read>(reader: R) -> Result<Vec<QuestionRow>, IngestError> {
    read_rows(reader, &[STUDENT_ID, ASSESSMENT_NAME])
}

pub fn read_assessments<R: Read>(reader: R) -> Result<Vec<AssessmentRecord>, IngestError> {
    Ok(read_assessment_rows(reader)?
        .into_iter()
        .map(AssessmentRecord::from)
        .collect())
}

pub fn read_questions<R: Read>(reader: R) -> Result<Vec<QuestionRecord>, IngestError> {
    Ok(read_question_rows(reader)?
        .into_iter()
        .map(QuestionRecord::from)
        .collect())
}
