//! Question-level drill-down for a single assessment attempt.

use serde::Serialize;

use crate::models::{format_number, Correctness, QuestionRecord};

/// Questions shown in the per-question score series.
pub const SERIES_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionStatus {
    Correct,
    Incorrect,
    NotScorable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetailRow {
    pub sequence: String,
    pub text: String,
    pub student_answer: Option<String>,
    pub status: QuestionStatus,
    pub points_earned: Option<f64>,
    pub points_possible: Option<f64>,
    pub skill: String,
    pub class_average_points: Option<String>,
}

impl QuestionDetailRow {
    pub fn points_label(&self) -> String {
        let show = |value: Option<f64>| value.map(format_number).unwrap_or_else(|| "-".into());
        format!("{}/{}", show(self.points_earned), show(self.points_possible))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerBreakdown {
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentDetail {
    pub assessment_name: String,
    pub questions: Vec<QuestionDetailRow>,
    pub breakdown: AnswerBreakdown,
    /// Earned over possible as a percentage, `None` where not scorable.
    pub score_series: Vec<Option<f64>>,
}

fn status(question: &QuestionRecord) -> QuestionStatus {
    match (question.points_earned, question.points_possible) {
        (Some(_), Some(possible)) if possible != 0.0 => match question.correctness {
            Correctness::Correct => QuestionStatus::Correct,
            _ => QuestionStatus::Incorrect,
        },
        _ => QuestionStatus::NotScorable,
    }
}

fn score_pct(question: &QuestionRecord) -> Option<f64> {
    match (question.points_earned, question.points_possible) {
        (Some(earned), Some(possible)) if possible != 0.0 => Some(earned / possible * 100.0),
        _ => None,
    }
}

/// `student_questions` must already be filtered to one student.
pub fn assessment_detail(student_questions: &[&QuestionRecord], assessment_name: &str) -> AssessmentDetail {
    let questions: Vec<&QuestionRecord> = student_questions
        .iter()
        .copied()
        .filter(|question| question.assessment_name == assessment_name)
        .collect();

    let mut breakdown = AnswerBreakdown::default();
    for question in &questions {
        match question.correctness {
            Correctness::Correct => breakdown.correct += 1,
            Correctness::Incorrect => breakdown.incorrect += 1,
            Correctness::Unknown => {}
        }
        if !question.is_answered() {
            breakdown.unanswered += 1;
        }
    }

    let rows = questions
        .iter()
        .enumerate()
        .map(|(index, question)| QuestionDetailRow {
            sequence: question
                .sequence_in_quiz
                .clone()
                .unwrap_or_else(|| (index + 1).to_string()),
            text: question
                .question_text
                .clone()
                .unwrap_or_else(|| "Question Text Missing".to_string()),
            student_answer: question.student_answer.clone(),
            status: status(question),
            points_earned: question.points_earned,
            points_possible: question.points_possible,
            skill: question.skill_tag.to_string(),
            class_average_points: question.class_average_points.clone(),
        })
        .collect();

    AssessmentDetail {
        assessment_name: assessment_name.to_string(),
        questions: rows,
        breakdown,
        score_series: questions
            .iter()
            .take(SERIES_LIMIT)
            .copied()
            .map(score_pct)
            .collect(),
    }
}
