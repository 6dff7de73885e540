//! Assembles the per-student dashboard view model.
//!
//! Class averages attached to individual rows are the population-wide
//! figures, not per-item averages.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::aggregate::{self, ScoreSummary, SkillTally};
use crate::identity;
use crate::models::{
    format_number, AssessmentRecord, AssessmentSource, AttemptDate, QuestionRecord, Score, Subject,
};

/// Score every student is measured against.
pub const TARGET_SCORE: i64 = 1400;

pub const STRENGTH_THRESHOLD: u8 = 80;
pub const WEAKNESS_THRESHOLD: u8 = 60;
pub const HIGHLIGHT_LIMIT: usize = 3;

/// How a single item's own score is shown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreCell {
    Scaled(i64),
    Percentage(f64),
    Raw { earned: f64, possible: Option<f64> },
    Unavailable,
}

impl ScoreCell {
    fn raw(record: &AssessmentRecord) -> Self {
        match record.raw_combined {
            Some(earned) => Self::Raw {
                earned,
                possible: record.points_possible_combined,
            },
            None => Self::Unavailable,
        }
    }
}

impl fmt::Display for ScoreCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scaled(value) => write!(f, "{value}"),
            Self::Percentage(value) => write!(f, "{}%", format_number(*value)),
            Self::Raw {
                earned,
                possible: Some(possible),
            } => write!(f, "{}/{}", format_number(*earned), format_number(*possible)),
            Self::Raw {
                earned,
                possible: None,
            } => f.write_str(&format_number(*earned)),
            Self::Unavailable => f.write_str("-"),
        }
    }
}

impl Serialize for ScoreCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scaled(value) => serializer.serialize_i64(*value),
            Self::Unavailable => serializer.serialize_none(),
            cell => serializer.collect_str(cell),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceBand {
    Good,
    Average,
    Poor,
}

impl PerformanceBand {
    pub fn for_pct(score_pct: u8) -> Self {
        match score_pct {
            85..=u8::MAX => Self::Good,
            70..=84 => Self::Average,
            _ => Self::Poor,
        }
    }
}

/// One list per subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectLists<T> {
    pub reading: Vec<T>,
    pub writing: Vec<T>,
    pub math: Vec<T>,
}

impl<T> Default for SubjectLists<T> {
    fn default() -> Self {
        Self {
            reading: Vec::new(),
            writing: Vec::new(),
            math: Vec::new(),
        }
    }
}

impl<T> SubjectLists<T> {
    pub fn get(&self, subject: Subject) -> &[T] {
        match subject {
            Subject::Reading => &self.reading,
            Subject::Writing => &self.writing,
            Subject::Math => &self.math,
        }
    }

    fn set(&mut self, subject: Subject, items: Vec<T>) {
        match subject {
            Subject::Reading => self.reading = items,
            Subject::Writing => self.writing = items,
            Subject::Math => self.math = items,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Subject, &T)> {
        Subject::ALL
            .into_iter()
            .flat_map(move |subject| self.get(subject).iter().map(move |item| (subject, item)))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTrend {
    pub labels: Vec<String>,
    pub student_scores: Vec<i64>,
    pub class_avg_scores: Vec<Score>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPerformance {
    pub subject: Subject,
    pub label: &'static str,
    pub student_accuracy_pct: u8,
    pub class_accuracy_pct: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillScore {
    pub skill_name: String,
    pub score_pct: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRow {
    pub skill_name: String,
    pub score_pct: u8,
    pub correct: usize,
    pub attempted: usize,
    pub class_avg_pct: u8,
    pub band: PerformanceBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeTestRow {
    pub name: String,
    pub date: AttemptDate,
    pub source: AssessmentSource,
    pub verbal: ScoreCell,
    pub quant: ScoreCell,
    pub total: ScoreCell,
    pub class_avg_verbal: Score,
    pub class_avg_quant: Score,
    pub class_avg_total: Score,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EocQuizRow {
    pub name: String,
    pub latest_score: ScoreCell,
    pub date: AttemptDate,
    pub class_avg: Score,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptivePracticeRow {
    pub name: String,
    pub date: AttemptDate,
    pub score: ScoreCell,
    pub points_possible: Option<f64>,
    pub class_avg: Score,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentViewModel {
    pub student_id: String,
    pub display_name: String,
    pub target_score: i64,
    pub points_to_target: Score,
    pub latest_scores: ScoreSummary,
    pub class_averages_global: ScoreSummary,
    pub score_trend: ScoreTrend,
    pub skill_performance_by_subject: Vec<SubjectPerformance>,
    pub strengths: Vec<SkillScore>,
    pub weaknesses: Vec<SkillScore>,
    pub practice_tests: Vec<PracticeTestRow>,
    pub eoc_quizzes: SubjectLists<EocQuizRow>,
    pub adaptive_practice: SubjectLists<AdaptivePracticeRow>,
    pub skill_breakdown: SubjectLists<SkillRow>,
}

pub fn build(
    student_assessments: &[&AssessmentRecord],
    all_assessments: &[AssessmentRecord],
    student_questions: &[&QuestionRecord],
    student_id: &str,
) -> StudentViewModel {
    let class_averages = aggregate::class_averages(all_assessments);
    build_with_averages(
        student_assessments,
        all_assessments,
        student_questions,
        student_id,
        class_averages,
    )
}

/// Same as [`build`] with the population averages supplied by the caller, so a
/// session can compute them once.
pub fn build_with_averages(
    student_assessments: &[&AssessmentRecord],
    all_assessments: &[AssessmentRecord],
    student_questions: &[&QuestionRecord],
    student_id: &str,
    class_averages: ScoreSummary,
) -> StudentViewModel {
    let display_name = identity::resolve_display_name(all_assessments, student_id);
    let latest_scores = latest_scores(student_assessments);
    let points_to_target = match latest_scores.total {
        Score::Value(total) => TARGET_SCORE
            .checked_sub(total)
            .map_or(Score::Unavailable, Score::Value),
        Score::Unavailable => Score::Unavailable,
    };

    let practice_tests = practice_tests(student_assessments, &class_averages);
    let score_trend = score_trend(&practice_tests, class_averages.total);

    let class_accuracy_pct = class_averages.avg_practice_pct.pct_or_zero();
    let mut skill_performance_by_subject = Vec::with_capacity(Subject::ALL.len());
    let mut skill_breakdown = SubjectLists::default();
    let mut eoc_quizzes = SubjectLists::default();
    let mut adaptive_practice = SubjectLists::default();

    for subject in Subject::ALL {
        let questions: Vec<&QuestionRecord> = student_questions
            .iter()
            .copied()
            .filter(|question| question.skill_tag.contains(subject.marker()))
            .collect();

        skill_performance_by_subject.push(SubjectPerformance {
            subject,
            label: subject.label(),
            student_accuracy_pct: aggregate::correctness_accuracy(questions.iter().copied()),
            class_accuracy_pct,
        });
        skill_breakdown.set(subject, skill_rows(&questions, class_accuracy_pct));
        eoc_quizzes.set(
            subject,
            eoc_rows(student_assessments, subject, class_averages.avg_practice_pct),
        );
        adaptive_practice.set(
            subject,
            adaptive_rows(student_assessments, subject, class_averages.avg_practice_pct),
        );
    }

    let (strengths, weaknesses) = highlights(&skill_breakdown);

    tracing::debug!(
        student_id,
        practice_tests = practice_tests.len(),
        trend_points = score_trend.labels.len(),
        strengths = strengths.len(),
        weaknesses = weaknesses.len(),
        "built student view model"
    );

    StudentViewModel {
        student_id: student_id.to_string(),
        display_name,
        target_score: TARGET_SCORE,
        points_to_target,
        latest_scores,
        class_averages_global: class_averages,
        score_trend,
        skill_performance_by_subject,
        strengths,
        weaknesses,
        practice_tests,
        eoc_quizzes,
        adaptive_practice,
        skill_breakdown,
    }
}

fn latest_scores(student_assessments: &[&AssessmentRecord]) -> ScoreSummary {
    let latest = aggregate::latest_by_date(
        student_assessments.iter().copied().filter(|record| {
            record.source == AssessmentSource::StandardizedTest && record.scaled_total.is_some()
        }),
    );

    ScoreSummary {
        total: Score::from_option(latest.and_then(|record| record.scaled_total)),
        verbal: Score::from_option(latest.and_then(|record| record.scaled_verbal)),
        quant: Score::from_option(latest.and_then(|record| record.scaled_quant)),
        avg_practice_pct: aggregate::average_practice_percentage(
            student_assessments.iter().copied(),
        ),
    }
}

fn practice_tests(
    student_assessments: &[&AssessmentRecord],
    class_averages: &ScoreSummary,
) -> Vec<PracticeTestRow> {
    let mut rows: Vec<PracticeTestRow> = student_assessments
        .iter()
        .filter(|record| {
            matches!(
                record.source,
                AssessmentSource::StandardizedTest | AssessmentSource::ModulePractice
            )
        })
        .map(|record| {
            let cell = |scaled: Option<f64>| match scaled {
                Some(value) => ScoreCell::Scaled(value.round() as i64),
                None if record.source == AssessmentSource::ModulePractice => ScoreCell::raw(record),
                None => ScoreCell::Unavailable,
            };

            PracticeTestRow {
                name: record.name.clone(),
                date: record.attempt_date.clone(),
                source: record.source.clone(),
                verbal: cell(record.scaled_verbal),
                quant: cell(record.scaled_quant),
                total: cell(record.scaled_total),
                class_avg_verbal: class_averages.verbal,
                class_avg_quant: class_averages.quant,
                class_avg_total: class_averages.total,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.date.cmp_ascending(&b.date));
    rows
}

/// Full tests only; module rows never enter the trend.
fn score_trend(practice_tests: &[PracticeTestRow], class_total: Score) -> ScoreTrend {
    let mut trend = ScoreTrend::default();
    for row in practice_tests {
        if row.source != AssessmentSource::StandardizedTest {
            continue;
        }
        if let ScoreCell::Scaled(total) = row.total {
            trend.labels.push(trend_label(&row.name));
            trend.student_scores.push(total);
            trend.class_avg_scores.push(class_total);
        }
    }
    trend
}

fn trend_label(name: &str) -> String {
    name.replacen("CB-T", "Test ", 1)
}

fn skill_rows(questions: &[&QuestionRecord], class_avg_pct: u8) -> Vec<SkillRow> {
    let mut rows: Vec<SkillRow> = aggregate::unique_skill_rollup(questions.iter().copied())
        .into_iter()
        .map(|(skill_name, tally): (String, SkillTally)| {
            let score_pct = tally.accuracy_pct();
            SkillRow {
                skill_name,
                score_pct,
                correct: tally.correct,
                attempted: tally.attempted,
                class_avg_pct,
                band: PerformanceBand::for_pct(score_pct),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.score_pct
            .cmp(&a.score_pct)
            .then_with(|| a.skill_name.cmp(&b.skill_name))
    });
    rows
}

fn highlights(skill_breakdown: &SubjectLists<SkillRow>) -> (Vec<SkillScore>, Vec<SkillScore>) {
    let by_name = |a: &&SkillRow, b: &&SkillRow| a.skill_name.cmp(&b.skill_name);

    let mut strengths: Vec<&SkillRow> = skill_breakdown
        .iter()
        .map(|(_, row)| row)
        .filter(|row| row.score_pct >= STRENGTH_THRESHOLD)
        .collect();
    strengths.sort_by(|a, b| b.score_pct.cmp(&a.score_pct).then_with(|| by_name(a, b)));

    let mut weaknesses: Vec<&SkillRow> = skill_breakdown
        .iter()
        .map(|(_, row)| row)
        .filter(|row| row.score_pct < WEAKNESS_THRESHOLD)
        .collect();
    weaknesses.sort_by(|a, b| a.score_pct.cmp(&b.score_pct).then_with(|| by_name(a, b)));

    let top = |rows: Vec<&SkillRow>| -> Vec<SkillScore> {
        rows.into_iter()
            .take(HIGHLIGHT_LIMIT)
            .map(|row| SkillScore {
                skill_name: row.skill_name.clone(),
                score_pct: row.score_pct,
            })
            .collect()
    };

    (top(strengths), top(weaknesses))
}

fn item_score(record: &AssessmentRecord) -> ScoreCell {
    match record.score_percentage {
        Some(pct) => ScoreCell::Percentage(pct),
        None => ScoreCell::raw(record),
    }
}

fn eoc_rows(
    student_assessments: &[&AssessmentRecord],
    subject: Subject,
    class_avg: Score,
) -> Vec<EocQuizRow> {
    student_assessments
        .iter()
        .filter(|record| {
            record.source == AssessmentSource::EndOfChapterPractice
                && record.name.starts_with(subject.end_of_chapter_prefix())
        })
        .map(|record| EocQuizRow {
            name: record.name.clone(),
            latest_score: item_score(record),
            date: record.attempt_date.clone(),
            class_avg,
        })
        .collect()
}

fn adaptive_rows(
    student_assessments: &[&AssessmentRecord],
    subject: Subject,
    class_avg: Score,
) -> Vec<AdaptivePracticeRow> {
    student_assessments
        .iter()
        .filter(|record| {
            record.source == AssessmentSource::ExternalAdaptivePractice
                && record.name.contains(subject.marker())
        })
        .map(|record| AdaptivePracticeRow {
            name: record.name.clone(),
            date: record.attempt_date.clone(),
            score: item_score(record),
            points_possible: record.points_possible_combined,
            class_avg,
        })
        .collect()
}
