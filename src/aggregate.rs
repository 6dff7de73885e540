//! Pure statistics over record subsets. Every function here is total: empty
//! input yields `Score::Unavailable` for score aggregates and `0` for accuracy.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{AssessmentRecord, AssessmentSource, Correctness, QuestionRecord, Score};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaledField {
    Total,
    Verbal,
    Quant,
}

impl ScaledField {
    pub fn value(self, record: &AssessmentRecord) -> Option<f64> {
        match self {
            Self::Total => record.scaled_total,
            Self::Verbal => record.scaled_verbal,
            Self::Quant => record.scaled_quant,
        }
    }
}

/// One block of headline figures, for either a student or the whole class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub total: Score,
    pub verbal: Score,
    pub quant: Score,
    pub avg_practice_pct: Score,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkillTally {
    pub correct: usize,
    pub attempted: usize,
}

impl SkillTally {
    fn record(&mut self, question: &QuestionRecord) {
        if question.is_answered() {
            self.attempted += 1;
            if question.correctness == Correctness::Correct {
                self.correct += 1;
            }
        }
    }

    pub fn accuracy_pct(self) -> u8 {
        if self.attempted == 0 {
            return 0;
        }
        (100.0 * self.correct as f64 / self.attempted as f64).round() as u8
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn average_scaled_score<'a, I>(records: I, field: ScaledField) -> Score
where
    I: IntoIterator<Item = &'a AssessmentRecord>,
{
    Score::from_option(mean(
        records
            .into_iter()
            .filter(|record| record.source == AssessmentSource::StandardizedTest)
            .filter_map(|record| field.value(record)),
    ))
}

pub fn average_practice_percentage<'a, I>(records: I) -> Score
where
    I: IntoIterator<Item = &'a AssessmentRecord>,
{
    Score::from_option(mean(
        records
            .into_iter()
            .filter(|record| record.source.is_practice())
            .filter_map(|record| record.score_percentage),
    ))
}

/// Most recent attempt; records without a usable date only win when nothing
/// is dated. Ties keep input order.
pub fn latest_by_date<'a, I>(records: I) -> Option<&'a AssessmentRecord>
where
    I: IntoIterator<Item = &'a AssessmentRecord>,
{
    let mut records: Vec<&AssessmentRecord> = records.into_iter().collect();
    records.sort_by(|a, b| a.attempt_date.cmp_latest_first(&b.attempt_date));
    records.first().copied()
}

pub fn correctness_accuracy<'a, I>(questions: I) -> u8
where
    I: IntoIterator<Item = &'a QuestionRecord>,
{
    let mut tally = SkillTally::default();
    for question in questions {
        tally.record(question);
    }
    tally.accuracy_pct()
}

pub fn unique_skill_rollup<'a, I>(questions: I) -> BTreeMap<String, SkillTally>
where
    I: IntoIterator<Item = &'a QuestionRecord>,
{
    let mut rollup: BTreeMap<String, SkillTally> = BTreeMap::new();
    for question in questions {
        if let Some(skill) = question.skill_tag.name() {
            rollup.entry(skill.to_string()).or_default().record(question);
        }
    }
    rollup
}

/// Population-wide averages. Independent of the selected student.
pub fn class_averages(all_assessments: &[AssessmentRecord]) -> ScoreSummary {
    ScoreSummary {
        total: average_scaled_score(all_assessments, ScaledField::Total),
        verbal: average_scaled_score(all_assessments, ScaledField::Verbal),
        quant: average_scaled_score(all_assessments, ScaledField::Quant),
        avg_practice_pct: average_practice_percentage(all_assessments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttemptDate, SkillTag};

    fn assessment(source: AssessmentSource, date: &str) -> AssessmentRecord {
        AssessmentRecord {
            student_id: "x@example.com".to_string(),
            display_name: None,
            source,
            name: "CB-T1".to_string(),
            attempt_date: AttemptDate::parse(date),
            scaled_total: None,
            scaled_verbal: None,
            scaled_quant: None,
            raw_combined: None,
            points_possible_combined: None,
            score_percentage: None,
        }
    }

    fn test_with_total(total: Option<f64>) -> AssessmentRecord {
        AssessmentRecord {
            scaled_total: total,
            ..assessment(AssessmentSource::StandardizedTest, "2024-01-01")
        }
    }

    fn question(skill: &str, correct: bool, answer: &str) -> QuestionRecord {
        QuestionRecord {
            student_id: "x@example.com".to_string(),
            assessment_name: "CB-T1".to_string(),
            skill_tag: SkillTag::parse(skill),
            correctness: if correct {
                Correctness::Correct
            } else {
                Correctness::Incorrect
            },
            student_answer: Some(answer.to_string()),
            points_earned: None,
            points_possible: None,
            sequence_in_quiz: None,
            question_text: None,
            class_average_points: None,
        }
    }

    #[test]
    fn scaled_average_rounds_mean_of_present_values() {
        let records = vec![
            test_with_total(Some(1200.0)),
            test_with_total(Some(1215.0)),
            test_with_total(None),
        ];
        assert_eq!(
            average_scaled_score(&records, ScaledField::Total),
            Score::Value(1208)
        );
    }

    #[test]
    fn scaled_average_ignores_other_sources() {
        let module = AssessmentRecord {
            scaled_total: Some(400.0),
            ..assessment(AssessmentSource::ModulePractice, "2024-01-01")
        };
        assert_eq!(
            average_scaled_score([&module], ScaledField::Total),
            Score::Unavailable
        );
        assert_eq!(
            average_scaled_score(&[test_with_total(None)], ScaledField::Total),
            Score::Unavailable
        );
    }

    #[test]
    fn practice_average_uses_only_practice_sources() {
        let with_pct = |source, pct| AssessmentRecord {
            score_percentage: Some(pct),
            ..assessment(source, "2024-01-01")
        };
        let records = vec![
            with_pct(AssessmentSource::EndOfChapterPractice, 80.0),
            with_pct(AssessmentSource::ExternalAdaptivePractice, 65.0),
            with_pct(AssessmentSource::ModulePractice, 10.0),
        ];
        assert_eq!(average_practice_percentage(&records), Score::Value(73));
        assert_eq!(average_practice_percentage(&records[2..]), Score::Unavailable);
    }

    #[test]
    fn latest_prefers_newest_and_puts_undated_last() {
        let records = vec![
            assessment(AssessmentSource::StandardizedTest, "2024-03-01"),
            assessment(AssessmentSource::StandardizedTest, "2024-05-15"),
            assessment(AssessmentSource::StandardizedTest, ""),
        ];
        let latest = latest_by_date(&records).unwrap();
        assert_eq!(latest.attempt_date, AttemptDate::parse("2024-05-15"));

        let undated = vec![assessment(AssessmentSource::StandardizedTest, "garbled")];
        assert!(latest_by_date(&undated).is_some());
        assert!(latest_by_date(&[] as &[AssessmentRecord]).is_none());
    }

    #[test]
    fn accuracy_floors_to_zero_without_attempts() {
        assert_eq!(correctness_accuracy(&[] as &[QuestionRecord]), 0);
        assert_eq!(correctness_accuracy(&[question("Math", false, " ")]), 0);
    }

    #[test]
    fn blank_answers_leave_the_denominator() {
        let questions = vec![
            question("Math", true, "A"),
            question("Math", false, "C"),
            question("Math", false, ""),
        ];
        assert_eq!(correctness_accuracy(&questions), 50);
    }

    #[test]
    fn accuracy_is_order_invariant() {
        let mut questions = vec![
            question("Math", true, "A"),
            question("Math", true, "B"),
            question("Math", false, "C"),
        ];
        let forward = correctness_accuracy(&questions);
        questions.reverse();
        assert_eq!(forward, 67);
        assert_eq!(correctness_accuracy(&questions), forward);
    }

    #[test]
    fn rollup_groups_by_exact_tag_and_skips_unclassified() {
        let questions = vec![
            question("A", true, "x"),
            question("A", false, "y"),
            question("B", true, "z"),
            question("TBD", true, "w"),
        ];
        let rollup = unique_skill_rollup(&questions);
        assert_eq!(rollup.len(), 2);
        assert_eq!(rollup["A"].accuracy_pct(), 50);
        assert_eq!(rollup["B"].accuracy_pct(), 100);
        assert_eq!(rollup["A"], SkillTally { correct: 1, attempted: 2 });
    }

    #[test]
    fn class_averages_cover_the_population() {
        let records = vec![
            AssessmentRecord {
                scaled_verbal: Some(590.0),
                scaled_quant: Some(590.0),
                ..test_with_total(Some(1180.0))
            },
            AssessmentRecord {
                score_percentage: Some(90.0),
                ..assessment(AssessmentSource::EndOfChapterPractice, "2024-02-02")
            },
        ];
        let averages = class_averages(&records);
        assert_eq!(averages.total, Score::Value(1180));
        assert_eq!(averages.verbal, Score::Value(590));
        assert_eq!(averages.avg_practice_pct, Score::Value(90));
    }
}
