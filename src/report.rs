use std::fmt::Write;

use crate::detail::AssessmentDetail;
use crate::models::{Score, Subject};
use crate::view::StudentViewModel;

/// `83%`, or a bare `-` when unavailable.
fn pct(score: Score) -> String {
    match score {
        Score::Value(value) => format!("{value}%"),
        Score::Unavailable => score.to_string(),
    }
}

pub fn build_report(view: &StudentViewModel) -> String {
    let mut output = String::new();
    let latest = &view.latest_scores;
    let class = &view.class_averages_global;

    let _ = writeln!(output, "# Score Dashboard: {}", view.display_name);
    let _ = writeln!(output, "Student: {}", view.student_id);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Snapshot");
    let _ = writeln!(
        output,
        "- Total: {} / 1600 (class avg {})",
        latest.total, class.total
    );
    let _ = writeln!(
        output,
        "- Reading & Writing: {} / 800 (class avg {})",
        latest.verbal, class.verbal
    );
    let _ = writeln!(output, "- Math: {} / 800 (class avg {})", latest.quant, class.quant);
    let _ = writeln!(
        output,
        "- Practice average: {} (class avg {})",
        pct(latest.avg_practice_pct),
        pct(class.avg_practice_pct)
    );
    let _ = writeln!(
        output,
        "- Target: {} (goal: {} points)",
        view.target_score, view.points_to_target
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Trend");
    if view.score_trend.labels.is_empty() {
        let _ = writeln!(output, "No full practice tests recorded yet.");
    } else {
        for ((label, score), class_avg) in view
            .score_trend
            .labels
            .iter()
            .zip(&view.score_trend.student_scores)
            .zip(&view.score_trend.class_avg_scores)
        {
            let _ = writeln!(output, "- {label}: {score} (class avg {class_avg})");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Skill Accuracy");
    for subject in &view.skill_performance_by_subject {
        let _ = writeln!(
            output,
            "- {}: {}% (class avg {}%)",
            subject.label, subject.student_accuracy_pct, subject.class_accuracy_pct
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Strengths");
    if view.strengths.is_empty() {
        let _ = writeln!(output, "No strengths identified yet.");
    } else {
        for skill in &view.strengths {
            let _ = writeln!(output, "- {} ({}%)", skill.skill_name, skill.score_pct);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Areas for Improvement");
    if view.weaknesses.is_empty() {
        let _ = writeln!(output, "No areas for improvement identified yet.");
    } else {
        for skill in &view.weaknesses {
            let _ = writeln!(output, "- {} ({}%)", skill.skill_name, skill.score_pct);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Practice Tests");
    if view.practice_tests.is_empty() {
        let _ = writeln!(output, "No practice test data available.");
    } else {
        let _ = writeln!(output, "| Test | Date | R&W | Math | Total | Class Avg Total |");
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for test in &view.practice_tests {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} |",
                test.name, test.date, test.verbal, test.quant, test.total, test.class_avg_total
            );
        }
    }

    for subject in Subject::ALL {
        let eoc = view.eoc_quizzes.get(subject);
        let adaptive = view.adaptive_practice.get(subject);
        let skills = view.skill_breakdown.get(subject);
        if eoc.is_empty() && adaptive.is_empty() && skills.is_empty() {
            continue;
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", subject.label());
        for quiz in eoc {
            let _ = writeln!(
                output,
                "- {} on {}: {} (class avg {})",
                quiz.name,
                quiz.date,
                quiz.latest_score,
                pct(quiz.class_avg)
            );
        }
        for item in adaptive {
            let _ = writeln!(
                output,
                "- {} on {}: {} (class avg {})",
                item.name,
                item.date,
                item.score,
                pct(item.class_avg)
            );
        }
        for skill in skills {
            let _ = writeln!(
                output,
                "- Skill {}: {}% ({}/{} answered correctly)",
                skill.skill_name, skill.score_pct, skill.correct, skill.attempted
            );
        }
    }

    output
}

pub fn build_detail_report(detail: &AssessmentDetail) -> String {
    let mut output = String::new();
    let breakdown = &detail.breakdown;

    let _ = writeln!(output, "# {} Details", detail.assessment_name);
    if detail.questions.is_empty() {
        let _ = writeln!(
            output,
            "No detailed question data found for this assessment for this student."
        );
        return output;
    }

    let _ = writeln!(
        output,
        "Correct {} / Incorrect {} / Unanswered {}",
        breakdown.correct, breakdown.incorrect, breakdown.unanswered
    );
    let _ = writeln!(output);
    for question in &detail.questions {
        let _ = writeln!(output, "- Q{}: {}", question.sequence, question.text);
        let _ = writeln!(
            output,
            "  Answer: {} ({:?}) | Points: {} | Skill: {} | Class Avg Correctness: {}%",
            question.student_answer.as_deref().unwrap_or("Not Provided"),
            question.status,
            question.points_label(),
            question.skill,
            question.class_average_points.as_deref().unwrap_or("N/A")
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::assessment_detail;
    use crate::ingest::read_questions;
    use crate::models::{AssessmentRecord, AssessmentSource, AttemptDate, QuestionRecord};
    use crate::view::build;

    fn test_record(name: &str, date: &str, total: Option<f64>) -> AssessmentRecord {
        AssessmentRecord {
            student_id: "jane.doe@example.com".to_string(),
            display_name: None,
            source: AssessmentSource::StandardizedTest,
            name: name.to_string(),
            attempt_date: AttemptDate::parse(date),
            scaled_total: total,
            scaled_verbal: None,
            scaled_quant: None,
            raw_combined: None,
            points_possible_combined: None,
            score_percentage: None,
        }
    }

    #[test]
    fn report_includes_sections_and_markers() {
        let records = vec![
            test_record("CB-T1", "2024-01-05", Some(1200.0)),
            test_record("CB-T2", "sometime", None),
        ];
        let refs: Vec<&AssessmentRecord> = records.iter().collect();
        let view = build(&refs, &records, &[], "jane.doe@example.com");

        let report = build_report(&view);
        assert!(report.contains("# Score Dashboard: Jane Doe"));
        assert!(report.contains("- Total: 1200 / 1600 (class avg 1200)"));
        assert!(report.contains("- Reading & Writing: - / 800"));
        assert!(report.contains("- Target: 1400 (goal: 200 points)"));
        assert!(report.contains("- Test 1: 1200 (class avg 1200)"));
        assert!(report.contains("| CB-T1 | Jan 5, 2024 | - | - | 1200 | 1200 |"));
        assert!(report.contains("| CB-T2 | sometime | - | - | - | 1200 |"));
        assert!(report.contains("No strengths identified yet."));
        assert!(report.contains("- Practice average: - (class avg -)"));
        assert!(!report.contains("-%"));
    }

    #[test]
    fn practice_items_show_percent_only_for_real_averages() {
        let eoc = AssessmentRecord {
            source: AssessmentSource::EndOfChapterPractice,
            score_percentage: Some(82.5),
            ..test_record("M-EOC Ch3", "2024-02-01", None)
        };
        let undated = AssessmentRecord {
            source: AssessmentSource::ExternalAdaptivePractice,
            raw_combined: Some(4.0),
            points_possible_combined: Some(5.0),
            ..test_record("Khan Math: Ratios", "", None)
        };

        let records = vec![eoc];
        let refs: Vec<&AssessmentRecord> = records.iter().collect();
        let report = build_report(&build(&refs, &records, &[], "jane.doe@example.com"));
        assert!(report.contains("- Practice average: 83% (class avg 83%)"));
        assert!(report.contains("- M-EOC Ch3 on Feb 1, 2024: 82.5% (class avg 83%)"));

        let records = vec![undated];
        let refs: Vec<&AssessmentRecord> = records.iter().collect();
        let report = build_report(&build(&refs, &records, &[], "jane.doe@example.com"));
        assert!(report.contains("- Khan Math: Ratios on -: 4/5 (class avg -)"));
        assert!(!report.contains("-%"));
    }

    #[test]
    fn detail_report_lists_questions() {
        let questions: Vec<QuestionRecord> = read_questions(
            "StudentGmailID,AssessmentName,SAT_Skill_Tag,IsCorrect,StudentAnswer,PointsEarned,PointsPossible_Question,QuestionText_Full\n\
             a@example.com,CB-T1,Math: Ratios,TRUE,B,1,1,What is 2:4?\n"
                .as_bytes(),
        )
        .unwrap();
        let refs: Vec<&QuestionRecord> = questions.iter().collect();

        let report = build_detail_report(&assessment_detail(&refs, "CB-T1"));
        assert!(report.contains("- Q1: What is 2:4?"));
        assert!(report.contains("Answer: B (Correct) | Points: 1/1 | Skill: Math: Ratios"));

        let empty = build_detail_report(&assessment_detail(&refs, "CB-T9"));
        assert!(empty.contains("No detailed question data found"));
    }
}
