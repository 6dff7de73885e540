use student_score_dashboard::identity;
use student_score_dashboard::models::{Score, Subject};
use student_score_dashboard::{RecordStore, Session, StudentLookup};

const ASSESSMENTS: &str = "\
StudentGmailID,StudentName_Full,AssessmentSource,AssessmentName,AttemptDate,Score_Scaled_Total,ScaledScore_RW,ScaledScore_Math,Score_Raw_Combined,PointsPossible_Combined,Score_Percentage
student.x@example.com,,Canvas CB Test,CB-T1,2024-03-01,1220,600,620,,,
student.x@example.com,,Canvas CB Test,CB-T2,2024-05-15,1250,620,630,,,
student.x@example.com,,Canvas CB Module,CB-T3 Module 1,2024-04-10,,,,21,27,
student.x@example.com,,Canvas EOC Practice,W-EOC Ch2,2024-04-02,,,,,,75%
student.x@example.com,,Khan Academy Practice,Reading Practice Set,,,,,,10,90%
peer.one@example.com,Peer One,Canvas CB Test,CB-T1,2024-03-01,1070,530,540,,,
peer.one@example.com,Peer One,Canvas EOC Practice,R-EOC Ch1,2024-03-05,,,,,,60%
";

const QUESTIONS: &str = "\
StudentGmailID,AssessmentName,SAT_Skill_Tag,IsCorrect,StudentAnswer,PointsEarned,PointsPossible_Question,QuestionSequenceInQuiz
student.x@example.com,CB-T1,Math: Linear equations,TRUE,B,1,1,1
student.x@example.com,CB-T1,Math: Linear equations,TRUE,C,1,1,2
student.x@example.com,CB-T1,Math: Circles,FALSE,A,0,1,3
student.x@example.com,CB-T1,Math: Circles,FALSE,,0,1,4
student.x@example.com,CB-T1,Reading: Words in Context,true,D,1,1,5
student.x@example.com,CB-T1,TBD,FALSE,A,0,1,6
peer.one@example.com,CB-T1,Math: Circles,TRUE,A,1,1,1
";

fn session() -> Session {
    Session::new(RecordStore::from_readers(ASSESSMENTS.as_bytes(), QUESTIONS.as_bytes()).unwrap())
}

fn view_for(session: &Session, email: &str) -> student_score_dashboard::StudentViewModel {
    match session.lookup(email) {
        StudentLookup::Found(view) => *view,
        StudentLookup::NoData => panic!("expected data for {email}"),
    }
}

#[test]
fn latest_scores_and_population_averages() {
    let session = session();
    let view = view_for(&session, "Student.X@example.com");

    assert_eq!(view.display_name, "Student X");
    assert_eq!(view.latest_scores.total, Score::Value(1250));
    assert_eq!(view.latest_scores.verbal, Score::Value(620));
    // (1220 + 1250 + 1070) / 3, the student's own tests included.
    assert_eq!(view.class_averages_global.total, Score::Value(1180));
    assert_eq!(view.latest_scores.avg_practice_pct, Score::Value(83));
    assert_eq!(view.class_averages_global.avg_practice_pct, Score::Value(75));
    assert_eq!(view.points_to_target, Score::Value(150));
}

#[test]
fn trend_and_practice_tables() {
    let session = session();
    let view = view_for(&session, "student.x@example.com");

    assert_eq!(view.score_trend.labels, ["Test 1", "Test 2"]);
    assert_eq!(view.score_trend.student_scores, [1220, 1250]);
    assert!(view
        .score_trend
        .class_avg_scores
        .iter()
        .all(|score| *score == Score::Value(1180)));

    let names: Vec<&str> = view.practice_tests.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, ["CB-T1", "CB-T3 Module 1", "CB-T2"]);
    assert_eq!(view.practice_tests[1].total.to_string(), "21/27");

    assert_eq!(view.eoc_quizzes.get(Subject::Writing).len(), 1);
    assert_eq!(view.adaptive_practice.get(Subject::Reading).len(), 1);
    assert!(view.eoc_quizzes.get(Subject::Reading).is_empty());
}

#[test]
fn skills_strengths_and_weaknesses() {
    let session = session();
    let view = view_for(&session, "student.x@example.com");

    let math = &view.skill_performance_by_subject[2];
    // Blank answer on question 4 leaves the denominator.
    assert_eq!(math.student_accuracy_pct, 67);
    assert_eq!(math.class_accuracy_pct, 75);

    let strengths: Vec<(&str, u8)> = view
        .strengths
        .iter()
        .map(|s| (s.skill_name.as_str(), s.score_pct))
        .collect();
    assert_eq!(
        strengths,
        [("Math: Linear equations", 100), ("Reading: Words in Context", 100)]
    );
    assert_eq!(view.weaknesses.len(), 1);
    assert_eq!(view.weaknesses[0].skill_name, "Math: Circles");
    assert_eq!(view.weaknesses[0].score_pct, 0);
}

#[test]
fn unknown_identifier_reports_no_data() {
    let session = session();
    assert_eq!(session.lookup("someone.else@example.com"), StudentLookup::NoData);
    assert!(!identity::identifier_exists(session.store(), "someone.else@example.com"));
    assert!(identity::identifier_exists(session.store(), "PEER.ONE@example.com"));
}

#[test]
fn rebuilding_yields_identical_output() {
    let session = session();
    let first = serde_json::to_string(&view_for(&session, "student.x@example.com")).unwrap();
    let second = serde_json::to_string(&view_for(&session, "student.x@example.com")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn drill_down_matches_assessment_by_name() {
    let session = session();
    let detail = session.assessment_detail("student.x@example.com", "CB-T1");
    assert_eq!(detail.questions.len(), 6);
    assert_eq!(detail.breakdown.correct, 3);
    assert_eq!(detail.breakdown.incorrect, 3);
    assert_eq!(detail.breakdown.unanswered, 1);
    assert_eq!(detail.questions[3].sequence, "4");
}
