use std::sync::OnceLock;

use crate::aggregate::{self, ScoreSummary};
use crate::detail::{self, AssessmentDetail};
use crate::identity;
use crate::store::RecordStore;
use crate::view::{self, StudentViewModel};

#[derive(Debug, Clone, PartialEq)]
pub enum StudentLookup {
    Found(Box<StudentViewModel>),
    /// The identifier matches nothing in either feed.
    NoData,
}

impl StudentLookup {
    pub fn has_data(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// One loaded snapshot plus the figures that do not depend on the student.
#[derive(Debug)]
pub struct Session {
    store: RecordStore,
    class_averages: OnceLock<ScoreSummary>,
}

impl Session {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            class_averages: OnceLock::new(),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn class_averages(&self) -> ScoreSummary {
        *self
            .class_averages
            .get_or_init(|| aggregate::class_averages(self.store.assessments()))
    }

    /// A blank identifier never matches, even rows exported without one.
    pub fn lookup(&self, raw_identifier: &str) -> StudentLookup {
        let student_id = identity::normalize_identifier(raw_identifier);
        if student_id.is_empty() {
            return StudentLookup::NoData;
        }
        let assessments = self.store.student_assessments(&student_id);
        let questions = self.store.student_questions(&student_id);

        if assessments.is_empty() && questions.is_empty() {
            tracing::info!(student_id = %student_id, "no records for student");
            return StudentLookup::NoData;
        }

        tracing::info!(
            student_id = %student_id,
            assessments = assessments.len(),
            questions = questions.len(),
            "building dashboard"
        );
        StudentLookup::Found(Box::new(view::build_with_averages(
            &assessments,
            self.store.assessments(),
            &questions,
            &student_id,
            self.class_averages(),
        )))
    }

    pub fn assessment_detail(&self, raw_identifier: &str, assessment_name: &str) -> AssessmentDetail {
        let student_id = identity::normalize_identifier(raw_identifier);
        let questions = if student_id.is_empty() {
            Vec::new()
        } else {
            self.store.student_questions(&student_id)
        };
        detail::assessment_detail(&questions, assessment_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Score;

    fn session() -> Session {
        let assessments = "\
StudentGmailID,AssessmentSource,AssessmentName,AttemptDate,Score_Scaled_Total
x@example.com,Canvas CB Test,CB-T1,2024-03-01,1200
y@example.com,Canvas CB Test,CB-T1,2024-03-02,1100
";
        let questions = "\
StudentGmailID,AssessmentName,SAT_Skill_Tag,IsCorrect,StudentAnswer
q@example.com,CB-T1,Math: Ratios,TRUE,A
";
        Session::new(RecordStore::from_readers(assessments.as_bytes(), questions.as_bytes()).unwrap())
    }

    #[test]
    fn unknown_student_is_distinguishable_from_empty_scores() {
        let session = session();
        assert_eq!(session.lookup("nobody@example.com"), StudentLookup::NoData);
        assert!(!session.lookup("nobody@example.com").has_data());
    }

    #[test]
    fn question_only_student_still_gets_a_view() {
        let session = session();
        let StudentLookup::Found(view) = session.lookup("Q@Example.com") else {
            panic!("expected a view model");
        };
        assert_eq!(view.latest_scores.total, Score::Unavailable);
        assert_eq!(view.class_averages_global.total, Score::Value(1150));
        assert_eq!(view.skill_performance_by_subject[2].student_accuracy_pct, 100);
    }

    #[test]
    fn lookups_are_repeatable() {
        let session = session();
        assert_eq!(session.lookup("x@example.com"), session.lookup(" X@example.com "));
        assert_eq!(session.class_averages().total, Score::Value(1150));
    }

    #[test]
    fn blank_identifier_matches_nothing() {
        let session = Session::new(
            RecordStore::from_readers(
                "StudentGmailID,AssessmentSource,AssessmentName\n,Canvas CB Test,CB-T1\n".as_bytes(),
                "StudentGmailID,AssessmentName,IsCorrect\n,CB-T1,TRUE\n".as_bytes(),
            )
            .unwrap(),
        );
        assert_eq!(session.store().assessments()[0].student_id, "");

        assert_eq!(session.lookup("   "), StudentLookup::NoData);
        assert_eq!(session.lookup(""), StudentLookup::NoData);
        assert!(session.assessment_detail(" ", "CB-T1").questions.is_empty());
        assert!(!identity::identifier_exists(session.store(), ""));
        assert!(!identity::identifier_exists(session.store(), "  "));
    }

    #[test]
    fn detail_is_scoped_to_the_student() {
        let session = session();
        assert_eq!(session.assessment_detail("q@example.com", "CB-T1").questions.len(), 1);
        assert!(session
            .assessment_detail("x@example.com", "CB-T1")
            .questions
            .is_empty());
    }
}
