/// Records that belong to one student.
pub trait StudentKeyed {
    fn student_id(&self) -> &str;
}

/// Exact match against an already normalized identifier. An empty result is a
/// normal outcome, not an error.
pub fn filter_by_student<'a, R: StudentKeyed>(records: &'a [R], student_id: &str) -> Vec<&'a R> {
    records
        .iter()
        .filter(|record| record.student_id() == student_id)
        .collect()
}

pub fn any_for_student<R: StudentKeyed>(records: &[R], student_id: &str) -> bool {
    records.iter().any(|record| record.student_id() == student_id)
}
