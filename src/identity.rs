use crate::error::IdentifierError;
use crate::filter::any_for_student;
use crate::ingest::normalize_student_id;
use crate::models::AssessmentRecord;
use crate::store::RecordStore;

pub fn normalize_identifier(raw: &str) -> String {
    normalize_student_id(raw)
}

/// Shape check only. This is a lookup key, not a credential.
pub fn validate_identifier(raw: &str) -> Result<String, IdentifierError> {
    let normalized = normalize_identifier(raw);
    if normalized.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if !normalized.contains('@') || !normalized.contains('.') {
        return Err(IdentifierError::NotAnEmail(normalized));
    }
    Ok(normalized)
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `jane.doe@example.com` becomes `Jane Doe`.
pub fn humanize_identifier(student_id: &str) -> String {
    let local_part = student_id.split('@').next().unwrap_or_default();
    local_part
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn resolve_display_name(all_assessments: &[AssessmentRecord], student_id: &str) -> String {
    all_assessments
        .iter()
        .filter(|record| record.student_id == student_id)
        .find_map(|record| record.display_name.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| humanize_identifier(student_id))
}

/// Whether the identifier appears in either feed. Case-insensitive; a blank
/// identifier never exists.
pub fn identifier_exists(store: &RecordStore, raw: &str) -> bool {
    let student_id = normalize_identifier(raw);
    if student_id.is_empty() {
        return false;
    }
    any_for_student(store.assessments(), &student_id)
        || any_for_student(store.questions(), &student_id)
}
