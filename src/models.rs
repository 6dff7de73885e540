use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::filter::StudentKeyed;

/// Where an assessment row came from. Export tags are mapped once at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssessmentSource {
    StandardizedTest,
    ModulePractice,
    EndOfChapterPractice,
    ExternalAdaptivePractice,
    Other(String),
}

impl AssessmentSource {
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        match tag.to_ascii_lowercase().as_str() {
            "canvas cb test" | "standardized-test" => Self::StandardizedTest,
            "canvas cb module" | "module-practice" => Self::ModulePractice,
            "canvas eoc practice" | "end-of-chapter-practice" => Self::EndOfChapterPractice,
            "khan academy practice" | "external-adaptive-practice" => {
                Self::ExternalAdaptivePractice
            }
            _ if tag.contains("EOC") => Self::EndOfChapterPractice,
            _ if tag.contains("Khan") => Self::ExternalAdaptivePractice,
            _ => Self::Other(tag.to_string()),
        }
    }

    /// Sources scored only by a raw percentage.
    pub fn is_practice(&self) -> bool {
        matches!(
            self,
            Self::EndOfChapterPractice | Self::ExternalAdaptivePractice
        )
    }
}

/// Attempt date as exported. Unparsable values are kept verbatim so they can be
/// shown as-is; both they and missing dates sort after every real date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptDate {
    Date(NaiveDate),
    Unparsed(String),
    Missing,
}

impl AttemptDate {
    const FORMATS: [&'static str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("n/a") {
            return Self::Missing;
        }

        // Sheet exports sometimes carry a timestamp after the date.
        let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
        Self::FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
            .map(Self::Date)
            .unwrap_or_else(|| Self::Unparsed(raw.to_string()))
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    /// Oldest first, undated last.
    pub fn cmp_ascending(&self, other: &Self) -> Ordering {
        match (self.as_date(), other.as_date()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Newest first, undated last.
    pub fn cmp_latest_first(&self, other: &Self) -> Ordering {
        match (self.as_date(), other.as_date()) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl fmt::Display for AttemptDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%b %-d, %Y")),
            Self::Unparsed(raw) => f.write_str(raw),
            Self::Missing => f.write_str("-"),
        }
    }
}

impl Serialize for AttemptDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Date(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            Self::Unparsed(raw) => serializer.serialize_str(raw),
            Self::Missing => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRecord {
    pub student_id: String,
    pub display_name: Option<String>,
    pub source: AssessmentSource,
    pub name: String,
    pub attempt_date: AttemptDate,
    pub scaled_total: Option<f64>,
    pub scaled_verbal: Option<f64>,
    pub scaled_quant: Option<f64>,
    pub raw_combined: Option<f64>,
    pub points_possible_combined: Option<f64>,
    pub score_percentage: Option<f64>,
}

impl StudentKeyed for AssessmentRecord {
    fn student_id(&self) -> &str {
        &self.student_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Correctness {
    Correct,
    Incorrect,
    Unknown,
}

impl Correctness {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") {
            Self::Correct
        } else if raw.eq_ignore_ascii_case("false") {
            Self::Incorrect
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkillTag {
    Named(String),
    Unclassified,
}

impl SkillTag {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("tbd") || raw.eq_ignore_ascii_case("unclassified")
        {
            Self::Unclassified
        } else {
            Self::Named(raw.to_string())
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name.as_str()),
            Self::Unclassified => None,
        }
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.name().is_some_and(|name| name.contains(marker))
    }
}

impl fmt::Display for SkillTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("TBD"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRecord {
    pub student_id: String,
    pub assessment_name: String,
    pub skill_tag: SkillTag,
    pub correctness: Correctness,
    pub student_answer: Option<String>,
    pub points_earned: Option<f64>,
    pub points_possible: Option<f64>,
    pub sequence_in_quiz: Option<String>,
    pub question_text: Option<String>,
    pub class_average_points: Option<String>,
}

impl QuestionRecord {
    pub fn is_answered(&self) -> bool {
        self.student_answer
            .as_deref()
            .is_some_and(|answer| !answer.trim().is_empty())
    }
}

impl StudentKeyed for QuestionRecord {
    fn student_id(&self) -> &str {
        &self.student_id
    }
}

/// Magnitude at which an `f64` no longer fits an `i64`.
pub(crate) const I64_BOUND: f64 = i64::MAX as f64;

/// An aggregate score, or the explicit marker that nothing contributed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Score {
    Value(i64),
    #[default]
    Unavailable,
}

impl Score {
    /// Rounds half away from zero. Values outside the `i64` range are unavailable.
    pub fn rounded(value: f64) -> Self {
        let value = value.round();
        if value.is_finite() && value.abs() < I64_BOUND {
            Self::Value(value as i64)
        } else {
            Self::Unavailable
        }
    }

    pub fn from_option(value: Option<f64>) -> Self {
        value.map(Self::rounded).unwrap_or(Self::Unavailable)
    }

    pub fn value(self) -> Option<i64> {
        match self {
            Self::Value(value) => Some(value),
            Self::Unavailable => None,
        }
    }

    /// Percentage for widgets that cannot show "unavailable".
    pub fn pct_or_zero(self) -> u8 {
        self.value().map(|value| value.clamp(0, 100) as u8).unwrap_or(0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Unavailable => f.write_str("-"),
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => serializer.serialize_i64(*value),
            Self::Unavailable => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Reading,
    Writing,
    Math,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Reading, Subject::Writing, Subject::Math];

    pub fn label(self) -> &'static str {
        match self {
            Self::Reading => "Reading",
            Self::Writing => "Writing & Language",
            Self::Math => "Math",
        }
    }

    /// Substring identifying the subject in skill tags and adaptive practice names.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Reading => "Reading",
            Self::Writing => "Writing",
            Self::Math => "Math",
        }
    }

    pub fn end_of_chapter_prefix(self) -> &'static str {
        match self {
            Self::Reading => "R-EOC",
            Self::Writing => "W-EOC",
            Self::Math => "M-EOC",
        }
    }
}

pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
