//! Schemas for the records the LMS returns.
//!
//! Upstream payloads are semi-structured: most fields are optional,
//! identifier fields vary by deployment, and group records carry their
//! context id under a name derived from the context type. Rather than
//! probing untyped maps, these schemas make every optional field
//! explicit and keep unrecognized fields reachable where a dynamic
//! lookup is required.

use crate::config::CourseKey;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// One enrollment entry inside a course record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Enrollment {
    /// Role tag within the course ("teacher", "student", ...).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// A course record, as returned by the course-collection endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Course {
    /// Numeric course id.
    #[serde(default)]
    pub id: Option<Value>,
    /// Institution-stable SIS course id.
    #[serde(default)]
    pub sis_course_id: Option<Value>,
    /// Human-readable course code.
    #[serde(default)]
    pub course_code: Option<Value>,
    /// The current user's enrollments in this course. May contain
    /// duplicates.
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

impl Course {
    /// Returns the configured identifier for this course, rendered as a
    /// string term, or `None` if the field is absent.
    #[must_use]
    pub fn identifier(&self, key: CourseKey) -> Option<String> {
        let value = match key {
            CourseKey::Id => self.id.as_ref(),
            CourseKey::SisCourseId => self.sis_course_id.as_ref(),
            CourseKey::CourseCode => self.course_code.as_ref(),
        };
        value.map(value_term)
    }

    /// Returns the distinct enrollment types present in this course.
    ///
    /// An enrollment without a type tag contributes the empty string.
    #[must_use]
    pub fn enrollment_types(&self) -> BTreeSet<String> {
        self.enrollments
            .iter()
            .map(|e| e.kind.clone().unwrap_or_default())
            .collect()
    }
}

/// A group-membership record, as returned by the self-groups endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupMembership {
    /// Display name of the group.
    #[serde(default)]
    pub name: Option<Value>,
    /// Context type tag, "Course" or "Account".
    #[serde(default)]
    pub context_type: Option<String>,
    /// Remaining fields, kept for the `{context_type}_id` lookup.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl GroupMembership {
    /// Returns the group name rendered as a string term, if present.
    #[must_use]
    pub fn name_term(&self) -> Option<String> {
        self.name.as_ref().map(value_term)
    }

    /// Returns the lower-cased context type. Empty when the record has
    /// no context-type tag.
    #[must_use]
    pub fn context_type_lower(&self) -> String {
        self.context_type
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
    }

    /// Returns the context id looked up under `{context_type}_id`,
    /// defaulting to `0` when absent.
    #[must_use]
    pub fn context_id(&self, context_type: &str) -> String {
        let field = format!("{context_type}_id");
        self.extra
            .get(&field)
            .map(value_term)
            .unwrap_or_else(|| "0".to_string())
    }
}

/// Renders a JSON value as a group-identifier term.
///
/// Strings render without quotes; everything else uses its JSON form
/// (so the numeric id `101` becomes `101`).
#[must_use]
pub fn value_term(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
