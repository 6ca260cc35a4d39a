//! Group derivation from LMS course and group-set records.
//!
//! Two pure functions translate the records fetched for a user into
//! canonical group identifiers:
//!
//! - [`course_groups`]: `course::{id}` plus
//!   `course::{id}::enrollment_type::{type}` per distinct enrollment
//!   type, in course input order.
//! - [`membership_groups`]: `{context_type}::{context_id}::group::{name}`,
//!   globally deduplicated.
//!
//! The asymmetry is deliberate: course identifiers keep input order
//! and may repeat across courses, while group-set names cannot be
//! distinguished across sets and collapse into a set.

use crate::config::CourseKey;
use crate::record::{Course, GroupMembership};
use serde_json::Value;
use std::collections::BTreeSet;

/// Joins identifier terms with the `::` separator.
fn join_terms(terms: &[&str]) -> String {
    terms.join("::")
}

/// Derives group identifiers from the user's course enrollments.
///
/// Courses are processed in input order; a course whose configured
/// identifier field is absent contributes nothing. Enrollment types
/// are emitted in sorted order so the output is reproducible.
#[must_use]
pub fn course_groups(courses: &[Value], key: CourseKey) -> Vec<String> {
    let mut groups = Vec::new();

    for record in courses {
        let Ok(course) = serde_json::from_value::<Course>(record.clone()) else {
            continue;
        };
        let Some(course_id) = course.identifier(key) else {
            continue;
        };

        groups.push(join_terms(&["course", &course_id]));

        for kind in course.enrollment_types() {
            groups.push(join_terms(&["course", &course_id, "enrollment_type", &kind]));
        }
    }

    groups
}

/// Derives group identifiers from the user's group-set memberships.
///
/// A record without a name contributes nothing. The context id is read
/// from the `{context_type}_id` field, defaulting to `0`. Identical
/// identifiers across group sets collapse; the result is returned in
/// sorted order and must be treated as a set.
#[must_use]
pub fn membership_groups(records: &[Value]) -> Vec<String> {
    let mut groups = BTreeSet::new();

    for record in records {
        let Ok(membership) = serde_json::from_value::<GroupMembership>(record.clone()) else {
            continue;
        };
        let Some(name) = membership.name_term() else {
            continue;
        };

        let context_type = membership.context_type_lower();
        let context_id = membership.context_id(&context_type);

        groups.insert(join_terms(&[&context_type, &context_id, "group", &name]));
    }

    groups.into_iter().collect()
}
