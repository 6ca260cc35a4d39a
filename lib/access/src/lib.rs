//! LMS-backed platform access for lmsgate.
//!
//! This crate provides the pure layer of the authenticator:
//! - Configuration for one LMS installation (`CanvasConfig`)
//! - Schemas for the LMS's semi-structured records (`record`)
//! - Group derivation from course enrollments and group sets (`groups`)
//! - The immutable per-login auth-state snapshot (`AuthState`)
//! - Username normalization and the final decision (`AuthDecision`)
//! - Spawn-environment projection for the hosting platform (`spawn`)
//!
//! Network concerns (token exchange, paginated fetching) live in the
//! server crate; everything here is deterministic and testable without
//! I/O.
//!
//! # Example
//!
//! ```
//! use lmsgate_access::{CourseKey, course_groups, membership_groups, normalize_username};
//! use serde_json::json;
//!
//! let courses = vec![json!({
//!     "id": 101,
//!     "enrollments": [{"type": "student"}],
//! })];
//! let memberships = vec![json!({
//!     "name": "g1",
//!     "context_type": "Course",
//!     "course_id": 101,
//! })];
//!
//! let mut groups = course_groups(&courses, CourseKey::Id);
//! groups.extend(membership_groups(&memberships));
//!
//! assert_eq!(groups, vec![
//!     "course::101",
//!     "course::101::enrollment_type::student",
//!     "course::101::group::g1",
//! ]);
//!
//! assert_eq!(
//!     normalize_username("Jane@Berkeley.EDU", Some("berkeley.edu")),
//!     "jane",
//! );
//! ```

pub mod config;
pub mod error;
pub mod groups;
pub mod record;
pub mod spawn;
pub mod state;
pub mod user;

// Re-export main types at crate root
pub use config::{CanvasConfig, CourseKey};
pub use error::{ConfigError, StateError};
pub use groups::{course_groups, membership_groups};
pub use spawn::{ACCESS_TOKEN_VAR, spawn_environment};
pub use state::{AuthState, TokenPayload, normalize_scopes};
pub use user::{AuthDecision, normalize_username};
