pub mod rank;
pub mod scoring;
pub mod stable;
pub mod weights;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::db::{ProjectFetchError, ResultStoreError, StudentFetchError};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchingAlgorithm {
    Weighted,
    Stable,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchingScope {
    AllStudents,
    OneStudent,
}

/// Parameters for one engine invocation.
///
/// `student_id` is required when `scope` is `ONE_STUDENT`. `recompute`
/// deletes prior results before scoring; `persist` controls whether the
/// computed records are written at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingRunRequest {
    pub algorithm: MatchingAlgorithm,
    pub scope: MatchingScope,
    #[serde(default)]
    pub student_id: Option<i64>,
    #[serde(default)]
    pub recompute: bool,
    #[serde(default)]
    pub persist: bool,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub weights: Option<WeightOverrides>,
}

impl MatchingRunRequest {
    pub fn with_recompute(mut self, recompute: bool) -> Self {
        self.recompute = recompute;
        self
    }
}

/// Optional per-request weight overrides; unset components keep their
/// default value before normalization.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightOverrides {
    #[serde(default)]
    pub skills: Option<f64>,
    #[serde(default)]
    pub interests: Option<f64>,
    #[serde(default)]
    pub work_type: Option<f64>,
}

/// Statistics returned to the caller after a run.
#[derive(Debug, Clone)]
pub struct MatchingRunResult {
    pub session_id: String,
    pub algorithm_used: MatchingAlgorithm,
    pub students_processed: usize,
    pub projects_considered: usize,
    pub results_computed: usize,
    pub results_saved: usize,
    pub recompute: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Students(#[from] StudentFetchError),
    #[error(transparent)]
    Projects(#[from] ProjectFetchError),
    #[error(transparent)]
    Results(#[from] ResultStoreError),
    #[error("matching run cancelled after {completed} of {total} units")]
    Cancelled { completed: usize, total: usize },
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn algorithm_parses_wire_names() {
        assert_eq!(
            MatchingAlgorithm::from_str("WEIGHTED").unwrap(),
            MatchingAlgorithm::Weighted
        );
        assert_eq!(MatchingAlgorithm::Stable.as_ref(), "STABLE");
        assert_eq!(MatchingAlgorithm::Hybrid.to_string(), "HYBRID");
    }

    #[test]
    fn request_deserializes_with_sparse_fields() {
        let request: MatchingRunRequest = serde_json::from_str(
            r#"{"algorithm":"WEIGHTED","scope":"ALL_STUDENTS","weights":{"workType":0.4}}"#,
        )
        .unwrap();

        assert!(!request.recompute);
        assert!(!request.persist);
        assert_eq!(request.student_id, None);
        assert_eq!(request.weights.unwrap().work_type, Some(0.4));
    }

    #[test]
    fn with_recompute_overrides_the_flag() {
        let request: MatchingRunRequest = serde_json::from_str(
            r#"{"algorithm":"STABLE","scope":"ONE_STUDENT","studentId":7}"#,
        )
        .unwrap();

        let forced = request.with_recompute(true);
        assert!(forced.recompute);
        assert_eq!(forced.student_id, Some(7));
    }
}
