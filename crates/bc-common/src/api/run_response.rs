use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matching::{MatchingAlgorithm, MatchingRunResult};

/// Run statistics as returned to API and CLI callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingRunResponse {
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

impl From<MatchingRunResult> for MatchingRunResponse {
    fn from(result: MatchingRunResult) -> Self {
        Self {
            session_id: result.session_id,
            algorithm_used: result.algorithm_used,
            students_processed: result.students_processed,
            projects_considered: result.projects_considered,
            results_computed: result.results_computed,
            results_saved: result.results_saved,
            recompute: result.recompute,
            started_at: result.started_at,
            finished_at: result.finished_at,
            warnings: result.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case_fields() {
        let response = MatchingRunResponse {
            session_id: "SESSION-TEST".into(),
            algorithm_used: MatchingAlgorithm::Hybrid,
            students_processed: 3,
            projects_considered: 5,
            results_computed: 18,
            results_saved: 18,
            recompute: true,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            warnings: vec!["Weights sum is 0. Using defaults 0.50/0.30/0.20".into()],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sessionId"], "SESSION-TEST");
        assert_eq!(json["algorithmUsed"], "HYBRID");
        assert_eq!(json["resultsComputed"], 18);
        assert!(json["warnings"][0].as_str().unwrap().contains('0'));
    }
}
