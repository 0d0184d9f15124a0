use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::StoredMatchingResult;

/// One persisted matching result as exposed by the retrieval endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingResultResponse {
    pub id: i64,
    pub session_id: String,
    pub student_id: i64,
    pub project_id: i64,
    pub global_score: f64,
    pub skills_score: Option<f64>,
    pub interests_score: Option<f64>,
    pub work_type_score: Option<f64>,
    pub skills_weight: Option<f64>,
    pub interests_weight: Option<f64>,
    pub work_type_weight: Option<f64>,
    pub threshold_used: Option<f64>,
    pub above_threshold: bool,
    pub recommendation_rank: Option<i32>,
    pub algorithm_used: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoredMatchingResult> for MatchingResultResponse {
    fn from(result: StoredMatchingResult) -> Self {
        Self {
            id: result.id,
            session_id: result.session_id,
            student_id: result.student_id,
            project_id: result.project_id,
            global_score: result.global_score,
            skills_score: result.skills_score,
            interests_score: result.interests_score,
            work_type_score: result.work_type_score,
            skills_weight: result.skills_weight,
            interests_weight: result.interests_weight,
            work_type_weight: result.work_type_weight,
            threshold_used: result.threshold_used,
            above_threshold: result.above_threshold,
            recommendation_rank: result.recommendation_rank,
            algorithm_used: result.algorithm_used,
            created_at: result.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_stored_rows_losslessly() {
        let stored = StoredMatchingResult {
            id: 9,
            session_id: "SESSION-TEST".into(),
            student_id: 1,
            project_id: 2,
            global_score: 0.85,
            skills_score: Some(1.0),
            interests_score: Some(0.5),
            work_type_score: Some(1.0),
            skills_weight: Some(0.5),
            interests_weight: Some(0.3),
            work_type_weight: Some(0.2),
            threshold_used: Some(0.5),
            above_threshold: true,
            recommendation_rank: Some(1),
            algorithm_used: "WEIGHTED".into(),
            created_at: Utc::now(),
        };

        let response = MatchingResultResponse::from(stored);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["globalScore"], 0.85);
        assert_eq!(json["recommendationRank"], 1);
        assert_eq!(json["aboveThreshold"], true);
        assert_eq!(json["algorithmUsed"], "WEIGHTED");
    }
}
