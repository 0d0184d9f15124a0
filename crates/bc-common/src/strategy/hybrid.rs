use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use super::{MatchingStrategy, StableStrategy, WeightedStrategy};
use crate::matching::{MatchingAlgorithm, MatchingError, MatchingRunRequest, MatchingRunResult};
use crate::session;

/// Weighted scoring followed by stable allocation over the identical
/// request. Both result sets are persisted independently under one shared
/// session id; no attempt is made to reconcile them.
pub struct HybridStrategy {
    weighted: Arc<WeightedStrategy>,
    stable: Arc<StableStrategy>,
}

impl HybridStrategy {
    pub fn new(weighted: Arc<WeightedStrategy>, stable: Arc<StableStrategy>) -> Self {
        Self { weighted, stable }
    }
}

#[async_trait::async_trait]
impl MatchingStrategy for HybridStrategy {
    fn algorithm(&self) -> MatchingAlgorithm {
        MatchingAlgorithm::Hybrid
    }

    #[instrument(skip(self, request))]
    async fn execute(
        &self,
        request: &MatchingRunRequest,
    ) -> Result<MatchingRunResult, MatchingError> {
        let started_at = Utc::now();
        let session_id = session::generate();

        let weighted_run = self.weighted.run_with_session(request, &session_id).await?;
        let stable_run = self.stable.run_with_session(request, &session_id).await?;

        // Both sub-runs walk the same scope, so entity counts should agree;
        // result counts genuinely differ and are summed.
        let students_processed = weighted_run
            .students_processed
            .max(stable_run.students_processed);
        let projects_considered = weighted_run
            .projects_considered
            .max(stable_run.projects_considered);
        let results_computed = weighted_run.results_computed + stable_run.results_computed;
        let results_saved = weighted_run.results_saved + stable_run.results_saved;

        let mut warnings = weighted_run.warnings;
        warnings.extend(stable_run.warnings);

        info!(
            session_id,
            students_processed, results_computed, results_saved, "hybrid matching completed"
        );

        Ok(MatchingRunResult {
            session_id,
            algorithm_used: MatchingAlgorithm::Hybrid,
            students_processed,
            projects_considered,
            results_computed,
            results_saved,
            recompute: request.recompute,
            started_at,
            finished_at: Utc::now(),
            warnings,
        })
    }
}
