use chrono::Utc;
use tracing::{info, instrument};

use super::{
    load_students_for_scope, rank_all_parallel, resolve_params, result_row, CancelFlag,
    MatchingStrategy,
};
use crate::db::{self, PgPool};
use crate::matching::{MatchingAlgorithm, MatchingError, MatchingRunRequest, MatchingRunResult};
use crate::session;

/// Scores every student in scope against the full project set and persists
/// a dense per-student recommendation ranking.
pub struct WeightedStrategy {
    pool: PgPool,
    cancel: CancelFlag,
}

impl WeightedStrategy {
    pub fn new(pool: PgPool, cancel: CancelFlag) -> Self {
        Self { pool, cancel }
    }

    #[instrument(skip(self, request))]
    pub(crate) async fn run_with_session(
        &self,
        request: &MatchingRunRequest,
        session_id: &str,
    ) -> Result<MatchingRunResult, MatchingError> {
        let started_at = Utc::now();

        let params = resolve_params(request)?;
        let mut warnings = params.warnings.clone();

        let students = load_students_for_scope(&self.pool, request).await?;
        let projects = db::fetch_active_projects(&self.pool).await?;

        let ranked_lists = rank_all_parallel(&students, &projects, params.weights).await?;

        let mut results_computed = 0;
        let mut results_saved = 0;
        let total = ranked_lists.len();

        for (index, (student_id, ranked)) in ranked_lists.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(MatchingError::Cancelled {
                    completed: index,
                    total,
                });
            }

            if request.recompute {
                db::delete_results_by_student(&self.pool, *student_id).await?;
            }

            results_computed += ranked.len();

            if request.persist {
                let rows: Vec<_> = ranked
                    .iter()
                    .map(|r| {
                        result_row(
                            session_id,
                            *student_id,
                            r.project_id,
                            &r.score,
                            Some(r.rank),
                            &params,
                            MatchingAlgorithm::Weighted,
                        )
                    })
                    .collect();

                results_saved += db::insert_results(&self.pool, &rows).await? as usize;
            }
        }

        info!(
            session_id,
            students = students.len(),
            projects = projects.len(),
            results_computed,
            results_saved,
            "weighted matching completed"
        );

        Ok(MatchingRunResult {
            session_id: session_id.to_string(),
            algorithm_used: MatchingAlgorithm::Weighted,
            students_processed: students.len(),
            projects_considered: projects.len(),
            results_computed,
            results_saved,
            recompute: request.recompute,
            started_at,
            finished_at: Utc::now(),
            warnings,
        })
    }
}

#[async_trait::async_trait]
impl MatchingStrategy for WeightedStrategy {
    fn algorithm(&self) -> MatchingAlgorithm {
        MatchingAlgorithm::Weighted
    }

    async fn execute(
        &self,
        request: &MatchingRunRequest,
    ) -> Result<MatchingRunResult, MatchingError> {
        self.run_with_session(request, &session::generate()).await
    }
}
