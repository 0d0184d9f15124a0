use chrono::Utc;
use tracing::{info, instrument};

use super::{
    load_students_for_scope, resolve_params, result_row, score_matrix_parallel, CancelFlag,
    MatchingStrategy,
};
use crate::db::{self, PgPool};
use crate::matching::stable::{solve, under_capacity_warnings};
use crate::matching::{
    MatchingAlgorithm, MatchingError, MatchingRunRequest, MatchingRunResult, MatchingScope,
};
use crate::session;

/// Runs capacitated deferred acceptance over the pairwise score matrix and
/// persists one record per seated student. Produces an assignment, not a
/// ranked list; `recommendation_rank` is the student's position within the
/// project's final roster.
pub struct StableStrategy {
    pool: PgPool,
    cancel: CancelFlag,
}

impl StableStrategy {
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

        if request.recompute {
            match request.scope {
                MatchingScope::OneStudent => {
                    if let Some(student) = students.first() {
                        db::delete_results_by_student(&self.pool, student.id).await?;
                    }
                }
                // Global stable recompute wipes the whole store, prior
                // sessions and other algorithms included.
                MatchingScope::AllStudents => {
                    db::delete_all_results(&self.pool).await?;
                }
            }
        }

        let matrix = score_matrix_parallel(&students, &projects, params.weights).await?;

        if self.cancel.is_cancelled() {
            return Err(MatchingError::Cancelled {
                completed: 0,
                total: projects.len(),
            });
        }

        let rosters = solve(&students, &projects, &matrix);
        warnings.extend(under_capacity_warnings(&projects, &rosters));

        let mut results_computed = 0;
        let mut results_saved = 0;
        let total = rosters.len();

        for (index, roster) in rosters.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(MatchingError::Cancelled {
                    completed: index,
                    total,
                });
            }

            results_computed += roster.placements.len();

            if request.persist && !roster.placements.is_empty() {
                let rows: Vec<_> = roster
                    .placements
                    .iter()
                    .map(|placement| {
                        result_row(
                            session_id,
                            placement.student_id,
                            roster.project_id,
                            &placement.score,
                            Some(placement.rank),
                            &params,
                            MatchingAlgorithm::Stable,
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
            under_capacity = warnings.len(),
            "stable matching completed"
        );

        Ok(MatchingRunResult {
            session_id: session_id.to_string(),
            algorithm_used: MatchingAlgorithm::Stable,
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
impl MatchingStrategy for StableStrategy {
    fn algorithm(&self) -> MatchingAlgorithm {
        MatchingAlgorithm::Stable
    }

    async fn execute(
        &self,
        request: &MatchingRunRequest,
    ) -> Result<MatchingRunResult, MatchingError> {
        self.run_with_session(request, &session::generate()).await
    }
}
