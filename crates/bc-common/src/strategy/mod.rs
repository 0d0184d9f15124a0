pub mod hybrid;
pub mod stable;
pub mod weighted;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::db::{self, MatchingResultInsert, PgPool};
use crate::matching::rank::{rank_projects, RankedProject};
use crate::matching::scoring::CompatibilityScore;
use crate::matching::stable::ScoreMatrix;
use crate::matching::weights::Weights;
use crate::matching::{MatchingAlgorithm, MatchingError, MatchingRunRequest, MatchingScope};
use crate::{Project, Student};

pub use hybrid::HybridStrategy;
pub use stable::StableStrategy;
pub use weighted::WeightedStrategy;

pub const DEFAULT_THRESHOLD: f64 = 0.50;

/// Upper bound on students scored per blocking task. Scoring is pure, so
/// chunks run concurrently without coordination.
const SCORING_CHUNK: usize = 64;

/// Cooperative cancellation shared between a run and its owner. Strategies
/// check it between units of work, never mid-batch.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[async_trait]
pub trait MatchingStrategy: Send + Sync {
    fn algorithm(&self) -> MatchingAlgorithm;

    async fn execute(
        &self,
        request: &MatchingRunRequest,
    ) -> Result<crate::matching::MatchingRunResult, MatchingError>;
}

/// Registry of strategies keyed by algorithm identifier. Built once at
/// startup and handed to whoever runs requests; nothing is registered
/// globally.
pub struct MatchingContext {
    strategies: HashMap<MatchingAlgorithm, Arc<dyn MatchingStrategy>>,
}

impl MatchingContext {
    pub fn new(strategies: impl IntoIterator<Item = Arc<dyn MatchingStrategy>>) -> Self {
        let strategies = strategies
            .into_iter()
            .map(|strategy| (strategy.algorithm(), strategy))
            .collect();

        Self { strategies }
    }

    pub async fn run(
        &self,
        request: &MatchingRunRequest,
    ) -> Result<crate::matching::MatchingRunResult, MatchingError> {
        let strategy = self.strategies.get(&request.algorithm).ok_or_else(|| {
            MatchingError::InvalidArgument(format!("Unknown algorithm: {}", request.algorithm))
        })?;

        strategy.execute(request).await
    }
}

/// Wire up the three stock strategies against one pool and cancel flag.
pub fn build_context(pool: PgPool, cancel: CancelFlag) -> MatchingContext {
    let weighted = Arc::new(WeightedStrategy::new(pool.clone(), cancel.clone()));
    let stable = Arc::new(StableStrategy::new(pool, cancel));
    let hybrid = Arc::new(HybridStrategy::new(Arc::clone(&weighted), Arc::clone(&stable)));

    MatchingContext::new([
        weighted as Arc<dyn MatchingStrategy>,
        stable as Arc<dyn MatchingStrategy>,
        hybrid as Arc<dyn MatchingStrategy>,
    ])
}

/// Request parameters resolved once per run: validated threshold,
/// normalized weights, and any warnings produced while resolving them.
pub(crate) struct RunParams {
    pub threshold: f64,
    pub weights: Weights,
    pub warnings: Vec<String>,
}

pub(crate) fn resolve_params(request: &MatchingRunRequest) -> Result<RunParams, MatchingError> {
    let threshold = request.threshold.unwrap_or(DEFAULT_THRESHOLD);
    if !(0.0..=1.0).contains(&threshold) {
        return Err(MatchingError::InvalidArgument(format!(
            "threshold must lie in [0, 1], got {threshold}"
        )));
    }

    let raw = Weights::from_overrides(request.weights.as_ref());
    if raw.has_negative() {
        return Err(MatchingError::InvalidArgument(
            "weights must be non-negative".into(),
        ));
    }

    let (weights, warning) = raw.normalize();

    Ok(RunParams {
        threshold,
        weights,
        warnings: warning.into_iter().map(String::from).collect(),
    })
}

pub(crate) async fn load_students_for_scope(
    pool: &PgPool,
    request: &MatchingRunRequest,
) -> Result<Vec<Student>, MatchingError> {
    match request.scope {
        MatchingScope::OneStudent => {
            let student_id = request.student_id.ok_or_else(|| {
                MatchingError::InvalidArgument(
                    "studentId is required when scope=ONE_STUDENT".into(),
                )
            })?;

            let student = db::fetch_student_by_id(pool, student_id)
                .await?
                .ok_or_else(|| {
                    MatchingError::InvalidArgument(format!("Student not found: {student_id}"))
                })?;

            Ok(vec![student])
        }
        MatchingScope::AllStudents => Ok(db::fetch_all_students(pool).await?),
    }
}

/// Compute each student's full ranking, chunked across blocking workers.
/// Output preserves the students' input order.
pub(crate) async fn rank_all_parallel(
    students: &[Student],
    projects: &[Project],
    weights: Weights,
) -> Result<Vec<(i64, Vec<RankedProject>)>, MatchingError> {
    let projects = Arc::new(projects.to_vec());
    let mut tasks = Vec::new();

    for chunk in students.chunks(SCORING_CHUNK) {
        let chunk = chunk.to_vec();
        let projects = Arc::clone(&projects);

        tasks.push(tokio::task::spawn_blocking(move || {
            chunk
                .iter()
                .map(|student| (student.id, rank_projects(student, &projects, &weights)))
                .collect::<Vec<_>>()
        }));
    }

    let mut ranked = Vec::with_capacity(students.len());
    for task in tasks {
        let partial = task
            .await
            .map_err(|err| MatchingError::Internal(format!("scoring task failed: {err}")))?;
        ranked.extend(partial);
    }

    Ok(ranked)
}

/// Build the full score matrix, chunked across blocking workers and merged.
pub(crate) async fn score_matrix_parallel(
    students: &[Student],
    projects: &[Project],
    weights: Weights,
) -> Result<ScoreMatrix, MatchingError> {
    let projects = Arc::new(projects.to_vec());
    let mut tasks = Vec::new();

    for chunk in students.chunks(SCORING_CHUNK) {
        let chunk = chunk.to_vec();
        let projects = Arc::clone(&projects);

        tasks.push(tokio::task::spawn_blocking(move || {
            crate::matching::stable::build_score_matrix(&chunk, &projects, &weights)
        }));
    }

    let mut matrix = ScoreMatrix::default();
    for task in tasks {
        let partial = task
            .await
            .map_err(|err| MatchingError::Internal(format!("scoring task failed: {err}")))?;
        matrix.merge(partial);
    }

    Ok(matrix)
}

/// Assemble one persistable record from a computed score.
pub(crate) fn result_row(
    session_id: &str,
    student_id: i64,
    project_id: i64,
    score: &CompatibilityScore,
    rank: Option<u32>,
    params: &RunParams,
    algorithm: MatchingAlgorithm,
) -> MatchingResultInsert {
    MatchingResultInsert {
        session_id: session_id.to_string(),
        student_id,
        project_id,
        global_score: score.total,
        skills_score: score.skills,
        interests_score: score.interests,
        work_type_score: score.work_type,
        skills_weight: params.weights.skills,
        interests_weight: params.weights.interests,
        work_type_weight: params.weights.work_type,
        threshold_used: params.threshold,
        above_threshold: score.total >= params.threshold,
        recommendation_rank: rank.map(|r| r as i32),
        algorithm_used: algorithm.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::weights::DEFAULT_WEIGHTS;

    fn request(threshold: Option<f64>) -> MatchingRunRequest {
        MatchingRunRequest {
            algorithm: MatchingAlgorithm::Weighted,
            scope: MatchingScope::AllStudents,
            student_id: None,
            recompute: false,
            persist: false,
            threshold,
            weights: None,
        }
    }

    #[test]
    fn resolve_defaults_threshold_to_half() {
        let params = resolve_params(&request(None)).unwrap();
        assert!((params.threshold - DEFAULT_THRESHOLD).abs() < f64::EPSILON);
        assert_eq!(params.weights, DEFAULT_WEIGHTS);
        assert!(params.warnings.is_empty());
    }

    #[test]
    fn resolve_rejects_out_of_range_thresholds() {
        assert!(matches!(
            resolve_params(&request(Some(1.5))),
            Err(MatchingError::InvalidArgument(_))
        ));
        assert!(matches!(
            resolve_params(&request(Some(-0.1))),
            Err(MatchingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn resolve_rejects_negative_weights() {
        let mut req = request(None);
        req.weights = Some(crate::matching::WeightOverrides {
            skills: Some(-0.1),
            interests: None,
            work_type: None,
        });

        assert!(matches!(
            resolve_params(&req),
            Err(MatchingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn resolve_warns_once_on_zero_sum_weights() {
        let mut req = request(None);
        req.weights = Some(crate::matching::WeightOverrides {
            skills: Some(0.0),
            interests: Some(0.0),
            work_type: Some(0.0),
        });

        let params = resolve_params(&req).unwrap();
        assert_eq!(params.weights, DEFAULT_WEIGHTS);
        assert_eq!(params.warnings.len(), 1);
        assert!(params.warnings[0].contains('0'));
    }

    #[test]
    fn result_row_applies_inclusive_threshold() {
        let params = resolve_params(&request(Some(0.5))).unwrap();
        let score = CompatibilityScore {
            skills: 0.5,
            interests: 0.5,
            work_type: 0.5,
            total: 0.5,
        };

        let row = result_row(
            "SESSION-TEST",
            1,
            2,
            &score,
            Some(3),
            &params,
            MatchingAlgorithm::Weighted,
        );

        assert!(row.above_threshold, "boundary score must count as above");
        assert_eq!(row.recommendation_rank, Some(3));
        assert_eq!(row.algorithm_used, "WEIGHTED");
        let weight_sum = row.skills_weight + row.interests_weight + row.work_type_weight;
        assert!((weight_sum - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn parallel_ranking_matches_sequential_order() {
        let students: Vec<Student> = (1..=130)
            .map(|id| Student {
                id,
                skills: vec![id % 7],
                ..Student::default()
            })
            .collect();
        let projects: Vec<Project> = (1..=5)
            .map(|id| Project {
                id,
                title: format!("project {id}"),
                max_students: 2,
                required_skills: vec![id % 7],
                ..Project::default()
            })
            .collect();

        let ranked = rank_all_parallel(&students, &projects, DEFAULT_WEIGHTS)
            .await
            .unwrap();

        assert_eq!(ranked.len(), students.len());
        for (expected, (student_id, list)) in students.iter().zip(&ranked) {
            assert_eq!(expected.id, *student_id);
            assert_eq!(list.len(), projects.len());
            assert_eq!(
                list,
                &rank_projects(expected, &projects, &DEFAULT_WEIGHTS)
            );
        }
    }

    #[tokio::test]
    async fn parallel_matrix_covers_every_pair() {
        let students: Vec<Student> = (1..=70)
            .map(|id| Student {
                id,
                skills: vec![1],
                ..Student::default()
            })
            .collect();
        let projects: Vec<Project> = (1..=3)
            .map(|id| Project {
                id,
                title: format!("project {id}"),
                max_students: 1,
                required_skills: vec![1],
                ..Project::default()
            })
            .collect();

        let matrix = score_matrix_parallel(&students, &projects, DEFAULT_WEIGHTS)
            .await
            .unwrap();

        assert_eq!(matrix.len(), students.len() * projects.len());
        assert!(matrix.get(1, 1).is_some());
        assert!(matrix.get(70, 3).is_some());
    }
}
