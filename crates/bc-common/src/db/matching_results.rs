use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::instrument;

use crate::db::util::TimedClientExt;
use crate::db::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum ResultStoreError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

/// One result record to persist. Records are immutable once written; a
/// rerun either adds a new session's records or deletes and recreates.
#[derive(Debug, Clone, Default)]
pub struct MatchingResultInsert {
    pub session_id: String,
    pub student_id: i64,
    pub project_id: i64,
    pub global_score: f64,
    pub skills_score: f64,
    pub interests_score: f64,
    pub work_type_score: f64,
    pub skills_weight: f64,
    pub interests_weight: f64,
    pub work_type_weight: f64,
    pub threshold_used: f64,
    pub above_threshold: bool,
    pub recommendation_rank: Option<i32>,
    pub algorithm_used: String,
}

/// A persisted result as read back for the retrieval endpoints.
#[derive(Debug, Clone)]
pub struct StoredMatchingResult {
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

const RESULT_COLUMNS: &str = "id, session_id, student_id, project_id, global_score,
    skills_score, interests_score, work_type_score,
    skills_weight, interests_weight, work_type_weight,
    threshold_used, above_threshold, recommendation_rank, algorithm_used, created_at";

fn map_result(row: &Row) -> StoredMatchingResult {
    StoredMatchingResult {
        id: row.get("id"),
        session_id: row.get("session_id"),
        student_id: row.get("student_id"),
        project_id: row.get("project_id"),
        global_score: row.get("global_score"),
        skills_score: row.get("skills_score"),
        interests_score: row.get("interests_score"),
        work_type_score: row.get("work_type_score"),
        skills_weight: row.get("skills_weight"),
        interests_weight: row.get("interests_weight"),
        work_type_weight: row.get("work_type_weight"),
        threshold_used: row.get("threshold_used"),
        above_threshold: row.get("above_threshold"),
        recommendation_rank: row.get("recommendation_rank"),
        algorithm_used: row.get("algorithm_used"),
        created_at: row.get("created_at"),
    }
}

/// Insert one unit of work (a student's ranking, or a project's roster) as
/// a single transaction, so a crash mid-run never leaves a half-written
/// batch behind. Returns the number of rows written.
#[instrument(skip(pool, results), fields(batch = results.len()))]
pub async fn insert_results(
    pool: &PgPool,
    results: &[MatchingResultInsert],
) -> Result<u64, ResultStoreError> {
    if results.is_empty() {
        return Ok(0);
    }

    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let stmt = tx
        .prepare(
            "INSERT INTO bc.matching_results (
                session_id,
                student_id,
                project_id,
                global_score,
                skills_score,
                interests_score,
                work_type_score,
                skills_weight,
                interests_weight,
                work_type_weight,
                threshold_used,
                above_threshold,
                recommendation_rank,
                algorithm_used
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14
            )",
        )
        .await?;

    let mut written = 0;
    for result in results {
        written += tx
            .execute(
                &stmt,
                &[
                    &result.session_id,
                    &result.student_id,
                    &result.project_id,
                    &result.global_score,
                    &result.skills_score,
                    &result.interests_score,
                    &result.work_type_score,
                    &result.skills_weight,
                    &result.interests_weight,
                    &result.work_type_weight,
                    &result.threshold_used,
                    &result.above_threshold,
                    &result.recommendation_rank,
                    &result.algorithm_used,
                ],
            )
            .await?;
    }

    tx.commit().await?;
    Ok(written)
}

/// Delete every result for one student, across all sessions and algorithms.
#[instrument(skip(pool))]
pub async fn delete_results_by_student(
    pool: &PgPool,
    student_id: i64,
) -> Result<u64, ResultStoreError> {
    let client = pool.get().await?;

    let deleted = client
        .timed_execute(
            "DELETE FROM bc.matching_results WHERE student_id = $1",
            &[&student_id],
            "results.delete_by_student",
        )
        .await?;

    Ok(deleted)
}

/// Delete every result in one session.
#[instrument(skip(pool))]
pub async fn delete_results_by_session(
    pool: &PgPool,
    session_id: &str,
) -> Result<u64, ResultStoreError> {
    let client = pool.get().await?;

    let deleted = client
        .timed_execute(
            "DELETE FROM bc.matching_results WHERE session_id = $1",
            &[&session_id],
            "results.delete_by_session",
        )
        .await?;

    Ok(deleted)
}

/// Wipe the whole result store. The global stable-mode recompute reset.
#[instrument(skip(pool))]
pub async fn delete_all_results(pool: &PgPool) -> Result<u64, ResultStoreError> {
    let client = pool.get().await?;

    let deleted = client
        .timed_execute("DELETE FROM bc.matching_results", &[], "results.delete_all")
        .await?;

    Ok(deleted)
}

/// Results for one student, best first. `above_threshold_only` narrows to
/// records that met their run's cutoff; `limit` keeps only the top N.
#[instrument(skip(pool))]
pub async fn fetch_results_by_student(
    pool: &PgPool,
    student_id: i64,
    above_threshold_only: bool,
    limit: Option<i64>,
) -> Result<Vec<StoredMatchingResult>, ResultStoreError> {
    let client = pool.get().await?;

    let mut query = format!(
        "SELECT {RESULT_COLUMNS} FROM bc.matching_results WHERE student_id = $1"
    );
    if above_threshold_only {
        query.push_str(" AND above_threshold = TRUE");
    }
    query.push_str(" ORDER BY global_score DESC, project_id");
    if limit.is_some() {
        query.push_str(" LIMIT $2");
    }

    let rows = match limit {
        Some(limit) => {
            client
                .timed_query(&query, &[&student_id, &limit], "results.fetch_by_student")
                .await?
        }
        None => {
            client
                .timed_query(&query, &[&student_id], "results.fetch_by_student")
                .await?
        }
    };

    Ok(rows.iter().map(map_result).collect())
}

/// Results for one project, best first.
#[instrument(skip(pool))]
pub async fn fetch_results_by_project(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<StoredMatchingResult>, ResultStoreError> {
    let client = pool.get().await?;

    let query = format!(
        "SELECT {RESULT_COLUMNS} FROM bc.matching_results
         WHERE project_id = $1
         ORDER BY global_score DESC, student_id"
    );
    let rows = client
        .timed_query(&query, &[&project_id], "results.fetch_by_project")
        .await?;

    Ok(rows.iter().map(map_result).collect())
}

/// Every result in one session, grouped by student, best first.
#[instrument(skip(pool))]
pub async fn fetch_results_by_session(
    pool: &PgPool,
    session_id: &str,
) -> Result<Vec<StoredMatchingResult>, ResultStoreError> {
    let client = pool.get().await?;

    let query = format!(
        "SELECT {RESULT_COLUMNS} FROM bc.matching_results
         WHERE session_id = $1
         ORDER BY student_id, global_score DESC, project_id"
    );
    let rows = client
        .timed_query(&query, &[&session_id], "results.fetch_by_session")
        .await?;

    Ok(rows.iter().map(map_result).collect())
}

#[instrument(skip(pool))]
pub async fn count_results_by_session(
    pool: &PgPool,
    session_id: &str,
) -> Result<i64, ResultStoreError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_one(
            "SELECT COUNT(*) FROM bc.matching_results WHERE session_id = $1",
            &[&session_id],
            "results.count_by_session",
        )
        .await?;

    Ok(row.get(0))
}

/// Mean global score across a student's stored results, if any exist.
#[instrument(skip(pool))]
pub async fn average_score_by_student(
    pool: &PgPool,
    student_id: i64,
) -> Result<Option<f64>, ResultStoreError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_one(
            "SELECT AVG(global_score) FROM bc.matching_results WHERE student_id = $1",
            &[&student_id],
            "results.average_by_student",
        )
        .await?;

    Ok(row.get(0))
}
