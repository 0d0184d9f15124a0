use std::str::FromStr;

use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::instrument;

use crate::db::util::TimedClientExt;
use crate::db::PgPool;
use crate::{Student, WorkType};

#[derive(Debug, thiserror::Error)]
pub enum StudentFetchError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map student row: {0}")]
    Mapping(String),
}

const STUDENT_SELECT: &str = "SELECT s.id,
        s.preferred_work_type,
        COALESCE(array_agg(DISTINCT sk.skill_id) FILTER (WHERE sk.skill_id IS NOT NULL), '{}') AS skill_ids,
        COALESCE(array_agg(DISTINCT si.keyword_id) FILTER (WHERE si.keyword_id IS NOT NULL), '{}') AS interest_ids
    FROM bc.students s
    LEFT JOIN bc.student_skills sk ON sk.student_id = s.id
    LEFT JOIN bc.student_interests si ON si.student_id = s.id";

fn map_student(row: &Row) -> Result<Student, StudentFetchError> {
    let preferred_work_type = row
        .get::<_, Option<String>>("preferred_work_type")
        .map(|raw| {
            WorkType::from_str(&raw)
                .map_err(|_| StudentFetchError::Mapping(format!("unknown work type: {raw}")))
        })
        .transpose()?;

    Ok(Student {
        id: row.get("id"),
        skills: row.get("skill_ids"),
        interests: row.get("interest_ids"),
        preferred_work_type,
    })
}

/// Fetch the full student snapshot, ordered by id so every run sees the
/// same input order.
#[instrument(skip(pool))]
pub async fn fetch_all_students(pool: &PgPool) -> Result<Vec<Student>, StudentFetchError> {
    let client = pool.get().await?;

    let query = format!("{STUDENT_SELECT} GROUP BY s.id ORDER BY s.id");
    let rows = client.timed_query(&query, &[], "students.fetch_all").await?;

    rows.iter().map(map_student).collect()
}

#[instrument(skip(pool))]
pub async fn fetch_student_by_id(
    pool: &PgPool,
    student_id: i64,
) -> Result<Option<Student>, StudentFetchError> {
    let client = pool.get().await?;

    let query = format!("{STUDENT_SELECT} WHERE s.id = $1 GROUP BY s.id");
    let row = client
        .timed_query_opt(&query, &[&student_id], "students.fetch_by_id")
        .await?;

    row.as_ref().map(map_student).transpose()
}

#[instrument(skip(pool))]
pub async fn student_exists(pool: &PgPool, student_id: i64) -> Result<bool, StudentFetchError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_one(
            "SELECT EXISTS (SELECT 1 FROM bc.students WHERE id = $1)",
            &[&student_id],
            "students.exists",
        )
        .await?;

    Ok(row.get(0))
}
