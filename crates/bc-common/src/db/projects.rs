use std::str::FromStr;

use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::instrument;

use crate::db::util::TimedClientExt;
use crate::db::PgPool;
use crate::{Project, WorkType};

#[derive(Debug, thiserror::Error)]
pub enum ProjectFetchError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map project row: {0}")]
    Mapping(String),
}

const PROJECT_SELECT: &str = "SELECT p.id,
        p.title,
        p.work_type,
        p.min_students,
        p.max_students,
        COALESCE(array_agg(DISTINCT rs.skill_id) FILTER (WHERE rs.skill_id IS NOT NULL), '{}') AS required_skill_ids,
        COALESCE(array_agg(DISTINCT pk.keyword_id) FILTER (WHERE pk.keyword_id IS NOT NULL), '{}') AS keyword_ids
    FROM bc.projects p
    LEFT JOIN bc.project_required_skills rs ON rs.project_id = p.id
    LEFT JOIN bc.project_keywords pk ON pk.project_id = p.id";

fn map_project(row: &Row) -> Result<Project, ProjectFetchError> {
    let work_type = row
        .get::<_, Option<String>>("work_type")
        .map(|raw| {
            WorkType::from_str(&raw)
                .map_err(|_| ProjectFetchError::Mapping(format!("unknown work type: {raw}")))
        })
        .transpose()?;

    Ok(Project {
        id: row.get("id"),
        title: row.get("title"),
        work_type,
        min_students: row.get("min_students"),
        max_students: row.get("max_students"),
        required_skills: row.get("required_skill_ids"),
        keywords: row.get("keyword_ids"),
    })
}

/// Fetch every active project with its resolved identifier sets, ordered by
/// id. The engine loads this once per run and shares the snapshot.
#[instrument(skip(pool))]
pub async fn fetch_active_projects(pool: &PgPool) -> Result<Vec<Project>, ProjectFetchError> {
    let client = pool.get().await?;

    let query = format!("{PROJECT_SELECT} WHERE p.active GROUP BY p.id ORDER BY p.id");
    let rows = client
        .timed_query(&query, &[], "projects.fetch_active")
        .await?;

    rows.iter().map(map_project).collect()
}

#[instrument(skip(pool))]
pub async fn project_exists(pool: &PgPool, project_id: i64) -> Result<bool, ProjectFetchError> {
    let client = pool.get().await?;

    let row = client
        .timed_query_one(
            "SELECT EXISTS (SELECT 1 FROM bc.projects WHERE id = $1)",
            &[&project_id],
            "projects.exists",
        )
        .await?;

    Ok(row.get(0))
}
