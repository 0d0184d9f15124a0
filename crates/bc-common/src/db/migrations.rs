use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::{DbPoolError, PgPool};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to build pool: {0}")]
    PoolBuild(#[from] DbPoolError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "initial bestchoice schema",
        sql: r#"
CREATE SCHEMA IF NOT EXISTS bc;

CREATE TABLE IF NOT EXISTS bc.students (
    id BIGSERIAL PRIMARY KEY,
    preferred_work_type TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS bc.student_skills (
    student_id BIGINT NOT NULL REFERENCES bc.students(id) ON DELETE CASCADE,
    skill_id BIGINT NOT NULL,
    PRIMARY KEY (student_id, skill_id)
);

CREATE TABLE IF NOT EXISTS bc.student_interests (
    student_id BIGINT NOT NULL REFERENCES bc.students(id) ON DELETE CASCADE,
    keyword_id BIGINT NOT NULL,
    PRIMARY KEY (student_id, keyword_id)
);

CREATE TABLE IF NOT EXISTS bc.projects (
    id BIGSERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    work_type TEXT,
    min_students INTEGER NOT NULL DEFAULT 1,
    max_students INTEGER NOT NULL DEFAULT 1 CHECK (max_students >= 1),
    active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS bc.project_required_skills (
    project_id BIGINT NOT NULL REFERENCES bc.projects(id) ON DELETE CASCADE,
    skill_id BIGINT NOT NULL,
    PRIMARY KEY (project_id, skill_id)
);

CREATE TABLE IF NOT EXISTS bc.project_keywords (
    project_id BIGINT NOT NULL REFERENCES bc.projects(id) ON DELETE CASCADE,
    keyword_id BIGINT NOT NULL,
    PRIMARY KEY (project_id, keyword_id)
);

CREATE TABLE IF NOT EXISTS bc.matching_results (
    id BIGSERIAL PRIMARY KEY,
    session_id TEXT NOT NULL,
    student_id BIGINT NOT NULL REFERENCES bc.students(id) ON DELETE CASCADE,
    project_id BIGINT NOT NULL REFERENCES bc.projects(id) ON DELETE CASCADE,
    global_score DOUBLE PRECISION NOT NULL,
    skills_score DOUBLE PRECISION,
    interests_score DOUBLE PRECISION,
    work_type_score DOUBLE PRECISION,
    skills_weight DOUBLE PRECISION,
    interests_weight DOUBLE PRECISION,
    work_type_weight DOUBLE PRECISION,
    threshold_used DOUBLE PRECISION,
    above_threshold BOOLEAN NOT NULL DEFAULT TRUE,
    recommendation_rank INTEGER,
    algorithm_used TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT uk_result_student_project_session UNIQUE (student_id, project_id, session_id)
);

CREATE INDEX IF NOT EXISTS idx_result_student ON bc.matching_results(student_id);
CREATE INDEX IF NOT EXISTS idx_result_project ON bc.matching_results(project_id);
CREATE INDEX IF NOT EXISTS idx_result_session ON bc.matching_results(session_id);
CREATE INDEX IF NOT EXISTS idx_result_global_score ON bc.matching_results(global_score);
"#,
    },
    Migration {
        id: 2,
        description: "score range safety checks",
        sql: r#"
DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'chk_global_score_range'
    ) THEN
        ALTER TABLE bc.matching_results
            ADD CONSTRAINT chk_global_score_range
            CHECK (global_score >= 0.0 AND global_score <= 1.0);
    END IF;

    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'chk_sub_score_range'
    ) THEN
        ALTER TABLE bc.matching_results
            ADD CONSTRAINT chk_sub_score_range
            CHECK (
                (skills_score IS NULL OR (skills_score >= 0.0 AND skills_score <= 1.0))
                AND (interests_score IS NULL OR (interests_score >= 0.0 AND interests_score <= 1.0))
                AND (work_type_score IS NULL OR (work_type_score >= 0.0 AND work_type_score <= 1.0))
            );
    END IF;
END $$;
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS bc;
             CREATE TABLE IF NOT EXISTS bc.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM bc.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO bc.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_ids_are_unique_and_ascending() {
        let mut previous = 0;
        for migration in MIGRATIONS {
            assert!(migration.id > previous, "ids must strictly increase");
            previous = migration.id;
        }
    }

    #[test]
    fn initial_migration_creates_the_results_table() {
        assert!(MIGRATIONS[0].sql.contains("bc.matching_results"));
        assert!(MIGRATIONS[0]
            .sql
            .contains("uk_result_student_project_session"));
    }
}
