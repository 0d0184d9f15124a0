pub mod matching_results;
pub mod migrations;
pub mod pool;
pub mod projects;
pub mod students;
pub mod util;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use matching_results::{
    average_score_by_student, count_results_by_session, delete_all_results,
    delete_results_by_session, delete_results_by_student, fetch_results_by_project,
    fetch_results_by_session, fetch_results_by_student, insert_results, MatchingResultInsert,
    ResultStoreError, StoredMatchingResult,
};
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, create_pool_from_url_checked, DbPoolError, PgPool};
pub use projects::{fetch_active_projects, project_exists, ProjectFetchError};
pub use students::{fetch_all_students, fetch_student_by_id, student_exists, StudentFetchError};
pub use util::TimedClientExt;
