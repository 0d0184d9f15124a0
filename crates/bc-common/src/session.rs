//! Matching session identifiers.
//!
//! Every invocation of the engine mints one session id; all results it
//! persists carry that id, enabling bulk retrieval and bulk deletion of a
//! single run's output. ULIDs keep the ids time-ordered and URL-safe.

use ulid::Ulid;

const SESSION_PREFIX: &str = "SESSION-";

/// Generates a fresh session id, e.g. `SESSION-01J9W3Y3E3V5Q6X2M8R0T4K7ZC`.
pub fn generate() -> String {
    format!("{SESSION_PREFIX}{}", Ulid::new())
}
