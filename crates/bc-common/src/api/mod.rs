pub mod result_response;
pub mod run_response;

pub use result_response::MatchingResultResponse;
pub use run_response::MatchingRunResponse;
