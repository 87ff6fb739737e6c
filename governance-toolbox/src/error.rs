use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Structural failures that abort an analysis step.
///
/// Row-level gaps in source data (a vote without a voter, a proposal without
/// an id) are deliberately not errors; they are skipped with a warning at
/// ingestion, see [`crate::votes::build_voting_history`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("voting data is structurally invalid: {0}")]
    InvalidVotingData(String),

    #[error("min_overlap must be a positive integer")]
    InvalidMinOverlap,
}
