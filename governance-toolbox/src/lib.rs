//! Analysis of governance-token voting behavior.
//!
//! The crate normalizes per-proposal vote records into a per-address voting
//! history, derives pairwise voting-agreement scores, clusters addresses into
//! coordinated voting blocks, and computes power, influence and anomaly
//! statistics over those inputs. Data sourcing (chain APIs, files) and
//! presentation (reports, charts) are left to callers; everything here is a
//! pure in-memory computation.
//!
//! You can roughly read the pipeline as
//! "proposals become a [`votes::VotingHistory`], the history becomes a
//! [`similarity::SimilarityMatrix`], the matrix becomes a list of
//! [`blocks::VotingBlock`]s, and the blocks are scored against a balance map".
//! [`analyzer::BlockAnalyzer`] drives that pipeline and caches the
//! intermediate results; the influence and anomaly analyses are independent
//! of it and work straight off the proposal list.

pub mod analyzer;
pub mod anomalies;
pub mod blocks;
pub mod error;
pub mod influence;
pub mod similarity;
pub mod votes;

pub use analyzer::BlockAnalyzer;
pub use error::{AnalysisError, Result};
