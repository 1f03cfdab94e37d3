//! Running ensembles over batches of samples.
//!
//! # Architecture
//!
//! ```text
//! FitnessEvaluator
//!   ├─ TraversalEvaluator ── Ensemble::classify (host)
//!   └─ OracleEvaluator ───── burst driver ── InferenceOracle
//!                                              └─ SoftwareOracle
//! ```
//!
//! The burst driver uploads an ensemble once and then feeds the oracle at most
//! [`InferenceOracle::max_burst`] samples per call.

pub use self::{
    burst::{count_mismatches, decode_prediction, pack_features, predict_in_bursts, predict_loaded},
    evaluator::{Evaluation, FitnessEvaluator, OracleEvaluator, TraversalEvaluator},
    oracle::{InferenceOracle, MAX_BURST, NO_CONSENSUS, OracleError, SoftwareOracle, VOTE_CLASSES},
};

pub mod burst;
pub mod evaluator;
pub mod oracle;
