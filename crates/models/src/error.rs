//! Error types for the models crate.

use thiserror::Error;

/// Errors a recommender can return
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// `recommend` was called before any successful `fit`
    #[error("{model} model is not fitted, call fit first")]
    NotFitted { model: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ModelError>;
