//! The capability every recommendation model exposes.

use crate::error::Result;
use crate::types::RecommendationRow;
use data_loader::UserId;
use pipeline::Dataset;

/// Core trait for recommendation models.
///
/// A model starts unfitted. `fit` moves it to the fitted state (refitting
/// replaces the previous state); `recommend` on an unfitted model fails with
/// [`ModelError::NotFitted`](crate::ModelError::NotFitted).
///
/// ## Contract for `recommend`
/// - at most `k` rows per user, ranks 1..=n with no gaps
/// - items the user already interacted with are never returned
/// - users left without candidates are omitted, never padded
/// - each requested user appears at most once, in request order
pub trait Recommender: Send + Sync {
    /// Returns the name of this model (for logging/debugging)
    fn name(&self) -> &str;

    /// True once `fit` has been called
    fn is_fitted(&self) -> bool;

    /// Learn from the dataset, replacing any previous state
    fn fit(&mut self, dataset: &Dataset);

    /// Rank items for the given external user ids.
    ///
    /// # Arguments
    /// * `user_ids` - External ids of the users to serve
    /// * `dataset` - The dataset the model was fitted on
    /// * `k` - Maximum list length per user
    fn recommend(
        &self,
        user_ids: &[UserId],
        dataset: &Dataset,
        k: usize,
    ) -> Result<Vec<RecommendationRow>>;
}
