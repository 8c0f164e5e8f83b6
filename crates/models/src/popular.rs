//! Popular Model - Non-personalized Fallback
//!
//! Ranks every item by a global popularity count and serves that one list
//! to everybody, minus the items each user already borrowed.
//!
//! ## Algorithm
//! 1. Count popularity per item (distinct borrowers by default)
//! 2. Sort items by count, most popular first; ties by internal index
//! 3. Per user: walk the global list, skip viewed items, stop at `k`

use crate::error::{ModelError, Result};
use crate::traits::Recommender;
use crate::types::{ranked_rows, RecommendationRow};
use data_loader::UserId;
use pipeline::{Dataset, InternalId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// What "popular" means when counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Popularity {
    /// Number of distinct users who borrowed the item
    #[default]
    #[serde(rename = "n_users")]
    Users,
    /// Number of checkouts of the item
    #[serde(rename = "n_interactions")]
    Interactions,
    /// Sum of interaction weights
    #[serde(rename = "sum_weight")]
    Weight,
}

/// Fallback model serving globally popular items
#[derive(Debug, Clone, Default)]
pub struct PopularModel {
    popularity: Popularity,

    /// Items ordered by popularity, `None` until fitted
    ranking: Option<Vec<InternalId>>,
}

impl PopularModel {
    /// Create an unfitted model counting distinct users
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the popularity measure (default: distinct users)
    pub fn with_popularity(mut self, popularity: Popularity) -> Self {
        self.popularity = popularity;
        self
    }

    fn item_counts(&self, dataset: &Dataset) -> Vec<u64> {
        let mut counts = vec![0u64; dataset.n_items()];
        match self.popularity {
            Popularity::Users => {
                for user in 0..dataset.n_users() as InternalId {
                    for entry in dataset.user_items(user) {
                        counts[entry.item as usize] += 1;
                    }
                }
            }
            Popularity::Interactions => {
                for interaction in dataset.interactions() {
                    counts[interaction.item as usize] += 1;
                }
            }
            Popularity::Weight => {
                for interaction in dataset.interactions() {
                    counts[interaction.item as usize] += interaction.weight as u64;
                }
            }
        }
        counts
    }
}

impl Recommender for PopularModel {
    fn name(&self) -> &str {
        "popular"
    }

    fn is_fitted(&self) -> bool {
        self.ranking.is_some()
    }

    #[instrument(skip(self, dataset), fields(items = dataset.n_items()))]
    fn fit(&mut self, dataset: &Dataset) {
        let counts = self.item_counts(dataset);
        let mut ranking: Vec<InternalId> = (0..counts.len() as InternalId).collect();
        ranking.sort_by(|a, b| counts[*b as usize].cmp(&counts[*a as usize]).then(a.cmp(b)));

        info!(
            "Fitted popular model over {} items ({:?})",
            ranking.len(),
            self.popularity
        );
        self.ranking = Some(ranking);
    }

    #[instrument(skip(self, user_ids, dataset), fields(requested = user_ids.len()))]
    fn recommend(
        &self,
        user_ids: &[UserId],
        dataset: &Dataset,
        k: usize,
    ) -> Result<Vec<RecommendationRow>> {
        let ranking = self.ranking.as_ref().ok_or_else(|| ModelError::NotFitted {
            model: self.name().to_string(),
        })?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut rows = Vec::new();

        for user_id in user_ids.iter().filter(|id| seen.insert(id.as_str())) {
            // Users unknown to the dataset have nothing to filter out
            let user = dataset.user_id_map().to_internal(user_id);
            let items = ranking
                .iter()
                .filter(|&&item| user.is_none_or(|user| !dataset.has_viewed(user, item)))
                .take(k)
                .filter_map(|&item| dataset.item_id_map().to_external(item));
            rows.extend(ranked_rows(user_id, items));
        }

        debug!("Generated {} popular rows", rows.len());
        Ok(rows)
    }
}
