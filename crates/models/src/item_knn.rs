//! Item kNN Model - Personalized Collaborative Filtering
//!
//! "Patrons who borrowed what you borrowed also borrowed these items."
//!
//! ## Algorithm
//! 1. Build the item × user matrix of interaction weights
//! 2. Re-weight it with BM25: items are the documents, users the terms,
//!    so prolific borrowers count less and long item rows are normalized
//! 3. Item-item similarity is the dot product of two weighted item rows;
//!    every item keeps only its `neighbours` most similar items
//! 4. A user's score for item j is the sum, over the items i they borrowed,
//!    of `weight(user, i) * similarity(i, j)`
//! 5. Borrowed items are dropped, the top `k` positive scores are returned
//!
//! Similarities are computed in parallel over items with Rayon.

use crate::error::{ModelError, Result};
use crate::traits::Recommender;
use crate::types::{ranked_rows, RecommendationRow};
use data_loader::UserId;
use pipeline::{Dataset, InternalId};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument};

/// Default number of neighbours kept per item
pub const DEFAULT_NEIGHBOURS: usize = 100;

/// Default BM25 term-frequency saturation
pub const DEFAULT_K1: f32 = 0.05;

/// Default BM25 length normalization
pub const DEFAULT_B: f32 = 0.1;

/// Sparse row: (index, value) pairs
type SparseRow = Vec<(InternalId, f32)>;

/// Personalized model based on BM25-weighted item-item similarity
#[derive(Debug, Clone)]
pub struct ItemKnnModel {
    /// Number of most similar items kept per item
    neighbours: usize,

    /// BM25 saturation parameter
    k1: f32,

    /// BM25 length normalization parameter
    b: f32,

    /// Per item: nearest neighbours sorted by similarity, `None` until fitted
    similarity: Option<Vec<SparseRow>>,
}

impl ItemKnnModel {
    /// Create an unfitted model with default parameters
    pub fn new() -> Self {
        Self {
            neighbours: DEFAULT_NEIGHBOURS,
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            similarity: None,
        }
    }

    /// Configure the neighbourhood size (default: 100)
    pub fn with_neighbours(mut self, neighbours: usize) -> Self {
        self.neighbours = neighbours;
        self
    }

    /// Configure BM25 k1 (default: 0.05)
    pub fn with_k1(mut self, k1: f32) -> Self {
        self.k1 = k1;
        self
    }

    /// Configure BM25 b (default: 0.1)
    pub fn with_b(mut self, b: f32) -> Self {
        self.b = b;
        self
    }

    /// BM25-weighted user rows: for every user, (item, weight) pairs
    fn bm25_user_rows(&self, dataset: &Dataset) -> Vec<SparseRow> {
        let n_items = dataset.n_items();
        let n_users = dataset.n_users();

        let mut item_sums = vec![0.0f32; n_items];
        for user in 0..n_users as InternalId {
            for entry in dataset.user_items(user) {
                item_sums[entry.item as usize] += entry.weight as f32;
            }
        }
        let mean_sum = item_sums.iter().sum::<f32>() / n_items.max(1) as f32;
        let mean_sum = if mean_sum > 0.0 { mean_sum } else { 1.0 };

        let n = n_items as f32;
        (0..n_users as InternalId)
            .map(|user| {
                let row = dataset.user_items(user);
                let idf = n.ln() - (row.len() as f32).ln_1p();
                row.iter()
                    .map(|entry| {
                        let weight = entry.weight as f32;
                        let length_norm = (1.0 - self.b) + self.b * item_sums[entry.item as usize] / mean_sum;
                        let bm25 = weight * (self.k1 + 1.0) / (self.k1 * length_norm + weight) * idf;
                        (entry.item, bm25)
                    })
                    .collect()
            })
            .collect()
    }

    /// Top-`neighbours` similar items for every item
    fn compute_similarity(&self, dataset: &Dataset) -> Vec<SparseRow> {
        let user_rows = self.bm25_user_rows(dataset);

        // Transpose into item rows: (user, weight)
        let mut item_rows: Vec<SparseRow> = vec![Vec::new(); dataset.n_items()];
        for (user, row) in user_rows.iter().enumerate() {
            for &(item, weight) in row {
                item_rows[item as usize].push((user as InternalId, weight));
            }
        }

        item_rows
            .par_iter()
            .map(|item_row| {
                let mut dots: HashMap<InternalId, f32> = HashMap::new();
                for &(user, weight) in item_row {
                    for &(other, other_weight) in &user_rows[user as usize] {
                        *dots.entry(other).or_insert(0.0) += weight * other_weight;
                    }
                }
                top_scores(dots.into_iter().filter(|&(_, sim)| sim > 0.0), self.neighbours)
            })
            .collect()
    }

    /// Top-`k` unseen items for one known user
    fn score_user(
        &self,
        similarity: &[SparseRow],
        dataset: &Dataset,
        user: InternalId,
        k: usize,
    ) -> Vec<InternalId> {
        let mut scores: HashMap<InternalId, f32> = HashMap::new();
        for entry in dataset.user_items(user) {
            let Some(neighbours) = similarity.get(entry.item as usize) else {
                continue;
            };
            for &(other, sim) in neighbours {
                *scores.entry(other).or_insert(0.0) += entry.weight as f32 * sim;
            }
        }

        let candidates = scores
            .into_iter()
            .filter(|&(item, score)| score > 0.0 && !dataset.has_viewed(user, item));
        top_scores(candidates, k)
            .into_iter()
            .map(|(item, _)| item)
            .collect()
    }
}

impl Default for ItemKnnModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort by score descending (ties by index ascending) and keep `limit`
fn top_scores(scores: impl Iterator<Item = (InternalId, f32)>, limit: usize) -> SparseRow {
    let mut scored: SparseRow = scores.collect();
    scored.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(limit);
    scored
}

impl Recommender for ItemKnnModel {
    fn name(&self) -> &str {
        "item_knn"
    }

    fn is_fitted(&self) -> bool {
        self.similarity.is_some()
    }

    #[instrument(skip(self, dataset), fields(users = dataset.n_users(), items = dataset.n_items()))]
    fn fit(&mut self, dataset: &Dataset) {
        let similarity = self.compute_similarity(dataset);
        let pairs: usize = similarity.iter().map(Vec::len).sum();
        info!(
            "Fitted item kNN: {} items, {} similarity pairs (K={}, k1={}, b={})",
            similarity.len(),
            pairs,
            self.neighbours,
            self.k1,
            self.b
        );
        self.similarity = Some(similarity);
    }

    #[instrument(skip(self, user_ids, dataset), fields(requested = user_ids.len()))]
    fn recommend(
        &self,
        user_ids: &[UserId],
        dataset: &Dataset,
        k: usize,
    ) -> Result<Vec<RecommendationRow>> {
        let similarity = self.similarity.as_ref().ok_or_else(|| ModelError::NotFitted {
            model: self.name().to_string(),
        })?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let requested: Vec<(&str, InternalId)> = user_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| {
                dataset
                    .user_id_map()
                    .to_internal(id)
                    .map(|user| (id.as_str(), user))
            })
            .collect();
        debug!(
            "Skipping {} users unknown to the dataset",
            seen.len() - requested.len()
        );

        let per_user: Vec<Vec<RecommendationRow>> = requested
            .par_iter()
            .map(|&(user_id, user)| {
                let items = self.score_user(similarity, dataset, user, k);
                ranked_rows(
                    user_id,
                    items
                        .into_iter()
                        .filter_map(|item| dataset.item_id_map().to_external(item)),
                )
            })
            .collect();

        let rows: Vec<RecommendationRow> = per_user.into_iter().flatten().collect();
        debug!("Generated {} item kNN rows", rows.len());
        Ok(rows)
    }
}
