//! # Hybrid Blender
//!
//! Merges the personalized and fallback recommenders into one result.
//!
//! ## Algorithm
//!
//! 1. Ask the personalized model for `k` items for every requested user
//! 2. Classify users as cold: those the personalized model omitted, plus
//!    those whose personalized list the [`ColdUserRule`] rejects
//! 3. Ask the fallback model for `k` items for the cold users only
//! 4. Output = personalized rows of warm users, then fallback rows
//!
//! Every user's list comes from exactly one model, so no (user, item)
//! pair can appear twice.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument};

use data_loader::{ItemId, UserId};
use models::error::Result;
use models::{ModelError, RecommendationRow, Recommender};
use pipeline::Dataset;

/// Decides whether a user's personalized list is too weak to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColdUserRule {
    /// Fewer than `k` rows
    #[default]
    UnderFilled,
    /// Sum of 1-based ranks below `threshold`
    RankMass { threshold: u32 },
}

impl ColdUserRule {
    fn is_cold(&self, stats: &ListStats, k: usize) -> bool {
        match *self {
            ColdUserRule::UnderFilled => stats.rows < k,
            ColdUserRule::RankMass { threshold } => stats.rank_mass < u64::from(threshold),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ListStats {
    rows: usize,
    rank_mass: u64,
}

/// Warm/cold merge of two recommenders
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridBlender {
    rule: ColdUserRule,
}

impl HybridBlender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: ColdUserRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn rule(&self) -> ColdUserRule {
        self.rule
    }

    /// Blend `personalized` and `fallback` for `user_ids`.
    ///
    /// Fails with `NotFitted` before producing anything if either model
    /// is unfitted.
    #[instrument(skip_all, fields(users = user_ids.len(), k = k))]
    pub fn blend<P, F>(
        &self,
        personalized: &P,
        fallback: &F,
        user_ids: &[UserId],
        dataset: &Dataset,
        k: usize,
    ) -> Result<Vec<RecommendationRow>>
    where
        P: Recommender + ?Sized,
        F: Recommender + ?Sized,
    {
        if !fallback.is_fitted() {
            return Err(ModelError::NotFitted {
                model: fallback.name().to_string(),
            });
        }

        let warm = personalized.recommend(user_ids, dataset, k)?;

        let mut stats: HashMap<&str, ListStats> = HashMap::new();
        for row in &warm {
            let entry = stats.entry(row.user_id.as_str()).or_default();
            entry.rows += 1;
            entry.rank_mass = entry.rank_mass.saturating_add(u64::from(row.rank));
        }

        let mut seen = HashSet::new();
        let cold: Vec<UserId> = user_ids
            .iter()
            .filter(|user_id| seen.insert(user_id.as_str()))
            .filter(|user_id| {
                stats
                    .get(user_id.as_str())
                    .is_none_or(|user_stats| self.rule.is_cold(user_stats, k))
            })
            .cloned()
            .collect();
        let cold_set: HashSet<&str> = cold.iter().map(String::as_str).collect();

        debug!(
            "{} users served by {}, {} routed to {}",
            stats.len(),
            personalized.name(),
            cold.len(),
            fallback.name()
        );

        let cold_rows = if cold.is_empty() {
            Vec::new()
        } else {
            fallback.recommend(&cold, dataset, k)?
        };

        let mut rows: Vec<RecommendationRow> = warm
            .into_iter()
            .filter(|row| !cold_set.contains(row.user_id.as_str()))
            .collect();
        let warm_rows = rows.len();
        rows.extend(cold_rows);

        info!(
            "Blended {} rows ({} personalized, {} fallback) for {} cold users",
            rows.len(),
            warm_rows,
            rows.len() - warm_rows,
            cold.len()
        );
        Ok(rows)
    }
}

/// Drop ranks, keeping per-user order
pub fn into_pairs(rows: Vec<RecommendationRow>) -> Vec<(UserId, ItemId)> {
    rows.into_iter().map(|row| (row.user_id, row.item_id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serves a fixed list per user and omits users it has no list for
    struct FixedModel {
        name: &'static str,
        fitted: bool,
        lists: HashMap<String, Vec<&'static str>>,
        default_list: Option<Vec<&'static str>>,
    }

    impl FixedModel {
        fn personalized() -> Self {
            let mut lists = HashMap::new();
            lists.insert("u1".to_string(), vec!["a", "b", "c"]);
            lists.insert("u2".to_string(), vec!["a"]);
            Self { name: "personalized", fitted: true, lists, default_list: None }
        }

        fn fallback() -> Self {
            Self {
                name: "fallback",
                fitted: true,
                lists: HashMap::new(),
                default_list: Some(vec!["p1", "p2", "p3"]),
            }
        }
    }

    impl Recommender for FixedModel {
        fn name(&self) -> &str {
            self.name
        }

        fn is_fitted(&self) -> bool {
            self.fitted
        }

        fn fit(&mut self, _dataset: &Dataset) {
            self.fitted = true;
        }

        fn recommend(&self, user_ids: &[UserId], _dataset: &Dataset, k: usize) -> Result<Vec<RecommendationRow>> {
            if !self.fitted {
                return Err(ModelError::NotFitted { model: self.name.to_string() });
            }
            let mut rows = Vec::new();
            for user_id in user_ids {
                let Some(list) = self.lists.get(user_id).or(self.default_list.as_ref()) else {
                    continue;
                };
                for (item, rank) in list.iter().take(k).zip(1u32..) {
                    rows.push(RecommendationRow::new(user_id.as_str(), *item, rank));
                }
            }
            Ok(rows)
        }
    }

    /// Serves `len` generated items ("i1", "i2", ...) per listed user
    struct LongListModel {
        lengths: HashMap<String, usize>,
    }

    impl LongListModel {
        fn new(lengths: &[(&str, usize)]) -> Self {
            let lengths = lengths.iter().map(|(user, len)| (user.to_string(), *len)).collect();
            Self { lengths }
        }
    }

    impl Recommender for LongListModel {
        fn name(&self) -> &str {
            "long_list"
        }

        fn is_fitted(&self) -> bool {
            true
        }

        fn fit(&mut self, _dataset: &Dataset) {}

        fn recommend(&self, user_ids: &[UserId], _dataset: &Dataset, k: usize) -> Result<Vec<RecommendationRow>> {
            let mut rows = Vec::new();
            for user_id in user_ids {
                let len = self.lengths.get(user_id).copied().unwrap_or(0).min(k);
                for rank in 1..=len as u32 {
                    rows.push(RecommendationRow::new(user_id.as_str(), format!("i{}", rank), rank));
                }
            }
            Ok(rows)
        }
    }

    fn users(ids: &[&str]) -> Vec<UserId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn items_of<'a>(rows: &'a [RecommendationRow], user_id: &str) -> Vec<&'a str> {
        rows.iter().filter(|r| r.user_id == user_id).map(|r| r.item_id.as_str()).collect()
    }

    #[test]
    fn test_each_user_served_by_one_model() {
        let dataset = Dataset::default();
        let rows = HybridBlender::new()
            .blend(&FixedModel::personalized(), &FixedModel::fallback(), &users(&["u1", "u2", "u3"]), &dataset, 3)
            .unwrap();

        assert_eq!(items_of(&rows, "u1"), vec!["a", "b", "c"]);
        // u2 has a single personalized row, so the whole list is replaced
        assert_eq!(items_of(&rows, "u2"), vec!["p1", "p2", "p3"]);
        assert_eq!(items_of(&rows, "u3"), vec!["p1", "p2", "p3"]);

        let pairs: HashSet<(&str, &str)> =
            rows.iter().map(|r| (r.user_id.as_str(), r.item_id.as_str())).collect();
        assert_eq!(pairs.len(), rows.len());
    }

    #[test]
    fn test_warm_rows_come_first() {
        let dataset = Dataset::default();
        let rows = HybridBlender::new()
            .blend(&FixedModel::personalized(), &FixedModel::fallback(), &users(&["u3", "u1"]), &dataset, 3)
            .unwrap();

        let order: Vec<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();
        assert_eq!(order, vec!["u1", "u1", "u1", "u3", "u3", "u3"]);
    }

    #[test]
    fn test_rank_mass_rule_matches_under_filled_at_full_lists() {
        let dataset = Dataset::default();
        let request = users(&["u1", "u2", "u3"]);

        let under_filled = HybridBlender::new()
            .blend(&FixedModel::personalized(), &FixedModel::fallback(), &request, &dataset, 3)
            .unwrap();
        // 1 + 2 + 3 = 6 is the rank mass of a full list of three
        let rank_mass = HybridBlender::new()
            .with_rule(ColdUserRule::RankMass { threshold: 6 })
            .blend(&FixedModel::personalized(), &FixedModel::fallback(), &request, &dataset, 3)
            .unwrap();

        assert_eq!(under_filled, rank_mass);
    }

    #[test]
    fn test_duplicate_requests_are_served_once() {
        let dataset = Dataset::default();
        let rows = HybridBlender::new()
            .blend(&FixedModel::personalized(), &FixedModel::fallback(), &users(&["u3", "u3"]), &dataset, 2)
            .unwrap();

        assert_eq!(items_of(&rows, "u3"), vec!["p1", "p2"]);
    }

    #[test]
    fn test_unfitted_model_fails_whole_blend() {
        let dataset = Dataset::default();
        let mut fallback = FixedModel::fallback();
        fallback.fitted = false;

        // u1 alone is warm, so the fallback would never be asked
        let err = HybridBlender::new()
            .blend(&FixedModel::personalized(), &fallback, &users(&["u1"]), &dataset, 3)
            .unwrap_err();
        assert_eq!(err, ModelError::NotFitted { model: "fallback".to_string() });

        let mut personalized = FixedModel::personalized();
        personalized.fitted = false;
        let err = HybridBlender::new()
            .blend(&personalized, &FixedModel::fallback(), &users(&["u1"]), &dataset, 3)
            .unwrap_err();
        assert_eq!(err, ModelError::NotFitted { model: "personalized".to_string() });
    }

    #[test]
    fn test_into_pairs_keeps_order() {
        let rows = vec![
            RecommendationRow::new("u1", "b", 1),
            RecommendationRow::new("u1", "a", 2),
        ];
        assert_eq!(
            into_pairs(rows),
            vec![("u1".to_string(), "b".to_string()), ("u1".to_string(), "a".to_string())]
        );
    }

    #[test]
    fn test_rank_mass_threshold_210_at_twenty() {
        let dataset = Dataset::default();
        let personalized = LongListModel::new(&[("full", 20), ("short", 19), ("single", 1)]);

        let rows = HybridBlender::new()
            .with_rule(ColdUserRule::RankMass { threshold: 210 })
            .blend(&personalized, &FixedModel::fallback(), &users(&["full", "short", "single"]), &dataset, 20)
            .unwrap();

        // 1 + 2 + ... + 20 = 210 keeps a full list warm
        assert_eq!(items_of(&rows, "full").len(), 20);
        assert_eq!(items_of(&rows, "full")[0], "i1");
        // 190 and 1 fall below the threshold
        assert_eq!(items_of(&rows, "short"), vec!["p1", "p2", "p3"]);
        assert_eq!(items_of(&rows, "single"), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_rank_mass_of_huge_lists_does_not_overflow() {
        let dataset = Dataset::default();
        let k = 100_000;
        // ranks 1..=100000 sum to about 5e9, past u32::MAX
        let personalized = LongListModel::new(&[("u1", k)]);

        let rows = HybridBlender::new()
            .with_rule(ColdUserRule::RankMass { threshold: 210 })
            .blend(&personalized, &FixedModel::fallback(), &users(&["u1"]), &dataset, k)
            .unwrap();

        assert_eq!(rows.len(), k);
        assert!(rows.iter().all(|row| row.item_id.starts_with('i')));
    }
}
