//! The reconciled, model-ready dataset.
//!
//! [`Dataset`] is built once per pipeline run and is read-only afterwards.
//! It holds:
//! - id maps between external ids (strings from the exports) and dense
//!   internal indices, in first-appearance order over the interactions
//! - the user → item interaction matrix (one sorted row per user)
//! - the user feature table: one-hot columns for the categorical axes and
//!   plain values for the rest
//!
//! Both recommendation models borrow the same `&Dataset` for fit and predict.

use crate::features::{FeatureEncoder, FeatureName, UserFeature};
use crate::interactions::{self, Interaction};
use chrono::NaiveDateTime;
use data_loader::{RawInteractionRecord, RawItemRecord, RawUserRecord, Result, UserId};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{info, instrument, warn};

/// Dense internal index of a user or item
pub type InternalId = u32;

// =============================================================================
// IdMap
// =============================================================================

/// Bidirectional mapping between external ids and dense internal indices.
///
/// Indices are handed out in insertion order, so building from the same
/// sequence always yields the same map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    external: Vec<String>,
    internal: HashMap<String, InternalId>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a sequence of ids; repeated ids keep their first index
    pub fn from_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut map = Self::new();
        for id in ids {
            map.get_or_insert(id);
        }
        map
    }

    /// Index of `id`, assigning the next free one if it is new
    pub fn get_or_insert(&mut self, id: &str) -> InternalId {
        if let Some(&idx) = self.internal.get(id) {
            return idx;
        }
        let idx = self.external.len() as InternalId;
        self.external.push(id.to_string());
        self.internal.insert(id.to_string(), idx);
        idx
    }

    pub fn to_internal(&self, id: &str) -> Option<InternalId> {
        self.internal.get(id).copied()
    }

    pub fn to_external(&self, idx: InternalId) -> Option<&str> {
        self.external.get(idx as usize).map(String::as_str)
    }

    /// External ids ordered by internal index
    pub fn external_ids(&self) -> &[String] {
        &self.external
    }

    pub fn len(&self) -> usize {
        self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.external.is_empty()
    }
}

// =============================================================================
// Interactions in internal ids
// =============================================================================

/// An interaction with both ids replaced by internal indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedInteraction {
    pub user: InternalId,
    pub item: InternalId,
    pub timestamp: NaiveDateTime,
    pub weight: u32,
}

/// One entry of a user's interaction row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemWeight {
    pub item: InternalId,
    /// Sum of the weights of every interaction with this item
    pub weight: u32,
}

// =============================================================================
// User features
// =============================================================================

/// A one-hot column of the categorical feature table, e.g. `gender = ж`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureColumn {
    pub feature: FeatureName,
    pub value: String,
}

/// User features restricted to users known to the dataset.
///
/// Values of categorical axes become one-hot columns; values of every other
/// axis are stored as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFeatureTable {
    categorical_axes: Vec<FeatureName>,
    columns: Vec<FeatureColumn>,
    /// Per internal user: sorted column indices
    categorical: Vec<Vec<usize>>,
    /// Per internal user: values of non-categorical axes
    direct: Vec<BTreeMap<FeatureName, String>>,
}

impl UserFeatureTable {
    fn new(n_users: usize, categorical_axes: &[FeatureName]) -> Self {
        Self {
            categorical_axes: categorical_axes.to_vec(),
            columns: Vec::new(),
            categorical: vec![Vec::new(); n_users],
            direct: vec![BTreeMap::new(); n_users],
        }
    }

    fn insert(&mut self, user: InternalId, feature: FeatureName, value: &str) {
        let user = user as usize;
        if !self.categorical_axes.contains(&feature) {
            self.direct[user].insert(feature, value.to_string());
            return;
        }
        let column = FeatureColumn {
            feature,
            value: value.to_string(),
        };
        let col_idx = match self.columns.iter().position(|c| *c == column) {
            Some(idx) => idx,
            None => {
                self.columns.push(column);
                self.columns.len() - 1
            }
        };
        let row = &mut self.categorical[user];
        if let Err(pos) = row.binary_search(&col_idx) {
            row.insert(pos, col_idx);
        }
    }

    /// Axes encoded as one-hot columns
    pub fn categorical_axes(&self) -> &[FeatureName] {
        &self.categorical_axes
    }

    /// All one-hot columns, in first-appearance order
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// One-hot column indices set for a user
    pub fn user_columns(&self, user: InternalId) -> &[usize] {
        self.categorical
            .get(user as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Value of one axis for a user, categorical or not
    pub fn value(&self, user: InternalId, feature: FeatureName) -> Option<&str> {
        if self.categorical_axes.contains(&feature) {
            self.user_columns(user)
                .iter()
                .map(|&col| &self.columns[col])
                .find(|column| column.feature == feature)
                .map(|column| column.value.as_str())
        } else {
            self.direct
                .get(user as usize)?
                .get(&feature)
                .map(String::as_str)
        }
    }

    /// Number of (user, feature) entries in the table
    pub fn len(&self) -> usize {
        let categorical: usize = self.categorical.iter().map(Vec::len).sum();
        let direct: usize = self.direct.iter().map(BTreeMap::len).sum();
        categorical + direct
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Interaction matrix plus user features, keyed by internal indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    user_id_map: IdMap,
    item_id_map: IdMap,
    interactions: Vec<IndexedInteraction>,
    /// Per internal user: items sorted by internal index, weights summed
    user_items: Vec<Vec<ItemWeight>>,
    user_features: UserFeatureTable,
}

impl Dataset {
    /// Assemble a dataset from normalized interactions and encoded features.
    ///
    /// ## Algorithm
    /// 1. Map users and items in order of first appearance in `interactions`
    /// 2. Collapse repeated (user, item) pairs into one weighted entry
    /// 3. Keep feature rows of mapped users only; the rest are dropped
    pub fn construct(
        interactions: &[Interaction],
        features: &[UserFeature],
        categorical_axes: &[FeatureName],
    ) -> Self {
        let mut user_id_map = IdMap::new();
        let mut item_id_map = IdMap::new();

        let indexed: Vec<IndexedInteraction> = interactions
            .iter()
            .map(|interaction| IndexedInteraction {
                user: user_id_map.get_or_insert(&interaction.user_id),
                item: item_id_map.get_or_insert(&interaction.item_id),
                timestamp: interaction.timestamp,
                weight: interaction.weight,
            })
            .collect();

        let mut rows: Vec<BTreeMap<InternalId, u32>> = vec![BTreeMap::new(); user_id_map.len()];
        for interaction in &indexed {
            *rows[interaction.user as usize]
                .entry(interaction.item)
                .or_insert(0) += interaction.weight;
        }
        let user_items = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(item, weight)| ItemWeight { item, weight })
                    .collect()
            })
            .collect();

        let mut user_features = UserFeatureTable::new(user_id_map.len(), categorical_axes);
        let mut dropped = 0usize;
        for feature in features {
            match user_id_map.to_internal(&feature.user_id) {
                Some(user) => user_features.insert(user, feature.feature, &feature.value),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!("Dropped {} feature rows for users without interactions", dropped);
        }

        Self {
            user_id_map,
            item_id_map,
            interactions: indexed,
            user_items,
            user_features,
        }
    }

    pub fn user_id_map(&self) -> &IdMap {
        &self.user_id_map
    }

    pub fn item_id_map(&self) -> &IdMap {
        &self.item_id_map
    }

    /// Every user with at least one interaction, in internal order
    pub fn user_ids(&self) -> &[UserId] {
        self.user_id_map.external_ids()
    }

    pub fn n_users(&self) -> usize {
        self.user_id_map.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_id_map.len()
    }

    /// All interactions in input order
    pub fn interactions(&self) -> &[IndexedInteraction] {
        &self.interactions
    }

    /// Items a user interacted with, sorted by internal index.
    ///
    /// Returns an empty slice for unknown users.
    pub fn user_items(&self, user: InternalId) -> &[ItemWeight] {
        self.user_items
            .get(user as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// True if the user already interacted with the item
    pub fn has_viewed(&self, user: InternalId, item: InternalId) -> bool {
        self.user_items(user)
            .binary_search_by_key(&item, |entry| entry.item)
            .is_ok()
    }

    pub fn user_features(&self) -> &UserFeatureTable {
        &self.user_features
    }
}

// =============================================================================
// DatasetBuilder
// =============================================================================

/// Builds a [`Dataset`] straight from the raw tables.
///
/// ## Usage
/// ```ignore
/// let dataset = DatasetBuilder::new()
///     .with_encoder(FeatureEncoder::new().with_unusable_values(["не указан"]))
///     .build(&tables.users, &tables.items, &tables.interactions)?;
/// ```
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    encoder: FeatureEncoder,
    categorical_axes: Vec<FeatureName>,
}

impl DatasetBuilder {
    /// Builder with default sentinels and gender + age bucket as categorical axes
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoder(mut self, encoder: FeatureEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_categorical_axes(mut self, axes: &[FeatureName]) -> Self {
        self.categorical_axes = axes.to_vec();
        self
    }

    /// Normalize, encode and reconcile the three raw tables.
    ///
    /// Fails only if an interaction cannot be normalized. Interactions that
    /// reference users or items missing from their tables are kept.
    #[instrument(skip_all, fields(users = users.len(), items = items.len(), interactions = interactions.len()))]
    pub fn build(
        &self,
        users: &[RawUserRecord],
        items: &[RawItemRecord],
        interactions: &[RawInteractionRecord],
    ) -> Result<Dataset> {
        let interactions = interactions::normalize(interactions)?;

        let known_users: HashSet<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
        let known_items: HashSet<&str> = items.iter().map(|i| i.item_id.as_str()).collect();
        let orphans = interactions
            .iter()
            .filter(|i| {
                !known_users.contains(i.user_id.as_str()) || !known_items.contains(i.item_id.as_str())
            })
            .count();
        if orphans > 0 {
            warn!(
                "{} interactions reference users or items missing from their tables",
                orphans
            );
        }

        let interacting: HashSet<UserId> = interactions.iter().map(|i| i.user_id.clone()).collect();
        let features = self.encoder.encode(users, &interacting);

        let dataset = Dataset::construct(&interactions, &features, &self.categorical_axes);
        info!(
            "Built dataset: {} users, {} items, {} interactions, {} feature entries",
            dataset.n_users(),
            dataset.n_items(),
            dataset.interactions().len(),
            dataset.user_features().len()
        );
        Ok(dataset)
    }
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self {
            encoder: FeatureEncoder::default(),
            categorical_axes: vec![FeatureName::Gender, FeatureName::AgeBucket],
        }
    }
}

/// Build a dataset with the default builder
pub fn build(
    users: &[RawUserRecord],
    items: &[RawItemRecord],
    interactions: &[RawInteractionRecord],
) -> Result<Dataset> {
    DatasetBuilder::default().build(users, items, interactions)
}
