//! # Service Configuration
//!
//! Three JSON files under one configs directory, each optional:
//!
//! | File                     | Section          | Keys                                              |
//! |--------------------------|------------------|---------------------------------------------------|
//! | `config.json`            | [`CommonConfig`] | `n_recos`, `cold_rank_threshold`, `popularity`, `unusable_values` |
//! | `bm25_model_config.json` | [`ItemKnnConfig`] | `bm25_k`, `bm25_k1`, `bm25_b`                    |
//! | `data_config.json`       | [`DataConfig`]   | `items_path`, `users_path`, `interactions_path`, `submissions_path` |
//!
//! A missing file means "all defaults"; a missing key means "default for
//! that key". Unknown keys are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use data_loader::TablePaths;
use models::{ItemKnnModel, PopularModel, Popularity};
use pipeline::features::DEFAULT_UNUSABLE_VALUES;
use pipeline::FeatureEncoder;

use crate::blender::ColdUserRule;
use crate::error::ConfigError;

pub const COMMON_CONFIG_FILE: &str = "config.json";
pub const MODEL_CONFIG_FILE: &str = "bm25_model_config.json";
pub const DATA_CONFIG_FILE: &str = "data_config.json";

/// Where the input tables live and where submissions go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub items_path: PathBuf,
    pub users_path: PathBuf,
    pub interactions_path: PathBuf,
    pub submissions_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            items_path: PathBuf::from("data/train/items.csv"),
            users_path: PathBuf::from("data/train/users.csv"),
            interactions_path: PathBuf::from("data/train/train_transactions_extended.csv"),
            submissions_path: PathBuf::from("data/submissions"),
        }
    }
}

impl DataConfig {
    /// Input tables as the loader expects them
    pub fn table_paths(&self) -> TablePaths {
        TablePaths {
            users: self.users_path.clone(),
            items: self.items_path.clone(),
            interactions: self.interactions_path.clone(),
        }
    }
}

/// Settings shared by both recommenders and the blender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonConfig {
    /// Recommendations per user
    pub n_recos: usize,
    /// Switches the cold rule to rank mass with this threshold when set
    pub cold_rank_threshold: Option<u32>,
    /// How the fallback counts popularity: `n_users`, `n_interactions` or `sum_weight`
    pub popularity: Popularity,
    /// Feature values treated as "no information"
    pub unusable_values: Vec<String>,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            n_recos: 20,
            cold_rank_threshold: None,
            popularity: Popularity::Users,
            unusable_values: DEFAULT_UNUSABLE_VALUES.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl CommonConfig {
    pub fn cold_rule(&self) -> ColdUserRule {
        match self.cold_rank_threshold {
            Some(threshold) => ColdUserRule::RankMass { threshold },
            None => ColdUserRule::UnderFilled,
        }
    }

    pub fn feature_encoder(&self) -> FeatureEncoder {
        FeatureEncoder::new().with_unusable_values(self.unusable_values.iter().map(String::as_str))
    }
}

/// BM25 item-kNN hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemKnnConfig {
    pub bm25_k: usize,
    pub bm25_k1: f32,
    pub bm25_b: f32,
}

impl Default for ItemKnnConfig {
    fn default() -> Self {
        Self {
            bm25_k: 100,
            bm25_k1: 0.05,
            bm25_b: 0.1,
        }
    }
}

/// Complete configuration of one service instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub data: DataConfig,
    pub common: CommonConfig,
    pub model: ItemKnnConfig,
}

impl ServiceConfig {
    /// Load the three config files from `dir`, falling back to defaults
    /// for any file that does not exist.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let config = Self {
            data: read_section(&dir.join(DATA_CONFIG_FILE))?,
            common: read_section(&dir.join(COMMON_CONFIG_FILE))?,
            model: read_section(&dir.join(MODEL_CONFIG_FILE))?,
        };
        config.validate()?;

        info!(
            "Loaded config from {}: n_recos={}, bm25_k={}, cold rule {:?}",
            dir.display(),
            config.common.n_recos,
            config.model.bm25_k,
            config.common.cold_rule()
        );
        Ok(config)
    }

    /// Reject hyper-parameters BM25 cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.bm25_k == 0 {
            return Err(ConfigError::Invalid {
                field: "bm25_k",
                reason: "neighbourhood size must be positive".to_string(),
            });
        }
        if !(self.model.bm25_k1 >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "bm25_k1",
                reason: format!("must be non-negative, got {}", self.model.bm25_k1),
            });
        }
        if !(0.0..=1.0).contains(&self.model.bm25_b) {
            return Err(ConfigError::Invalid {
                field: "bm25_b",
                reason: format!("must be within [0, 1], got {}", self.model.bm25_b),
            });
        }
        Ok(())
    }

    pub fn personalized_model(&self) -> ItemKnnModel {
        ItemKnnModel::new()
            .with_neighbours(self.model.bm25_k)
            .with_k1(self.model.bm25_k1)
            .with_b(self.model.bm25_b)
    }

    pub fn fallback_model(&self) -> PopularModel {
        PopularModel::new().with_popularity(self.common.popularity)
    }
}

fn read_section<T>(path: &Path) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        debug!("{} not found, using defaults", path.display());
        return Ok(T::default());
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
