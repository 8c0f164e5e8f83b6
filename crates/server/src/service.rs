//! # Recommendation Service
//!
//! Owns everything a running service needs: configuration, the built
//! dataset, the two recommenders and the record of the last fit.
//!
//! ## Lifecycle
//!
//! 1. `from_config` loads and reconciles the tables; models start unfitted
//! 2. `fit` (re)trains both models
//! 3. `predict` / `predict_and_save` / `recommend_for` blend their output
//!
//! `fit` takes `&mut self` and the read paths take `&self`, so a fit can
//! never overlap a prediction.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use data_loader::parser::SEPARATOR;
use data_loader::{ItemId, RawTables, UserId};
use models::{Model, RecommendationRow, Recommender};
use pipeline::{Dataset, DatasetBuilder};

use crate::blender::{self, HybridBlender};
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};

pub const SUBMISSION_FILE: &str = "submission.csv";
pub const SUBMISSION_HEADER: [&str; 2] = ["chb", "sys_numb"];

pub const INFO_MESSAGE: &str =
    "Service for library patron book recommendations. Train the models first (fit), then request predictions.";

/// When the models were last trained and how many times
#[derive(Debug, Clone, PartialEq)]
pub struct FitState {
    pub fitted_at: DateTime<Utc>,
    pub generation: u64,
}

/// Hybrid recommendation service
#[derive(Debug)]
pub struct RecommendationService {
    config: ServiceConfig,
    dataset: Dataset,
    personalized: Model,
    fallback: Model,
    blender: HybridBlender,
    fit_state: Option<FitState>,
}

impl RecommendationService {
    /// Build the service around an existing dataset
    pub fn new(config: ServiceConfig, dataset: Dataset) -> Self {
        let personalized = Model::from(config.personalized_model());
        let fallback = Model::from(config.fallback_model());
        let blender = HybridBlender::new().with_rule(config.common.cold_rule());
        Self {
            config,
            dataset,
            personalized,
            fallback,
            blender,
            fit_state: None,
        }
    }

    /// Load the tables named in `config` and build the service
    #[instrument(skip_all)]
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        let start = Instant::now();

        let tables = RawTables::load(&config.data.table_paths())?;
        let dataset = DatasetBuilder::new()
            .with_encoder(config.common.feature_encoder())
            .build(&tables.users, &tables.items, &tables.interactions)?;

        info!(
            "Service ready in {:.2?}: {} users, {} items",
            start.elapsed(),
            dataset.n_users(),
            dataset.n_items()
        );
        Ok(Self::new(config, dataset))
    }

    pub fn info(&self) -> &'static str {
        INFO_MESSAGE
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Users a full prediction covers: everyone with at least one interaction
    pub fn user_ids(&self) -> &[UserId] {
        self.dataset.user_ids()
    }

    pub fn fit_state(&self) -> Option<&FitState> {
        self.fit_state.as_ref()
    }

    /// Train both models from scratch, replacing any previous fit
    #[instrument(skip(self))]
    pub fn fit(&mut self) -> &FitState {
        let start = Instant::now();
        self.personalized.fit(&self.dataset);
        self.fallback.fit(&self.dataset);

        let generation = self.fit_state.as_ref().map_or(1, |state| state.generation + 1);
        info!("Models fitted in {:.2?} (generation {})", start.elapsed(), generation);

        self.fit_state.insert(FitState {
            fitted_at: Utc::now(),
            generation,
        })
    }

    /// Blended (user, item) pairs for every user, in per-user rank order
    pub fn predict(&self) -> Result<Vec<(UserId, ItemId)>> {
        let rows = self.blend(self.user_ids())?;
        Ok(blender::into_pairs(rows))
    }

    /// Predict and write `submission.csv` into the submissions directory
    pub fn predict_and_save(&self) -> Result<PathBuf> {
        let pairs = self.predict()?;
        let dir = &self.config.data.submissions_path;
        fs::create_dir_all(dir)?;

        let path = dir.join(SUBMISSION_FILE);
        write_submission(&path, &pairs)?;
        info!("Wrote {} recommendations to {}", pairs.len(), path.display());
        Ok(path)
    }

    /// Blended rows for a single user
    pub fn recommend_for(&self, user_id: &str) -> Result<Vec<RecommendationRow>> {
        self.blend(&[user_id.to_string()])
    }

    fn blend(&self, user_ids: &[UserId]) -> Result<Vec<RecommendationRow>> {
        let rows = self.blender.blend(
            &self.personalized,
            &self.fallback,
            user_ids,
            &self.dataset,
            self.config.common.n_recos,
        )?;
        Ok(rows)
    }
}

/// Write pairs as a `;`-separated table with header `chb;sys_numb`
pub fn write_submission(path: &Path, pairs: &[(UserId, ItemId)]) -> Result<()> {
    let to_error = |source: csv::Error| ServiceError::Submission {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(SEPARATOR)
        .from_path(path)
        .map_err(to_error)?;
    writer.write_record(SUBMISSION_HEADER).map_err(to_error)?;
    for (user_id, item_id) in pairs {
        writer.write_record([user_id, item_id]).map_err(to_error)?;
    }
    writer.flush()?;
    Ok(())
}
