//! Dataset construction for the checkout recommender.
//!
//! This crate provides:
//! - FeatureEncoder for turning raw patron rows into categorical features
//! - Interaction normalization (dates, constant weights)
//! - Dataset and DatasetBuilder for reconciling everything into one
//!   model-ready structure with stable internal ids
//!
//! ## Architecture
//! The pipeline processes the raw tables in stages:
//! 1. Interactions are normalized (day-first dates, constant weight)
//! 2. Users that borrowed something are encoded into feature rows
//! 3. Dataset maps ids and joins interactions with features
//!
//! ## Example Usage
//! ```ignore
//! use data_loader::{RawTables, TablePaths};
//! use pipeline::DatasetBuilder;
//!
//! let tables = RawTables::load(&TablePaths::in_dir(data_dir))?;
//! let dataset = DatasetBuilder::new().build(&tables.users, &tables.items, &tables.interactions)?;
//! println!("{} users can be served", dataset.user_ids().len());
//! ```

pub mod features;
pub mod interactions;
pub mod dataset;

// Re-export main types
pub use features::{age_bucket, FeatureEncoder, FeatureName, UserFeature, UNKNOWN_AGE};
pub use interactions::{normalize, parse_date, Interaction, INTERACTION_WEIGHT};
pub use dataset::{
    build, Dataset, DatasetBuilder, FeatureColumn, IdMap, IndexedInteraction, InternalId,
    ItemWeight, UserFeatureTable,
};
