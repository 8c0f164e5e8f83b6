//! Server crate for the book recommendation service.
//!
//! This crate owns the serving layer: configuration, the warm/cold
//! blender that combines the two recommenders, and the service container
//! that exposes fit and predict.

pub mod error;
pub mod config;
pub mod blender;
pub mod service;

pub use blender::{into_pairs, ColdUserRule, HybridBlender};
pub use config::{CommonConfig, DataConfig, ItemKnnConfig, ServiceConfig};
pub use error::{ConfigError, ServiceError};
pub use service::{write_submission, FitState, RecommendationService, SUBMISSION_FILE};
