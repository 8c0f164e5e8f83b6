//! # Models Crate
//!
//! This crate implements the recommenders behind the hybrid service.
//!
//! ## Components
//!
//! ### Item kNN (Personalized)
//! Collaborative filtering over BM25-weighted item-item similarity:
//! - "Patrons who borrowed what you borrowed also borrowed..."
//! - Serves only users with enough co-borrowing signal
//!
//! ### Popular (Fallback)
//! One global popularity ranking, filtered per user:
//! - Serves anyone, including users the personalized model cannot
//!
//! Both implement [`Recommender`]; [`Model`] wraps them for dispatch.
//!
//! ## Example Usage
//!
//! ```ignore
//! use models::{ItemKnnModel, Model, PopularModel, Recommender};
//!
//! let mut personalized = Model::from(ItemKnnModel::new().with_neighbours(100));
//! personalized.fit(&dataset);
//!
//! let rows = personalized.recommend(dataset.user_ids(), &dataset, 20)?;
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod traits;
pub mod item_knn;
pub mod popular;
pub mod model;

// Re-export commonly used types
pub use error::ModelError;
pub use types::RecommendationRow;
pub use traits::Recommender;
pub use item_knn::ItemKnnModel;
pub use popular::{PopularModel, Popularity};
pub use model::Model;
