//! Tagged union over the concrete recommenders.
//!
//! The serving layer holds one `Model` per role (personalized, fallback)
//! and the blender dispatches through it without trait objects.

use crate::error::Result;
use crate::item_knn::ItemKnnModel;
use crate::popular::PopularModel;
use crate::traits::Recommender;
use crate::types::RecommendationRow;
use data_loader::UserId;
use pipeline::Dataset;

/// Every recommender variant the service can run
#[derive(Debug, Clone)]
pub enum Model {
    ItemKnn(ItemKnnModel),
    Popular(PopularModel),
}

impl Recommender for Model {
    fn name(&self) -> &str {
        match self {
            Model::ItemKnn(model) => model.name(),
            Model::Popular(model) => model.name(),
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            Model::ItemKnn(model) => model.is_fitted(),
            Model::Popular(model) => model.is_fitted(),
        }
    }

    fn fit(&mut self, dataset: &Dataset) {
        match self {
            Model::ItemKnn(model) => model.fit(dataset),
            Model::Popular(model) => model.fit(dataset),
        }
    }

    fn recommend(
        &self,
        user_ids: &[UserId],
        dataset: &Dataset,
        k: usize,
    ) -> Result<Vec<RecommendationRow>> {
        match self {
            Model::ItemKnn(model) => model.recommend(user_ids, dataset, k),
            Model::Popular(model) => model.recommend(user_ids, dataset, k),
        }
    }
}

impl From<ItemKnnModel> for Model {
    fn from(model: ItemKnnModel) -> Self {
        Model::ItemKnn(model)
    }
}

impl From<PopularModel> for Model {
    fn from(model: PopularModel) -> Self {
        Model::Popular(model)
    }
}
