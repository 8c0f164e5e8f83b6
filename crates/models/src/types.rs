//! Output types shared by every recommender.

use data_loader::{ItemId, UserId};

/// One recommended item for one user.
///
/// `rank` is 1-based: rank 1 is the best item in the user's list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecommendationRow {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rank: u32,
}

impl RecommendationRow {
    pub fn new(user_id: impl Into<UserId>, item_id: impl Into<ItemId>, rank: u32) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            rank,
        }
    }
}

/// Turn a user's ranked item list into rows with ranks 1..=n
pub(crate) fn ranked_rows<'a>(
    user_id: &str,
    items: impl IntoIterator<Item = &'a str>,
) -> Vec<RecommendationRow> {
    items
        .into_iter()
        .zip(1u32..)
        .map(|(item_id, rank)| RecommendationRow::new(user_id, item_id, rank))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_rows_start_at_one() {
        let rows = ranked_rows("u1", ["a", "b", "c"]);
        let ranks: Vec<u32> = rows.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(rows.iter().all(|r| r.user_id == "u1"));
        assert_eq!(rows[2].item_id, "c");
    }
}
