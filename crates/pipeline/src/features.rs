//! Feature encoding for patrons.
//!
//! Turns raw user rows into `(user, feature, value)` triples for the three
//! feature axes the dataset knows about: gender, age bucket and membership
//! type.
//!
//! Cleansing rules:
//! - age is bucketed; anything that is not an integer, or that falls between
//!   buckets, becomes [`UNKNOWN_AGE`] instead of being dropped
//! - gender and membership values the library uses as "not specified"
//!   sentinels are dropped, so the user just has no row for that axis
//! - only users that borrowed something are encoded

use data_loader::{RawUserRecord, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Filled in for every user whose age could not be bucketed
pub const UNKNOWN_AGE: &str = "unknown_age";

/// Values the source system writes when a field was never filled in
pub const DEFAULT_UNUSABLE_VALUES: [&str; 3] = ["не указан", "отсутствует", "нет данных"];

/// Age bucket boundaries, inclusive on both ends: (low, high, label).
///
/// The 45..=54 range carries the label "age_45_64", and 55..=64 has no
/// bucket at all. Users in that gap end up as [`UNKNOWN_AGE`]. Both are kept
/// as-is so encoded datasets stay comparable with previously trained ones.
const AGE_BUCKETS: [(i64, Option<i64>, &str); 6] = [
    (0, Some(17), "age_0_17"),
    (18, Some(24), "age_18_24"),
    (25, Some(34), "age_25_34"),
    (35, Some(44), "age_35_44"),
    (45, Some(54), "age_45_64"),
    (65, None, "age_65_inf"),
];

/// The feature axes a user can have values for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    Gender,
    AgeBucket,
    MembershipType,
}

impl FeatureName {
    /// All axes, in encoding order
    pub const ALL: [FeatureName; 3] = [
        FeatureName::Gender,
        FeatureName::AgeBucket,
        FeatureName::MembershipType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::Gender => "gender",
            FeatureName::AgeBucket => "age_bucket",
            FeatureName::MembershipType => "membership_type",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One encoded feature value of one user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserFeature {
    pub user_id: UserId,
    pub feature: FeatureName,
    pub value: String,
}

impl UserFeature {
    pub fn new(user_id: impl Into<UserId>, feature: FeatureName, value: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            feature,
            value: value.into(),
        }
    }
}

/// Map a raw age value to its bucket label.
///
/// Returns `None` when the value is not an integer or lies outside every
/// bucket (negative ages, 55..=64).
pub fn age_bucket(raw_age: &str) -> Option<&'static str> {
    let age: i64 = raw_age.trim().parse().ok()?;
    AGE_BUCKETS
        .iter()
        .find(|(low, high, _)| age >= *low && high.is_none_or(|high| age <= high))
        .map(|(_, _, label)| *label)
}

/// Converts raw user rows into [`UserFeature`] triples.
///
/// ## Usage
/// ```ignore
/// let encoder = FeatureEncoder::default();
/// let features = encoder.encode(&tables.users, &interacting_users);
/// ```
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    unusable_values: HashSet<String>,
}

impl FeatureEncoder {
    /// Encoder with the library's standard sentinel values
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sentinel set used for gender and membership type
    pub fn with_unusable_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unusable_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// True if the value carries no information (missing, blank or sentinel)
    fn is_unusable(&self, value: &str) -> bool {
        let value = value.trim();
        value.is_empty() || self.unusable_values.contains(value)
    }

    /// Encode users that appear in `interacting_user_ids`.
    ///
    /// Each user gets an age bucket row and, when usable, a gender and a
    /// membership type row. A user listed more than once is encoded from its
    /// first row only.
    pub fn encode(
        &self,
        raw_users: &[RawUserRecord],
        interacting_user_ids: &HashSet<UserId>,
    ) -> Vec<UserFeature> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut features = Vec::new();

        for user in raw_users {
            if !interacting_user_ids.contains(&user.user_id) || !seen.insert(user.user_id.as_str()) {
                continue;
            }

            if let Some(gender) = user.gender.as_deref().filter(|g| !self.is_unusable(g)) {
                features.push(UserFeature::new(&*user.user_id, FeatureName::Gender, gender.trim()));
            }

            let bucket = user.age.as_deref().and_then(age_bucket).unwrap_or(UNKNOWN_AGE);
            features.push(UserFeature::new(&*user.user_id, FeatureName::AgeBucket, bucket));

            if let Some(membership) = user
                .membership_type
                .as_deref()
                .filter(|m| !self.is_unusable(m))
            {
                features.push(UserFeature::new(
                    &*user.user_id,
                    FeatureName::MembershipType,
                    membership.trim(),
                ));
            }
        }

        features
    }
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self {
            unusable_values: DEFAULT_UNUSABLE_VALUES.iter().map(|v| v.to_string()).collect(),
        }
    }
}
