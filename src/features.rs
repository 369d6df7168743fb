use anyhow::{Context, Result};
use ndarray::Array2;
use serde::Deserialize;

use crate::username::extract_username;

/// Number of features the classifier is trained on.
pub const FEATURE_COUNT: usize = 8;

/// Column names of the feature vector, in the order the model expects them.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "userFollowerCount",
    "userFollowingCount",
    "userBiographyLength",
    "userMediaCount",
    "userHasProfilPic",
    "userIsPrivate",
    "usernameDigitCount",
    "usernameLength",
];

/// Raw fields submitted through the profile form.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileForm {
    pub url: String,
    pub followers: String,
    pub following: String,
    pub bio_length: String,
    pub media_count: String,
    pub profile_pic: String,
    pub is_private: String,
}

/// Numeric description of a profile, ordered as [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileFeatures {
    pub followers: i64,
    pub following: i64,
    pub bio_length: i64,
    pub media_count: i64,
    pub has_profile_pic: i64,
    pub is_private: i64,
    pub username_digits: i64,
    pub username_length: i64,
}

impl ProfileFeatures {
    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        [
            self.followers as f64,
            self.following as f64,
            self.bio_length as f64,
            self.media_count as f64,
            self.has_profile_pic as f64,
            self.is_private as f64,
            self.username_digits as f64,
            self.username_length as f64,
        ]
    }

    /// Single-row matrix ready for the model.
    pub fn to_row(&self) -> Array2<f64> {
        let values = self.values();
        Array2::from_shape_fn((1, FEATURE_COUNT), |(_, j)| values[j])
    }
}

fn parse_field(name: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("field `{name}` must be an integer, got {value:?}"))
}

/// Builds the feature vector for a submitted form.
///
/// Returns `Ok(None)` when no username can be extracted from the URL; the
/// numeric fields are not looked at in that case. Any numeric field that
/// does not parse as an integer is an error.
pub fn build_features(form: &ProfileForm) -> Result<Option<ProfileFeatures>> {
    let Some(username) = extract_username(&form.url) else {
        return Ok(None);
    };

    Ok(Some(ProfileFeatures {
        followers: parse_field("followers", &form.followers)?,
        following: parse_field("following", &form.following)?,
        bio_length: parse_field("bio_length", &form.bio_length)?,
        media_count: parse_field("media_count", &form.media_count)?,
        has_profile_pic: parse_field("profile_pic", &form.profile_pic)?,
        is_private: parse_field("is_private", &form.is_private)?,
        username_digits: username.chars().filter(|c| c.is_ascii_digit()).count() as i64,
        username_length: username.chars().count() as i64,
    }))
}
