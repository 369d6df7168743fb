use anyhow::{Context, Result, bail};
use linfa::Dataset;
use ndarray::{Array1, Array2, Ix1};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::features::FEATURE_COUNT;

/// One labelled profile from a training or test dataset.
///
/// Field names follow the JSON column names. Extra columns in the source
/// file are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(rename = "userFollowerCount")]
    pub follower_count: f64,
    #[serde(rename = "userFollowingCount")]
    pub following_count: f64,
    #[serde(rename = "userBiographyLength")]
    pub biography_length: f64,
    #[serde(rename = "userMediaCount")]
    pub media_count: f64,
    #[serde(rename = "userHasProfilPic")]
    pub has_profile_pic: f64,
    #[serde(rename = "userIsPrivate")]
    pub is_private: f64,
    #[serde(rename = "usernameDigitCount")]
    pub username_digit_count: f64,
    #[serde(rename = "usernameLength")]
    pub username_length: f64,
    #[serde(rename = "isFake", deserialize_with = "binary_label")]
    pub is_fake: usize,
}

impl ProfileRecord {
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.follower_count,
            self.following_count,
            self.biography_length,
            self.media_count,
            self.has_profile_pic,
            self.is_private,
            self.username_digit_count,
            self.username_length,
        ]
    }
}

/// Accepts `0`/`1` (integer or float) or a JSON boolean.
fn binary_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Float(f64),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => return Ok(b as usize),
        Raw::Int(i) => i as f64,
        Raw::Float(f) => f,
    };
    if value == 0.0 {
        Ok(0)
    } else if value == 1.0 {
        Ok(1)
    } else {
        Err(serde::de::Error::custom(format!("isFake must be 0 or 1, got {value}")))
    }
}

/// Reads a JSON array of profile records.
pub fn load_records(path: &Path) -> Result<Vec<ProfileRecord>> {
    let file = File::open(path).with_context(|| format!("failed to open dataset {path:?}"))?;
    let records: Vec<ProfileRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse dataset {path:?}"))?;
    if records.is_empty() {
        bail!("dataset {path:?} contains no records");
    }
    Ok(records)
}

/// Stacks records into a feature matrix and label vector.
pub fn to_dataset(records: &[ProfileRecord]) -> Dataset<f64, usize, Ix1> {
    let records_matrix = Array2::from_shape_fn((records.len(), FEATURE_COUNT), |(i, j)| {
        records[i].features()[j]
    });
    let labels = records.iter().map(|r| r.is_fake).collect::<Array1<_>>();
    Dataset::new(records_matrix, labels)
}
