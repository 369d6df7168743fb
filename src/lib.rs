//! # fakeacc
//!
//! Predict whether a social-media profile is fake from a handful of
//! manually entered attributes.
//!
//! A profile URL and six numeric form fields are turned into an
//! eight-feature vector (follower/following counts, bio length, media
//! count, profile-picture and private flags, plus digit count and length of
//! the username pulled from the URL). A pipeline of standard scaling and a
//! seeded 100-tree random forest, trained once from two JSON datasets and
//! persisted with `rmp-serde` (MessagePack), labels the profile
//! `"Fake Account"` or `"Real Account"`.
//!
//! ## Example
//! ```no_run
//! use std::path::Path;
//! use fakeacc::{FakeAccountDetector, ProfileForm, build_features};
//!
//! let model = FakeAccountDetector::load_or_train(
//!     Path::new("fake_account_detector.msgpack"),
//!     Path::new("trainData.json"),
//!     Path::new("testData.json"),
//! )?;
//! let form = ProfileForm {
//!     url: "https://instagram.com/test_user1".into(),
//!     followers: "100".into(),
//!     following: "50".into(),
//!     bio_length: "20".into(),
//!     media_count: "10".into(),
//!     profile_pic: "1".into(),
//!     is_private: "0".into(),
//! };
//! if let Some(features) = build_features(&form)? {
//!     println!("{}", model.predict(&features)?.label());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod dataset;
pub mod features;
pub mod forest;
pub mod model;
pub mod username;
pub mod web;

pub use config::Config;
pub use features::{FEATURE_NAMES, ProfileFeatures, ProfileForm, build_features};
pub use model::{FakeAccountDetector, TrainOutcome, Verdict};
pub use username::extract_username;
