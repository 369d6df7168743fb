//! Runtime configuration. Defaults reproduce the fixed paths and address the
//! service has always used; environment variables may override them.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on (`FAKEACC_ADDR`).
    pub addr: SocketAddr,
    /// Serialized model artifact (`FAKEACC_MODEL_PATH`).
    pub model_path: PathBuf,
    /// JSON training dataset (`FAKEACC_TRAIN_DATA`).
    pub train_data: PathBuf,
    /// JSON test dataset (`FAKEACC_TEST_DATA`).
    pub test_data: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            model_path: PathBuf::from("fake_account_detector.msgpack"),
            train_data: PathBuf::from("trainData.json"),
            test_data: PathBuf::from("testData.json"),
        }
    }
}

impl Config {
    /// Defaults overridden by whichever `FAKEACC_*` variables are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(addr) = lookup("FAKEACC_ADDR") {
            config.addr = addr
                .parse()
                .with_context(|| format!("FAKEACC_ADDR is not a socket address: {addr:?}"))?;
        }
        if let Some(path) = lookup("FAKEACC_MODEL_PATH") {
            config.model_path = path.into();
        }
        if let Some(path) = lookup("FAKEACC_TRAIN_DATA") {
            config.train_data = path.into();
        }
        if let Some(path) = lookup("FAKEACC_TEST_DATA") {
            config.test_data = path.into();
        }
        Ok(config)
    }
}
