use anyhow::{Context, Result, ensure};
use linfa::prelude::*;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array1, Array2};
use rmp_serde::{decode::from_read, encode::write_named};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::dataset::{ProfileRecord, load_records, to_dataset};
use crate::features::{FEATURE_NAMES, ProfileFeatures};
use crate::forest::{ForestParams, RandomForest};

static LABEL_FAKE: &str = "Fake Account";
static LABEL_REAL: &str = "Real Account";

/// Classifier output for one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fake,
    Real,
}

impl Verdict {
    fn from_class(class: usize) -> Self {
        if class == 1 { Verdict::Fake } else { Verdict::Real }
    }

    /// Human-readable label shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Fake => LABEL_FAKE,
            Verdict::Real => LABEL_REAL,
        }
    }
}

/// What [`FakeAccountDetector::ensure_trained`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainOutcome {
    /// An artifact was already on disk and was left untouched.
    Skipped,
    /// A new artifact was written; `accuracy` is measured on the test set.
    Trained { accuracy: f64 },
}

/// Standard scaling followed by a random forest, persisted as one artifact.
#[derive(Serialize, Deserialize)]
pub struct FakeAccountDetector {
    feature_names: Vec<String>,
    scaler: LinearScaler<f64>,
    forest: RandomForest,
}

impl FakeAccountDetector {
    /// Trains a model on `train_path` and saves it to `model_path`, unless
    /// `model_path` already exists. An existing artifact is not inspected.
    pub fn ensure_trained(
        model_path: &Path,
        train_path: &Path,
        test_path: &Path,
    ) -> Result<TrainOutcome> {
        if model_path.exists() {
            debug!("📦 Model already present at {:?}, skipping training", model_path);
            return Ok(TrainOutcome::Skipped);
        }

        info!("🧠 Training model (no artifact at {:?})...", model_path);
        let train = load_records(train_path)?;
        let test = load_records(test_path)?;
        info!(train = train.len(), test = test.len(), "datasets loaded");

        let model = Self::train_from_records(&train, &ForestParams::default())?;
        model.save_to_file(model_path)?;
        let accuracy = model.evaluate_on(&test)?;
        info!("💾 Model trained and saved at {:?}", model_path);
        info!("✅ Test accuracy: {:.4}", accuracy);

        Ok(TrainOutcome::Trained { accuracy })
    }

    /// Loads the artifact at `model_path`, training it first if it is missing.
    pub fn load_or_train(model_path: &Path, train_path: &Path, test_path: &Path) -> Result<Self> {
        Self::ensure_trained(model_path, train_path, test_path)?;
        Self::load_from_file(model_path)
    }

    /// Fits the scaler on the training records, then the forest on the scaled records.
    pub fn train_from_records(records: &[ProfileRecord], params: &ForestParams) -> Result<Self> {
        ensure!(!records.is_empty(), "no training records");
        let dataset = to_dataset(records);
        let scaler = LinearScaler::standard()
            .fit(&dataset)
            .context("failed to fit feature scaler")?;
        let dataset = scaler.transform(dataset);
        let forest = RandomForest::fit(&dataset, params)?;

        Ok(Self {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            scaler,
            forest,
        })
    }

    fn predict_rows(&self, rows: Array2<f64>) -> Result<Array1<f64>> {
        let scaled = self.scaler.transform(rows);
        self.forest.predict_proba(scaled.view())
    }

    /// Predicts a verdict and returns it with the forest's mean "fake" probability.
    pub fn predict_with_proba(&self, features: &ProfileFeatures) -> Result<(Verdict, f64)> {
        let share = self.predict_rows(features.to_row())?[0];
        let verdict = Verdict::from_class(usize::from(share > 0.5));
        debug!(fake_share = share, label = verdict.label(), "prediction");
        Ok((verdict, share))
    }

    pub fn predict(&self, features: &ProfileFeatures) -> Result<Verdict> {
        Ok(self.predict_with_proba(features)?.0)
    }

    /// Fraction of `records` whose label is predicted correctly.
    pub fn evaluate_on(&self, records: &[ProfileRecord]) -> Result<f64> {
        ensure!(!records.is_empty(), "no evaluation records");
        let dataset = to_dataset(records);
        let shares = self.predict_rows(dataset.records().clone())?;
        let correct = shares
            .iter()
            .zip(dataset.targets().iter())
            .filter(|&(&share, &label)| usize::from(share > 0.5) == label)
            .count();
        Ok(correct as f64 / records.len() as f64)
    }

    /// Saves the model as MessagePack, replacing `path` atomically.
    ///
    /// The temporary file is removed again if any step fails.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let tmp = temp_path(path)?;
        let written = self.write_to(&tmp).and_then(|()| {
            fs::rename(&tmp, path).with_context(|| format!("failed to move model into {path:?}"))
        });
        if written.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        written
    }

    fn write_to(&self, tmp: &Path) -> Result<()> {
        let file =
            File::create(tmp).with_context(|| format!("failed to create model file {tmp:?}"))?;
        let mut writer = BufWriter::new(file);
        write_named(&mut writer, self).context("failed to serialize model to MessagePack")?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Loads a MessagePack model, rejecting artifacts built for a different feature layout.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open model file {path:?}"))?;
        let model: Self = from_read(BufReader::new(file))
            .with_context(|| format!("failed to deserialize model from {path:?}"))?;
        ensure!(
            model.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES),
            "model at {path:?} was trained on features {:?}, expected {:?}",
            model.feature_names,
            FEATURE_NAMES
        );
        Ok(model)
    }
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .with_context(|| format!("model path {path:?} has no file name"))?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}
