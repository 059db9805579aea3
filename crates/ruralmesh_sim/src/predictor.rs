//! Failure-predictor lifecycle: NoModel -> Trained, one shot per process.
//!
//! Absence of a model is a normal state, never an error: scoring without a
//! model always reports not-at-risk. A corrupt artifact is logged and
//! treated the same as a missing one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ruralmesh_core::{feature_vector, FeatureRow, Node, RandomForest, TrainingSample};
use tracing::{info, warn};

/// First cycle at which training may trigger.
pub const TRAIN_CYCLE_THRESHOLD: u64 = 5;
/// The dataset must hold strictly more rows than this before training.
pub const MIN_TRAINING_ROWS: usize = 30;

/// Reads the accumulated dataset into training samples.
pub fn load_training_samples(path: &Path) -> Result<Vec<TrainingSample>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let mut samples = Vec::new();
    for row in reader.deserialize::<FeatureRow>() {
        let row = row.with_context(|| format!("Malformed row in {}", path.display()))?;
        samples.push(TrainingSample {
            features: row.features(),
            label: row.label != 0,
        });
    }
    Ok(samples)
}

pub struct FailurePredictor {
    model_path: PathBuf,
    forest: Option<RandomForest>,
}

impl FailurePredictor {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            forest: None,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn has_model(&self) -> bool {
        self.forest.is_some()
    }

    /// Loads the persisted artifact if one exists and none is in memory
    /// yet. An unreadable artifact downgrades to the no-model state.
    pub fn load(&mut self) {
        if self.forest.is_some() || !self.model_path.exists() {
            return;
        }
        match RandomForest::load_json(&self.model_path) {
            Ok(forest) => {
                info!(path = %self.model_path.display(), "Loaded failure model");
                self.forest = Some(forest);
            }
            Err(e) => {
                warn!(error = %e, "Model artifact unreadable, scoring with no model");
            }
        }
    }

    /// Binary risk flag for the node's current feature vector. Always
    /// false while no model exists.
    pub fn score(&self, node: &Node) -> bool {
        self.forest
            .as_ref()
            .map_or(false, |forest| forest.predict(&feature_vector(node)))
    }

    /// One-shot training: fires at the first cycle >= [`TRAIN_CYCLE_THRESHOLD`]
    /// at which no artifact exists and the dataset holds more than
    /// [`MIN_TRAINING_ROWS`] rows. Fits on the entire dataset, persists the
    /// artifact, and keeps the model in memory. Returns whether training ran.
    ///
    /// Dataset read failures propagate; a failed artifact write keeps the
    /// in-memory model and is only logged (the next session retrains).
    pub fn maybe_train(&mut self, cycle: u64, dataset_path: &Path) -> Result<bool> {
        if cycle < TRAIN_CYCLE_THRESHOLD || self.forest.is_some() || self.model_path.exists() {
            return Ok(false);
        }
        if !dataset_path.exists() {
            return Ok(false);
        }

        let samples = load_training_samples(dataset_path)?;
        if samples.len() <= MIN_TRAINING_ROWS {
            return Ok(false);
        }

        let mut forest = RandomForest::default();
        forest.fit(&samples);
        if let Err(e) = forest.save_json(&self.model_path) {
            warn!(error = %e, "Could not persist model artifact");
        } else {
            info!(
                rows = samples.len(),
                path = %self.model_path.display(),
                "Failure model trained and saved"
            );
        }
        self.forest = Some(forest);
        Ok(true)
    }
}
