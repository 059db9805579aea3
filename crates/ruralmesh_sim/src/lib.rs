//! Simulation engine: the explicit session object that owns all per-run
//! state, the append-only CSV recorders, and the failure-predictor
//! lifecycle.
//!
//! The session is the only writer to the dataset and run-log files, and a
//! cycle runs synchronously to completion before control returns to the
//! caller. Presentation and notification consume the [`CycleReport`]
//! produced at the end of each cycle; they never reach into the session.

pub mod predictor;
pub mod recorder;
pub mod session;
pub mod snapshot;

pub use predictor::{FailurePredictor, MIN_TRAINING_ROWS, TRAIN_CYCLE_THRESHOLD};
pub use recorder::{FeatureRecorder, RunLog};
pub use session::{SessionPaths, SimSession};
pub use snapshot::{CycleReport, NodeSnapshot};
