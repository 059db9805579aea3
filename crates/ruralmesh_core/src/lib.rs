//! Core domain model for the rural mesh simulator: the static six-node ring
//! topology, the per-cycle state transition, feature derivation and the
//! random-forest failure classifier.
//!
//! Everything here is synchronous and side-effect free except the model
//! artifact I/O in [`forest`]. Persistence of the dataset and run log lives
//! in `ruralmesh_sim`.

pub mod features;
pub mod forest;
pub mod node;
pub mod sim;
pub mod topology;

pub use features::{feature_vector, FeatureRow, FEATURE_COUNT};
pub use forest::{RandomForest, TrainingSample};
pub use node::{Node, NodeStatus, SensorSeries};
pub use sim::{advance_cycle, step_node, RECOVERY_PROBABILITY};
pub use topology::{default_topology, NodeSpec, Technology};

use thiserror::Error;

/// Fatal domain errors. The topology is static and fully known in advance,
/// so an inconsistent neighbor reference is a construction-time failure,
/// never a runtime condition.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("node '{node}' references unknown neighbor '{neighbor}'")]
    UnknownNeighbor { node: String, neighbor: String },
    #[error("duplicate node name '{0}' in topology")]
    DuplicateNode(String),
    #[error("topology has no nodes")]
    EmptyTopology,
}
