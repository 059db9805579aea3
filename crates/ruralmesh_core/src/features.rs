//! Feature/label derivation for the failure classifier.
//!
//! One row is emitted per node per cycle, immediately after the node's
//! step. Column names are the dataset's on-disk interface and must not
//! change.

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::topology::Technology;

/// Number of numeric features the classifier consumes. The technology tag
/// is recorded in the dataset but not fed to the model.
pub const FEATURE_COUNT: usize = 4;

/// One training example, serialized as a dataset CSV row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    #[serde(rename = "Nodo")]
    pub node: String,
    #[serde(rename = "Ciclo")]
    pub cycle: u64,
    #[serde(rename = "Latencia")]
    pub latency_ms: u32,
    #[serde(rename = "Disponibilidad")]
    pub availability: f64,
    #[serde(rename = "Fallos")]
    pub failures: u64,
    #[serde(rename = "PorcVecinosActivos")]
    pub active_neighbor_fraction: f64,
    #[serde(rename = "Tecnologia")]
    pub technology: Technology,
    /// 1 if the node is Inactive this cycle.
    #[serde(rename = "FalloProximo")]
    pub label: u8,
}

impl FeatureRow {
    /// Derives the row from a node's post-step state.
    pub fn from_node(node: &Node, cycle: u64) -> Self {
        Self {
            node: node.name.clone(),
            cycle,
            latency_ms: node.latency_ms,
            availability: node.availability(),
            failures: node.failures,
            active_neighbor_fraction: node.active_neighbor_fraction(),
            technology: node.technology,
            label: u8::from(!node.status.is_active()),
        }
    }

    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.latency_ms as f64,
            self.availability,
            self.failures as f64,
            self.active_neighbor_fraction,
        ]
    }
}

/// Feature vector for scoring a node's current state.
pub fn feature_vector(node: &Node) -> [f64; FEATURE_COUNT] {
    [
        node.latency_ms as f64,
        node.availability(),
        node.failures as f64,
        node.active_neighbor_fraction(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeStatus;
    use crate::topology::default_topology;

    #[test]
    fn label_follows_status() {
        let mut node = Node::from_spec(&default_topology()[0]);
        node.total = 1;
        node.active_cycles = 1;

        let row = FeatureRow::from_node(&node, 1);
        assert_eq!(row.label, 0);

        node.status = NodeStatus::Inactive;
        let row = FeatureRow::from_node(&node, 1);
        assert_eq!(row.label, 1);
    }

    #[test]
    fn row_features_match_scoring_vector() {
        let mut node = Node::from_spec(&default_topology()[2]);
        node.total = 4;
        node.active_cycles = 3;
        node.failures = 1;
        node.latency_ms = 350;
        node.routes = vec!["Nodo B".to_string()];

        let row = FeatureRow::from_node(&node, 4);
        assert_eq!(row.features(), feature_vector(&node));
        assert_eq!(row.technology, Technology::LoRaWan);
    }
}
