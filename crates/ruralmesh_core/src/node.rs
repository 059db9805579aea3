//! Mutable per-node state, updated in place once per cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::topology::{NodeSpec, Technology};

/// Operational status of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Active,
    Inactive,
}

impl NodeStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, NodeStatus::Active)
    }

    /// Wire string used in the run log.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Active => "Activo",
            NodeStatus::Inactive => "Inactivo",
        }
    }
}

/// One sensor reading stream: latest value plus full history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorSeries {
    pub latest: f64,
    pub history: Vec<f64>,
}

impl SensorSeries {
    pub fn record(&mut self, value: f64) {
        self.latest = value;
        self.history.push(value);
    }
}

/// A simulated network element with fixed identity and neighbors, and
/// mutable status, latency and lifetime counters.
///
/// `sensors` and `gateway` are fixed fields present from construction; the
/// sensor map simply stays empty when no readings are attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub neighbors: Vec<String>,
    pub lat: f64,
    pub lon: f64,
    pub technology: Technology,
    pub gateway: bool,
    pub status: NodeStatus,
    pub latency_ms: u32,
    /// Lifetime cycles observed.
    pub total: u64,
    /// Lifetime cycles spent Active.
    pub active_cycles: u64,
    /// Lifetime Active -> Inactive transitions.
    pub failures: u64,
    /// Most recent classifier output.
    pub at_risk: bool,
    /// Neighbors currently Active, recomputed every cycle.
    pub routes: Vec<String>,
    pub sensors: BTreeMap<String, SensorSeries>,
}

impl Node {
    pub fn from_spec(spec: &NodeSpec) -> Self {
        Self {
            name: spec.name.clone(),
            neighbors: spec.neighbors.clone(),
            lat: spec.lat,
            lon: spec.lon,
            technology: spec.technology,
            gateway: spec.gateway,
            status: NodeStatus::Active,
            latency_ms: 0,
            total: 0,
            active_cycles: 0,
            failures: 0,
            at_risk: false,
            routes: Vec::new(),
            sensors: BTreeMap::new(),
        }
    }

    /// Percentage of observed cycles spent Active, rounded to two decimals.
    /// Defined as 100 before the first cycle.
    pub fn availability(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        let pct = self.active_cycles as f64 / self.total as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }

    /// Fraction of neighbors currently Active, in [0, 1].
    pub fn active_neighbor_fraction(&self) -> f64 {
        if self.neighbors.is_empty() {
            return 0.0;
        }
        self.routes.len() as f64 / self.neighbors.len() as f64
    }

    pub fn record_reading(&mut self, kind: &str, value: f64) {
        self.sensors.entry(kind.to_string()).or_default().record(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::default_topology;

    fn node_a() -> Node {
        Node::from_spec(&default_topology()[0])
    }

    #[test]
    fn availability_is_100_before_first_cycle() {
        let node = node_a();
        assert_eq!(node.total, 0);
        assert_eq!(node.availability(), 100.0);
    }

    #[test]
    fn availability_rounds_to_two_decimals() {
        let mut node = node_a();
        node.total = 3;
        node.active_cycles = 1;
        // 33.333... -> 33.33
        assert_eq!(node.availability(), 33.33);
        node.active_cycles = 2;
        // 66.666... -> 66.67
        assert_eq!(node.availability(), 66.67);
    }

    #[test]
    fn sensors_start_empty_and_accumulate() {
        let mut node = node_a();
        assert!(node.sensors.is_empty());
        node.record_reading("temperatura", 24.5);
        node.record_reading("temperatura", 25.1);
        let series = &node.sensors["temperatura"];
        assert_eq!(series.latest, 25.1);
        assert_eq!(series.history, vec![24.5, 25.1]);
    }

    #[test]
    fn neighbor_fraction_tracks_routes() {
        let mut node = node_a();
        assert_eq!(node.active_neighbor_fraction(), 0.0);
        node.routes = vec!["Nodo B".to_string()];
        assert_eq!(node.active_neighbor_fraction(), 0.5);
        node.routes = node.neighbors.clone();
        assert_eq!(node.active_neighbor_fraction(), 1.0);
    }
}
