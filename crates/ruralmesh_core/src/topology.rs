//! Static network topology: six named nodes in a ring (A-B-C-D-E-F-A).
//!
//! No operation adds or removes nodes or edges at runtime. The technology
//! tag only parameterizes the simulation (failure probability and latency
//! range); it is not structural.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::MeshError;

/// Link technology of a node. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Technology {
    #[serde(rename = "WiFi")]
    WiFi,
    #[serde(rename = "LoRaWAN")]
    LoRaWan,
}

impl Technology {
    /// Per-cycle probability that an Active node goes Inactive.
    /// LoRaWAN links are the more failure-resistant of the two.
    pub fn failure_probability(&self) -> f64 {
        match self {
            Technology::WiFi => 0.2,
            Technology::LoRaWan => 0.1,
        }
    }

    /// Uniform latency range in milliseconds, redrawn every cycle.
    /// Wider and higher for the longer-range technology.
    pub fn latency_range(&self) -> RangeInclusive<u32> {
        match self {
            Technology::WiFi => 20..=120,
            Technology::LoRaWan => 100..=800,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Technology::WiFi => "WiFi",
            Technology::LoRaWan => "LoRaWAN",
        }
    }
}

/// Immutable definition of one node in the fixed topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    pub neighbors: Vec<String>,
    pub lat: f64,
    pub lon: f64,
    pub technology: Technology,
    pub gateway: bool,
}

impl NodeSpec {
    fn new(
        name: &str,
        neighbors: [&str; 2],
        lat: f64,
        lon: f64,
        technology: Technology,
        gateway: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            neighbors: neighbors.iter().map(|n| n.to_string()).collect(),
            lat,
            lon,
            technology,
            gateway,
        }
    }
}

/// The fixed six-node ring. "Nodo A" is the gateway.
pub fn default_topology() -> Vec<NodeSpec> {
    use Technology::{LoRaWan, WiFi};
    vec![
        NodeSpec::new("Nodo A", ["Nodo B", "Nodo F"], 5.0, -74.0, WiFi, true),
        NodeSpec::new("Nodo B", ["Nodo A", "Nodo C"], 5.1, -74.1, WiFi, false),
        NodeSpec::new("Nodo C", ["Nodo B", "Nodo D"], 5.2, -74.0, LoRaWan, false),
        NodeSpec::new("Nodo D", ["Nodo C", "Nodo E"], 5.3, -74.2, WiFi, false),
        NodeSpec::new("Nodo E", ["Nodo D", "Nodo F"], 5.1, -74.3, LoRaWan, false),
        NodeSpec::new("Nodo F", ["Nodo E", "Nodo A"], 5.0, -74.2, LoRaWan, false),
    ]
}

/// Checks that the topology is non-empty, has unique names, and that every
/// neighbor reference resolves to a defined node.
pub fn validate_topology(specs: &[NodeSpec]) -> Result<(), MeshError> {
    if specs.is_empty() {
        return Err(MeshError::EmptyTopology);
    }

    let mut names = HashSet::new();
    for spec in specs {
        if !names.insert(spec.name.as_str()) {
            return Err(MeshError::DuplicateNode(spec.name.clone()));
        }
    }

    for spec in specs {
        for neighbor in &spec.neighbors {
            if !names.contains(neighbor.as_str()) {
                return Err(MeshError::UnknownNeighbor {
                    node: spec.name.clone(),
                    neighbor: neighbor.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_topology_is_valid() {
        let specs = default_topology();
        assert_eq!(specs.len(), 6);
        validate_topology(&specs).unwrap();
    }

    #[test]
    fn default_topology_is_a_ring() {
        let specs = default_topology();
        for spec in &specs {
            assert_eq!(spec.neighbors.len(), 2, "{} is not degree 2", spec.name);
        }
        // Edges are symmetric
        for spec in &specs {
            for neighbor in &spec.neighbors {
                let other = specs.iter().find(|s| &s.name == neighbor).unwrap();
                assert!(
                    other.neighbors.contains(&spec.name),
                    "edge {} -> {} is not symmetric",
                    spec.name,
                    neighbor
                );
            }
        }
    }

    #[test]
    fn exactly_one_gateway() {
        let gateways = default_topology().iter().filter(|s| s.gateway).count();
        assert_eq!(gateways, 1);
    }

    #[test]
    fn unknown_neighbor_is_fatal() {
        let mut specs = default_topology();
        specs[0].neighbors[0] = "Nodo Z".to_string();
        let err = validate_topology(&specs).unwrap_err();
        assert!(matches!(err, MeshError::UnknownNeighbor { .. }));
    }

    #[test]
    fn lorawan_range_is_wider_and_higher() {
        let wifi = Technology::WiFi.latency_range();
        let lora = Technology::LoRaWan.latency_range();
        assert!(lora.end() > wifi.end());
        assert!(lora.end() - lora.start() > wifi.end() - wifi.start());
        assert!(Technology::LoRaWan.failure_probability() < Technology::WiFi.failure_probability());
    }
}
