//! Per-cycle output consumed by the presentation and notification
//! boundaries. Rendering (tables, maps, charts) happens outside this
//! repository; these types are the contract.

use ruralmesh_core::{Node, NodeStatus, Technology};
use serde::Serialize;
use std::collections::BTreeMap;

/// One table row per node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSnapshot {
    pub node: String,
    pub technology: Technology,
    pub status: NodeStatus,
    pub latency_ms: u32,
    pub availability: f64,
    pub failures: u64,
    pub routes: Vec<String>,
    pub at_risk: bool,
    pub gateway: bool,
    pub lat: f64,
    pub lon: f64,
    /// Latest value per attached sensor stream; empty when none.
    pub readings: BTreeMap<String, f64>,
}

impl NodeSnapshot {
    fn capture(node: &Node) -> Self {
        Self {
            node: node.name.clone(),
            technology: node.technology,
            status: node.status,
            latency_ms: node.latency_ms,
            availability: node.availability(),
            failures: node.failures,
            routes: node.routes.clone(),
            at_risk: node.at_risk,
            gateway: node.gateway,
            lat: node.lat,
            lon: node.lon,
            readings: node
                .sensors
                .iter()
                .map(|(kind, series)| (kind.clone(), series.latest))
                .collect(),
        }
    }
}

/// Everything a dashboard or notifier needs from one completed cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub trained_this_cycle: bool,
    pub nodes: Vec<NodeSnapshot>,
}

impl CycleReport {
    pub fn capture(cycle: u64, nodes: &[Node], trained_this_cycle: bool) -> Self {
        Self {
            cycle,
            trained_this_cycle,
            nodes: nodes.iter().map(NodeSnapshot::capture).collect(),
        }
    }

    /// Inactive nodes with no active neighbor left.
    pub fn isolated(&self) -> Vec<&NodeSnapshot> {
        self.nodes
            .iter()
            .filter(|n| n.status == NodeStatus::Inactive && n.routes.is_empty())
            .collect()
    }

    /// Human-readable multi-line summary for the messaging side-channel.
    pub fn summary_text(&self) -> String {
        let mut lines = vec![format!("Red rural - ciclo {}", self.cycle)];
        for node in &self.nodes {
            let routes = if node.routes.is_empty() {
                "sin rutas".to_string()
            } else {
                node.routes.join("|")
            };
            lines.push(format!(
                "{}: {} | {}ms | disp {}% | {}{}",
                node.node,
                node.status.as_str(),
                node.latency_ms,
                node.availability,
                routes,
                if node.at_risk { " | RIESGO" } else { "" },
            ));
        }
        let isolated = self.isolated();
        if !isolated.is_empty() {
            let names: Vec<&str> = isolated.iter().map(|n| n.node.as_str()).collect();
            lines.push(format!("Sin rutas activas: {}", names.join(", ")));
        }
        if self.trained_this_cycle {
            lines.push("Modelo de fallos entrenado".to_string());
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruralmesh_core::default_topology;

    fn nodes_with_one_down() -> Vec<Node> {
        let mut nodes: Vec<Node> = default_topology().iter().map(Node::from_spec).collect();
        for node in nodes.iter_mut() {
            node.total = 1;
            node.active_cycles = 1;
            node.routes = node.neighbors.clone();
        }
        nodes[2].status = NodeStatus::Inactive;
        nodes[2].routes.clear();
        nodes[2].active_cycles = 0;
        nodes
    }

    #[test]
    fn report_captures_every_node_in_order() {
        let nodes = nodes_with_one_down();
        let report = CycleReport::capture(4, &nodes, false);
        assert_eq!(report.nodes.len(), 6);
        assert_eq!(report.nodes[0].node, "Nodo A");
        assert_eq!(report.nodes[5].node, "Nodo F");
    }

    #[test]
    fn isolated_lists_inactive_nodes_without_routes() {
        let nodes = nodes_with_one_down();
        let report = CycleReport::capture(4, &nodes, false);
        let isolated = report.isolated();
        assert_eq!(isolated.len(), 1);
        assert_eq!(isolated[0].node, "Nodo C");
    }

    #[test]
    fn summary_mentions_cycle_nodes_and_isolation() {
        let nodes = nodes_with_one_down();
        let report = CycleReport::capture(4, &nodes, true);
        let summary = report.summary_text();

        assert!(summary.starts_with("Red rural - ciclo 4"));
        assert_eq!(summary.lines().count(), 1 + 6 + 1 + 1);
        assert!(summary.contains("Nodo C: Inactivo"));
        assert!(summary.contains("Sin rutas activas: Nodo C"));
        assert!(summary.contains("Modelo de fallos entrenado"));
    }
}
