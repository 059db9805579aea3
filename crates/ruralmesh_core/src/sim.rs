//! Per-cycle state transition.
//!
//! Nodes advance sequentially in topology insertion order. A node's
//! alternate routes therefore reflect the status of neighbors that already
//! took their own step earlier in the same cycle: a sequential-update
//! model, not a simultaneous snapshot. Pinned by the reproducibility
//! tests; do not reorder the draws.

use rand::Rng;

use crate::node::{Node, NodeStatus};

/// Per-cycle probability that an Inactive node comes back.
/// Technology-independent.
pub const RECOVERY_PROBABILITY: f64 = 0.3;

/// Advances one node by one discrete cycle.
///
/// Exactly one status check applies per step: an Inactive node rolls for
/// recovery, an Active node rolls for failure. A node cannot both recover
/// and fail in the same step. Latency has no memory of the prior cycle.
pub fn step_node<R: Rng>(nodes: &mut [Node], idx: usize, rng: &mut R) {
    {
        let node = &mut nodes[idx];
        node.total += 1;

        match node.status {
            NodeStatus::Inactive => {
                if rng.gen_bool(RECOVERY_PROBABILITY) {
                    node.status = NodeStatus::Active;
                }
            }
            NodeStatus::Active => {
                if rng.gen_bool(node.technology.failure_probability()) {
                    node.status = NodeStatus::Inactive;
                    node.failures += 1;
                }
            }
        }

        if node.status.is_active() {
            node.active_cycles += 1;
        }

        node.latency_ms = rng.gen_range(node.technology.latency_range());
    }

    let routes: Vec<String> = nodes[idx]
        .neighbors
        .iter()
        .filter(|name| {
            nodes
                .iter()
                .any(|other| &other.name == *name && other.status.is_active())
        })
        .cloned()
        .collect();
    nodes[idx].routes = routes;
}

/// Advances every node by one cycle, in slice order.
pub fn advance_cycle<R: Rng>(nodes: &mut [Node], rng: &mut R) {
    for idx in 0..nodes.len() {
        step_node(nodes, idx, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::default_topology;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn build_nodes() -> Vec<Node> {
        default_topology().iter().map(Node::from_spec).collect()
    }

    #[test]
    fn counters_never_violate_invariants() {
        let mut nodes = build_nodes();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..200 {
            advance_cycle(&mut nodes, &mut rng);
            for node in &nodes {
                assert!(node.active_cycles <= node.total);
                let avail = node.availability();
                assert!((0.0..=100.0).contains(&avail));
            }
        }
        for node in &nodes {
            assert_eq!(node.total, 200);
        }
    }

    #[test]
    fn latency_stays_in_technology_range() {
        let mut nodes = build_nodes();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..100 {
            advance_cycle(&mut nodes, &mut rng);
            for node in &nodes {
                assert!(
                    node.technology.latency_range().contains(&node.latency_ms),
                    "{}ms outside {:?} range for {}",
                    node.latency_ms,
                    node.technology,
                    node.name
                );
            }
        }
    }

    #[test]
    fn routes_are_the_active_neighbor_subset() {
        let mut nodes = build_nodes();
        let mut rng = ChaCha8Rng::seed_from_u64(13);

        for _ in 0..100 {
            advance_cycle(&mut nodes, &mut rng);
            let statuses: Vec<(String, bool)> = nodes
                .iter()
                .map(|n| (n.name.clone(), n.status.is_active()))
                .collect();
            for node in &nodes {
                for route in &node.routes {
                    assert!(node.neighbors.contains(route));
                }
                for neighbor in &node.neighbors {
                    let active = statuses
                        .iter()
                        .find(|(name, _)| name == neighbor)
                        .map(|(_, a)| *a)
                        .unwrap();
                    assert_eq!(node.routes.contains(neighbor), active);
                }
            }
        }
    }

    #[test]
    fn failures_only_count_active_to_inactive_transitions() {
        let mut nodes = build_nodes();
        let mut rng = ChaCha8Rng::seed_from_u64(17);

        let mut prev: Vec<(NodeStatus, u64)> =
            nodes.iter().map(|n| (n.status, n.failures)).collect();
        for _ in 0..300 {
            advance_cycle(&mut nodes, &mut rng);
            for (node, (prev_status, prev_failures)) in nodes.iter().zip(&prev) {
                let delta = node.failures - prev_failures;
                match (prev_status, node.status) {
                    (NodeStatus::Active, NodeStatus::Inactive) => assert_eq!(delta, 1),
                    _ => assert_eq!(delta, 0),
                }
            }
            prev = nodes.iter().map(|n| (n.status, n.failures)).collect();
        }
    }

    #[test]
    fn same_seed_same_trajectory() {
        let mut a = build_nodes();
        let mut b = build_nodes();
        let mut rng_a = ChaCha8Rng::seed_from_u64(42);
        let mut rng_b = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..50 {
            advance_cycle(&mut a, &mut rng_a);
            advance_cycle(&mut b, &mut rng_b);
            for (x, y) in a.iter().zip(&b) {
                assert_eq!(x.status, y.status);
                assert_eq!(x.latency_ms, y.latency_ms);
                assert_eq!(x.routes, y.routes);
            }
        }
    }
}
