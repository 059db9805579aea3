//! The simulation session: explicit, owned state for one run.
//!
//! One session = one process lifetime. The node map and cycle counter live
//! here and reset on restart; only the CSV files and the model artifact
//! persist across sessions.

use std::path::PathBuf;

use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use ruralmesh_core::{
    default_topology, sim::step_node, topology::validate_topology, FeatureRow, MeshError, Node,
};
use tracing::{debug, info};

use crate::predictor::FailurePredictor;
use crate::recorder::{FeatureRecorder, RunLog};
use crate::snapshot::CycleReport;

/// File layout inside the data directory. The CSV names are the interface
/// consumed by the existing dashboard; do not rename them.
#[derive(Debug, Clone)]
pub struct SessionPaths {
    data_dir: PathBuf,
}

impl SessionPaths {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn dataset(&self) -> PathBuf {
        self.data_dir.join("dataset_ia.csv")
    }

    pub fn run_log(&self) -> PathBuf {
        self.data_dir.join("registro_red.csv")
    }

    pub fn model(&self) -> PathBuf {
        self.data_dir.join("modelo_entrenado.json")
    }
}

pub struct SimSession {
    cycle: u64,
    nodes: Vec<Node>,
    rng: ChaCha8Rng,
    recorder: FeatureRecorder,
    run_log: RunLog,
    predictor: FailurePredictor,
    notified_this_cycle: bool,
}

impl SimSession {
    /// Builds the session from the fixed topology. With a seed, every run
    /// produces the exact same status/latency trajectory.
    pub fn new(paths: &SessionPaths, seed: Option<u64>) -> Result<Self, MeshError> {
        let specs = default_topology();
        validate_topology(&specs)?;

        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            cycle: 0,
            nodes: specs.iter().map(Node::from_spec).collect(),
            rng,
            recorder: FeatureRecorder::new(paths.dataset()),
            run_log: RunLog::new(paths.run_log()),
            predictor: FailurePredictor::new(paths.model()),
            notified_this_cycle: false,
        })
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// At most one notification per cycle: the first caller wins, later
    /// callers within the same cycle get false. Reset at cycle start.
    pub fn try_claim_notification(&mut self) -> bool {
        if self.notified_this_cycle {
            return false;
        }
        self.notified_this_cycle = true;
        true
    }

    /// Attaches a sensor reading to a node. Returns false for an unknown
    /// node name.
    pub fn record_reading(&mut self, node_name: &str, kind: &str, value: f64) -> bool {
        match self.nodes.iter_mut().find(|n| n.name == node_name) {
            Some(node) => {
                node.record_reading(kind, value);
                true
            }
            None => false,
        }
    }

    /// Runs one full cycle synchronously: advance every node in topology
    /// order, record its feature row, score it, and log the run-log line;
    /// then run the one-shot training if due.
    ///
    /// Dataset and run-log write failures abort the cycle and propagate.
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycle += 1;
        self.notified_this_cycle = false;
        self.predictor.load();

        for idx in 0..self.nodes.len() {
            step_node(&mut self.nodes, idx, &mut self.rng);

            let row = FeatureRow::from_node(&self.nodes[idx], self.cycle);
            self.recorder.append(&row)?;

            let at_risk = self.predictor.score(&self.nodes[idx]);
            self.nodes[idx].at_risk = at_risk;

            self.run_log.append(self.cycle, &self.nodes[idx])?;
            debug!(
                cycle = self.cycle,
                node = %self.nodes[idx].name,
                status = self.nodes[idx].status.as_str(),
                latency_ms = self.nodes[idx].latency_ms,
                at_risk,
                "Node stepped"
            );
        }

        let dataset_path = self.recorder.path().to_path_buf();
        let trained = self.predictor.maybe_train(self.cycle, &dataset_path)?;

        let active = self.nodes.iter().filter(|n| n.status.is_active()).count();
        info!(
            cycle = self.cycle,
            active,
            total = self.nodes.len(),
            trained,
            "Cycle complete"
        );

        Ok(CycleReport::capture(self.cycle, &self.nodes, trained))
    }
}
