//! Append-only CSV persistence: the training dataset and the run log.
//!
//! Both files get their header exactly once, when the file is created; every
//! later write is a plain append. No row is ever rewritten or deduplicated,
//! and write failures propagate to the caller.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ruralmesh_core::{FeatureRow, Node};

/// Run-log column names, part of the on-disk interface.
const RUN_LOG_HEADER: [&str; 6] = [
    "Ciclo",
    "Nodo",
    "Estado",
    "Latencia",
    "Disponibilidad",
    "Rutas Alternas",
];

fn open_append(path: &Path) -> Result<(std::fs::File, bool)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let fresh = !path.exists();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok((file, fresh))
}

fn count_data_rows(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut count = 0;
    for record in reader.records() {
        record.with_context(|| format!("Malformed row in {}", path.display()))?;
        count += 1;
    }
    Ok(count)
}

/// Appends one feature/label row per node per cycle to the dataset file.
pub struct FeatureRecorder {
    path: PathBuf,
}

impl FeatureRecorder {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, row: &FeatureRow) -> Result<()> {
        let (file, fresh) = open_append(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(fresh)
            .from_writer(file);
        writer
            .serialize(row)
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        writer.flush().context("Failed to flush dataset")?;
        Ok(())
    }

    /// Data rows currently on disk, excluding the header. 0 if the file
    /// does not exist yet.
    pub fn row_count(&self) -> Result<usize> {
        count_data_rows(&self.path)
    }
}

/// Appends one human-auditable line per node per cycle.
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, cycle: u64, node: &Node) -> Result<()> {
        let (file, fresh) = open_append(&self.path)?;
        let mut writer = csv::Writer::from_writer(file);
        if fresh {
            writer
                .write_record(RUN_LOG_HEADER)
                .context("Failed to write run-log header")?;
        }
        writer
            .write_record([
                cycle.to_string(),
                node.name.clone(),
                node.status.as_str().to_string(),
                node.latency_ms.to_string(),
                node.availability().to_string(),
                node.routes.join("|"),
            ])
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        writer.flush().context("Failed to flush run log")?;
        Ok(())
    }

    pub fn data_row_count(&self) -> Result<usize> {
        count_data_rows(&self.path)
    }
}
