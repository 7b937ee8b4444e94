// src/metrics.rs
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::{Path, PathBuf};

use crate::error::OutputError;
use crate::state::write_atomic;

/// File name of the exposition dump written next to the snapshot.
pub const EXPOSITION_FILE: &str = "metrics.prom";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. `None` when a recorder is
    /// already installed (e.g. a second pass in the same process).
    pub fn init() -> Option<Self> {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                crate::ingest::ensure_metrics_described();
                Some(Self { handle })
            }
            Err(error) => {
                tracing::warn!(%error, "prometheus recorder not installed");
                None
            }
        }
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Dump the exposition next to `snapshot_path`; returns the file written.
    pub fn write_next_to(&self, snapshot_path: &Path) -> Result<PathBuf, OutputError> {
        let target = snapshot_path.with_file_name(EXPOSITION_FILE);
        write_atomic(&target, self.render().as_bytes())?;
        Ok(target)
    }
}
