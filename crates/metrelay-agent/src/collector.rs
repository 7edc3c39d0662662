//! Host metric sampling.
//!
//! Wraps a persistent [`sysinfo::System`] and turns each refresh into
//! the flat name → value payload the proxy ingests.

use metrelay_store::MetricPayload;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, Pid, ProcessRefreshKind, RefreshKind, System};

/// Samples host-level and process-level gauges.
///
/// The `System` handle is kept across samples because CPU usage is
/// computed from the delta between two refreshes; the first sample
/// after startup reports `0.0` until a second refresh lands.
pub struct SystemSampler {
    sys: System,
    /// Our own PID, used for the process-level gauges. `None` on
    /// platforms where it cannot be resolved; the gauges are then
    /// simply omitted from the payload.
    pid: Option<Pid>,
}

impl SystemSampler {
    pub fn new() -> Self {
        Self {
            sys: System::new_with_specifics(Self::refresh_kind()),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    /// Refresh only what the gauges need: CPU usage, RAM, and
    /// per-process CPU/memory.
    fn refresh_kind() -> RefreshKind {
        RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
            .with_memory(MemoryRefreshKind::nothing().with_ram())
            .with_processes(ProcessRefreshKind::nothing().with_cpu().with_memory())
    }

    /// Refresh and return the current gauge snapshot.
    pub fn sample(&mut self) -> MetricPayload {
        self.sys.refresh_specifics(Self::refresh_kind());

        let mut payload = MetricPayload::new();
        payload.insert(
            "system_cpu_usage_percent".to_owned(),
            f64::from(self.sys.global_cpu_usage()),
        );
        payload.insert(
            "system_memory_usage_bytes".to_owned(),
            self.sys.used_memory() as f64,
        );
        payload.insert(
            "system_memory_total_bytes".to_owned(),
            self.sys.total_memory() as f64,
        );

        if let Some(process) = self.pid.and_then(|pid| self.sys.process(pid)) {
            payload.insert(
                "process_cpu_usage_percent".to_owned(),
                f64::from(process.cpu_usage()),
            );
            payload.insert(
                "process_memory_usage_bytes".to_owned(),
                process.memory() as f64,
            );
        }

        payload
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}
