use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[derive(Debug, Clone)]
pub struct StageTiming {
    pub stage: String,
    pub elapsed: Duration,
    pub rows: usize,
    pub memory_mb: Option<u64>,
}

/// Records how long each ETL stage took and how many rows it left behind. When the
/// `cli` feature is on, process memory is sampled after every stage as well.
pub struct RunMonitor {
    enabled: bool,
    started: Instant,
    stage_started: Instant,
    timings: Vec<StageTiming>,
    peak_memory_mb: u64,
    #[cfg(feature = "cli")]
    system: Option<(System, Pid)>,
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        #[cfg(feature = "cli")]
        let system = if enabled {
            sysinfo::get_current_pid().ok().map(|pid| (System::new(), pid))
        } else {
            None
        };

        let now = Instant::now();
        Self {
            enabled,
            started: now,
            stage_started: now,
            timings: Vec::new(),
            peak_memory_mb: 0,
            #[cfg(feature = "cli")]
            system,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(feature = "cli")]
    fn sample_memory_mb(&mut self) -> Option<u64> {
        let (system, pid) = self.system.as_mut()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[*pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system.process(*pid).map(|p| p.memory() / 1024 / 1024)
    }

    #[cfg(not(feature = "cli"))]
    fn sample_memory_mb(&mut self) -> Option<u64> {
        None
    }

    /// Closes the current stage and starts timing the next one.
    pub fn finish_stage(&mut self, stage: &str, rows: usize) {
        if !self.enabled {
            return;
        }

        let elapsed = self.stage_started.elapsed();
        let memory_mb = self.sample_memory_mb();
        if let Some(mb) = memory_mb {
            self.peak_memory_mb = self.peak_memory_mb.max(mb);
        }

        match memory_mb {
            Some(mb) => tracing::info!(
                "📊 {} - rows: {}, time: {:?}, memory: {}MB",
                stage,
                rows,
                elapsed,
                mb
            ),
            None => tracing::info!("📊 {} - rows: {}, time: {:?}", stage, rows, elapsed),
        }

        self.timings.push(StageTiming {
            stage: stage.to_string(),
            elapsed,
            rows,
            memory_mb,
        });
        self.stage_started = Instant::now();
    }

    pub fn log_final_stats(&self) {
        if self.enabled {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                self.started.elapsed(),
                self.peak_memory_mb
            );
        }
    }

    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}
