#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::Instant;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy)]
pub struct ProcessStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
}

/// Samples the server process around each render. Browser variants spawn
/// Chromium as a child, so the interesting number is how far the server's own
/// footprint drifts across requests.
#[cfg(feature = "cli")]
pub struct RenderMonitor {
    state: Option<Mutex<MonitorState>>,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
    renders: u64,
}

#[cfg(feature = "cli")]
impl RenderMonitor {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self { state: None };
        }

        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(e) => {
                tracing::warn!("⚠️ Monitoring disabled, cannot resolve current PID: {}", e);
                return Self { state: None };
            }
        };

        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::everything(),
        );

        Self {
            state: Some(Mutex::new(MonitorState {
                system,
                pid,
                peak_memory_mb: 0,
                renders: 0,
            })),
        }
    }

    pub fn sample(&self) -> Option<ProcessStats> {
        let mut state = self.state.as_ref()?.lock().ok()?;
        let pid = state.pid;
        state.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::everything(),
        );

        let process = state.system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let cpu_usage = process.cpu_usage();

        if memory_mb > state.peak_memory_mb {
            state.peak_memory_mb = memory_mb;
        }

        Some(ProcessStats {
            cpu_usage,
            memory_usage_mb: memory_mb,
            peak_memory_mb: state.peak_memory_mb,
        })
    }

    pub fn render_started(&self, variant: &str) -> Option<Instant> {
        let stats = self.sample()?;
        tracing::info!(
            "📊 {} render start - CPU: {:.1}%, Memory: {}MB, Peak: {}MB",
            variant,
            stats.cpu_usage,
            stats.memory_usage_mb,
            stats.peak_memory_mb
        );
        Some(Instant::now())
    }

    pub fn render_finished(&self, variant: &str, started: Option<Instant>) {
        let Some(started) = started else {
            return;
        };
        let renders = match self.state.as_ref().and_then(|s| s.lock().ok()) {
            Some(mut state) => {
                state.renders += 1;
                state.renders
            }
            None => return,
        };
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 {} render #{} done in {:?} - Memory: {}MB, Peak: {}MB",
                variant,
                renders,
                started.elapsed(),
                stats.memory_usage_mb,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(feature = "cli")]
impl Default for RenderMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 為非CLI環境提供空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct RenderMonitor;

#[cfg(not(feature = "cli"))]
impl RenderMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn render_started(&self, _variant: &str) -> Option<std::time::Instant> {
        None
    }

    pub fn render_finished(&self, _variant: &str, _started: Option<std::time::Instant>) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
