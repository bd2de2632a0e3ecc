use crate::error::{Result, ViewerError};
use std::collections::VecDeque;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tokio::time::Instant;

/// Cumulative CPU time consumed by the process, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CpuTimes {
    pub user: f64,
    pub system: f64,
}

/// Source of process resource usage
pub trait ResourceSampler {
    fn cpu_times(&mut self) -> Result<CpuTimes>;

    fn resident_memory_bytes(&mut self) -> Result<u64>;
}

/// Wall-clock, CPU and memory readings taken at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSnapshot {
    pub at: Instant,
    pub cpu: CpuTimes,
    pub rss_bytes: u64,
}

impl ResourceSnapshot {
    pub fn take<R: ResourceSampler + ?Sized>(sampler: &mut R, at: Instant) -> Result<Self> {
        Ok(Self {
            at,
            cpu: sampler.cpu_times()?,
            rss_bytes: sampler.resident_memory_bytes()?,
        })
    }
}

/// Samples the current process: `getrusage` for CPU, sysinfo for RSS
pub struct ProcessSampler {
    system: System,
    pid: Pid,
}

impl ProcessSampler {
    pub fn new() -> Result<Self> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| ViewerError::sampling(format!("Cannot determine process id: {}", e)))?;

        Ok(Self {
            system: System::new(),
            pid,
        })
    }
}

impl ResourceSampler for ProcessSampler {
    fn cpu_times(&mut self) -> Result<CpuTimes> {
        rusage_self()
    }

    fn resident_memory_bytes(&mut self) -> Result<u64> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            false,
            ProcessRefreshKind::nothing().with_memory(),
        );

        self.system
            .process(self.pid)
            .map(|process| process.memory())
            .ok_or_else(|| ViewerError::sampling(format!("Process {} not found", self.pid)))
    }
}

#[cfg(unix)]
fn rusage_self() -> Result<CpuTimes> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();

    // SAFETY: getrusage only writes into the provided struct
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return Err(ViewerError::sampling(format!(
            "getrusage failed: {}",
            std::io::Error::last_os_error()
        )));
    }

    // SAFETY: initialised by the successful call above
    let usage = unsafe { usage.assume_init() };
    Ok(CpuTimes {
        user: timeval_seconds(&usage.ru_utime),
        system: timeval_seconds(&usage.ru_stime),
    })
}

#[cfg(unix)]
fn timeval_seconds(tv: &libc::timeval) -> f64 {
    tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0
}

#[cfg(not(unix))]
fn rusage_self() -> Result<CpuTimes> {
    Err(ViewerError::sampling(
        "process CPU times are only available on Unix",
    ))
}

/// Sampler replaying fixed readings; the last reading repeats once exhausted
#[derive(Debug, Clone, Default)]
pub struct ScriptedSampler {
    cpu: VecDeque<CpuTimes>,
    rss: VecDeque<u64>,
    failing: bool,
}

impl ScriptedSampler {
    pub fn new(cpu: impl IntoIterator<Item = CpuTimes>, rss: impl IntoIterator<Item = u64>) -> Self {
        Self {
            cpu: cpu.into_iter().collect(),
            rss: rss.into_iter().collect(),
            failing: false,
        }
    }

    /// Sampler whose every reading fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn next<T: Copy>(queue: &mut VecDeque<T>) -> Option<T> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().copied()
        }
    }
}

impl ResourceSampler for ScriptedSampler {
    fn cpu_times(&mut self) -> Result<CpuTimes> {
        if self.failing {
            return Err(ViewerError::sampling("scripted failure"));
        }
        Ok(Self::next(&mut self.cpu).unwrap_or_default())
    }

    fn resident_memory_bytes(&mut self) -> Result<u64> {
        if self.failing {
            return Err(ViewerError::sampling("scripted failure"));
        }
        Ok(Self::next(&mut self.rss).unwrap_or_default())
    }
}
