mod metrics;
mod orchestrator;
mod phase;
mod report;
mod run;
mod sampler;
mod stats;
#[cfg(test)]
mod tests;

pub use metrics::{bytes_to_megabytes, cpu_percent_one_core, fps_display, RunMetrics};
pub use orchestrator::{BenchmarkOrchestrator, RunProgress};
pub use phase::{PhaseEvent, RunPhase};
pub use report::{default_output_path, write_summary, BenchmarkSummary, ConfigSnapshot};
pub use run::{BenchmarkRun, RunEvent, RunOutcome};
pub use sampler::{CpuTimes, ProcessSampler, ResourceSampler, ResourceSnapshot, ScriptedSampler};
pub use stats::{mean, median, nearest_rank, sample_stddev, summarize, FpsSummary};
