use super::metrics::{round_2, RunMetrics};
use super::stats::FpsSummary;
use crate::config::{BenchmarkConfig, PreviewConfig};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Benchmark parameters echoed into the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    pub runs: u32,
    #[serde(rename = "warmup_s")]
    pub warmup_seconds: u32,
    #[serde(rename = "duration_s")]
    pub duration_seconds: u32,
}

impl ConfigSnapshot {
    pub fn new(preview: &PreviewConfig, benchmark: &BenchmarkConfig) -> Self {
        Self {
            width: preview.width,
            height: preview.height,
            framerate: preview.framerate,
            runs: benchmark.runs,
            warmup_seconds: benchmark.warmup_seconds,
            duration_seconds: benchmark.duration_seconds,
        }
    }
}

/// JSON report written after all runs complete
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkSummary {
    pub timestamp: DateTime<Utc>,
    pub config: ConfigSnapshot,
    #[serde(serialize_with = "round_2")]
    pub fps_mean: f64,
    #[serde(serialize_with = "round_2")]
    pub fps_median: f64,
    #[serde(serialize_with = "round_2")]
    pub fps_stddev: f64,
    #[serde(serialize_with = "round_2")]
    pub fps_p95: f64,
    #[serde(serialize_with = "round_2")]
    pub fps_p99: f64,
    pub runs: Vec<RunMetrics>,
}

impl BenchmarkSummary {
    pub fn new(timestamp: DateTime<Utc>, config: ConfigSnapshot, runs: Vec<RunMetrics>) -> Self {
        let fps = FpsSummary::from_runs(&runs);

        Self {
            timestamp,
            config,
            fps_mean: fps.mean,
            fps_median: fps.median,
            fps_stddev: fps.stddev,
            fps_p95: fps.p95,
            fps_p99: fps.p99,
            runs,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// `benchmark-YYYYMMDDTHHMM.json` in the working directory
pub fn default_output_path(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("benchmark-{}.json", now.format("%Y%m%dT%H%M")))
}

/// Write the report, creating parent directories as needed
pub fn write_summary(summary: &BenchmarkSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(path, summary.to_json()?)?;
    info!("Benchmark results written to {}", path.display());
    Ok(())
}
