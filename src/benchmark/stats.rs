use super::metrics::{round_to, RunMetrics};

/// Aggregate FPS statistics across runs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FpsSummary {
    pub mean: f64,
    pub median: f64,
    pub stddev: f64,
    pub p95: f64,
    pub p99: f64,
}

impl FpsSummary {
    /// Statistics over each run's FPS as reported, i.e. rounded to 2 places
    pub fn from_runs(runs: &[RunMetrics]) -> Self {
        let samples: Vec<f64> = runs
            .iter()
            .map(|run| round_to(run.fps_display, 2))
            .collect();
        Self::from_samples(&samples)
    }

    /// All fields are 0 for an empty sample set
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Self {
            mean: mean(samples),
            median: median(&sorted),
            stddev: sample_stddev(samples),
            p95: nearest_rank(&sorted, 0.95),
            p99: nearest_rank(&sorted, 0.99),
        }
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Median of an ascending-sorted slice
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Sample standard deviation (n - 1 denominator), 0 below two samples
pub fn sample_stddev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let mean = mean(samples);
    let variance = samples
        .iter()
        .map(|sample| (sample - mean).powi(2))
        .sum::<f64>()
        / (samples.len() - 1) as f64;
    variance.sqrt()
}

/// Nearest-rank percentile: element `floor(n * quantile)` of an
/// ascending-sorted slice, clamped to the last element
pub fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f64) * quantile).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// FPS statistics over a set of runs
pub fn summarize(runs: &[RunMetrics]) -> FpsSummary {
    FpsSummary::from_runs(runs)
}
