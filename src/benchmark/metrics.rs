use super::sampler::ResourceSnapshot;
use serde::{Serialize, Serializer};

/// Results of one measurement window.
///
/// Values are kept at full precision; rounding happens only when the
/// metrics are serialized into the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    #[serde(rename = "elapsed_s", serialize_with = "round_3")]
    pub elapsed_seconds: f64,
    pub frames_rendered: u64,
    #[serde(serialize_with = "round_2")]
    pub fps_display: f64,
    #[serde(rename = "cpu_pct_1core", serialize_with = "round_1")]
    pub cpu_percent_one_core: f64,
    #[serde(rename = "mem_rss_mb", serialize_with = "round_1")]
    pub mem_rss_megabytes: f64,
    pub run_id: u32,
}

impl RunMetrics {
    pub fn from_window(
        run_id: u32,
        start: &ResourceSnapshot,
        end: &ResourceSnapshot,
        frames_rendered: u64,
    ) -> Self {
        let elapsed_seconds = end.at.duration_since(start.at).as_secs_f64();
        let user = end.cpu.user - start.cpu.user;
        let system = end.cpu.system - start.cpu.system;

        Self {
            elapsed_seconds,
            frames_rendered,
            fps_display: fps_display(frames_rendered, elapsed_seconds),
            cpu_percent_one_core: cpu_percent_one_core(user, system, elapsed_seconds),
            mem_rss_megabytes: bytes_to_megabytes(end.rss_bytes),
            run_id,
        }
    }
}

/// Frames presented per second over the window.
/// The window is always a positive configured duration.
pub fn fps_display(frames: u64, elapsed_seconds: f64) -> f64 {
    debug_assert!(elapsed_seconds > 0.0);
    frames as f64 / elapsed_seconds
}

/// CPU usage relative to one core; may exceed 100 on multi-core systems
pub fn cpu_percent_one_core(user_seconds: f64, system_seconds: f64, elapsed_seconds: f64) -> f64 {
    debug_assert!(elapsed_seconds > 0.0);
    (user_seconds + system_seconds) / elapsed_seconds * 100.0
}

pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

pub(crate) fn round_1<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 1))
}

pub(crate) fn round_2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 2))
}

pub(crate) fn round_3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 3))
}
