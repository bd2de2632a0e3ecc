use super::*;
use crate::capture::{CallLog, CaptureBackend, MockCaptureStack};
use crate::config::{BenchmarkConfig, PreviewConfig, ViewerConfig};
use crate::error::ViewerError;
use crate::lifecycle::{LifecycleState, ShutdownFlag};
use crate::render::{MockGraphicsStack, ProbeStep};
use chrono::TimeZone;
use std::time::Duration;

fn create_test_config(runs: u32) -> ViewerConfig {
    ViewerConfig {
        preview: PreviewConfig {
            width: 640,
            height: 480,
            framerate: 10,
            ..PreviewConfig::default()
        },
        benchmark: BenchmarkConfig {
            runs,
            warmup_seconds: 1,
            duration_seconds: 2,
            output: None,
        },
        ..ViewerConfig::default()
    }
}

fn cpu(user: f64, system: f64) -> CpuTimes {
    CpuTimes { user, system }
}

fn metrics(run_id: u32, fps: f64) -> RunMetrics {
    RunMetrics {
        elapsed_seconds: 30.0,
        frames_rendered: (fps * 30.0) as u64,
        fps_display: fps,
        cpu_percent_one_core: 42.0,
        mem_rss_megabytes: 120.0,
        run_id,
    }
}

fn orchestrator(
    runs: u32,
    log: &CallLog,
    sampler: ScriptedSampler,
    shutdown: &ShutdownFlag,
) -> BenchmarkOrchestrator<MockCaptureStack, MockGraphicsStack, ScriptedSampler> {
    BenchmarkOrchestrator::new(
        &create_test_config(runs),
        MockCaptureStack::new(CaptureBackend::Libcamera, log.clone()),
        MockGraphicsStack::new(log.clone()),
        sampler,
        shutdown.clone(),
    )
    .unwrap()
}

#[test]
fn test_phase_transitions() {
    assert_eq!(
        RunPhase::Warmup.advance(PhaseEvent::WarmupElapsed),
        Some(RunPhase::Measuring)
    );
    assert_eq!(
        RunPhase::Measuring.advance(PhaseEvent::MeasurementElapsed),
        Some(RunPhase::Done)
    );
    assert_eq!(RunPhase::Warmup.advance(PhaseEvent::MeasurementElapsed), None);
    assert_eq!(RunPhase::Done.advance(PhaseEvent::WarmupElapsed), None);
    assert!(RunPhase::Done.is_done());
}

#[test]
fn test_metric_formulas() {
    assert_eq!(fps_display(295, 10.0), 29.5);
    assert_eq!(cpu_percent_one_core(1.5, 0.5, 2.0), 100.0);
    assert_eq!(cpu_percent_one_core(4.0, 1.0, 5.0), 100.0);
    // Multi-threaded work can exceed one core
    assert_eq!(cpu_percent_one_core(3.0, 1.0, 2.0), 200.0);
    assert_eq!(bytes_to_megabytes(150 * 1024 * 1024), 150.0);
}

#[test]
fn test_fps_statistics() {
    let summary = FpsSummary::from_samples(&[30.2, 28.0, 29.5, 30.0, 29.0]);
    assert!((summary.mean - 29.34).abs() < 1e-9);
    assert_eq!(summary.median, 29.5);
    assert_eq!(summary.p95, 30.2);
    assert_eq!(summary.p99, 30.2);
    assert!((summary.stddev - 0.882_043).abs() < 1e-5);
}

#[test]
fn test_summarize_runs() {
    let runs: Vec<RunMetrics> = [28.0, 29.0, 29.5, 30.0, 30.2]
        .iter()
        .enumerate()
        .map(|(i, fps)| metrics(i as u32 + 1, *fps))
        .collect();
    let summary = summarize(&runs);
    assert_eq!(summary.p95, 30.2);
    assert_eq!(summary.median, 29.5);
}

#[test]
fn test_statistics_edge_cases() {
    assert_eq!(FpsSummary::from_samples(&[]), FpsSummary::default());

    let single = FpsSummary::from_samples(&[25.0]);
    assert_eq!(single.stddev, 0.0);
    assert_eq!(single.mean, 25.0);
    assert_eq!(single.p99, 25.0);

    assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    assert_eq!(nearest_rank(&[1.0, 2.0], 0.99), 2.0);
    assert_eq!(nearest_rank(&[1.0, 2.0, 3.0], 0.5), 2.0);
    assert_eq!(mean(&[]), 0.0);
    assert_eq!(sample_stddev(&[2.0, 4.0]), 2f64.sqrt());
}

#[test]
fn test_report_json_shape_and_rounding() {
    let timestamp = chrono::Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
    let config = ConfigSnapshot::new(&create_test_config(2).preview, &create_test_config(2).benchmark);
    let runs = vec![
        RunMetrics {
            elapsed_seconds: 2.000_449,
            frames_rendered: 59,
            fps_display: 29.493_366,
            cpu_percent_one_core: 37.263,
            mem_rss_megabytes: 84.349,
            run_id: 1,
        },
        metrics(2, 30.01),
    ];
    let summary = BenchmarkSummary::new(timestamp, config, runs);
    let value = serde_json::to_value(&summary).unwrap();

    assert_eq!(value["config"]["width"], 640);
    assert_eq!(value["config"]["warmup_s"], 1);
    assert_eq!(value["config"]["duration_s"], 2);
    assert_eq!(value["fps_median"], 29.75);
    assert_eq!(value["fps_p95"], 30.01);

    let run = &value["runs"][0];
    assert_eq!(run["elapsed_s"], 2.0);
    assert_eq!(run["frames_rendered"], 59);
    assert_eq!(run["fps_display"], 29.49);
    assert_eq!(run["cpu_pct_1core"], 37.3);
    assert_eq!(run["mem_rss_mb"], 84.3);
    assert_eq!(run["run_id"], 1);

    for key in ["timestamp", "fps_mean", "fps_stddev", "fps_p99"] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert!(value["timestamp"].as_str().unwrap().starts_with("2026-10-18T09:30:00"));

    // Raw values are kept in memory
    assert_eq!(summary.runs[0].fps_display, 29.493_366);
}

#[test]
fn test_summary_statistics_use_reported_fps() {
    let timestamp = chrono::Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap();
    let config = ConfigSnapshot::new(&create_test_config(2).preview, &create_test_config(2).benchmark);
    let summary = BenchmarkSummary::new(
        timestamp,
        config,
        vec![metrics(1, 10.004), metrics(2, 10.006)],
    );

    // Reported per-run values are 10.0 and 10.01
    assert!((summary.fps_stddev - 0.01 / 2f64.sqrt()).abs() < 1e-9);
    assert_eq!(summary.fps_p95, 10.01);
    assert_eq!(summary.fps_p99, 10.01);

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["runs"][0]["fps_display"], 10.0);
    assert_eq!(value["runs"][1]["fps_display"], 10.01);
    assert_eq!(value["fps_stddev"], 0.01);
}

#[test]
fn test_default_output_path_and_write() {
    let now = chrono::Utc.with_ymd_and_hms(2026, 10, 18, 9, 5, 0).unwrap();
    assert_eq!(
        default_output_path(now).to_str().unwrap(),
        "benchmark-20261018T0905.json"
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results").join("bench.json");
    let summary = BenchmarkSummary::new(
        now,
        ConfigSnapshot::new(&PreviewConfig::default(), &BenchmarkConfig::default()),
        vec![metrics(1, 29.0)],
    );
    write_summary(&summary, &path).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["runs"].as_array().unwrap().len(), 1);
    assert_eq!(written["config"]["runs"], 5);
}

#[tokio::test(start_paused = true)]
async fn test_run_once_measures_window() {
    let log = CallLog::new();
    let sampler = ScriptedSampler::new(
        [cpu(1.0, 0.5), cpu(2.5, 1.0)],
        [80 * 1024 * 1024, 96 * 1024 * 1024],
    );
    let shutdown = ShutdownFlag::new();
    let mut bench = orchestrator(1, &log, sampler, &shutdown);

    let run = bench.run_once(1).await.unwrap();

    assert_eq!(run.run_id, 1);
    assert!((run.elapsed_seconds - 2.0).abs() < 0.01, "{:?}", run);
    assert!((19..=21).contains(&run.frames_rendered), "{:?}", run);
    assert!((run.fps_display - run.frames_rendered as f64 / run.elapsed_seconds).abs() < 1e-9);
    assert!((run.cpu_percent_one_core - 100.0).abs() < 1.0);
    assert_eq!(run.mem_rss_megabytes, 96.0);

    // Renders happen in warm-up too but are not counted
    assert!(log.count("surface.render") as u64 > run.frames_rendered);

    // Capture released before the surface is closed
    let close = log.position("camera.close").unwrap();
    assert!(log.position("camera.stop").unwrap() < close);
    assert!(close < log.position("surface.close").unwrap());
    assert_eq!(bench.lifecycle_state(), LifecycleState::Running);
}

#[tokio::test(start_paused = true)]
async fn test_run_all_aggregates_runs() {
    let log = CallLog::new();
    let sampler = ScriptedSampler::new([cpu(0.0, 0.0)], [64 * 1024 * 1024]);
    let shutdown = ShutdownFlag::new();
    let mut bench = orchestrator(3, &log, sampler, &shutdown);

    let mut seen = Vec::new();
    let summary = bench
        .run_all_with(|progress| match progress {
            RunProgress::Started { run_id, total } => {
                log.record(format!("run.start {}/{}", run_id, total));
                seen.push(format!("start {}", run_id));
            }
            RunProgress::Finished(run) => seen.push(format!("done {}", run.run_id)),
        })
        .await
        .unwrap();

    assert_eq!(
        seen,
        vec!["start 1", "done 1", "start 2", "done 2", "start 3", "done 3"]
    );
    // Progress is announced before the run acquires its camera
    assert!(log.position("run.start 1/3").unwrap() < log.position("camera.open").unwrap());
    assert_eq!(summary.runs.len(), 3);
    assert_eq!(summary.config, bench.config_snapshot());
    assert_eq!(summary.config.runs, 3);
    assert!(summary.fps_mean > 8.0 && summary.fps_mean < 12.0, "{}", summary.fps_mean);
    assert!(summary.runs.iter().all(|run| run.cpu_percent_one_core == 0.0));

    // Each run opens and releases its own camera
    assert_eq!(log.count("camera.open"), 3);
    assert_eq!(log.count("camera.close"), 3);
    assert_eq!(log.count("gl.surface.create"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_measurement_discards_run() {
    let log = CallLog::new();
    let shutdown = ShutdownFlag::new();
    let mut bench = orchestrator(3, &log, ScriptedSampler::new([cpu(0.0, 0.0)], [1]), &shutdown);

    // Warm-up ends at 1 s, measurement would end at 3 s
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_800)).await;
        trigger.request();
    });

    let err = bench.run_all().await.unwrap_err();
    assert!(matches!(err, ViewerError::Interrupted { completed_runs: 0 }));
    assert_eq!(err.exit_code(), 130);
    assert_eq!(bench.lifecycle_state(), LifecycleState::Stopped);

    assert_eq!(log.count("camera.open"), 1);
    assert_eq!(log.count("camera.stop"), 1);
    assert_eq!(log.count("camera.close"), 1);
    assert!(!log.contains("camera.next_frame_after_close"));
}

#[tokio::test(start_paused = true)]
async fn test_completed_runs_reported_on_interrupt() {
    let log = CallLog::new();
    let shutdown = ShutdownFlag::new();
    let mut bench = orchestrator(3, &log, ScriptedSampler::new([cpu(0.0, 0.0)], [1]), &shutdown);

    // First run spans 0-3 s; interrupt during the second run's warm-up
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3_300)).await;
        trigger.request();
    });

    let err = bench.run_all().await.unwrap_err();
    assert!(matches!(err, ViewerError::Interrupted { completed_runs: 1 }));
    assert_eq!(log.count("camera.open"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_sampling_failure_is_fatal_before_acquiring_camera() {
    let log = CallLog::new();
    let shutdown = ShutdownFlag::new();
    let mut bench = orchestrator(2, &log, ScriptedSampler::failing(), &shutdown);

    let err = bench.run_all().await.unwrap_err();
    assert!(matches!(err, ViewerError::ResourceSampling { .. }));
    assert!(!log.contains("camera.open"));
}

#[tokio::test(start_paused = true)]
async fn test_sampling_failure_mid_run_releases_camera() {
    let log = CallLog::new();
    let shutdown = ShutdownFlag::new();
    let mut bench = orchestrator(1, &log, ScriptedSampler::failing(), &shutdown);

    let err = bench.run_once(1).await.unwrap_err();
    assert!(matches!(err, ViewerError::ResourceSampling { .. }));
    assert_eq!(log.count("camera.close"), 1);
    assert!(log.contains("surface.close"));
}

#[tokio::test(start_paused = true)]
async fn test_software_fallback_is_benchmarked() {
    let log = CallLog::new();
    let shutdown = ShutdownFlag::new();
    let mut bench = BenchmarkOrchestrator::new(
        &create_test_config(1),
        MockCaptureStack::new(CaptureBackend::Libcamera, log.clone()),
        MockGraphicsStack::new(log.clone()).failing_probe_at(ProbeStep::Surface),
        ScriptedSampler::new([cpu(0.0, 0.0)], [1]),
        shutdown,
    )
    .unwrap();

    let summary = bench.run_all().await.unwrap();
    assert_eq!(summary.runs.len(), 1);
    assert!(log.contains("surface.software.create"));
}

#[test]
fn test_invalid_benchmark_config_rejected() {
    let mut config = create_test_config(1);
    config.benchmark.duration_seconds = 0;

    let result = BenchmarkOrchestrator::new(
        &config,
        MockCaptureStack::new(CaptureBackend::Libcamera, CallLog::new()),
        MockGraphicsStack::new(CallLog::new()),
        ScriptedSampler::default(),
        ShutdownFlag::new(),
    );
    assert!(matches!(result, Err(ViewerError::InvalidConfig { .. })));
}
