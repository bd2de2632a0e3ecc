use super::*;
use crate::capture::{CallLog, CaptureBackend, MockCaptureStack};
use crate::config::{PreviewConfig, ViewerConfig};
use crate::error::ViewerError;
use crate::event_loop::EventLoop;
use crate::lifecycle::{LifecycleController, LifecycleState, ShutdownFlag};
use crate::render::{MockGraphicsStack, ProbeStep, RenderPath};
use crate::transform::Rotation;
use std::time::Duration;

fn create_test_config(rotation: Rotation, fullscreen: bool) -> ViewerConfig {
    ViewerConfig {
        preview: PreviewConfig {
            width: 1920,
            height: 1080,
            framerate: 30,
            rotation,
            fullscreen,
            buffer_count: 2,
        },
        ..ViewerConfig::default()
    }
}

fn request_shutdown_after(flag: &ShutdownFlag, delay: Duration) {
    let flag = flag.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        flag.request();
    });
}

#[tokio::test(start_paused = true)]
async fn test_rotated_fullscreen_preview_tears_down_in_order() {
    let log = CallLog::new();
    let shutdown = ShutdownFlag::new();
    let mut orchestrator = ViewerOrchestrator::new(
        create_test_config(Rotation::Rotate90, true),
        MockCaptureStack::new(CaptureBackend::Libcamera, log.clone()),
        MockGraphicsStack::new(log.clone()),
        shutdown.clone(),
    )
    .unwrap();

    request_shutdown_after(&shutdown, Duration::from_secs(2));
    let exit_code = orchestrator.run().await.unwrap();

    assert_eq!(exit_code, 0);
    assert_eq!(orchestrator.lifecycle_state(), LifecycleState::Stopped);

    assert!(log.contains("camera.configure 1920x1080"));
    assert!(log.contains("camera.set_transform hflip=true vflip=false transpose=true"));
    assert!(log.contains("surface.accelerated.create"));
    assert!(log.contains("surface.show fullscreen=true"));
    assert!(!log.contains("surface.title PiCamViewer"));

    // Roughly 30 fps for two to two and a half seconds
    let rendered = log.count("surface.render");
    assert!((50..=80).contains(&rendered), "rendered {} frames", rendered);

    let stop = log.position("camera.stop").unwrap();
    let close = log.position("camera.close").unwrap();
    let surface_close = log.position("surface.close").unwrap();
    assert!(stop < close && close < surface_close);
    assert_eq!(log.count("camera.stop"), 1);
    assert_eq!(log.count("camera.close"), 1);

    // Nothing may touch the camera once it is released
    assert!(log.entries()[close..].iter().all(|e| e != "surface.render"));
    assert!(!log.contains("camera.next_frame_after_close"));
}

#[tokio::test(start_paused = true)]
async fn test_windowed_preview_sets_title() {
    let log = CallLog::new();
    let shutdown = ShutdownFlag::new();
    let mut orchestrator = ViewerOrchestrator::new(
        create_test_config(Rotation::Rotate0, false),
        MockCaptureStack::new(CaptureBackend::Libcamera, log.clone()),
        MockGraphicsStack::new(log.clone()).failing_probe_at(ProbeStep::MakeCurrent),
        shutdown.clone(),
    )
    .unwrap();

    request_shutdown_after(&shutdown, Duration::from_millis(600));
    orchestrator.run().await.unwrap();

    let title = log.position("surface.title PiCamViewer").unwrap();
    let show = log.position("surface.show fullscreen=false").unwrap();
    assert!(title < show);
    assert!(log.contains("surface.software.create"));
    assert!(log.contains("camera.set_transform hflip=false vflip=false transpose=false"));
}

#[tokio::test(start_paused = true)]
async fn test_legacy_stack_uses_overlay_preview() {
    let log = CallLog::new();
    let shutdown = ShutdownFlag::new();
    let mut orchestrator = ViewerOrchestrator::new(
        create_test_config(Rotation::Rotate180, true),
        MockCaptureStack::new(CaptureBackend::Legacy, log.clone()),
        MockGraphicsStack::new(log.clone()),
        shutdown.clone(),
    )
    .unwrap();
    assert_eq!(orchestrator.backend(), CaptureBackend::Legacy);

    request_shutdown_after(&shutdown, Duration::from_millis(250));
    orchestrator.run().await.unwrap();

    assert!(log.contains("camera.start_preview fullscreen"));
    assert!(!log.contains("gl.surface.create"));
    assert!(!log.contains("surface.render"));
    assert_eq!(orchestrator.lifecycle_state(), LifecycleState::Stopped);
    assert!(log.position("camera.stop").unwrap() < log.position("camera.close").unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_windowed_legacy_overlay_is_sized_to_capture() {
    let log = CallLog::new();
    let shutdown = ShutdownFlag::new();
    let mut orchestrator = ViewerOrchestrator::new(
        create_test_config(Rotation::Rotate0, false),
        MockCaptureStack::new(CaptureBackend::Legacy, log.clone()),
        MockGraphicsStack::new(log.clone()),
        shutdown.clone(),
    )
    .unwrap();

    request_shutdown_after(&shutdown, Duration::from_millis(150));
    orchestrator.run().await.unwrap();

    assert!(log.contains("camera.start_preview window=0,0,1920x1080"));
    assert!(!log.contains("camera.start_preview fullscreen"));
}

#[tokio::test]
async fn test_camera_open_failure_propagates() {
    let log = CallLog::new();
    let mut orchestrator = ViewerOrchestrator::new(
        ViewerConfig::default(),
        MockCaptureStack::new(CaptureBackend::Libcamera, log.clone()).with_failing_open(),
        MockGraphicsStack::new(log.clone()),
        ShutdownFlag::new(),
    )
    .unwrap();

    let err = orchestrator.run().await.unwrap_err();
    assert!(matches!(err, ViewerError::Capture(_)));
    assert!(!log.contains("gl.surface.create"));
}

#[tokio::test]
async fn test_renderer_failure_releases_camera() {
    let log = CallLog::new();
    let mut orchestrator = ViewerOrchestrator::new(
        ViewerConfig::default(),
        MockCaptureStack::new(CaptureBackend::Libcamera, log.clone()),
        MockGraphicsStack::new(log.clone())
            .with_failing_accelerated_surface()
            .with_failing_software_surface(),
        ShutdownFlag::new(),
    )
    .unwrap();

    let err = orchestrator.run().await.unwrap_err();
    assert!(matches!(err, ViewerError::Render(_)));
    assert!(log.contains("camera.close"));
    assert!(!log.contains("camera.start"));
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = ViewerConfig::default();
    config.preview.framerate = 0;

    let result = ViewerOrchestrator::new(
        config,
        MockCaptureStack::new(CaptureBackend::Libcamera, CallLog::new()),
        MockGraphicsStack::new(CallLog::new()),
        ShutdownFlag::new(),
    );
    assert!(matches!(result, Err(ViewerError::InvalidConfig { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_session_counts_renders_and_stops_after_teardown() {
    let log = CallLog::new();
    let preview = PreviewConfig {
        framerate: 10,
        ..PreviewConfig::default()
    };
    let (camera, surface) = start_preview(
        &MockCaptureStack::new(CaptureBackend::Libcamera, log.clone()),
        &MockGraphicsStack::new(log.clone()),
        &preview,
    )
    .unwrap();
    assert_eq!(surface.path(), RenderPath::Accelerated);

    let flag = ShutdownFlag::new();
    let mut lifecycle = LifecycleController::new(flag.clone(), Duration::from_millis(500));
    request_shutdown_after(&flag, Duration::from_millis(1_200));

    let mut event_loop = EventLoop::new();
    event_loop.context_mut().schedule_now(PreviewEvent::RenderFrame);
    event_loop
        .context_mut()
        .schedule_after(Duration::from_millis(500), PreviewEvent::ShutdownPoll);

    let mut session = PreviewSession::new(camera, surface, &mut lifecycle, preview.frame_interval());
    event_loop.run(&mut session).await;

    // Render ticks at 0..=1400 ms, shutdown observed at the 1500 ms poll
    let stats = session.stats().clone();
    assert!((14..=16).contains(&stats.frames_rendered), "{:?}", stats);
    assert_eq!(stats.render_errors, 0);

    session.render_tick();
    assert_eq!(session.stats().frames_rendered, stats.frames_rendered);

    drop(session);
    lifecycle.mark_stopped();
    assert_eq!(lifecycle.state(), LifecycleState::Stopped);
}

#[test]
fn test_preview_stats_success_rate() {
    let mut stats = PreviewStats::default();
    assert_eq!(stats.render_success_rate(), 0.0);

    stats.record_frame_render();
    stats.record_frame_render();
    stats.record_frame_render();
    stats.record_render_error();
    assert_eq!(stats.render_success_rate(), 0.75);
}
