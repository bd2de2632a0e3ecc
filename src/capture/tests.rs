use super::*;
use crate::config::PreviewConfig;
use crate::error::{CaptureError, ViewerError};
use crate::transform::Rotation;

fn preview(width: u32, height: u32, framerate: u32) -> PreviewConfig {
    PreviewConfig {
        width,
        height,
        framerate,
        ..PreviewConfig::default()
    }
}

#[test]
fn test_capture_settings_from_preview() {
    let settings = CaptureSettings::from_preview(&preview(1280, 720, 25));
    assert_eq!(settings.size, (1280, 720));
    assert_eq!(settings.buffer_count, 2);
    assert_eq!(settings.frame_duration_limits, (40_000, 40_000));
}

#[test]
fn test_backend_selection_prefers_libcamera() {
    assert_eq!(select_backend(true, true).unwrap(), CaptureBackend::Libcamera);
    assert_eq!(select_backend(true, false).unwrap(), CaptureBackend::Libcamera);
    assert_eq!(select_backend(false, true).unwrap(), CaptureBackend::Legacy);
}

#[test]
fn test_no_backend_is_fatal_with_exit_code_2() {
    let err = select_backend(false, false).unwrap_err();
    assert!(matches!(err, ViewerError::CaptureStackUnavailable { .. }));
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_mock_camera_lifecycle() {
    let log = CallLog::new();
    let stack = MockCaptureStack::new(CaptureBackend::Libcamera, log.clone());
    let mut camera = stack.open().unwrap();

    // Not started yet: nothing to render
    assert!(camera.next_frame().unwrap().is_none());

    camera
        .configure(&CaptureSettings::from_preview(&preview(64, 48, 30)))
        .unwrap();
    camera.set_transform(Rotation::Rotate90.transform()).unwrap();
    camera.start().unwrap();
    assert!(camera.is_capturing());

    let frame = camera.next_frame().unwrap().unwrap();
    assert_eq!(frame.sequence, 1);
    assert_eq!((frame.width, frame.height), (48, 64));
    assert!(frame.validate_size());

    camera.stop().unwrap();
    camera.close().unwrap();
    assert!(!camera.is_capturing());
    assert_eq!(camera.next_frame().unwrap_err(), CaptureError::Closed);

    assert_eq!(
        log.entries()[..5],
        [
            "camera.open",
            "camera.configure 64x48",
            "camera.set_transform hflip=true vflip=false transpose=true",
            "camera.start",
            "camera.stop",
        ]
    );
    assert!(log.contains("camera.next_frame_after_close"));
}

#[test]
fn test_mock_camera_rejects_start_before_configure() {
    let stack = MockCaptureStack::new(CaptureBackend::Libcamera, CallLog::new());
    let mut camera = stack.open().unwrap();
    assert!(matches!(
        camera.start(),
        Err(CaptureError::Configuration { .. })
    ));
}

#[test]
fn test_overlay_preview_only_on_legacy() {
    let log = CallLog::new();

    let mut libcamera = MockCaptureStack::new(CaptureBackend::Libcamera, log.clone())
        .open()
        .unwrap();
    assert!(matches!(
        libcamera.start_overlay_preview(true),
        Err(CaptureError::Unsupported { .. })
    ));

    let mut legacy = MockCaptureStack::new(CaptureBackend::Legacy, log.clone())
        .open()
        .unwrap();
    assert!(matches!(
        legacy.start_overlay_preview(false),
        Err(CaptureError::Configuration { .. })
    ));

    legacy
        .configure(&CaptureSettings::from_preview(&preview(640, 480, 30)))
        .unwrap();
    legacy.start_overlay_preview(false).unwrap();
    assert!(legacy.is_capturing());
    assert!(log.contains("camera.start_preview window=0,0,640x480"));
}

#[test]
fn test_overlay_window_placement() {
    let fullscreen = OverlayWindow::new(true, (1920, 1080));
    assert!(fullscreen.is_fullscreen());
    assert_eq!(fullscreen.to_string(), "fullscreen");

    let window = OverlayWindow::new(false, (1280, 720));
    assert!(!window.is_fullscreen());
    assert_eq!(
        window,
        OverlayWindow::Window {
            x: 0,
            y: 0,
            width: 1280,
            height: 720
        }
    );
}

#[test]
fn test_failing_open() {
    let stack = MockCaptureStack::new(CaptureBackend::Libcamera, CallLog::new()).with_failing_open();
    assert!(matches!(stack.open(), Err(CaptureError::DeviceOpen { .. })));
}

#[test]
fn test_boxed_stack_delegates() {
    let stack: Box<dyn CaptureStack> =
        Box::new(MockCaptureStack::new(CaptureBackend::Legacy, CallLog::new()));
    assert_eq!(stack.backend(), CaptureBackend::Legacy);
    assert!(stack.open().is_ok());
}

#[test]
fn test_bounded_call_log_keeps_latest() {
    let log = CallLog::bounded(2);
    log.record("a");
    log.record("b");
    log.record("c");
    assert_eq!(log.entries(), vec!["b".to_string(), "c".to_string()]);
    assert_eq!(log.count("a"), 0);
}
