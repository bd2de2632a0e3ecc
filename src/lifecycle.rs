use crate::capture::Camera;
use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, info, warn};

/// Process-wide shutdown request.
///
/// Signal handlers only ever set this flag. Teardown is performed later from
/// the event loop, which observes it by polling.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown; returns true only for the first request
    pub fn request(&self) -> bool {
        !self.requested.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Route SIGINT and SIGTERM into `flag`
pub fn install_signal_handlers(flag: &ShutdownFlag) -> Result<()> {
    // Handle SIGTERM (systemd stop) - Unix only
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        let flag = flag.clone();
        tokio::spawn(async move {
            if sigterm.recv().await.is_some() {
                info!("Received SIGTERM signal");
                flag.request();
            }
        });
    }

    let flag = flag.clone();
    tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            info!("Received SIGINT signal (Ctrl+C)");
            flag.request();
        }
    });

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Stopping,
    Stopped,
}

/// Turns a shutdown request into an ordered, one-time teardown
#[derive(Debug)]
pub struct LifecycleController {
    flag: ShutdownFlag,
    state: LifecycleState,
    poll_interval: Duration,
}

impl LifecycleController {
    pub fn new(flag: ShutdownFlag, poll_interval: Duration) -> Self {
        Self {
            flag,
            state: LifecycleState::Running,
            poll_interval,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Periodic check from the event loop. Returns true if teardown ran.
    pub fn poll(&mut self, camera: &mut dyn Camera, request_exit: impl FnOnce()) -> bool {
        if self.state == LifecycleState::Running && self.flag.is_requested() {
            self.teardown(camera, request_exit)
        } else {
            false
        }
    }

    /// Stop capture, release the camera, then ask the loop to exit.
    ///
    /// Errors from the camera are logged and do not abort the remaining
    /// steps. Only the first call has any effect.
    pub fn teardown(&mut self, camera: &mut dyn Camera, request_exit: impl FnOnce()) -> bool {
        if self.state != LifecycleState::Running {
            debug!("Teardown already performed");
            return false;
        }
        self.state = LifecycleState::Stopping;

        info!("Stopping camera preview");
        if let Err(e) = camera.stop() {
            warn!("Error stopping camera: {}", e);
        }
        if let Err(e) = camera.close() {
            warn!("Error closing camera: {}", e);
        }

        request_exit();
        true
    }

    /// Record that the event loop has exited
    pub fn mark_stopped(&mut self) {
        if self.state == LifecycleState::Stopping {
            self.state = LifecycleState::Stopped;
        }
    }

    /// Block until shutdown is requested, re-checking every `interval`,
    /// then tear down. Used where the capture stack renders its own preview.
    pub async fn wait_for_shutdown(&mut self, camera: &mut dyn Camera, interval: Duration) {
        while !self.flag.is_requested() {
            tokio::time::sleep(interval).await;
        }

        self.teardown(camera, || {});
        self.mark_stopped();
    }
}
