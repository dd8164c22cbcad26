//! Lifecycle controller wiring the button to the camera.

use super::PermissionChecker;
use crate::capture::{Camera, CaptureCounter, FrameReader, FrameSink};
use crate::dispatch::{
    DispatchStats, Dispatcher, Event, EventSender, Trigger, Worker, WorkerError,
};
use crate::error::{AppError, ErrorPolicy};
use crate::gpio::{Board, Direction, EdgeEvent, EdgeTrigger, GpioError, GpioLine, PeripheralManager};
use crate::upload::{LogUploader, Uploader};
use std::sync::Arc;
use thiserror::Error;

/// Name of the background thread camera and button events run on.
pub const WORKER_NAME: &str = "camera-background";

/// Errors from lifecycle calls made in the wrong state.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `on_create` was called while the worker is running.
    #[error("controller already started")]
    AlreadyStarted,
    /// The call needs a running worker.
    #[error("controller not started")]
    NotStarted,
    /// A permission result arrived without a pending request.
    #[error("no permission request is pending")]
    NoPendingRequest,
    /// The camera moved into an earlier worker and cannot be reused.
    #[error("camera was handed to a previous run")]
    CameraConsumed,
    /// Starting or posting to the worker failed.
    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// Result of a start attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// The worker is running and the button line was set up (or its failure
    /// was reported).
    Started,
    /// Camera access was missing; it has been requested and nothing was
    /// opened.
    PermissionRequested,
    /// A pending permission request was answered with a denial.
    PermissionDenied,
}

/// Owns the button line and the worker, and drives them through
/// `on_create` / `on_destroy`.
pub struct Controller {
    permissions: Box<dyn PermissionChecker>,
    peripherals: Box<dyn PeripheralManager>,
    camera: Option<Box<dyn Camera>>,
    uploader: Option<Box<dyn Uploader>>,
    button_pin: Option<String>,
    policy: ErrorPolicy,
    stats: Arc<DispatchStats>,
    counter: CaptureCounter,
    max_frames: usize,
    worker: Option<Worker>,
    button: Option<Box<dyn GpioLine>>,
    awaiting_permission: bool,
}

impl Controller {
    /// Creates a controller. Nothing is opened until `on_create`.
    pub fn new(
        permissions: Box<dyn PermissionChecker>,
        peripherals: Box<dyn PeripheralManager>,
        camera: Box<dyn Camera>,
    ) -> Self {
        Self {
            permissions,
            peripherals,
            camera: Some(camera),
            uploader: Some(Box::new(LogUploader)),
            button_pin: None,
            policy: ErrorPolicy::default(),
            stats: Arc::new(DispatchStats::new()),
            counter: CaptureCounter::new(),
            max_frames: crate::capture::CaptureConfig::default().max_frames,
            worker: None,
            button: None,
            awaiting_permission: false,
        }
    }

    /// Uses `uploader` instead of the logging stub.
    pub fn with_uploader(mut self, uploader: Box<dyn Uploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Overrides the board's button GPIO.
    pub fn with_button_pin(mut self, pin: impl Into<String>) -> Self {
        self.button_pin = Some(pin.into());
        self
    }

    /// Replaces the error policy.
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets how many delivered frames the reader keeps.
    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Counters updated by the worker.
    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// Running count of captures delivered by the camera.
    pub fn capture_counter(&self) -> CaptureCounter {
        self.counter.clone()
    }

    /// Whether a worker thread was started.
    pub fn worker_started(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether the worker thread is alive.
    pub fn worker_running(&self) -> bool {
        self.worker.as_ref().is_some_and(Worker::is_running)
    }

    /// Whether the button line is currently open.
    pub fn button_open(&self) -> bool {
        self.button.is_some()
    }

    /// Starts the service if camera access is granted, otherwise requests
    /// it and opens nothing.
    pub fn on_create(&mut self) -> Result<Startup, LifecycleError> {
        if self.worker.is_some() {
            return Err(LifecycleError::AlreadyStarted);
        }
        tracing::info!("Starting capture controller");

        if !self.permissions.check_camera() {
            tracing::error!("No camera permission");
            self.permissions.request_camera();
            self.awaiting_permission = true;
            return Ok(Startup::PermissionRequested);
        }
        tracing::info!("Camera permission granted");

        self.start_hardware()?;
        Ok(Startup::Started)
    }

    /// Completes a start that stopped at a permission request.
    pub fn on_request_permissions_result(
        &mut self,
        granted: bool,
    ) -> Result<Startup, LifecycleError> {
        if !std::mem::take(&mut self.awaiting_permission) {
            return Err(LifecycleError::NoPendingRequest);
        }
        if !granted {
            tracing::warn!("Camera permission denied");
            return Ok(Startup::PermissionDenied);
        }
        tracing::info!("Camera permission granted late, starting");
        self.start_hardware()?;
        Ok(Startup::Started)
    }

    /// Requests a capture as if the button had been pressed.
    pub fn request_capture(&self) -> Result<(), LifecycleError> {
        let worker = self.worker.as_ref().ok_or(LifecycleError::NotStarted)?;
        worker.sender().send(Event::ButtonEdge(Trigger::Manual))?;
        Ok(())
    }

    /// Quiesces the worker and releases the button line.
    ///
    /// Does not wait for the worker; see [`Controller::join_worker`].
    pub fn on_destroy(&mut self) {
        if let Some(worker) = &self.worker {
            worker.quit_safely();
        }

        if let Some(button) = self.button.take() {
            tracing::info!(pin = button.name(), "Closing button GPIO pin");
            if let Err(e) = button.close() {
                self.report(e.into());
            }
        }
    }

    /// Waits for the worker to finish its queued events and exit.
    pub fn join_worker(&mut self) -> Result<(), LifecycleError> {
        let mut worker = self.worker.take().ok_or(LifecycleError::NotStarted)?;
        worker.join()?;
        Ok(())
    }

    fn start_hardware(&mut self) -> Result<(), LifecycleError> {
        let mut camera = self.camera.take().ok_or(LifecycleError::CameraConsumed)?;
        let uploader = self
            .uploader
            .take()
            .unwrap_or_else(|| Box::new(LogUploader) as Box<dyn Uploader>);

        let mut worker = Worker::new(WORKER_NAME);
        let reader = FrameReader::new(self.max_frames);
        let sink = FrameSink::new(reader.clone(), self.counter.clone(), worker.sender());
        if let Err(e) = camera.initialize(sink) {
            self.report(e.into());
        }

        let dispatcher = Dispatcher::new(camera, reader, uploader)
            .with_policy(self.policy)
            .with_stats(Arc::clone(&self.stats));
        worker.start(dispatcher)?;
        let events = worker.sender();
        self.worker = Some(worker);

        match self.open_button(events) {
            Ok(line) => self.button = Some(line),
            Err(e) => self.report(e.into()),
        }
        Ok(())
    }

    fn open_button(&mut self, events: EventSender) -> Result<Box<dyn GpioLine>, GpioError> {
        let pin = match &self.button_pin {
            Some(pin) => pin.clone(),
            None => Board::detect().button_gpio()?.to_string(),
        };

        let mut line = self.peripherals.open_gpio(&pin)?;
        line.set_direction(Direction::In)?;
        line.set_edge_trigger(EdgeTrigger::Falling)?;
        line.register_edge_callback(Box::new(move |edge: &EdgeEvent| {
            tracing::trace!(pin = %edge.pin, at = %edge.at, "Edge observed");
            // Keep listening for as long as the worker accepts events.
            events.send(Event::ButtonEdge(Trigger::Gpio)).is_ok()
        }))?;
        tracing::info!(pin = %pin, "Button GPIO configured");
        Ok(line)
    }

    fn report(&self, error: AppError) {
        self.stats.record_error();
        self.policy.handle(&error);
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        // The camera's sink keeps the worker's queue alive, so the worker
        // only exits on an explicit quit.
        self.on_destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureConfig, MockCamera};
    use crate::gpio::MockPeripheralManager;
    use crate::lifecycle::StaticPermission;

    fn controller(permission: StaticPermission) -> (Controller, crate::gpio::MockGpioHandle) {
        let peripherals = MockPeripheralManager::new();
        let gpio = peripherals.handle();
        let controller = Controller::new(
            Box::new(permission),
            Box::new(peripherals),
            Box::new(MockCamera::new(CaptureConfig::with_dimensions(4, 4))),
        )
        .with_button_pin("BCM21");
        (controller, gpio)
    }

    #[test]
    fn test_create_twice_rejected() {
        let (mut controller, gpio) = controller(StaticPermission::granted());
        assert_eq!(controller.on_create().unwrap(), Startup::Started);
        assert!(matches!(
            controller.on_create(),
            Err(LifecycleError::AlreadyStarted)
        ));
        assert_eq!(gpio.open_count(), 1);
        controller.on_destroy();
        controller.join_worker().unwrap();
    }

    #[test]
    fn test_destroy_without_create_is_noop() {
        let (mut controller, gpio) = controller(StaticPermission::granted());
        controller.on_destroy();
        assert_eq!(gpio.close_count(), 0);
        assert!(matches!(
            controller.join_worker(),
            Err(LifecycleError::NotStarted)
        ));
    }

    #[test]
    fn test_permission_result_without_request() {
        let (mut controller, _gpio) = controller(StaticPermission::granted());
        assert!(matches!(
            controller.on_request_permissions_result(true),
            Err(LifecycleError::NoPendingRequest)
        ));
    }

    #[test]
    fn test_request_capture_before_start() {
        let (controller, _gpio) = controller(StaticPermission::granted());
        assert!(matches!(
            controller.request_capture(),
            Err(LifecycleError::NotStarted)
        ));
    }

    #[test]
    fn test_open_failure_is_not_fatal() {
        let (mut controller, gpio) = controller(StaticPermission::granted());
        gpio.fail_open(true);

        assert_eq!(controller.on_create().unwrap(), Startup::Started);
        assert!(controller.worker_started());
        assert!(!controller.button_open());
        assert_eq!(controller.stats().errors(), 1);

        controller.on_destroy();
        controller.join_worker().unwrap();
    }
}
