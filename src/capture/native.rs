//! V4L2/native camera backend built on `nokhwa`.

use super::{Camera, CameraError, CaptureConfig, Frame, FrameSink};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

/// Camera backed by a `nokhwa` stream running on its own capture thread.
///
/// The stream is opened by the capture thread and never leaves it. Each
/// `take_picture` posts a request; the thread grabs the next MJPEG frame
/// and hands it to the sink as a single-plane frame.
pub struct NokhwaCamera {
    config: CaptureConfig,
    requests: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl NokhwaCamera {
    /// Creates an unopened camera for the configured device.
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            requests: None,
            thread: None,
        }
    }
}

impl Camera for NokhwaCamera {
    fn initialize(&mut self, sink: FrameSink) -> Result<(), CameraError> {
        self.config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;

        let config = self.config.clone();
        let (request_tx, request_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), CameraError>>(1);

        let thread = thread::Builder::new()
            .name("camera-capture".into())
            .spawn(move || capture_loop(config, sink, request_rx, ready_tx))
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| CameraError::OpenFailed("capture thread exited".into()))??;

        self.requests = Some(request_tx);
        self.thread = Some(thread);
        Ok(())
    }

    fn take_picture(&mut self) -> Result<(), CameraError> {
        let requests = self.requests.as_ref().ok_or(CameraError::NotInitialized)?;
        requests
            .send(())
            .map_err(|_| CameraError::CaptureFailed("capture thread stopped".into()))
    }

    fn shutdown(&mut self) {
        // Dropping the sender ends the capture loop once queued requests
        // are served.
        self.requests = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Camera capture thread panicked");
            }
        }
        tracing::info!("Camera closed");
    }
}

fn capture_loop(
    config: CaptureConfig,
    sink: FrameSink,
    requests: mpsc::Receiver<()>,
    ready: mpsc::SyncSender<Result<(), CameraError>>,
) {
    let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
        CameraFormat::new_from(config.width, config.height, FrameFormat::MJPEG, config.fps),
    ));
    let mut camera = match nokhwa::Camera::new(CameraIndex::Index(config.device_id), format) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready.send(Err(CameraError::DeviceNotFound(e.to_string())));
            return;
        }
    };
    if let Err(e) = camera.open_stream() {
        let _ = ready.send(Err(CameraError::OpenFailed(e.to_string())));
        return;
    }
    tracing::info!(
        device = config.device_id,
        format = ?camera.camera_format(),
        "Camera stream opened"
    );
    let _ = ready.send(Ok(()));

    let mut sequence = 0u64;
    for () in requests {
        match camera.frame() {
            Ok(buffer) => {
                sequence += 1;
                let resolution = buffer.resolution();
                let frame = Frame::single_plane(
                    buffer.buffer().to_vec(),
                    resolution.width(),
                    resolution.height(),
                    sequence,
                );
                if sink.deliver(frame).is_err() {
                    tracing::warn!("Worker gone, stopping capture thread");
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Frame capture failed");
            }
        }
    }

    if let Err(e) = camera.stop_stream() {
        tracing::warn!(error = %e, "Failed to stop camera stream");
    }
}
