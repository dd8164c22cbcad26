//! Image-ready handling, checked through the log output it produces.

use gpio_camera::capture::{
    CaptureConfig, CaptureCounter, Frame, FrameReader, FrameSink, MockCamera,
};
use gpio_camera::dispatch::{Dispatcher, Event, Worker};
use gpio_camera::error::Disposition;
use gpio_camera::upload::LogUploader;
use gpio_camera::Camera;
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with logs captured and returns what was written.
fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    buffer.contents()
}

fn dispatcher(reader: &FrameReader) -> Dispatcher {
    Dispatcher::new(
        Box::new(MockCamera::new(CaptureConfig::default())),
        reader.clone(),
        Box::new(LogUploader),
    )
}

#[test]
fn frame_with_bytes_logs_image_get_once_per_event() {
    let reader = FrameReader::default();
    let mut dispatcher = dispatcher(&reader);

    let logs = capture_logs(|| {
        for sequence in 1..=3 {
            reader.push(Frame::single_plane(vec![0xAB; 64], 8, 8, sequence));
            assert_eq!(dispatcher.dispatch(Event::FrameReady), Disposition::Log);
        }
    });

    assert_eq!(logs.matches("image get").count(), 3);
    assert_eq!(logs.matches("Image not get").count(), 0);
    assert!(logs.contains("bytes=64"));
}

#[test]
fn missing_frame_logs_not_get_once() {
    let reader = FrameReader::default();
    let mut dispatcher = dispatcher(&reader);

    let logs = capture_logs(|| {
        assert_eq!(dispatcher.dispatch(Event::FrameReady), Disposition::Log);
    });

    assert_eq!(logs.matches("Image not get").count(), 1);
    assert_eq!(logs.matches("image get").count(), 0);
}

#[test]
fn frame_without_planes_logs_not_get() {
    let reader = FrameReader::default();
    let worker = Worker::new("unused");
    let mut camera = MockCamera::new(CaptureConfig::with_dimensions(4, 4)).with_empty_frames();
    camera
        .initialize(FrameSink::new(reader.clone(), CaptureCounter::new(), worker.sender()))
        .unwrap();
    camera.take_picture().unwrap();
    let mut dispatcher = dispatcher(&reader);

    let logs = capture_logs(|| {
        dispatcher.dispatch(Event::FrameReady);
    });

    assert_eq!(logs.matches("Image not get").count(), 1);
    assert_eq!(dispatcher.stats().uploads_missing(), 1);
}
