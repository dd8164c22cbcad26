//! Delivery path from a camera back to the worker.

use super::{CameraError, Frame, FrameReader};
use crate::dispatch::{Event, EventSender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running count of delivered captures.
///
/// Stands in for an on-screen counter: the value is logged every time a
/// frame is delivered and can be read from any thread.
#[derive(Debug, Clone, Default)]
pub struct CaptureCounter(Arc<AtomicU64>);

impl CaptureCounter {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter and returns the new value.
    pub fn increment(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Capability handed to a camera so it can report completed captures.
#[derive(Clone)]
pub struct FrameSink {
    reader: FrameReader,
    counter: CaptureCounter,
    events: EventSender,
}

impl FrameSink {
    /// Creates a sink delivering into `reader` and notifying `events`.
    pub fn new(reader: FrameReader, counter: CaptureCounter, events: EventSender) -> Self {
        Self {
            reader,
            counter,
            events,
        }
    }

    /// Queues a frame and notifies the worker that an image is available.
    pub fn deliver(&self, frame: Frame) -> Result<(), CameraError> {
        let sequence = frame.sequence();
        self.reader.push(frame);
        let captures = self.counter.increment();
        tracing::debug!(sequence, captures, "Frame delivered");
        self.notify()
    }

    /// Notifies the worker without queuing a frame.
    ///
    /// The image-ready handler will find nothing to acquire and forward an
    /// empty result.
    pub fn notify(&self) -> Result<(), CameraError> {
        self.events
            .send(Event::FrameReady)
            .map_err(|_| CameraError::SinkClosed)
    }

    /// The capture counter this sink bumps.
    pub fn counter(&self) -> &CaptureCounter {
        &self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{event_channel, Message};

    #[test]
    fn test_deliver_queues_and_notifies() {
        let (events, rx) = event_channel();
        let reader = FrameReader::default();
        let sink = FrameSink::new(reader.clone(), CaptureCounter::new(), events);

        sink.deliver(Frame::single_plane(vec![1, 2, 3, 4], 2, 2, 1))
            .unwrap();

        assert_eq!(reader.pending(), 1);
        assert_eq!(sink.counter().get(), 1);
        assert!(matches!(rx.try_recv(), Ok(Message::Event(Event::FrameReady))));
    }

    #[test]
    fn test_deliver_after_worker_gone() {
        let (events, rx) = event_channel();
        drop(rx);
        let sink = FrameSink::new(FrameReader::default(), CaptureCounter::new(), events);
        assert!(matches!(
            sink.deliver(Frame::single_plane(vec![0], 1, 1, 1)),
            Err(CameraError::SinkClosed)
        ));
    }
}
