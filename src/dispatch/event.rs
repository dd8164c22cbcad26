//! Event types carried to the worker.

use super::WorkerError;
use std::sync::mpsc;

/// What caused a capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Falling edge on the button line.
    Gpio,
    /// Explicit request from the controller.
    Manual,
}

/// Work for the background worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The button was pressed; take a picture.
    ButtonEdge(Trigger),
    /// The camera has a frame ready in the reader.
    FrameReady,
}

#[derive(Debug)]
pub(crate) enum Message {
    Event(Event),
    Quit,
}

/// Cloneable handle for posting events to a worker.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Message>,
}

impl EventSender {
    /// Posts an event. Fails once the worker has exited.
    pub fn send(&self, event: Event) -> Result<(), WorkerError> {
        self.tx
            .send(Message::Event(event))
            .map_err(|_| WorkerError::Disconnected)
    }

    pub(crate) fn quit(&self) -> Result<(), WorkerError> {
        self.tx
            .send(Message::Quit)
            .map_err(|_| WorkerError::Disconnected)
    }
}

pub(crate) fn event_channel() -> (EventSender, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel();
    (EventSender { tx }, rx)
}
