//! The single background thread events are handled on.

use super::{event_channel, Dispatcher, EventSender, Message};
use crate::error::Disposition;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

/// Errors from starting, stopping or posting to a worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// `start` was called on a worker that already has a thread.
    #[error("worker has already been started")]
    AlreadyStarted,
    /// `join` was called before `start`.
    #[error("worker has not been started")]
    NotStarted,
    /// `join` was called twice.
    #[error("worker has already been joined")]
    AlreadyJoined,
    /// A handler panicked and took the thread down.
    #[error("worker thread panicked")]
    Panicked,
    /// The thread has exited and no longer accepts events.
    #[error("worker event channel disconnected")]
    Disconnected,
    /// The thread could not be spawned.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A named thread with an attached event queue.
///
/// The queue exists as soon as the worker is created, so senders can be
/// handed out before the thread is started. Events posted before `start`
/// are handled once it runs.
pub struct Worker {
    name: String,
    sender: EventSender,
    receiver: Option<mpsc::Receiver<Message>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Creates a worker whose thread is not yet running.
    pub fn new(name: impl Into<String>) -> Self {
        let (sender, receiver) = event_channel();
        Self {
            name: name.into(),
            sender,
            receiver: Some(receiver),
            handle: None,
        }
    }

    /// Handle for posting events to this worker.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Spawns the thread and hands it the dispatcher.
    pub fn start(&mut self, mut dispatcher: Dispatcher) -> Result<(), WorkerError> {
        let receiver = self.receiver.take().ok_or(WorkerError::AlreadyStarted)?;
        let name = self.name.clone();
        let handle = thread::Builder::new().name(self.name.clone()).spawn(move || {
            tracing::debug!(worker = %name, "Worker started");
            for message in receiver {
                match message {
                    Message::Quit => break,
                    Message::Event(event) => {
                        if dispatcher.dispatch(event) == Disposition::Halt {
                            tracing::warn!(worker = %name, "Worker halted by error policy");
                            break;
                        }
                    }
                }
            }
            dispatcher.shutdown();
            tracing::debug!(worker = %name, "Worker exited");
        })?;
        self.handle = Some(handle);
        Ok(())
    }

    /// Asks the thread to exit after the events already queued.
    ///
    /// Returns immediately. Anything posted after this call is dropped.
    pub fn quit_safely(&self) {
        if self.sender.quit().is_err() {
            tracing::debug!(worker = %self.name, "Worker already gone");
        }
    }

    /// Whether the thread was started and has not yet finished.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Waits for the thread to exit.
    pub fn join(&mut self) -> Result<(), WorkerError> {
        if self.receiver.is_some() {
            return Err(WorkerError::NotStarted);
        }
        let handle = self.handle.take().ok_or(WorkerError::AlreadyJoined)?;
        handle.join().map_err(|_| WorkerError::Panicked)
    }
}
