//! In-memory GPIO peripheral for tests and simulation.

use super::{
    Direction, EdgeCallback, EdgeEvent, EdgeTrigger, GpioError, GpioLine, PeripheralManager,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct MockLine {
    name: String,
    direction: Option<Direction>,
    edge: Option<EdgeTrigger>,
    callback: Option<EdgeCallback>,
    closes: usize,
}

#[derive(Default)]
struct MockState {
    lines: Vec<MockLine>,
    fail_open: bool,
    fail_close: bool,
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock peripheral manager that records every line it opens.
#[derive(Default)]
pub struct MockPeripheralManager {
    state: Shared,
}

impl MockPeripheralManager {
    /// Creates a manager with no lines open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle for inspecting and driving the opened lines.
    pub fn handle(&self) -> MockGpioHandle {
        MockGpioHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl PeripheralManager for MockPeripheralManager {
    fn open_gpio(&mut self, name: &str) -> Result<Box<dyn GpioLine>, GpioError> {
        let mut state = lock(&self.state);
        if state.fail_open {
            return Err(GpioError::Open {
                pin: name.to_string(),
                reason: "injected failure".into(),
            });
        }
        state.lines.push(MockLine {
            name: name.to_string(),
            ..Default::default()
        });
        tracing::debug!(pin = name, "Mock GPIO opened");
        Ok(Box::new(MockGpioLine {
            index: state.lines.len() - 1,
            name: name.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockGpioLine {
    index: usize,
    name: String,
    state: Shared,
}

impl MockGpioLine {
    fn with_line<R>(&self, f: impl FnOnce(&mut MockLine) -> R) -> R {
        let mut state = lock(&self.state);
        f(&mut state.lines[self.index])
    }
}

impl GpioLine for MockGpioLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), GpioError> {
        self.with_line(|line| line.direction = Some(direction));
        Ok(())
    }

    fn set_edge_trigger(&mut self, trigger: EdgeTrigger) -> Result<(), GpioError> {
        self.with_line(|line| {
            if line.direction != Some(Direction::In) {
                return Err(GpioError::NotInput(line.name.clone()));
            }
            line.edge = Some(trigger);
            Ok(())
        })
    }

    fn register_edge_callback(&mut self, callback: EdgeCallback) -> Result<(), GpioError> {
        self.with_line(|line| line.callback = Some(callback));
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), GpioError> {
        let mut state = lock(&self.state);
        let fail = state.fail_close;
        let line = &mut state.lines[self.index];
        line.closes += 1;
        line.callback = None;
        if fail {
            return Err(GpioError::Close("injected failure".into()));
        }
        Ok(())
    }
}

/// Test-side view of a [`MockPeripheralManager`].
#[derive(Clone)]
pub struct MockGpioHandle {
    state: Shared,
}

impl MockGpioHandle {
    /// Makes every subsequent `open_gpio` fail.
    pub fn fail_open(&self, fail: bool) {
        lock(&self.state).fail_open = fail;
    }

    /// Makes every subsequent `close` fail (the line still counts as closed).
    pub fn fail_close(&self, fail: bool) {
        lock(&self.state).fail_close = fail;
    }

    /// Number of lines opened so far.
    pub fn open_count(&self) -> usize {
        lock(&self.state).lines.len()
    }

    /// Names of the lines opened so far, in order.
    pub fn opened(&self) -> Vec<String> {
        lock(&self.state).lines.iter().map(|l| l.name.clone()).collect()
    }

    /// Direction of the most recently opened line.
    pub fn direction(&self) -> Option<Direction> {
        lock(&self.state).lines.last().and_then(|l| l.direction)
    }

    /// Edge trigger of the most recently opened line.
    pub fn edge_trigger(&self) -> Option<EdgeTrigger> {
        lock(&self.state).lines.last().and_then(|l| l.edge)
    }

    /// How many times the most recently opened line was closed.
    pub fn close_count(&self) -> usize {
        lock(&self.state).lines.last().map_or(0, |l| l.closes)
    }

    /// Whether the most recently opened line has a callback registered.
    pub fn has_callback(&self) -> bool {
        lock(&self.state)
            .lines
            .last()
            .is_some_and(|l| l.callback.is_some())
    }

    /// Simulates a falling edge on the most recently opened line.
    ///
    /// Returns `true` if a callback ran and asked to keep listening. A
    /// callback that returns `false` is unregistered.
    pub fn fire_edge(&self) -> bool {
        // The callback runs without the lock held so it may call back into
        // the mock.
        let (name, mut callback) = {
            let mut state = lock(&self.state);
            let Some(line) = state.lines.last_mut() else {
                return false;
            };
            if line.edge != Some(EdgeTrigger::Falling) && line.edge != Some(EdgeTrigger::Both) {
                return false;
            }
            let Some(callback) = line.callback.take() else {
                return false;
            };
            (line.name.clone(), callback)
        };

        let keep = callback(&EdgeEvent::now(name));

        if keep {
            let mut state = lock(&self.state);
            if let Some(line) = state.lines.last_mut() {
                if line.closes == 0 && line.callback.is_none() {
                    line.callback = Some(callback);
                }
            }
        }
        keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_open_configure_and_fire() {
        let mut manager = MockPeripheralManager::new();
        let handle = manager.handle();
        let hits = Arc::new(AtomicUsize::new(0));

        let mut line = manager.open_gpio("BCM21").unwrap();
        line.set_direction(Direction::In).unwrap();
        line.set_edge_trigger(EdgeTrigger::Falling).unwrap();
        let counter = Arc::clone(&hits);
        line.register_edge_callback(Box::new(move |_: &EdgeEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        }))
        .unwrap();

        assert!(handle.fire_edge());
        assert!(handle.fire_edge());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(handle.opened(), vec!["BCM21".to_string()]);
    }

    #[test]
    fn test_callback_returning_false_unregisters() {
        let mut manager = MockPeripheralManager::new();
        let handle = manager.handle();

        let mut line = manager.open_gpio("BCM21").unwrap();
        line.set_direction(Direction::In).unwrap();
        line.set_edge_trigger(EdgeTrigger::Falling).unwrap();
        line.register_edge_callback(Box::new(|_: &EdgeEvent| false)).unwrap();

        assert!(!handle.fire_edge());
        assert!(!handle.has_callback());
    }

    #[test]
    fn test_edge_trigger_requires_input() {
        let mut manager = MockPeripheralManager::new();
        let mut line = manager.open_gpio("BCM21").unwrap();
        assert!(matches!(
            line.set_edge_trigger(EdgeTrigger::Falling),
            Err(GpioError::NotInput(_))
        ));
    }

    #[test]
    fn test_close_failure_still_counts() {
        let mut manager = MockPeripheralManager::new();
        let handle = manager.handle();
        handle.fail_close(true);

        let line = manager.open_gpio("BCM21").unwrap();
        assert!(line.close().is_err());
        assert_eq!(handle.close_count(), 1);
    }
}
