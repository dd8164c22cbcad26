//! Frame type and the reader frames are delivered through.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One channel of a captured image.
#[derive(Clone)]
pub struct Plane {
    data: Vec<u8>,
    row_stride: usize,
    pixel_stride: usize,
}

impl Plane {
    /// Creates a plane from raw bytes and its layout.
    pub fn new(data: Vec<u8>, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }

    /// The plane's raw bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Distance in bytes between the starts of two rows.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Distance in bytes between two adjacent pixels in a row.
    #[inline]
    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }
}

/// A single captured frame from the camera.
///
/// Compressed formats such as JPEG carry the whole image in the first
/// plane.
#[derive(Clone)]
pub struct Frame {
    planes: Vec<Plane>,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
    sequence: u64,
}

impl Frame {
    /// Creates a frame from its planes.
    pub fn new(planes: Vec<Plane>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            planes,
            width,
            height,
            captured_at: Utc::now(),
            sequence,
        }
    }

    /// Creates a frame holding a single packed plane.
    pub fn single_plane(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        let row_stride = if height == 0 {
            0
        } else {
            data.len() / height as usize
        };
        Self::new(vec![Plane::new(data, row_stride, 1)], width, height, sequence)
    }

    /// All planes of the frame.
    #[inline]
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// The first plane, if the frame has any.
    #[inline]
    pub fn first_plane(&self) -> Option<&Plane> {
        self.planes.first()
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Capture timestamp.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Monotonic sequence number assigned by the camera.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("planes", &self.planes.len())
            .field(
                "bytes",
                &self.planes.iter().map(|p| p.data.len()).sum::<usize>(),
            )
            .finish()
    }
}

/// Default number of frames held before the oldest is dropped.
pub const DEFAULT_MAX_FRAMES: usize = 2;

/// Shared queue of delivered frames.
///
/// Cloning yields another handle to the same queue. The queue is bounded:
/// once full, delivering a new frame drops the oldest one.
#[derive(Clone)]
pub struct FrameReader {
    frames: Arc<Mutex<VecDeque<Frame>>>,
    max_frames: usize,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAMES)
    }
}

impl FrameReader {
    /// Creates a reader holding at most `max_frames` frames.
    pub fn new(max_frames: usize) -> Self {
        let max_frames = max_frames.max(1);
        Self {
            frames: Arc::new(Mutex::new(VecDeque::with_capacity(max_frames))),
            max_frames,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a frame, dropping the oldest if the reader is full.
    pub fn push(&self, frame: Frame) {
        let mut frames = self.lock();
        if frames.len() >= self.max_frames {
            if let Some(dropped) = frames.pop_front() {
                tracing::debug!(sequence = dropped.sequence(), "Dropping unread frame");
            }
        }
        frames.push_back(frame);
    }

    /// Takes the newest frame and discards any older ones.
    pub fn acquire_latest(&self) -> Option<Frame> {
        let mut frames = self.lock();
        let latest = frames.pop_back();
        frames.clear();
        latest
    }

    /// Number of frames waiting to be read.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }
}
