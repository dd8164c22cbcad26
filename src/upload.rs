//! Upload of captured images.
//!
//! Only a logging stub exists: it reports whether bytes arrived and sends
//! nothing anywhere.

use thiserror::Error;

/// Errors an uploader can report.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The destination refused the image.
    #[error("upload rejected: {0}")]
    Rejected(String),
}

/// Result of handing an image to an uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Image bytes were present.
    Received {
        /// Number of bytes received.
        len: usize,
    },
    /// No image bytes were available.
    Missing,
}

/// Destination for captured image bytes.
pub trait Uploader: Send {
    /// Handles one captured image. `None` means the capture produced no
    /// readable bytes.
    fn upload(&mut self, image: Option<&[u8]>) -> Result<UploadOutcome, UploadError>;
}

/// Uploader that only logs.
#[derive(Debug, Default)]
pub struct LogUploader;

impl Uploader for LogUploader {
    fn upload(&mut self, image: Option<&[u8]>) -> Result<UploadOutcome, UploadError> {
        match image {
            Some(bytes) => {
                tracing::info!(bytes = bytes.len(), "image get");
                Ok(UploadOutcome::Received { len: bytes.len() })
            }
            None => {
                tracing::info!("Image not get");
                Ok(UploadOutcome::Missing)
            }
        }
    }
}
