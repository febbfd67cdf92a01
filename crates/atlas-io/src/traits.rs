//! I/O traits for texture readers, writers and multi-frame sources.
//!
//! These traits define the interface for format-specific implementations.

use crate::{ImageData, IoError, IoResult};
use std::fs;
use std::path::Path;

/// Trait for texture format readers.
///
/// Readers decode the first (largest) frame of a file.
pub trait ImageReader {
    /// Reads an image from memory.
    fn read_from_memory(&self, data: &[u8]) -> IoResult<ImageData>;

    /// Reads an image from a file path.
    ///
    /// The whole file is loaded and the handle closed before decoding.
    fn read<P: AsRef<Path>>(&self, path: P) -> IoResult<ImageData> {
        let data = fs::read(path)?;
        self.read_from_memory(&data)
    }
}

/// Trait for texture format writers.
pub trait ImageWriter {
    /// Encodes an image to memory.
    fn write_to_memory(&self, image: &ImageData) -> IoResult<Vec<u8>>;

    /// Writes an image to a file path and returns the number of bytes written.
    fn write<P: AsRef<Path>>(&self, path: P, image: &ImageData) -> IoResult<u64> {
        let bytes = self.write_to_memory(image)?;
        fs::write(path, &bytes)?;
        Ok(bytes.len() as u64)
    }
}

/// A decoded-on-demand image container that may hold several frames.
///
/// For textures the frames are mip levels, frame 0 being the full
/// resolution image.
///
/// # Frame count
///
/// [`FrameSource::frame_count`] returns `None` both when the container has
/// no notion of frames and when probing failed. Callers treat `None` like a
/// single frame and decode frame 0.
pub trait FrameSource {
    /// Number of frames, if the container can tell.
    fn frame_count(&self) -> Option<usize>;

    /// Decodes one frame.
    fn decode_frame(&self, index: usize) -> IoResult<ImageData>;
}

/// A [`FrameSource`] over one already-decoded image.
#[derive(Debug, Clone)]
pub struct SingleFrame(pub ImageData);

impl FrameSource for SingleFrame {
    fn frame_count(&self) -> Option<usize> {
        None
    }

    fn decode_frame(&self, index: usize) -> IoResult<ImageData> {
        if index == 0 {
            Ok(self.0.clone())
        } else {
            Err(IoError::DecodeError(format!(
                "frame {} requested from a single-frame source",
                index
            )))
        }
    }
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn frame_count(&self) -> Option<usize> {
        (**self).frame_count()
    }

    fn decode_frame(&self, index: usize) -> IoResult<ImageData> {
        (**self).decode_frame(index)
    }
}
