//! Frame sources feeding the encode pump.
//!
//! The decode pump reads plain bytes from any [`std::io::Read`]; only the
//! encode side needs a dedicated trait, because raw frames travel as
//! pool-backed [`Surface`]s.

use crate::error::Result;
use framepump_core::{ImageInfo, Surface, SurfacePool};
use std::io::{self, Read};
use tracing::trace;

/// Default bitstream chunk size for the decode pump, 1 MiB.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Supplies raw frames to an encode workstream, one per call.
pub trait FrameSource {
    /// Descriptor every produced frame matches.
    fn info(&self) -> ImageInfo;

    /// Read the next frame, or `None` once the source is exhausted.
    ///
    /// The source keeps the creation reference of every surface it issues
    /// and owns its eventual reclamation; callers acquire their own
    /// reference for anything that must outlive the issuing call.
    fn read_frame(&mut self) -> Result<Option<Surface>>;
}

/// Reads tightly packed raw frames (no container, no padding) from a byte
/// stream into pool surfaces.
pub struct RawFrameReader<R> {
    reader: R,
    pool: SurfacePool,
    issued: Vec<Surface>,
}

impl<R: Read> RawFrameReader<R> {
    /// Create a reader producing frames with the given descriptor.
    pub fn new(reader: R, info: ImageInfo) -> Self {
        Self {
            reader,
            pool: SurfacePool::new(info),
            issued: Vec::new(),
        }
    }

    /// The pool backing this source's surfaces.
    pub fn pool(&self) -> &SurfacePool {
        &self.pool
    }

    /// Release the creation reference of every surface issued so far.
    ///
    /// Runs automatically on drop; call it earlier to reclaim buffers whose
    /// other holders are already done.
    pub fn reclaim(&mut self) {
        for surface in self.issued.drain(..) {
            surface.release();
        }
    }
}

impl<R: Read> FrameSource for RawFrameReader<R> {
    fn info(&self) -> ImageInfo {
        self.pool.info()
    }

    fn read_frame(&mut self) -> Result<Option<Surface>> {
        let size = self.pool.info().frame_size();
        let mut data = vec![0u8; size];
        let mut filled = 0;
        while filled < size {
            let n = self.reader.read(&mut data[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        if filled < size {
            // A partial trailing frame is a malformed stream, not a sentinel.
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("partial frame: {filled} of {size} bytes"),
            )
            .into());
        }
        let surface = self.pool.alloc_from(data);
        trace!(surface = surface.id(), "raw frame read");
        self.issued.push(surface.clone());
        Ok(Some(surface))
    }
}

impl<R> Drop for RawFrameReader<R> {
    fn drop(&mut self) {
        for surface in self.issued.drain(..) {
            surface.release();
        }
    }
}
