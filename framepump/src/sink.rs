//! Frame sinks consuming decoded output.

use crate::error::Result;
use framepump_core::Surface;
use std::io::Write;

/// Consumes decoded frames, one per call.
///
/// The sink borrows the surface for the duration of the call; the pump
/// releases the handle immediately afterwards. A renderer would be just
/// another implementation of this trait; none ships here, and the headless
/// [`NullFrameSink`] is always a valid default.
pub trait FrameSink {
    /// Consume one decoded frame.
    fn consume(&mut self, surface: &Surface) -> Result<()>;
}

/// Discards every frame. The default sink when no consumer is configured.
#[derive(Debug, Default)]
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn consume(&mut self, _surface: &Surface) -> Result<()> {
        Ok(())
    }
}

/// Writes the raw plane bytes of every frame to a byte stream.
pub struct RawWriterSink<W> {
    writer: W,
}

impl<W: Write> RawWriterSink<W> {
    /// Create a sink appending to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for RawWriterSink<W> {
    fn consume(&mut self, surface: &Surface) -> Result<()> {
        self.writer.write_all(&surface.map())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framepump_core::{ImageInfo, RawFormat, SurfacePool};

    #[test]
    fn test_raw_writer_sink_appends_planes() {
        let pool = SurfacePool::new(ImageInfo::new(32, 32, RawFormat::Nv12));
        let surface = pool.alloc_from(vec![0xab; 32 * 32 * 3 / 2]);

        let mut sink = RawWriterSink::new(Vec::new());
        sink.consume(&surface).unwrap();
        sink.consume(&surface).unwrap();

        let written = sink.into_inner();
        assert_eq!(written.len(), 2 * 32 * 32 * 3 / 2);
        assert!(written.iter().all(|&b| b == 0xab));
        surface.release();
    }

    #[test]
    fn test_null_sink_leaves_the_surface_alone() {
        let pool = SurfacePool::new(ImageInfo::new(16, 16, RawFormat::Rgba));
        let surface = pool.alloc();

        let mut sink = NullFrameSink;
        sink.consume(&surface).unwrap();
        assert_eq!(surface.ref_count(), 1);
        surface.release();
    }
}
