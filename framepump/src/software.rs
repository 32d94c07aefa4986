//! Software reference workstreams.
//!
//! Always-available implementations of the engine boundary, so the pumps can
//! be exercised end to end without a hardware device. The decoder treats its
//! bitstream as tightly packed raw frames; the encoder emits length-prefixed
//! run-length blocks. Neither is a real codec; they model the protocol of
//! one: buffering, backpressure, drain behavior, and surface lifetimes.

use crate::config::{DecodeConfig, EncodeConfig};
use crate::engine::{DecodeWorkstream, EncodeWorkstream};
use crate::error::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use framepump_core::{Error as CoreError, ImageInfo, Surface, SurfacePool, WorkstreamState};
use tracing::debug;

/// Magic number opening every encoded block, "FPK1".
const BLOCK_MAGIC: u32 = 0x4650_4b31;

/// Input frames the decoder buffers before reporting `InputBufferFull`.
const DECODER_WATERMARK_FRAMES: usize = 4;

/// Software decode workstream.
///
/// Consumes a stream of tightly packed raw frames in arbitrary chunkings and
/// produces one pool surface per buffered frame. The frame count it yields
/// depends only on the total input length, never on how the input was
/// chunked. A trailing partial frame is discarded.
pub struct SoftwareDecoder {
    info: ImageInfo,
    pool: SurfacePool,
    buffer: Vec<u8>,
    starved: bool,
    watermark: usize,
}

impl SoftwareDecoder {
    /// Create a decoder for the given configuration.
    pub fn new(config: &DecodeConfig) -> Result<Self> {
        config.validate()?;
        debug!(device = %config.device, format = %config.src_format,
            "software decode workstream selected");
        let info = config.output_info();
        Ok(Self {
            info,
            pool: SurfacePool::new(info),
            buffer: Vec::new(),
            starved: false,
            watermark: info.frame_size() * DECODER_WATERMARK_FRAMES,
        })
    }

    /// The pool this decoder allocates output surfaces from.
    pub fn pool(&self) -> &SurfacePool {
        &self.pool
    }
}

impl DecodeWorkstream for SoftwareDecoder {
    fn state(&self) -> WorkstreamState {
        let frame_size = self.info.frame_size();
        if self.starved && self.buffer.len() < frame_size {
            WorkstreamState::EndOfOperation
        } else if self.buffer.len() >= self.watermark {
            WorkstreamState::InputBufferFull
        } else {
            WorkstreamState::ReadInput
        }
    }

    fn decode(&mut self, input: Option<&[u8]>) -> Result<Option<Surface>> {
        match input {
            Some(bytes) if !bytes.is_empty() => {
                self.starved = false;
                self.buffer.extend_from_slice(bytes);
            }
            _ => self.starved = true,
        }

        let frame_size = self.info.frame_size();
        if self.buffer.len() < frame_size {
            return Ok(None);
        }
        let data: Vec<u8> = self.buffer.drain(..frame_size).collect();
        Ok(Some(self.pool.alloc_from(data)))
    }
}

/// Software encode workstream.
///
/// Run-length encodes each supplied frame into one `FPK1` block:
/// a 4-byte magic, a 4-byte little-endian payload length, then
/// `(run, value)` byte pairs. Finishes with the frame, releasing the
/// reference acquired for it, before returning; a hardware engine would
/// hold that reference across its pipeline depth instead.
pub struct SoftwareEncoder {
    info: ImageInfo,
    flushed: bool,
}

impl SoftwareEncoder {
    /// Create an encoder for the given configuration.
    pub fn new(config: &EncodeConfig) -> Result<Self> {
        config.validate()?;
        debug!(device = %config.device, format = %config.dst_format,
            "software encode workstream selected");
        Ok(Self {
            info: config.source_info(),
            flushed: false,
        })
    }
}

impl EncodeWorkstream for SoftwareEncoder {
    fn state(&self) -> WorkstreamState {
        if self.flushed {
            WorkstreamState::EndOfOperation
        } else {
            WorkstreamState::ReadInput
        }
    }

    fn encode(&mut self, frame: Option<&Surface>) -> Result<Vec<u8>> {
        let Some(surface) = frame else {
            self.flushed = true;
            return Ok(Vec::new());
        };

        if surface.info() != self.info {
            return Err(CoreError::invalid_param(format!(
                "frame descriptor {} does not match configured {}",
                surface.info(),
                self.info
            ))
            .into());
        }

        let payload = {
            let planes = surface.map();
            rle_compress(&planes)
        };
        surface.release();

        let mut block = Vec::with_capacity(payload.len() + 8);
        block.write_u32::<LittleEndian>(BLOCK_MAGIC)?;
        block.write_u32::<LittleEndian>(payload.len() as u32)?;
        block.extend_from_slice(&payload);
        Ok(block)
    }
}

/// Byte-wise run-length encoding: `(run, value)` pairs, runs capped at 255.
fn rle_compress(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut iter = bytes.iter().copied();
    let Some(mut current) = iter.next() else {
        return out;
    };
    let mut run = 1u8;
    for byte in iter {
        if byte == current && run < u8::MAX {
            run += 1;
        } else {
            out.push(run);
            out.push(current);
            current = byte;
            run = 1;
        }
    }
    out.push(run);
    out.push(current);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BitstreamFormat, Resolution};

    #[test]
    fn test_rle_compress() {
        assert_eq!(rle_compress(&[]), Vec::<u8>::new());
        assert_eq!(rle_compress(&[9]), vec![1, 9]);
        assert_eq!(rle_compress(&[0, 0, 0, 1, 1]), vec![3, 0, 2, 1]);

        // Runs are capped at 255.
        let long = vec![5u8; 300];
        assert_eq!(rle_compress(&long), vec![255, 5, 45, 5]);
    }

    #[test]
    fn test_decoder_starts_in_read_input() {
        let decoder = SoftwareDecoder::new(&DecodeConfig::new(BitstreamFormat::H264)).unwrap();
        assert_eq!(decoder.state(), WorkstreamState::ReadInput);
    }

    #[test]
    fn test_decoder_ends_after_drain() {
        let mut decoder =
            SoftwareDecoder::new(&DecodeConfig::new(BitstreamFormat::H264)).unwrap();
        assert!(decoder.decode(None).unwrap().is_none());
        assert_eq!(decoder.state(), WorkstreamState::EndOfOperation);
    }

    #[test]
    fn test_decoder_reports_backpressure() {
        let config = DecodeConfig::new(BitstreamFormat::H264);
        let mut decoder = SoftwareDecoder::new(&config).unwrap();
        let frame_size = config.output_info().frame_size();

        // One oversized chunk buffers more than the watermark even after
        // this call's frame is carved off.
        let chunk = vec![0u8; frame_size * (DECODER_WATERMARK_FRAMES + 2)];
        let produced = decoder.decode(Some(&chunk)).unwrap();
        assert!(produced.is_some());
        produced.unwrap().release();
        assert_eq!(decoder.state(), WorkstreamState::InputBufferFull);
    }

    #[test]
    fn test_encoder_flush_then_end() {
        let config = EncodeConfig::new(BitstreamFormat::H264, Resolution::new(352, 288));
        let mut encoder = SoftwareEncoder::new(&config).unwrap();
        assert_eq!(encoder.state(), WorkstreamState::ReadInput);

        let out = encoder.encode(None).unwrap();
        assert!(out.is_empty());
        assert_eq!(encoder.state(), WorkstreamState::EndOfOperation);
    }

    #[test]
    fn test_encoder_rejects_mismatched_descriptor() {
        let config = EncodeConfig::new(BitstreamFormat::H264, Resolution::new(352, 288));
        let mut encoder = SoftwareEncoder::new(&config).unwrap();

        let other = SurfacePool::new(ImageInfo::new(176, 144, framepump_core::RawFormat::Nv12));
        let surface = other.alloc();
        surface.acquire();
        assert!(encoder.encode(Some(&surface)).is_err());
        surface.release();
        surface.release();
    }

    #[test]
    fn test_encoder_block_framing() {
        let config = EncodeConfig::new(BitstreamFormat::H264, Resolution::new(32, 32));
        let mut encoder = SoftwareEncoder::new(&config).unwrap();

        let pool = SurfacePool::new(config.source_info());
        let surface = pool.alloc();
        surface.acquire();
        let block = encoder.encode(Some(&surface)).unwrap();
        surface.release();

        assert_eq!(&block[0..4], BLOCK_MAGIC.to_le_bytes().as_slice());
        let len = u32::from_le_bytes(block[4..8].try_into().unwrap()) as usize;
        assert_eq!(block.len(), len + 8);
        assert_eq!(pool.outstanding(), 0);
    }
}
