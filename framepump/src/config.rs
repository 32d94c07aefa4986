//! Typed workstream configuration.
//!
//! Every recognized property is a struct field, so an unsupported key is a
//! compile error rather than a runtime surprise. Value combinations are
//! still checked by [`DecodeConfig::validate`]/[`EncodeConfig::validate`],
//! which run before the first state query.

use crate::error::{PumpError, Result};
use framepump_core::{ImageInfo, RawFormat};
use std::fmt;

/// Target-device preference for engine creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceTarget {
    /// Let the engine pick; GPU if available.
    #[default]
    Auto,
    /// Prefer the GPU.
    Gpu,
    /// Prefer the CPU.
    Cpu,
}

impl DeviceTarget {
    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Gpu => "gpu",
            Self::Cpu => "cpu",
        }
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compressed bitstream format, on the input side of a decode workstream or
/// the output side of an encode workstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitstreamFormat {
    /// H.264/AVC elementary stream.
    H264,
    /// H.265/HEVC elementary stream.
    Hevc,
}

impl BitstreamFormat {
    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::Hevc => "hevc",
        }
    }
}

impl fmt::Display for BitstreamFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output or source resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Configuration for a decode workstream: bitstream in, raw frames out,
/// color conversion and scaling folded into the engine.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    /// Target-device preference.
    pub device: DeviceTarget,
    /// Format of the incoming bitstream.
    pub src_format: BitstreamFormat,
    /// Raw format of produced frames.
    pub dst_format: RawFormat,
    /// Resolution produced frames are scaled to.
    pub output: Resolution,
}

impl DecodeConfig {
    /// Create a decode configuration with the default device, NV12 output
    /// and CIF resolution.
    pub fn new(src_format: BitstreamFormat) -> Self {
        Self {
            device: DeviceTarget::default(),
            src_format,
            dst_format: RawFormat::Nv12,
            output: Resolution::new(352, 288),
        }
    }

    /// Set the target device.
    pub fn with_device(mut self, device: DeviceTarget) -> Self {
        self.device = device;
        self
    }

    /// Set the raw format of produced frames.
    pub fn with_dst_format(mut self, format: RawFormat) -> Self {
        self.dst_format = format;
        self
    }

    /// Set the output resolution.
    pub fn with_output(mut self, output: Resolution) -> Self {
        self.output = output;
        self
    }

    /// Descriptor of the frames this workstream produces.
    pub fn output_info(&self) -> ImageInfo {
        ImageInfo::new(self.output.width, self.output.height, self.dst_format)
    }

    /// Reject unsupported value combinations before the loop starts.
    pub fn validate(&self) -> Result<()> {
        if self.output.width == 0 || self.output.height == 0 {
            return Err(PumpError::InvalidConfig(format!(
                "output resolution {} has a zero dimension",
                self.output
            )));
        }
        Ok(())
    }
}

/// Configuration for an encode workstream: raw frames in, bitstream out.
#[derive(Debug, Clone)]
pub struct EncodeConfig {
    /// Target-device preference.
    pub device: DeviceTarget,
    /// Format of the produced bitstream.
    pub dst_format: BitstreamFormat,
    /// Raw format of incoming frames.
    pub src_format: RawFormat,
    /// Resolution of incoming frames.
    pub source: Resolution,
}

impl EncodeConfig {
    /// Create an encode configuration for NV12 input at the given
    /// resolution.
    pub fn new(dst_format: BitstreamFormat, source: Resolution) -> Self {
        Self {
            device: DeviceTarget::default(),
            dst_format,
            src_format: RawFormat::Nv12,
            source,
        }
    }

    /// Set the target device.
    pub fn with_device(mut self, device: DeviceTarget) -> Self {
        self.device = device;
        self
    }

    /// Set the raw format of incoming frames.
    pub fn with_src_format(mut self, format: RawFormat) -> Self {
        self.src_format = format;
        self
    }

    /// Descriptor incoming raw frames must match.
    pub fn source_info(&self) -> ImageInfo {
        ImageInfo::new(self.source.width, self.source.height, self.src_format)
    }

    /// Reject unsupported value combinations before the loop starts.
    pub fn validate(&self) -> Result<()> {
        if self.source.width == 0 || self.source.height == 0 {
            return Err(PumpError::InvalidConfig(format!(
                "source resolution {} has a zero dimension",
                self.source
            )));
        }
        if self.src_format != RawFormat::Nv12 {
            return Err(PumpError::InvalidConfig(format!(
                "encode input must be nv12, got {}",
                self.src_format
            )));
        }
        Ok(())
    }
}
