//! Driver loops for hardware media workstreams.
//!
//! A transform engine (hardware decode, encode, or video post-processing)
//! is an opaque, stateful unit: it reports one of four states and exposes a
//! single process-one-step operation. This crate provides the state-driven
//! pumps that move data through such an engine under its backpressure
//! protocol, the boundary traits an engine implements, typed workstream
//! configuration, and frame sources/sinks. A software reference workstream
//! is included so everything runs without a device.
//!
//! # Example
//!
//! ```
//! use framepump::{BitstreamFormat, DecodeConfig, DecodePump, NullFrameSink, SoftwareDecoder};
//!
//! # fn main() -> framepump::Result<()> {
//! let config = DecodeConfig::new(BitstreamFormat::H264);
//! let mut engine = SoftwareDecoder::new(&config)?;
//! let frame = vec![0u8; config.output_info().frame_size()];
//!
//! let report = DecodePump::new().run(
//!     &mut engine,
//!     &mut frame.as_slice(),
//!     &mut NullFrameSink,
//! )?;
//! assert_eq!(report.frames, 1);
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod pump;
mod sink;
mod software;
mod source;

pub use config::{BitstreamFormat, DecodeConfig, DeviceTarget, EncodeConfig, Resolution};
pub use engine::{DecodeWorkstream, EncodeWorkstream};
pub use error::{PumpError, Result};
pub use pump::{DecodePump, DecodeReport, EncodePump, EncodeReport, ProgressFn};
pub use sink::{FrameSink, NullFrameSink, RawWriterSink};
pub use software::{SoftwareDecoder, SoftwareEncoder};
pub use source::{FrameSource, RawFrameReader, CHUNK_SIZE};
