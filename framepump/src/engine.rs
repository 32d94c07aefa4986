//! Boundary traits for the external transform engine.
//!
//! The engine itself (bitstream parsing, motion compensation, color
//! conversion, entropy coding) lives behind these traits. The driver loops
//! only ever query the current [`WorkstreamState`] and issue one processing
//! call per iteration; everything else is the engine's business.

use crate::error::Result;
use framepump_core::{Surface, WorkstreamState};

/// One configured decode workstream: compressed bitstream in, raw frames
/// out.
pub trait DecodeWorkstream {
    /// Current state, queried before every pump iteration.
    fn state(&self) -> WorkstreamState;

    /// Process one step.
    ///
    /// `input` carries the next bitstream chunk, or `None` to drain buffered
    /// work without supplying new data. Returns the produced frame, if this
    /// step yielded one. The caller owns the returned handle's creation
    /// reference and must release it exactly once.
    fn decode(&mut self, input: Option<&[u8]>) -> Result<Option<Surface>>;
}

/// One configured encode workstream: raw frames in, compressed bitstream
/// out.
pub trait EncodeWorkstream {
    /// Current state, queried before every pump iteration.
    fn state(&self) -> WorkstreamState;

    /// Process one step.
    ///
    /// `frame` carries the next raw frame, or `None` once the source is
    /// exhausted, which flushes buffered work. Returns the encoded bytes
    /// produced by this step; an empty result means nothing was produced.
    ///
    /// The caller acquires a reference on `frame` before the call; the
    /// engine releases it once it is done with the frame. If the call
    /// fails, the engine must not have retained the frame and the caller
    /// reclaims the reference.
    ///
    /// Engines observed in the field may lag their `EndOfOperation` report
    /// by one iteration after the flush completes; callers treat an empty
    /// result after the `None` sentinel as completion. Confirm against the
    /// concrete engine's documented contract when integrating one.
    fn encode(&mut self, frame: Option<&Surface>) -> Result<Vec<u8>>;
}
