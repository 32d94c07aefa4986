//! State-driven pump loops for decode and encode workstreams.
//!
//! Both pumps share one control pattern: query the engine state, dispatch on
//! it exhaustively, bracket every engine call with the timer, forward every
//! produced unit, and release frame handles exactly once. They differ only
//! in the direction the data moves.

use crate::engine::{DecodeWorkstream, EncodeWorkstream};
use crate::error::{PumpError, Result};
use crate::sink::FrameSink;
use crate::source::{FrameSource, CHUNK_SIZE};
use framepump_core::{Timer, WorkstreamState};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// Per-frame progress callback. Called with the running frame count.
pub type ProgressFn = Box<dyn FnMut(u64)>;

/// Result of a completed decode run.
#[derive(Debug, Clone)]
pub struct DecodeReport {
    /// Frames produced and forwarded to the sink.
    pub frames: u64,
    /// Wall time spent inside engine calls only.
    pub engine_time: Duration,
}

impl DecodeReport {
    /// Frames per second of engine time. `None` when no frames were
    /// produced or no engine time accumulated.
    pub fn fps(&self) -> Option<f64> {
        fps(self.frames, self.engine_time)
    }
}

/// Result of a completed encode run.
#[derive(Debug, Clone)]
pub struct EncodeReport {
    /// Raw frames supplied to the engine.
    pub frames: u64,
    /// Wall time spent inside engine calls only.
    pub engine_time: Duration,
    /// Encoded bytes written to the destination.
    pub bytes_written: u64,
    /// Size in bytes of one raw input frame.
    pub raw_frame_size: usize,
}

impl EncodeReport {
    /// Frames per second of engine time. `None` when no frames were
    /// supplied or no engine time accumulated.
    pub fn fps(&self) -> Option<f64> {
        fps(self.frames, self.engine_time)
    }

    /// Encoded bytes over raw bytes. `None` when no frames were supplied.
    pub fn compression_ratio(&self) -> Option<f64> {
        let raw_bytes = self.frames * self.raw_frame_size as u64;
        if raw_bytes == 0 {
            return None;
        }
        Some(self.bytes_written as f64 / raw_bytes as f64)
    }
}

fn fps(frames: u64, elapsed: Duration) -> Option<f64> {
    if frames == 0 || elapsed.is_zero() {
        return None;
    }
    Some(frames as f64 / elapsed.as_secs_f64())
}

/// Drives a decode workstream to completion.
pub struct DecodePump {
    chunk_size: usize,
    progress: Option<ProgressFn>,
}

impl Default for DecodePump {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodePump {
    /// Create a pump reading 1 MiB bitstream chunks.
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            progress: None,
        }
    }

    /// Set the bitstream chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Register a per-frame progress callback.
    pub fn on_progress(mut self, f: impl FnMut(u64) + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Drive `engine` until it reports a terminal state, feeding bitstream
    /// chunks from `source` and forwarding every decoded frame to `sink`.
    ///
    /// A zero-length read signals source exhaustion and switches the pump to
    /// drain mode; the engine decides when it is truly done. Every forwarded
    /// frame handle is released exactly once, after the sink returns.
    pub fn run<E, R, S>(&mut self, engine: &mut E, source: &mut R, sink: &mut S) -> Result<DecodeReport>
    where
        E: DecodeWorkstream,
        R: Read,
        S: FrameSink,
    {
        if self.chunk_size == 0 {
            return Err(PumpError::InvalidConfig("chunk size must be at least 1".into()));
        }

        let mut chunk = vec![0u8; self.chunk_size];
        let mut exhausted = false;
        let mut frames = 0u64;
        let mut timer = Timer::new();

        debug!(chunk_size = self.chunk_size, "entering decode loop");
        loop {
            let state = engine.state();
            trace!(%state, "decode iteration");
            let produced = match state {
                WorkstreamState::ReadInput => {
                    let n = if exhausted { 0 } else { source.read(&mut chunk)? };
                    if n == 0 {
                        if !exhausted {
                            exhausted = true;
                            debug!("bitstream exhausted, draining");
                        }
                        timer.time(|| engine.decode(None))?
                    } else {
                        timer.time(|| engine.decode(Some(&chunk[..n])))?
                    }
                }
                WorkstreamState::InputBufferFull => timer.time(|| engine.decode(None))?,
                WorkstreamState::EndOfOperation => break,
                WorkstreamState::Error => {
                    debug!(frames, "engine reported error state");
                    return Err(PumpError::EngineFailed { frames });
                }
            };

            if let Some(surface) = produced {
                frames += 1;
                trace!(frame = frames, surface = surface.id(), "frame decoded");
                if let Some(cb) = self.progress.as_mut() {
                    cb(frames);
                }
                // Release on every path, including a failing sink.
                let consumed = sink.consume(&surface);
                surface.release();
                consumed?;
            }
        }

        debug!(frames, "decode loop complete");
        Ok(DecodeReport {
            frames,
            engine_time: timer.elapsed(),
        })
    }
}

/// Drives an encode workstream to completion.
#[derive(Default)]
pub struct EncodePump {
    progress: Option<ProgressFn>,
}

impl EncodePump {
    /// Create an encode pump.
    pub fn new() -> Self {
        Self { progress: None }
    }

    /// Register a per-frame progress callback.
    pub fn on_progress(mut self, f: impl FnMut(u64) + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Drive `engine` until done, supplying raw frames from `source` and
    /// appending every encoded byte span to `dest`.
    ///
    /// Each supplied frame is acquired before the engine call, because the
    /// engine may retain it past the call that accepted it; the source pool
    /// owns the frame's eventual reclamation. Once the source reports the
    /// exhaustion sentinel the pump keeps flushing; an empty byte result
    /// then ends the run successfully even if the engine has not yet
    /// reported `EndOfOperation`.
    pub fn run<E, S, W>(&mut self, engine: &mut E, source: &mut S, dest: &mut W) -> Result<EncodeReport>
    where
        E: EncodeWorkstream,
        S: FrameSource,
        W: Write,
    {
        let raw_frame_size = source.info().frame_size();
        let mut frames = 0u64;
        let mut bytes_written = 0u64;
        let mut timer = Timer::new();
        let mut done = false;

        debug!(raw_frame_size, "entering encode loop");
        while !done {
            let state = engine.state();
            trace!(%state, "encode iteration");
            let encoded = match state {
                WorkstreamState::ReadInput => match source.read_frame()? {
                    Some(frame) => {
                        frames += 1;
                        trace!(frame = frames, surface = frame.id(), "frame supplied");
                        if let Some(cb) = self.progress.as_mut() {
                            cb(frames);
                        }
                        // The engine may retain the frame past this call.
                        frame.acquire();
                        match timer.time(|| engine.encode(Some(&frame))) {
                            Ok(out) => out,
                            Err(e) => {
                                // A failed call never takes the reference.
                                frame.release();
                                return Err(e);
                            }
                        }
                    }
                    None => {
                        let out = timer.time(|| engine.encode(None))?;
                        if out.is_empty() {
                            // Some engines lag their terminal-state report by
                            // one iteration; an empty flush result is
                            // completion.
                            done = true;
                        }
                        out
                    }
                },
                WorkstreamState::InputBufferFull => timer.time(|| engine.encode(None))?,
                WorkstreamState::EndOfOperation => {
                    done = true;
                    Vec::new()
                }
                WorkstreamState::Error => {
                    debug!(frames, "engine reported error state");
                    return Err(PumpError::EngineFailed { frames });
                }
            };

            if !encoded.is_empty() {
                bytes_written += encoded.len() as u64;
                dest.write_all(&encoded)?;
            }
        }

        debug!(frames, bytes_written, "encode loop complete");
        Ok(EncodeReport {
            frames,
            engine_time: timer.elapsed(),
            bytes_written,
            raw_frame_size,
        })
    }
}
