//! Workstream state reported by a transform engine.

use std::fmt;

/// State of a transform workstream, queried before every pump iteration.
///
/// The states are mutually exclusive; the driver loop dispatches on the
/// current state and must handle all four of them explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkstreamState {
    /// The engine can accept more input; the caller must supply it.
    ReadInput,
    /// The engine cannot accept input this iteration; the caller must drain
    /// buffered work by calling the processing operation with no new input.
    InputBufferFull,
    /// The engine has produced all output it ever will. Terminal success.
    EndOfOperation,
    /// The engine has failed irrecoverably. Terminal failure.
    Error,
}

impl WorkstreamState {
    /// Check whether this state ends the driver loop.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::EndOfOperation | Self::Error)
    }

    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadInput => "read-input",
            Self::InputBufferFull => "input-buffer-full",
            Self::EndOfOperation => "end-of-operation",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for WorkstreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
