//! Audio sink abstraction.
//!
//! The player only needs to open a stream, push frames, recover from an
//! underrun and drain. Closing happens when the sink is dropped.

use thiserror::Error;

use crate::config::BeepConfig;

/// Errors reported by an audio sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Alsa(#[from] alsa::Error),
    #[error("unsupported stream configuration: {0}")]
    Unsupported(String),
}

/// Something that can open a playback stream.
pub trait AudioOutput {
    type Sink: AudioSink;

    /// Open and configure a fresh stream for one bell.
    fn open(&mut self, config: &BeepConfig) -> Result<Self::Sink, SinkError>;
}

/// An opened single-channel 16-bit playback stream.
pub trait AudioSink {
    /// Write frames, blocking. May write fewer than `frames.len()`.
    fn write(&mut self, frames: &[i16]) -> Result<usize, SinkError>;

    /// Resynchronize the stream after a failed write.
    fn recover(&mut self, err: SinkError) -> Result<(), SinkError>;

    /// Block until everything written has been played.
    fn drain(&mut self) -> Result<(), SinkError>;
}
