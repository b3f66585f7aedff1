//! Bell player.
//!
//! Synthesizes the tone for one bell and streams it to a freshly opened
//! sink, looping the buffer until the requested duration has been written.

use crate::config::BeepConfig;
use crate::sink::{AudioOutput, AudioSink, SinkError};
use crate::tone::{BellRequest, ToneBuffer, TonePlan};

/// Plays one bell.
///
/// Returns `true` when the bell was played or deliberately skipped
/// (inaudible pitch, zero volume or duration). Returns `false` when the
/// audio device failed and the caller should fall back to the server bell.
pub fn play<O: AudioOutput>(output: &mut O, config: &BeepConfig, request: BellRequest) -> bool {
    let Some(plan) = TonePlan::new(request, config.sample_rate, config.duration_limit_ms) else {
        log::trace!("Skipping unplayable bell {:?}", request);
        return true;
    };

    let buffer = ToneBuffer::new(&plan);
    if buffer.is_empty() {
        log::trace!("Bell {:?} rounds to silence", request);
        return true;
    }
    log::trace!(
        "Playing {} Hz at {}% for {} ms ({} frames)",
        request.pitch,
        plan.percent,
        plan.duration,
        plan.frame_count
    );

    let mut sink = match output.open(config) {
        Ok(sink) => sink,
        Err(e) => {
            log::error!("ALSA device {} open error: {}", config.device, e);
            return false;
        }
    };

    if let Err(e) = stream(&mut sink, buffer.as_slice(), plan.frame_count) {
        log::error!("ALSA playback error: {}", e);
        return false;
    }

    if let Err(e) = sink.drain() {
        log::error!("ALSA playback error: {}", e);
    }
    true
}

/// Write `frame_count` frames by repeating `buffer`.
///
/// Partial writes resume where they stopped. A failed write is handed to
/// [`AudioSink::recover`] and retried; only a failed recovery ends the stream.
fn stream<S: AudioSink>(sink: &mut S, buffer: &[i16], frame_count: usize) -> Result<(), SinkError> {
    if buffer.is_empty() {
        return Ok(());
    }

    let mut remaining = frame_count;
    while remaining > 0 {
        let mut chunk = &buffer[..buffer.len().min(remaining)];
        remaining -= chunk.len();

        while !chunk.is_empty() {
            let sent = match sink.write(chunk) {
                Ok(sent) => sent.min(chunk.len()),
                Err(e) => {
                    log::trace!("ALSA write failed, recovering: {}", e);
                    sink.recover(e)?;
                    0
                }
            };
            chunk = &chunk[sent..];
        }
    }
    Ok(())
}
