//! Bell event loop.
//!
//! Waits for bell events, plays each one and falls back to the server's own
//! bell when playback fails.

use crate::config::BeepConfig;
use crate::player;
use crate::sink::AudioOutput;
use crate::tone::BellRequest;

/// Identifies the keyboard bell that rang. Only used for the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BellDevice {
    pub device: u16,
    pub class: u16,
    pub id: u16,
}

/// A bell notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BellEvent {
    pub request: BellRequest,
    pub device: BellDevice,
}

/// Source of bell notifications.
pub trait BellSource {
    type Error: std::error::Error;

    /// Block until the next bell notification.
    fn next_bell(&mut self) -> Result<BellEvent, Self::Error>;

    /// Ring the server's built-in bell for `event` instead.
    fn force_bell(&mut self, event: &BellEvent) -> Result<(), Self::Error>;
}

/// Handle one bell: play it, or force the native bell if playback failed.
pub fn handle<S, O>(
    source: &mut S,
    output: &mut O,
    config: &BeepConfig,
    event: &BellEvent,
) -> Result<(), S::Error>
where
    S: BellSource,
    O: AudioOutput,
{
    log::trace!(
        "Bell percent={} pitch={} duration={}",
        event.request.percent,
        event.request.pitch,
        event.request.duration
    );

    if !player::play(output, config, event.request) {
        log::trace!("Falling back to server bell on {:?}", event.device);
        source.force_bell(event)?;
    }
    Ok(())
}

/// Run the event loop. Only returns if the event source fails.
pub fn run<S, O>(source: &mut S, output: &mut O, config: &BeepConfig) -> Result<(), S::Error>
where
    S: BellSource,
    O: AudioOutput,
{
    loop {
        let event = source.next_bell()?;
        handle(source, output, config, &event)?;
    }
}
