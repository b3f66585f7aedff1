//! Configuration module for the bell player.
//!
//! Holds the audio device and tone limits passed to the player and the
//! event loop.

use std::time::Duration;

/// Audio device and tone settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BeepConfig {
    /// ALSA PCM device name.
    pub device: String,
    /// Playback sample rate (Hz).
    pub sample_rate: u32,
    /// Target device latency.
    pub latency: Duration,
    /// Longest bell that will be played, in milliseconds.
    pub duration_limit_ms: i32,
}

impl Default for BeepConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            latency: default_latency(),
            duration_limit_ms: default_duration_limit(),
        }
    }
}

// Default value functions
fn default_device() -> String {
    "default".to_string()
}
fn default_sample_rate() -> u32 {
    48000
}
fn default_latency() -> Duration {
    Duration::from_millis(200)
}
fn default_duration_limit() -> i32 {
    20000
}

impl BeepConfig {
    /// Target latency in microseconds, as ALSA expects it.
    pub fn latency_us(&self) -> u32 {
        u32::try_from(self.latency.as_micros()).unwrap_or(u32::MAX)
    }
}
