//! ALSA playback sink.
//!
//! Opens the configured PCM in blocking mode with the parameters
//! `snd_pcm_set_params` would pick: interleaved S16, one channel, the
//! configured rate and a buffer sized to the latency target.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};

use crate::config::BeepConfig;
use crate::sink::{AudioOutput, AudioSink, SinkError};

/// Opens ALSA streams on demand.
#[derive(Debug, Default)]
pub struct AlsaOutput;

impl AudioOutput for AlsaOutput {
    type Sink = AlsaSink;

    fn open(&mut self, config: &BeepConfig) -> Result<AlsaSink, SinkError> {
        let pcm = PCM::new(&config.device, Direction::Playback, false)?;

        {
            let hwp = HwParams::any(&pcm)?;
            hwp.set_access(Access::RWInterleaved)?;
            hwp.set_format(Format::s16())?;
            hwp.set_channels(1)?;
            hwp.set_rate_resample(true)?;
            hwp.set_rate(config.sample_rate, ValueOr::Nearest)?;
            hwp.set_buffer_time_near(config.latency_us(), ValueOr::Nearest)?;
            pcm.hw_params(&hwp)?;
        }

        {
            let hwp = pcm.hw_params_current()?;
            let rate = hwp.get_rate()?;
            if rate != config.sample_rate {
                return Err(SinkError::Unsupported(format!(
                    "rate {} Hz instead of {} Hz",
                    rate, config.sample_rate
                )));
            }
            let buffer_size = hwp.get_buffer_size()?;
            let period_size = hwp.get_period_size()?;
            let swp = pcm.sw_params_current()?;
            // Start once every whole period in the buffer has been filled
            let threshold = if period_size > 0 {
                buffer_size / period_size * period_size
            } else {
                buffer_size
            };
            swp.set_start_threshold(threshold)?;
            pcm.sw_params(&swp)?;
        }

        log::trace!("Opened ALSA device {}", config.device);
        Ok(AlsaSink { pcm })
    }
}

/// One open ALSA stream. Closed on drop.
pub struct AlsaSink {
    pcm: PCM,
}

impl AudioSink for AlsaSink {
    fn write(&mut self, frames: &[i16]) -> Result<usize, SinkError> {
        let io = self.pcm.io_i16()?;
        Ok(io.writei(frames)?)
    }

    fn recover(&mut self, err: SinkError) -> Result<(), SinkError> {
        match err {
            SinkError::Alsa(e) => Ok(self.pcm.try_recover(e, true)?),
            other => Err(other),
        }
    }

    fn drain(&mut self) -> Result<(), SinkError> {
        Ok(self.pcm.drain()?)
    }
}
