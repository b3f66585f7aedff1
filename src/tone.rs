//! Tone synthesis.
//!
//! Turns a bell request into a [`TonePlan`] (how many samples one buffer
//! holds and how many frames the whole bell lasts) and fills a
//! [`ToneBuffer`] with a sine wave that loops without a phase jump.

use std::f64::consts::TAU;

/// Capacity of one tone buffer, in samples.
pub const MAX_SAMPLES: usize = 8192;

/// Lowest pitch that is still played (exclusive).
pub const MIN_PITCH: i32 = 20;
/// Highest pitch that is still played (exclusive).
pub const MAX_PITCH: i32 = 20000;

/// Maps percent of full scale onto the signed 16-bit range.
const AMPLITUDE_PER_PERCENT: f64 = 327.67;

/// Bell parameters as reported by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BellRequest {
    /// Volume, percent of full scale. May exceed 100.
    pub percent: i32,
    /// Pitch in Hz.
    pub pitch: i32,
    /// Duration in milliseconds.
    pub duration: i32,
}

impl BellRequest {
    /// Whether this bell is worth synthesizing at all.
    pub fn is_playable(&self) -> bool {
        self.pitch > MIN_PITCH && self.pitch < MAX_PITCH && self.percent > 0 && self.duration > 0
    }
}

/// Sizes and scaling for one bell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TonePlan {
    /// Fraction of a cycle advanced per sample.
    pub sample_step: f64,
    /// Samples in one buffer fill, a whole number of cycles.
    pub sample_count: usize,
    /// Frames to stream in total, rounded to a half-cycle boundary.
    pub frame_count: usize,
    /// Peak sample value.
    pub amplitude: f64,
    /// Percent after clamping to 100.
    pub percent: i32,
    /// Duration after clamping to the configured limit.
    pub duration: i32,
}

impl TonePlan {
    /// Compute the plan for a playable request.
    ///
    /// Returns `None` when the request fails [`BellRequest::is_playable`].
    pub fn new(request: BellRequest, sample_rate: u32, duration_limit_ms: i32) -> Option<Self> {
        if !request.is_playable() || sample_rate == 0 {
            return None;
        }

        let mut duration = request.duration;
        if duration > duration_limit_ms {
            log::debug!(
                "Limiting bell duration {} to {}",
                duration,
                duration_limit_ms
            );
            duration = duration_limit_ms;
        }
        let percent = request.percent.min(100);

        let sample_step = f64::from(request.pitch) / f64::from(sample_rate);

        // Whole cycles that fit in one buffer, so the buffer loops cleanly
        let cycles = (MAX_SAMPLES as f64 * sample_step).floor();
        let sample_count = ((cycles / sample_step).round() as usize).min(MAX_SAMPLES);

        // Land on a half period so the tone stops near a zero crossing
        let half_step = sample_step * 2.0;
        let duration_frames = duration as u64 * u64::from(sample_rate) / 1000;
        let half_cycles = (duration_frames as f64 * half_step).round();
        let frame_count = (half_cycles / half_step).round() as usize;

        Some(Self {
            sample_step,
            sample_count: sample_count.min(frame_count),
            frame_count,
            amplitude: AMPLITUDE_PER_PERCENT * f64::from(percent),
            percent,
            duration,
        })
    }
}

/// One fill of sine samples, at most [`MAX_SAMPLES`] long.
pub struct ToneBuffer {
    samples: [i16; MAX_SAMPLES],
    len: usize,
}

impl ToneBuffer {
    /// Synthesize the buffer described by `plan`.
    pub fn new(plan: &TonePlan) -> Self {
        let mut samples = [0i16; MAX_SAMPLES];
        let len = plan.sample_count.min(MAX_SAMPLES);
        let step = plan.sample_step * TAU;

        for (i, slot) in samples[..len].iter_mut().enumerate() {
            *slot = (plan.amplitude * (i as f64 * step).sin()).round() as i16;
        }

        Self { samples, len }
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.samples[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 48000;
    const LIMIT: i32 = 20000;

    fn plan(percent: i32, pitch: i32, duration: i32) -> TonePlan {
        TonePlan::new(BellRequest { percent, pitch, duration }, RATE, LIMIT)
            .expect("playable request")
    }

    fn peak(buffer: &ToneBuffer) -> i32 {
        buffer
            .as_slice()
            .iter()
            .map(|s| i32::from(*s).abs())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn rejects_unplayable_requests() {
        for (percent, pitch, duration) in [
            (50, 20, 100),
            (50, 10, 100),
            (50, 20000, 100),
            (50, 25000, 100),
            (0, 440, 100),
            (-5, 440, 100),
            (50, 440, 0),
            (50, 440, -1),
        ] {
            let request = BellRequest { percent, pitch, duration };
            assert!(!request.is_playable(), "{:?}", request);
            assert!(TonePlan::new(request, RATE, LIMIT).is_none());
        }
    }

    #[test]
    fn a4_at_half_volume() {
        let plan = plan(50, 440, 200);
        assert!((plan.sample_step - 440.0 / 48000.0).abs() < 1e-12);
        assert!((plan.amplitude - 16383.5).abs() < 1e-9);
        assert_eq!(plan.frame_count, 9600);
        assert_eq!(plan.sample_count, 8182);

        let cycles = plan.sample_count as f64 * plan.sample_step;
        assert!((cycles - cycles.round()).abs() < 0.01);
        assert!(cycles > 70.0);
    }

    #[test]
    fn buffer_never_exceeds_capacity() {
        for pitch in [21, 55, 440, 997, 4186, 12345, 19999] {
            let plan = plan(100, pitch, 20000);
            assert!(plan.sample_count <= MAX_SAMPLES, "pitch {}", pitch);
            assert!(plan.sample_count > 0, "pitch {}", pitch);
        }
    }

    #[test]
    fn frame_count_lands_on_half_cycle() {
        for (pitch, duration) in [(440, 200), (21, 333), (1000, 7), (3001, 150), (19999, 50)] {
            let plan = plan(50, pitch, duration);
            let half_cycles = plan.frame_count as f64 * plan.sample_step * 2.0;
            assert!(
                (half_cycles - half_cycles.round()).abs() <= plan.sample_step * 2.0,
                "pitch {} duration {}",
                pitch,
                duration
            );
        }
    }

    #[test]
    fn short_bell_fits_in_one_buffer() {
        let plan = plan(50, 440, 10);
        assert!(plan.frame_count < MAX_SAMPLES);
        assert_eq!(plan.sample_count, plan.frame_count);
    }

    #[test]
    fn duration_is_clamped_to_limit() {
        let long = plan(50, 440, 60000);
        let limit = plan(50, 440, LIMIT);
        assert_eq!(long.duration, LIMIT);
        assert_eq!(long.frame_count, limit.frame_count);
        assert_eq!(long.frame_count, 960_000);
    }

    #[test]
    fn percent_above_hundred_is_full_scale() {
        let loud = plan(250, 440, 100);
        assert_eq!(loud.percent, 100);
        assert!((loud.amplitude - 32767.0).abs() < 1e-9);
        let full = plan(100, 440, 100);
        assert_eq!(ToneBuffer::new(&loud).as_slice(), ToneBuffer::new(&full).as_slice());
    }

    #[test]
    fn samples_stay_in_range_and_scale_with_percent() {
        let quiet = ToneBuffer::new(&plan(25, 440, 200));
        let half = ToneBuffer::new(&plan(50, 440, 200));
        let full = ToneBuffer::new(&plan(100, 440, 200));

        assert!(peak(&full) <= i16::MAX as i32);
        assert!(peak(&full) > 32000);

        let ratio = peak(&half) as f64 / peak(&quiet) as f64;
        assert!((ratio - 2.0).abs() < 0.01, "ratio {}", ratio);
        let ratio = peak(&full) as f64 / peak(&half) as f64;
        assert!((ratio - 2.0).abs() < 0.01, "ratio {}", ratio);
    }

    #[test]
    fn buffer_loops_without_discontinuity() {
        for pitch in [21, 440, 1000, 2500, 7919] {
            let plan = plan(100, pitch, 20000);
            let buffer = ToneBuffer::new(&plan);
            let samples = buffer.as_slice();
            assert_eq!(samples[0], 0);

            // Phase after one full buffer is within half a sample of a whole cycle
            let phase = samples.len() as f64 * plan.sample_step;
            assert!((phase - phase.round()).abs() <= plan.sample_step / 2.0 + 1e-9);

            // Restarting at sample 0 is no bigger a jump than the wave itself makes
            let max_delta = samples
                .windows(2)
                .map(|w| (i32::from(w[1]) - i32::from(w[0])).abs())
                .max()
                .unwrap_or(0);
            let expected_next = plan.amplitude * (phase * TAU).sin();
            assert!(
                expected_next.abs() <= max_delta as f64 / 2.0 + 1.0,
                "pitch {}: expected {} max delta {}",
                pitch,
                expected_next,
                max_delta
            );
        }
    }

    #[test]
    fn buffer_reflects_only_its_own_pitch() {
        let low = ToneBuffer::new(&plan(50, 220, 200));
        let high = ToneBuffer::new(&plan(50, 880, 200));
        let again = ToneBuffer::new(&plan(50, 220, 200));
        assert_ne!(low.as_slice(), high.as_slice());
        assert_eq!(low.as_slice(), again.as_slice());
    }
}
