// Speech conditioning DSP over 16-bit PCM
//
// Mirrors the classic "boost then band-limit" chain used before cloud
// recognition: a fixed gain, a first-order low-pass to cut hiss above the
// speech band, and a first-order high-pass to remove rumble.
// All stages clip to the i16 range.

use std::f32::consts::PI;

/// Parameters for the conditioning chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterChain {
    pub gain_db: f32,
    pub low_pass_hz: f32,
    pub high_pass_hz: f32,
}

impl Default for FilterChain {
    fn default() -> Self {
        Self {
            gain_db: 15.0,
            low_pass_hz: 2000.0,
            high_pass_hz: 150.0,
        }
    }
}

impl FilterChain {
    /// Apply gain, low-pass, then high-pass to mono samples in place
    pub fn apply(&self, samples: &mut [i16], sample_rate: u32) {
        apply_gain(samples, self.gain_db);
        low_pass(samples, self.low_pass_hz, sample_rate);
        high_pass(samples, self.high_pass_hz, sample_rate);
    }

    /// ffmpeg `-af` expression equivalent to [`FilterChain::apply`]
    pub fn ffmpeg_filter(&self) -> String {
        format!(
            "volume={}dB,lowpass=f={},highpass=f={}",
            self.gain_db, self.low_pass_hz, self.high_pass_hz
        )
    }
}

fn clip(value: f32) -> i16 {
    value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Scale by `gain_db` decibels with clipping
pub fn apply_gain(samples: &mut [i16], gain_db: f32) {
    let factor = 10f32.powf(gain_db / 20.0);
    for sample in samples.iter_mut() {
        *sample = clip(*sample as f32 * factor);
    }
}

/// First-order RC low-pass
pub fn low_pass(samples: &mut [i16], cutoff_hz: f32, sample_rate: u32) {
    if samples.is_empty() || cutoff_hz <= 0.0 {
        return;
    }

    let dt = 1.0 / sample_rate as f32;
    let rc = 1.0 / (2.0 * PI * cutoff_hz);
    let alpha = dt / (rc + dt);

    let mut previous = samples[0] as f32;
    for sample in samples.iter_mut() {
        let filtered = previous + alpha * (*sample as f32 - previous);
        previous = filtered;
        *sample = clip(filtered);
    }
}

/// First-order RC high-pass
pub fn high_pass(samples: &mut [i16], cutoff_hz: f32, sample_rate: u32) {
    if samples.is_empty() || cutoff_hz <= 0.0 {
        return;
    }

    let dt = 1.0 / sample_rate as f32;
    let rc = 1.0 / (2.0 * PI * cutoff_hz);
    let alpha = rc / (rc + dt);

    let mut previous_in = samples[0] as f32;
    let mut previous_out = samples[0] as f32;
    for sample in samples.iter_mut() {
        let input = *sample as f32;
        let filtered = alpha * (previous_out + input - previous_in);
        previous_in = input;
        previous_out = filtered;
        *sample = clip(filtered);
    }
}

/// Average interleaved channels down to mono
pub fn downmix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}
