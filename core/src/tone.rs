use crate::error::{DemodError, Result};
use crate::{HOP_SIZE, SAMPLE_RATE, WINDOW_SIZE};
use std::f32::consts::PI;

// Tone-burst transmitter used to produce captures for the demodulator
//
// Each bit is one burst: a high carrier for 1, a low carrier for 0, both
// inside the default 4800-7200 Hz carrier band and on opposite sides of the
// default threshold bin (250, about 5371 Hz at 44 kHz / 2048).
//
// Burst timing (at 44 kHz with a 2048-sample window and 512-sample hop):
// - Burst: 2048 samples with a full Hann envelope, so its spectrum has no
//   hard-edge splatter and forms a single hump over time
// - Gap: 4096 samples of silence, placing burst centers 12 frames apart,
//   outside each other's 7-frame peak neighborhood
// - Lead-in: 3072 samples, so every burst center lands on a frame center

/// Carrier for a 0 bit (bin ~232.7)
pub const TONE_LOW_HZ: f32 = 5000.0;

/// Carrier for a 1 bit (bin ~302.5)
pub const TONE_HIGH_HZ: f32 = 6500.0;

pub const BURST_SAMPLES: usize = WINDOW_SIZE;
pub const GAP_SAMPLES: usize = 2 * WINDOW_SIZE;
pub const LEAD_SAMPLES: usize = 6 * HOP_SIZE;

const TONE_AMPLITUDE: f32 = 0.5;

pub struct ToneBurstModulator {
    sample_rate: u32,
    low_hz: f32,
    high_hz: f32,
    burst_samples: usize,
    gap_samples: usize,
    lead_samples: usize,
    amplitude: f32,
}

impl ToneBurstModulator {
    pub fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            low_hz: TONE_LOW_HZ,
            high_hz: TONE_HIGH_HZ,
            burst_samples: BURST_SAMPLES,
            gap_samples: GAP_SAMPLES,
            lead_samples: LEAD_SAMPLES,
            amplitude: TONE_AMPLITUDE,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_tones(mut self, low_hz: f32, high_hz: f32) -> Self {
        self.low_hz = low_hz;
        self.high_hz = high_hz;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples between the starts of consecutive bursts
    pub fn symbol_samples(&self) -> usize {
        self.burst_samples + self.gap_samples
    }

    /// Sample index at the center of burst `index`
    pub fn burst_center(&self, index: usize) -> usize {
        self.lead_samples + index * self.symbol_samples() + self.burst_samples / 2
    }

    /// Modulate a single burst for `bit`
    pub fn modulate_bit(&self, bit: u8) -> Result<Vec<f32>> {
        let freq = match bit {
            0 => self.low_hz,
            1 => self.high_hz,
            other => return Err(DemodError::InvalidBit(other)),
        };

        let len = self.burst_samples;
        let sample_rate = self.sample_rate as f32;
        let samples = (0..len)
            .map(|i| {
                let envelope = 0.5 - 0.5 * (2.0 * PI * i as f32 / len as f32).cos();
                let phase = 2.0 * PI * freq * (i as f32 / sample_rate);
                self.amplitude * envelope * phase.sin()
            })
            .collect();
        Ok(samples)
    }

    /// Modulate a bit sequence: lead-in, then one burst and gap per bit
    pub fn modulate(&self, bits: &[u8]) -> Result<Vec<f32>> {
        let mut samples = vec![0.0; self.lead_samples];
        samples.reserve(bits.len() * self.symbol_samples());
        for &bit in bits {
            samples.extend(self.modulate_bit(bit)?);
            samples.extend(std::iter::repeat(0.0).take(self.gap_samples));
        }
        Ok(samples)
    }
}

impl Default for ToneBurstModulator {
    fn default() -> Self {
        Self::new()
    }
}
