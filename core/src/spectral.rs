//! Short-time Fourier magnitude grid
//!
//! Frames are centered: the signal is zero-padded by half a window on each
//! side, so frame `t` is centered on sample `t * hop`. Each frame is
//! multiplied by a periodic Hann window before a real FFT.

use crate::config::bin_to_hz;
use crate::error::{DemodError, Result};
use crate::TOP_DB;
use ndarray::{s, Array2, ArrayView2};
use realfft::RealFftPlanner;
use std::f32::consts::PI;
use std::ops::Range;

/// Frequency of every STFT bin for a window of `window_size` samples
pub fn fft_frequencies(sample_rate: u32, window_size: usize) -> Vec<f32> {
    (0..window_size / 2 + 1)
        .map(|bin| bin_to_hz(bin, sample_rate, window_size))
        .collect()
}

/// Periodic Hann window
fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / len as f32).cos())
        .collect()
}

/// Convert magnitudes to decibels relative to the grid maximum.
///
/// Computes `10 log10(max(1e-10, m^2)) - 10 log10(max(1e-10, max^2))` and
/// floors the result `TOP_DB` below its own maximum, so every value lies in
/// `[-TOP_DB, 0]`.
pub fn amplitude_to_db(magnitudes: ArrayView2<f32>) -> Array2<f32> {
    const AMIN: f32 = 1e-10;
    let max = magnitudes.iter().fold(0.0f32, |acc, &m| acc.max(m));
    let reference = 10.0 * (max * max).max(AMIN).log10();

    let mut db = magnitudes.mapv(|m| 10.0 * (m * m).max(AMIN).log10() - reference);
    let peak_db = db.iter().fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let floor = peak_db - TOP_DB;
    db.mapv_inplace(|v| v.max(floor));
    db
}

/// Magnitude grid indexed by (frequency bin, time frame)
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    magnitudes: Array2<f32>,
    frequencies: Vec<f32>,
    sample_rate: u32,
    window_size: usize,
    hop_size: usize,
}

impl Spectrogram {
    pub fn magnitudes(&self) -> ArrayView2<'_, f32> {
        self.magnitudes.view()
    }

    /// Hz value of each row
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    pub fn num_bins(&self) -> usize {
        self.magnitudes.nrows()
    }

    pub fn num_frames(&self) -> usize {
        self.magnitudes.ncols()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Time in seconds at the center of frame `frame`
    pub fn frame_time(&self, frame: usize) -> f32 {
        (frame * self.hop_size) as f32 / self.sample_rate as f32
    }

    pub fn decibels(&self) -> Array2<f32> {
        amplitude_to_db(self.magnitudes.view())
    }

    /// Rows whose frequency lies within `low_hz..=high_hz`
    pub fn band_rows(&self, low_hz: f32, high_hz: f32) -> Range<usize> {
        let start = self.frequencies.partition_point(|&f| f < low_hz);
        let end = self.frequencies.partition_point(|&f| f <= high_hz);
        start..end.max(start)
    }

    /// Copy of `grid` restricted to `rows`
    pub fn restrict_rows<T: Clone>(grid: ArrayView2<T>, rows: Range<usize>) -> Array2<T> {
        grid.slice(s![rows, ..]).to_owned()
    }
}

/// STFT front end with a fixed window and hop
pub struct SpectralAnalyzer {
    window_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    planner: RealFftPlanner<f32>,
}

impl SpectralAnalyzer {
    pub fn new(window_size: usize, hop_size: usize) -> Result<Self> {
        if window_size < 2 || window_size % 2 != 0 {
            return Err(DemodError::InvalidConfig(format!(
                "window size must be even and at least 2, got {}",
                window_size
            )));
        }
        if hop_size == 0 || hop_size > window_size {
            return Err(DemodError::InvalidConfig(format!(
                "hop size must be in 1..={}, got {}",
                window_size, hop_size
            )));
        }
        Ok(Self {
            window_size,
            hop_size,
            window: hann_window(window_size),
            planner: RealFftPlanner::new(),
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        1 + len / self.hop_size
    }

    /// Compute the magnitude grid and frequency axis of `samples`
    pub fn analyze(&mut self, samples: &[f32], sample_rate: u32) -> Result<Spectrogram> {
        if samples.is_empty() {
            return Err(DemodError::InvalidSampleBuffer("cannot analyze an empty buffer".into()));
        }

        let pad = self.window_size / 2;
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let num_frames = self.num_frames(samples.len());
        let num_bins = self.window_size / 2 + 1;

        let r2c = self.planner.plan_fft_forward(self.window_size);
        let mut frame_buf = r2c.make_input_vec();
        let mut spectrum = r2c.make_output_vec();
        let mut magnitudes = Array2::<f32>::zeros((num_bins, num_frames));

        for t in 0..num_frames {
            let start = t * self.hop_size;
            let frame = &padded[start..start + self.window_size];
            for ((dst, &x), &w) in frame_buf.iter_mut().zip(frame).zip(&self.window) {
                *dst = x * w;
            }

            r2c.process(&mut frame_buf, &mut spectrum).map_err(|e| {
                DemodError::FftError(format!("STFT forward process failed at frame {}: {:?}", t, e))
            })?;

            for (bin, c) in spectrum.iter().enumerate() {
                magnitudes[[bin, t]] = c.norm();
            }
        }

        log::debug!(
            "STFT: {} samples -> {} bins x {} frames (window {}, hop {})",
            samples.len(),
            num_bins,
            num_frames,
            self.window_size,
            self.hop_size
        );

        Ok(Spectrogram {
            magnitudes,
            frequencies: fft_frequencies(sample_rate, self.window_size),
            sample_rate,
            window_size: self.window_size,
            hop_size: self.hop_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn tone(freq: f32, sample_rate: u32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_frequency_axis() {
        let freqs = fft_frequencies(44000, 2048);
        assert_eq!(freqs.len(), 1025);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1024] - 22000.0).abs() < 1e-2);
        for pair in freqs.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!((pair[1] - pair[0] - 44000.0 / 2048.0).abs() < 1e-2);
        }
    }

    #[test]
    fn test_grid_shape() {
        let mut analyzer = SpectralAnalyzer::new(2048, 512).unwrap();
        let spec = analyzer.analyze(&vec![0.0; 44000], 44000).unwrap();
        assert_eq!(spec.num_bins(), 1025);
        assert_eq!(spec.num_frames(), 1 + 44000 / 512);
        assert_eq!(spec.frequencies().len(), spec.num_bins());
    }

    #[test]
    fn test_short_signal_single_frame() {
        let mut analyzer = SpectralAnalyzer::new(2048, 512).unwrap();
        let spec = analyzer.analyze(&[1.0; 100], 44000).unwrap();
        assert_eq!(spec.num_frames(), 1);
    }

    #[test]
    fn test_tone_peaks_at_expected_bin() {
        let mut analyzer = SpectralAnalyzer::new(2048, 512).unwrap();
        // Exactly on bin 256
        let freq = 256.0 * 44000.0 / 2048.0;
        let spec = analyzer.analyze(&tone(freq, 44000, 44000, 1.0), 44000).unwrap();

        let mags = spec.magnitudes();
        let frame = spec.num_frames() / 2;
        let column = mags.column(frame);
        let (peak_bin, peak) = column
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
        assert_eq!(peak_bin, 256);
        // Hann window sums to N/2, a unit sine contributes half of that
        assert!((peak - 512.0).abs() < 1.0, "peak magnitude {}", peak);
        assert!(mags.iter().all(|&m| m >= 0.0));
    }

    #[test]
    fn test_amplitude_to_db() {
        let grid = array![[10.0f32, 1.0], [0.1, 0.0]];
        let db = amplitude_to_db(grid.view());
        assert!((db[[0, 0]] - 0.0).abs() < 1e-4);
        assert!((db[[0, 1]] + 20.0).abs() < 1e-4);
        assert!((db[[1, 0]] + 40.0).abs() < 1e-4);
        // Silence is floored TOP_DB below the maximum
        assert!((db[[1, 1]] + TOP_DB).abs() < 1e-4);
    }

    #[test]
    fn test_band_rows() {
        let mut analyzer = SpectralAnalyzer::new(2048, 512).unwrap();
        let spec = analyzer.analyze(&vec![0.0; 4096], 44000).unwrap();
        let rows = spec.band_rows(4800.0, 7200.0);
        let freqs = spec.frequencies();
        assert!(freqs[rows.start] >= 4800.0);
        assert!(freqs[rows.start - 1] < 4800.0);
        assert!(freqs[rows.end - 1] <= 7200.0);
        assert!(freqs[rows.end] > 7200.0);

        let view = Spectrogram::restrict_rows(spec.magnitudes(), rows.clone());
        assert_eq!(view.nrows(), rows.len());
        assert_eq!(view.ncols(), spec.num_frames());
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(SpectralAnalyzer::new(0, 1).is_err());
        assert!(SpectralAnalyzer::new(2047, 512).is_err());
        assert!(SpectralAnalyzer::new(2048, 0).is_err());
        assert!(SpectralAnalyzer::new(2048, 4096).is_err());
    }
}
