//! Butterworth band-pass design and zero-phase filtering
//!
//! The filter is designed with `sci_rs` as cascaded second-order sections
//! for filtering, plus the equivalent transfer function for inspection.
//! Filtering runs the sections forward and then backward (`sosfiltfilt`),
//! cancelling the phase response so tone timing is preserved. Edges are
//! handled with an odd extension and steady-state initial conditions.

use crate::error::{DemodError, Result};
use sci_rs::signal::filter::design::{
    butter_dyn, DigitalFilter, FilterBandType, FilterOutputType, Sos,
};
use sci_rs::signal::filter::sosfiltfilt_dyn;

/// Designed band-pass filter
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    sections: Vec<Sos<f64>>,
    b: Vec<f64>,
    a: Vec<f64>,
    low_hz: f32,
    high_hz: f32,
    order: usize,
    sample_rate: u32,
}

impl BandpassFilter {
    /// Design a Butterworth band-pass filter passing `low_hz..high_hz`
    pub fn design(low_hz: f32, high_hz: f32, order: usize, sample_rate: u32) -> Result<Self> {
        if order < 1 {
            return Err(DemodError::InvalidFilterSpec(format!(
                "order must be at least 1, got {}",
                order
            )));
        }
        if sample_rate == 0 {
            return Err(DemodError::InvalidFilterSpec("sample rate must be positive".into()));
        }
        let nyquist = 0.5 * sample_rate as f64;
        let (low, high) = (low_hz as f64, high_hz as f64);
        if !(low > 0.0) {
            return Err(DemodError::InvalidFilterSpec(format!(
                "low cutoff must be positive, got {} Hz",
                low_hz
            )));
        }
        if low >= high {
            return Err(DemodError::InvalidFilterSpec(format!(
                "low cutoff {} Hz must be below high cutoff {} Hz",
                low_hz, high_hz
            )));
        }
        if high >= nyquist {
            return Err(DemodError::InvalidFilterSpec(format!(
                "high cutoff {} Hz must be below Nyquist {} Hz",
                high_hz, nyquist
            )));
        }

        let band = vec![low / nyquist, high / nyquist];
        let sections = match butter(order, band.clone(), FilterOutputType::Sos) {
            DigitalFilter::Sos(sos) => sos.sos,
            _ => return Err(unexpected_output("second-order sections")),
        };
        let (b, a) = match butter(order, band, FilterOutputType::Ba) {
            DigitalFilter::Ba(ba) => (ba.b, ba.a),
            _ => return Err(unexpected_output("transfer function")),
        };
        log::debug!(
            "Designed order-{} band-pass {}-{} Hz at {} Hz ({} sections)",
            order,
            low_hz,
            high_hz,
            sample_rate,
            sections.len()
        );

        Ok(Self {
            sections,
            b,
            a,
            low_hz,
            high_hz,
            order,
            sample_rate,
        })
    }

    /// Transfer-function numerator
    pub fn numerator(&self) -> &[f64] {
        &self.b
    }

    /// Transfer-function denominator, `a[0] == 1`
    pub fn denominator(&self) -> &[f64] {
        &self.a
    }

    pub fn sections(&self) -> &[Sos<f64>] {
        &self.sections
    }

    pub fn low_hz(&self) -> f32 {
        self.low_hz
    }

    pub fn high_hz(&self) -> f32 {
        self.high_hz
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples of odd extension added at each end before filtering.
    ///
    /// Three times the tap count of the cascade, less the sections whose
    /// last numerator and denominator taps are both zero.
    pub fn padlen(&self) -> usize {
        let taps = 2 * self.sections.len() + 1;
        let b_zeros = self.sections.iter().filter(|s| s.b[2] == 0.0).count();
        let a_zeros = self.sections.iter().filter(|s| s.a[2] == 0.0).count();
        3 * (taps - b_zeros.min(a_zeros))
    }

    /// Zero-phase filter `samples`; output has the same length
    pub fn apply(&self, samples: &[f32]) -> Result<Vec<f32>> {
        let padlen = self.padlen();
        if samples.len() <= padlen {
            return Err(DemodError::InsufficientSamples {
                needed: padlen,
                got: samples.len(),
            });
        }

        let filtered = sosfiltfilt_dyn(samples.iter().map(|&s| s as f64), &self.sections);
        Ok(filtered.into_iter().map(|v| v as f32).collect())
    }
}

/// Digital Butterworth band-pass for normalized band edges (1 is Nyquist)
fn butter(order: usize, band: Vec<f64>, output: FilterOutputType) -> DigitalFilter<f64> {
    butter_dyn(
        order,
        band,
        Some(FilterBandType::Bandpass),
        Some(false),
        Some(output),
        None,
    )
}

fn unexpected_output(kind: &str) -> DemodError {
    DemodError::InvalidFilterSpec(format!("filter design did not return {}", kind))
}
