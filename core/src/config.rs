use crate::error::{DemodError, Result};
use crate::{
    CAPTURE_DURATION_SECS, DB_MASK_THRESHOLD, DIST_FREQ, DIST_TIME, FILTER_ORDER, FRAME_SIZE,
    HIGH_CUT_HZ, HOP_SIZE, LOW_CUT_HZ, PEAK_THRESHOLD, SAMPLE_RATE, THRESHOLD_BIN, WINDOW_SIZE,
};

/// Frequency of STFT bin `bin`: `bin * sample_rate / window_size`
pub fn bin_to_hz(bin: usize, sample_rate: u32, window_size: usize) -> f32 {
    bin as f32 * sample_rate as f32 / window_size as f32
}

/// Convert a frequency in Hz to the STFT bin it falls in.
///
/// Uses `floor(hz * window_size / sample_rate)`. For integer bins `k`,
/// `k > hz_to_bin(f)` holds exactly when `bin_to_hz(k) > f`, so a bin
/// comparison against the converted value matches a Hertz comparison.
pub fn hz_to_bin(hz: f32, sample_rate: u32, window_size: usize) -> usize {
    if hz <= 0.0 {
        return 0;
    }
    (hz as f64 * window_size as f64 / sample_rate as f64).floor() as usize
}

/// Threshold deciding whether a peak decodes as 1 or 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BitThreshold {
    /// Compare the peak's frequency-bin index directly
    Bin(usize),
    /// Physical frequency, converted with [`hz_to_bin`]
    Hertz(f32),
}

impl BitThreshold {
    /// Resolve to a bin index for the given STFT geometry
    pub fn to_bin(&self, sample_rate: u32, window_size: usize) -> usize {
        match *self {
            BitThreshold::Bin(bin) => bin,
            BitThreshold::Hertz(hz) => hz_to_bin(hz, sample_rate, window_size),
        }
    }
}

/// Parity computed over each frame's data bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParityScheme {
    /// Sum of the bits modulo 2
    #[default]
    Even,
    /// Complement of even parity
    Odd,
}

impl ParityScheme {
    pub fn parity(&self, bits: &[u8]) -> u8 {
        let even = (bits.iter().map(|&b| b as u32).sum::<u32>() % 2) as u8;
        match self {
            ParityScheme::Even => even,
            ParityScheme::Odd => 1 - even,
        }
    }
}

/// Ordering applied to extracted peaks before framing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakOrder {
    /// Frequency bin first, time bin second
    #[default]
    FrequencyMajor,
    /// Time bin first, frequency bin second
    TimeMajor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub frame_size: usize,
    pub parity: ParityScheme,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            frame_size: FRAME_SIZE,
            parity: ParityScheme::Even,
        }
    }
}

/// Per-run demodulator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DemodConfig {
    pub sample_rate: u32,
    pub duration_secs: f32,
    pub low_cut_hz: f32,
    pub high_cut_hz: f32,
    pub order: usize,
    pub window_size: usize,
    pub hop_size: usize,
    /// Half-width of the peak neighborhood along the frequency axis (bins)
    pub dist_freq: usize,
    /// Half-width of the peak neighborhood along the time axis (frames)
    pub dist_time: usize,
    /// Raw magnitude a neighborhood maximum must exceed
    pub thresh: f32,
    /// Multiplier on the global max dB for the decibel mask
    pub db_thresh: f32,
    pub bit_threshold: BitThreshold,
    pub peak_order: PeakOrder,
    pub layout: FrameLayout,
}

impl Default for DemodConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            duration_secs: CAPTURE_DURATION_SECS,
            low_cut_hz: LOW_CUT_HZ,
            high_cut_hz: HIGH_CUT_HZ,
            order: FILTER_ORDER,
            window_size: WINDOW_SIZE,
            hop_size: HOP_SIZE,
            dist_freq: DIST_FREQ,
            dist_time: DIST_TIME,
            thresh: PEAK_THRESHOLD,
            db_thresh: DB_MASK_THRESHOLD,
            bit_threshold: BitThreshold::Bin(THRESHOLD_BIN),
            peak_order: PeakOrder::FrequencyMajor,
            layout: FrameLayout::default(),
        }
    }
}

impl DemodConfig {
    /// Number of samples a capture of `duration_secs` holds
    pub fn capture_samples(&self) -> usize {
        (self.duration_secs as f64 * self.sample_rate as f64).round() as usize
    }

    /// Bin index used for bit classification
    pub fn threshold_bin(&self) -> usize {
        self.bit_threshold.to_bin(self.sample_rate, self.window_size)
    }

    /// Check everything except the filter cutoffs, which
    /// [`crate::BandpassFilter::design`] validates on its own.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(DemodError::InvalidConfig("sample rate must be positive".into()));
        }
        if !(self.duration_secs > 0.0) {
            return Err(DemodError::InvalidConfig(format!(
                "duration must be positive, got {}",
                self.duration_secs
            )));
        }
        if self.window_size < 2 {
            return Err(DemodError::InvalidConfig(format!(
                "window size must be at least 2, got {}",
                self.window_size
            )));
        }
        if self.hop_size == 0 || self.hop_size > self.window_size {
            return Err(DemodError::InvalidConfig(format!(
                "hop size must be in 1..={}, got {}",
                self.window_size, self.hop_size
            )));
        }
        if self.layout.frame_size == 0 {
            return Err(DemodError::InvalidConfig("frame size must be positive".into()));
        }
        if !self.thresh.is_finite() || !self.db_thresh.is_finite() {
            return Err(DemodError::InvalidConfig("thresholds must be finite".into()));
        }
        Ok(())
    }
}
