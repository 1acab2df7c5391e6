//! Acoustic tone-burst demodulator
//!
//! Recovers bits from tone bursts transmitted in a narrow carrier band:
//! band-pass isolation, STFT magnitude grid, constellation peak picking,
//! then framing with a parity bit per frame.

pub mod error;
pub mod config;
pub mod samples;
pub mod bandpass;
pub mod spectral;
pub mod constellation;
pub mod bits;
pub mod table;
pub mod io;
pub mod tone;
pub mod demodulator;

pub use bandpass::BandpassFilter;
pub use bits::{BitDecoder, Frame, PeakPoint};
pub use config::{hz_to_bin, BitThreshold, DemodConfig, FrameLayout, ParityScheme, PeakOrder};
pub use constellation::ConstellationExtractor;
pub use demodulator::{Decoded, Demodulator, DisplayView};
pub use error::{DemodError, Result};
pub use io::{AudioSource, BufferSource, MemorySink, ResultSink};
pub use samples::SampleBuffer;
pub use spectral::{SpectralAnalyzer, Spectrogram};
pub use table::{ResultRow, ResultTable};
pub use tone::ToneBurstModulator;

// Capture configuration
pub const SAMPLE_RATE: u32 = 44000;
pub const CAPTURE_DURATION_SECS: f32 = 14.0;

// Carrier band
pub const LOW_CUT_HZ: f32 = 4800.0;
pub const HIGH_CUT_HZ: f32 = 7200.0;
pub const FILTER_ORDER: usize = 4;

// STFT configuration
pub const WINDOW_SIZE: usize = 2048;
pub const HOP_SIZE: usize = WINDOW_SIZE / 4; // 512

// Constellation configuration
pub const DIST_FREQ: usize = 7;
pub const DIST_TIME: usize = 7;
pub const PEAK_THRESHOLD: f32 = 2.0;
pub const DB_MASK_THRESHOLD: f32 = 2.0;

// Decibel view: floor relative to the grid maximum
pub const TOP_DB: f32 = 80.0;

// Bit classification: frequency-bin index above this decodes as 1
pub const THRESHOLD_BIN: usize = 250;

// Frame configuration
pub const FRAME_SIZE: usize = 8;
