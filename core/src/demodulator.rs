use crate::bandpass::BandpassFilter;
use crate::bits::{BitDecoder, Frame, PeakPoint};
use crate::config::DemodConfig;
use crate::constellation::ConstellationExtractor;
use crate::error::{DemodError, Result};
use crate::io::{AudioSource, ResultSink};
use crate::samples::SampleBuffer;
use crate::spectral::{SpectralAnalyzer, Spectrogram};
use crate::table::ResultTable;
use ndarray::Array2;

/// Everything one decode run produced
#[derive(Debug, Clone)]
pub struct Decoded {
    pub spectrogram: Spectrogram,
    pub decibels: Array2<f32>,
    pub constellation: Array2<bool>,
    pub peaks: Vec<PeakPoint>,
    pub frames: Vec<Frame>,
}

/// Carrier-band slice of the dB spectrogram and constellation, for plotting
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayView {
    pub frequencies: Vec<f32>,
    pub frame_times: Vec<f32>,
    pub decibels: Array2<f32>,
    pub constellation: Array2<bool>,
}

/// Batch demodulator: band-pass, STFT, constellation, bits
pub struct Demodulator {
    config: DemodConfig,
    filter: BandpassFilter,
    analyzer: SpectralAnalyzer,
    extractor: ConstellationExtractor,
    bits: BitDecoder,
}

impl Demodulator {
    pub fn new(config: DemodConfig) -> Result<Self> {
        config.validate()?;
        let filter = BandpassFilter::design(
            config.low_cut_hz,
            config.high_cut_hz,
            config.order,
            config.sample_rate,
        )?;
        let analyzer = SpectralAnalyzer::new(config.window_size, config.hop_size)?;
        let extractor = ConstellationExtractor::new(
            config.dist_freq,
            config.dist_time,
            config.thresh,
            config.db_thresh,
        );
        let bits = BitDecoder::new(config.threshold_bin(), config.peak_order, config.layout);

        Ok(Self {
            config,
            filter,
            analyzer,
            extractor,
            bits,
        })
    }

    pub fn config(&self) -> &DemodConfig {
        &self.config
    }

    pub fn filter(&self) -> &BandpassFilter {
        &self.filter
    }

    /// Run every stage on `buffer`
    pub fn demodulate(&mut self, buffer: &SampleBuffer) -> Result<Decoded> {
        if buffer.sample_rate() != self.config.sample_rate {
            return Err(DemodError::InvalidConfig(format!(
                "buffer sample rate {} Hz does not match configured {} Hz",
                buffer.sample_rate(),
                self.config.sample_rate
            )));
        }

        let filtered = self.filter.apply(buffer.samples())?;
        let spectrogram = self.analyzer.analyze(&filtered, buffer.sample_rate())?;
        let decibels = spectrogram.decibels();
        let constellation = self
            .extractor
            .extract(spectrogram.magnitudes(), decibels.view());
        let (peaks, frames) = self.bits.decode(&constellation);
        log::info!(
            "Decoded {} peaks into {} frames from {:.2}s capture ({} bins x {} frames grid)",
            peaks.len(),
            frames.len(),
            buffer.duration_secs(),
            spectrogram.num_bins(),
            spectrogram.num_frames()
        );

        Ok(Decoded {
            spectrogram,
            decibels,
            constellation,
            peaks,
            frames,
        })
    }

    /// Demodulate and pair the frames with the sender's parity bits
    pub fn decode_table(&mut self, buffer: &SampleBuffer, expected_parity: &[u8]) -> Result<ResultTable> {
        let decoded = self.demodulate(buffer)?;
        ResultTable::build(decoded.frames, expected_parity, self.config.layout.frame_size)
    }

    /// Restrict the dB spectrogram and constellation to the carrier band
    pub fn display_view(&self, decoded: &Decoded) -> DisplayView {
        let spectrogram = &decoded.spectrogram;
        let rows = spectrogram.band_rows(self.config.low_cut_hz, self.config.high_cut_hz);
        DisplayView {
            frequencies: spectrogram.frequencies()[rows.clone()].to_vec(),
            frame_times: (0..spectrogram.num_frames())
                .map(|t| spectrogram.frame_time(t))
                .collect(),
            decibels: Spectrogram::restrict_rows(decoded.decibels.view(), rows.clone()),
            constellation: Spectrogram::restrict_rows(decoded.constellation.view(), rows),
        }
    }

    /// Capture from `source`, decode, and hand the table to `sink`
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K, expected_parity: &[u8]) -> Result<ResultTable>
    where
        S: AudioSource + ?Sized,
        K: ResultSink + ?Sized,
    {
        let buffer = source.capture()?;
        let table = self.decode_table(&buffer, expected_parity)?;
        sink.consume(&table)?;
        Ok(table)
    }
}
