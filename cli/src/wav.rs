use crate::error::CliError;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tonepeak_core::{AudioSource, DemodError, SampleBuffer};

/// Mono WAV file played back as one fixed-duration capture
pub struct WavSource {
    reader: Option<WavReader<BufReader<File>>>,
    spec: WavSpec,
    capture_secs: f32,
}

impl WavSource {
    pub fn open(path: &Path, capture_secs: f32) -> Result<Self, CliError> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        log::info!(
            "Read WAV: {} Hz, {} channels, {} bits",
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample
        );

        if spec.channels != 1 {
            return Err(CliError::UnsupportedFormat(format!(
                "{} channels (only mono captures are decoded)",
                spec.channels
            )));
        }
        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 16) | (SampleFormat::Float, 32) => {}
            (format, bits) => {
                return Err(CliError::UnsupportedFormat(format!(
                    "{:?} with {} bits per sample",
                    format, bits
                )))
            }
        }

        Ok(Self {
            reader: Some(reader),
            spec,
            capture_secs,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn read_samples(reader: WavReader<BufReader<File>>, spec: WavSpec) -> hound::Result<Vec<f32>> {
        match spec.sample_format {
            SampleFormat::Int => reader
                .into_samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect(),
            SampleFormat::Float => reader.into_samples::<f32>().collect(),
        }
    }
}

impl AudioSource for WavSource {
    fn capture(&mut self) -> tonepeak_core::Result<SampleBuffer> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| DemodError::Capture("WAV file already consumed".into()))?;
        let samples = Self::read_samples(reader, self.spec)
            .map_err(|e| DemodError::Capture(e.to_string()))?;
        log::info!("Extracted {} samples", samples.len());

        let target = (self.capture_secs as f64 * self.spec.sample_rate as f64).round() as usize;
        SampleBuffer::new(samples, self.spec.sample_rate)?.fit_to_len(target)
    }
}

/// Write mono samples as 16-bit PCM
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), CliError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
