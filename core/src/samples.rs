use crate::error::{DemodError, Result};

/// Mono capture at a known sample rate.
///
/// Always non-empty with finite samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(DemodError::InvalidSampleBuffer("buffer is empty".into()));
        }
        if sample_rate == 0 {
            return Err(DemodError::InvalidSampleBuffer("sample rate must be positive".into()));
        }
        if let Some(pos) = samples.iter().position(|s| !s.is_finite()) {
            return Err(DemodError::InvalidSampleBuffer(format!(
                "non-finite sample at index {}",
                pos
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Truncate or zero-pad to exactly `len` samples
    pub fn fit_to_len(mut self, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(DemodError::InvalidSampleBuffer("target length is zero".into()));
        }
        if self.samples.len() > len {
            log::warn!(
                "Truncating capture from {} to {} samples",
                self.samples.len(),
                len
            );
        }
        self.samples.resize(len, 0.0);
        Ok(self)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            SampleBuffer::new(Vec::new(), 44000),
            Err(DemodError::InvalidSampleBuffer(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite() {
        let err = SampleBuffer::new(vec![0.0, f32::NAN, 0.5], 44000).unwrap_err();
        assert!(err.to_string().contains("index 1"));
        assert!(SampleBuffer::new(vec![f32::INFINITY], 44000).is_err());
    }

    #[test]
    fn test_fit_to_len() {
        let buffer = SampleBuffer::new(vec![1.0; 10], 100).unwrap();
        let padded = buffer.clone().fit_to_len(15).unwrap();
        assert_eq!(padded.len(), 15);
        assert_eq!(padded.samples()[14], 0.0);

        let truncated = buffer.fit_to_len(4).unwrap();
        assert_eq!(truncated.samples(), &[1.0; 4]);
        assert!((truncated.duration_secs() - 0.04).abs() < 1e-6);
    }
}
