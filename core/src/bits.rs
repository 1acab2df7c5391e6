//! Constellation points to framed bits
//!
//! Points are sorted, then folded into frames of `frame_size` bits. A point
//! decodes as 1 when its frequency bin lies above the threshold bin. Each
//! frame carries a parity bit over whatever bits it holds, so a short final
//! frame still gets one.

use crate::config::{FrameLayout, PeakOrder};
use ndarray::Array2;

/// Accepted constellation cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeakPoint {
    pub freq_bin: usize,
    pub time_bin: usize,
}

impl PeakPoint {
    pub fn new(freq_bin: usize, time_bin: usize) -> Self {
        Self { freq_bin, time_bin }
    }
}

/// All true cells of `cmap`, in row-major order
pub fn collect_peaks(cmap: &Array2<bool>) -> Vec<PeakPoint> {
    cmap.indexed_iter()
        .filter(|(_, &accepted)| accepted)
        .map(|((freq_bin, time_bin), _)| PeakPoint::new(freq_bin, time_bin))
        .collect()
}

/// Stable lexicographic sort by the key order `order` selects
pub fn sort_peaks(peaks: &mut [PeakPoint], order: PeakOrder) {
    match order {
        PeakOrder::FrequencyMajor => peaks.sort_by_key(|p| (p.freq_bin, p.time_bin)),
        PeakOrder::TimeMajor => peaks.sort_by_key(|p| (p.time_bin, p.freq_bin)),
    }
}

/// Decoded group of bits with its parity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bits: Vec<u8>,
    parity: u8,
}

impl Frame {
    pub fn new(bits: Vec<u8>, layout: &FrameLayout) -> Self {
        let parity = layout.parity.parity(&bits);
        Self { bits, parity }
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn parity(&self) -> u8 {
        self.parity
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Labelled bit cells: `("Bit0", b0)`, `("Bit1", b1)`, ...
    pub fn labelled_bits(&self) -> impl Iterator<Item = (String, u8)> + '_ {
        self.bits
            .iter()
            .enumerate()
            .map(|(i, &bit)| (format!("Bit{}", i), bit))
    }
}

pub struct BitDecoder {
    threshold_bin: usize,
    order: PeakOrder,
    layout: FrameLayout,
}

impl BitDecoder {
    pub fn new(threshold_bin: usize, order: PeakOrder, layout: FrameLayout) -> Self {
        Self {
            threshold_bin,
            order,
            layout,
        }
    }

    pub fn threshold_bin(&self) -> usize {
        self.threshold_bin
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn bit_for(&self, point: &PeakPoint) -> u8 {
        u8::from(point.freq_bin > self.threshold_bin)
    }

    /// Collect and sort the constellation points of `cmap`
    pub fn ordered_peaks(&self, cmap: &Array2<bool>) -> Vec<PeakPoint> {
        let mut peaks = collect_peaks(cmap);
        sort_peaks(&mut peaks, self.order);
        peaks
    }

    /// Fold already-ordered points into frames
    pub fn frame_points(&self, points: &[PeakPoint]) -> Vec<Frame> {
        let frame_size = self.layout.frame_size;
        let (mut frames, partial) = points.iter().fold(
            (Vec::new(), Vec::with_capacity(frame_size)),
            |(mut frames, mut current): (Vec<Frame>, Vec<u8>), point| {
                current.push(self.bit_for(point));
                if current.len() == frame_size {
                    frames.push(Frame::new(current, &self.layout));
                    (frames, Vec::with_capacity(frame_size))
                } else {
                    (frames, current)
                }
            },
        );
        if !partial.is_empty() {
            frames.push(Frame::new(partial, &self.layout));
        }
        frames
    }

    /// Decode a constellation grid into its ordered peaks and their frames
    pub fn decode(&self, cmap: &Array2<bool>) -> (Vec<PeakPoint>, Vec<Frame>) {
        let peaks = self.ordered_peaks(cmap);
        let frames = self.frame_points(&peaks);
        if frames.is_empty() {
            log::warn!("No constellation peaks found; decoded zero frames");
        } else {
            log::debug!("Decoded {} peaks into {} frames", peaks.len(), frames.len());
        }
        (peaks, frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParityScheme;

    fn decoder(order: PeakOrder) -> BitDecoder {
        BitDecoder::new(250, order, FrameLayout::default())
    }

    #[test]
    fn test_all_false_grid_yields_no_frames() {
        let cmap = Array2::from_elem((8, 40), false);
        let (peaks, frames) = decoder(PeakOrder::FrequencyMajor).decode(&cmap);
        assert!(peaks.is_empty());
        assert!(frames.is_empty());
    }

    #[test]
    fn test_sort_frequency_major() {
        let mut peaks = vec![
            PeakPoint::new(300, 1),
            PeakPoint::new(200, 9),
            PeakPoint::new(200, 3),
            PeakPoint::new(100, 50),
        ];
        sort_peaks(&mut peaks, PeakOrder::FrequencyMajor);
        assert_eq!(
            peaks,
            vec![
                PeakPoint::new(100, 50),
                PeakPoint::new(200, 3),
                PeakPoint::new(200, 9),
                PeakPoint::new(300, 1),
            ]
        );

        let mut again = peaks.clone();
        again.reverse();
        sort_peaks(&mut again, PeakOrder::FrequencyMajor);
        assert_eq!(again, peaks);
    }

    #[test]
    fn test_sort_time_major() {
        let mut peaks = vec![
            PeakPoint::new(300, 1),
            PeakPoint::new(200, 9),
            PeakPoint::new(100, 9),
        ];
        sort_peaks(&mut peaks, PeakOrder::TimeMajor);
        assert_eq!(
            peaks,
            vec![
                PeakPoint::new(300, 1),
                PeakPoint::new(100, 9),
                PeakPoint::new(200, 9),
            ]
        );
    }

    #[test]
    fn test_eight_points_one_frame() {
        let points: Vec<PeakPoint> = [300, 310, 320, 330, 340, 100, 110, 120]
            .iter()
            .enumerate()
            .map(|(t, &f)| PeakPoint::new(f, t))
            .collect();
        let frames = decoder(PeakOrder::TimeMajor).frame_points(&points);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].bits(), &[1, 1, 1, 1, 1, 0, 0, 0]);
        assert_eq!(frames[0].parity(), 1);
    }

    #[test]
    fn test_eight_peaks_from_grid_in_time_order() {
        let mut cmap = Array2::from_elem((400, 100), false);
        for (t, f) in [300, 310, 320, 330, 340, 100, 110, 120].iter().enumerate() {
            cmap[[*f, t * 10]] = true;
        }
        let (peaks, frames) = decoder(PeakOrder::TimeMajor).decode(&cmap);
        assert_eq!(peaks.len(), 8);
        assert_eq!(peaks[0], PeakPoint::new(300, 0));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].bits(), &[1, 1, 1, 1, 1, 0, 0, 0]);
        assert_eq!(frames[0].parity(), 1);

        // Frequency-major ordering puts the low bins first
        let (peaks, frames) = decoder(PeakOrder::FrequencyMajor).decode(&cmap);
        assert_eq!(peaks[0], PeakPoint::new(100, 50));
        assert_eq!(frames[0].bits(), &[0, 0, 0, 1, 1, 1, 1, 1]);
        assert_eq!(frames[0].parity(), 1);
    }

    #[test]
    fn test_nine_points_short_trailing_frame() {
        let mut points: Vec<PeakPoint> = (0..8).map(|t| PeakPoint::new(100, t)).collect();
        points.push(PeakPoint::new(260, 8));
        let frames = decoder(PeakOrder::TimeMajor).frame_points(&points);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].len(), 8);
        assert_eq!(frames[1].bits(), &[1]);
        assert_eq!(frames[1].parity(), 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        let d = decoder(PeakOrder::FrequencyMajor);
        assert_eq!(d.bit_for(&PeakPoint::new(250, 0)), 0);
        assert_eq!(d.bit_for(&PeakPoint::new(251, 0)), 1);
    }

    #[test]
    fn test_parity_invariant_holds_for_every_frame() {
        let points: Vec<PeakPoint> = (0..29)
            .map(|i| PeakPoint::new(if i % 3 == 0 { 300 } else { 200 }, i))
            .collect();
        let frames = decoder(PeakOrder::TimeMajor).frame_points(&points);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[3].len(), 5);
        for frame in &frames {
            let sum: u32 = frame.bits().iter().map(|&b| b as u32).sum();
            assert_eq!(frame.parity() as u32, sum % 2);
        }
    }

    #[test]
    fn test_custom_layout() {
        let layout = FrameLayout {
            frame_size: 4,
            parity: ParityScheme::Odd,
        };
        let d = BitDecoder::new(250, PeakOrder::TimeMajor, layout);
        let points: Vec<PeakPoint> = (0..6).map(|t| PeakPoint::new(300, t)).collect();
        let frames = d.frame_points(&points);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].bits(), &[1, 1, 1, 1]);
        assert_eq!(frames[0].parity(), 1);
        assert_eq!(frames[1].bits(), &[1, 1]);
        assert_eq!(frames[1].parity(), 1);
    }

    #[test]
    fn test_labelled_bits() {
        let frame = Frame::new(vec![1, 0, 1], &FrameLayout::default());
        let labels: Vec<(String, u8)> = frame.labelled_bits().collect();
        assert_eq!(
            labels,
            vec![("Bit0".to_string(), 1), ("Bit1".to_string(), 0), ("Bit2".to_string(), 1)]
        );
    }
}
