use crate::bits::Frame;
use crate::error::{DemodError, Result};

/// Frame annotated with the parity the sender reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub frame: Frame,
    pub sent_parity: u8,
    pub matches: bool,
}

/// Decoded frames with expected parity and match flags, ready for export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    frame_size: usize,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    /// Pair `frames` with `expected_parity`; lengths must agree
    pub fn build(frames: Vec<Frame>, expected_parity: &[u8], frame_size: usize) -> Result<Self> {
        if expected_parity.len() != frames.len() {
            return Err(DemodError::ConfigurationMismatch {
                expected: expected_parity.len(),
                frames: frames.len(),
            });
        }

        let rows = frames
            .into_iter()
            .zip(expected_parity)
            .map(|(frame, &sent_parity)| ResultRow {
                matches: frame.parity() == sent_parity,
                frame,
                sent_parity,
            })
            .collect();

        Ok(Self { frame_size, rows })
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn match_count(&self) -> usize {
        self.rows.iter().filter(|r| r.matches).count()
    }

    /// `Bit0..Bit{n-1}`, `Parity`, `Sent Parity`, `Match`
    pub fn columns(&self) -> Vec<String> {
        (0..self.frame_size)
            .map(|i| format!("Bit{}", i))
            .chain(["Parity", "Sent Parity", "Match"].iter().map(|s| s.to_string()))
            .collect()
    }

    /// One cell string per column; missing bits of a short row are empty
    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let bits = row.frame.bits();
                (0..self.frame_size)
                    .map(|i| bits.get(i).map(|b| b.to_string()).unwrap_or_default())
                    .chain([
                        row.frame.parity().to_string(),
                        row.sent_parity.to_string(),
                        (if row.matches { "Yes" } else { "No" }).to_string(),
                    ])
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FrameLayout;

    fn frames() -> Vec<Frame> {
        let layout = FrameLayout::default();
        vec![
            Frame::new(vec![1, 1, 1, 1, 1, 0, 0, 0], &layout),
            Frame::new(vec![0, 0, 1, 1, 0, 0, 0, 0], &layout),
            Frame::new(vec![1], &layout),
        ]
    }

    #[test]
    fn test_build_and_match() {
        let table = ResultTable::build(frames(), &[1, 1, 1], 8).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.rows()[0].matches);
        assert!(!table.rows()[1].matches);
        assert!(table.rows()[2].matches);
        assert_eq!(table.match_count(), 2);
    }

    #[test]
    fn test_short_expected_parity_fails() {
        let err = ResultTable::build(frames(), &[1, 0], 8).unwrap_err();
        assert!(matches!(
            err,
            DemodError::ConfigurationMismatch {
                expected: 2,
                frames: 3
            }
        ));
    }

    #[test]
    fn test_long_expected_parity_fails() {
        assert!(ResultTable::build(frames(), &[1, 0, 1, 0], 8).is_err());
    }

    #[test]
    fn test_empty_table() {
        let table = ResultTable::build(Vec::new(), &[], 8).unwrap();
        assert!(table.is_empty());
        assert!(table.records().is_empty());
    }

    #[test]
    fn test_columns_and_records() {
        let table = ResultTable::build(frames(), &[1, 0, 0], 8).unwrap();
        let columns = table.columns();
        assert_eq!(columns.len(), 11);
        assert_eq!(columns[0], "Bit0");
        assert_eq!(columns[7], "Bit7");
        assert_eq!(&columns[8..], &["Parity", "Sent Parity", "Match"]);

        let records = table.records();
        assert_eq!(records[0], vec!["1", "1", "1", "1", "1", "0", "0", "0", "1", "1", "Yes"]);
        assert_eq!(records[1][10], "Yes");
        // Short row leaves missing bit cells empty
        assert_eq!(records[2], vec!["1", "", "", "", "", "", "", "", "1", "0", "No"]);
    }
}
