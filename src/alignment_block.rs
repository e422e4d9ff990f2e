//! Decomposition of a cigar alignment into reference/read coordinate blocks
//!

use std::fmt;

use rust_htslib::bam::record::Cigar;

use crate::cigar_utils::{is_clip, update_ref_and_read_pos};
use crate::errors::MalformedCigarError;

/// The reference and read coordinates covered by a single cigar element
///
/// All coordinates are 1-indexed and fully closed, [start,stop]. An element which does not
/// consume a coordinate type has an empty range in that coordinate, represented as
/// stop == start - 1. For example a deletion has an empty read range starting at the read
/// position immediately after the deletion, and a soft-clip has an empty reference range.
///
#[derive(Clone, Eq, PartialEq)]
pub struct AlignmentBlock {
    pub op: Cigar,
    pub ref_start: i64,
    pub ref_stop: i64,
    pub read_start: i64,
    pub read_stop: i64,
}

impl AlignmentBlock {
    pub fn ref_len(&self) -> i64 {
        self.ref_stop - self.ref_start + 1
    }

    pub fn read_len(&self) -> i64 {
        self.read_stop - self.read_start + 1
    }
}

impl fmt::Debug for AlignmentBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "AlignmentBlock: {} ref: [{}-{}] read: [{}-{}]",
            self.op, self.ref_start, self.ref_stop, self.read_start, self.read_stop
        )
    }
}

/// Decompose the alignment without structural checks
fn get_alignment_blocks(start: i64, cigar: &[Cigar]) -> Vec<AlignmentBlock> {
    let mut ref_pos = start;
    let mut read_pos = 1;
    cigar
        .iter()
        .map(|c| {
            let (ref_start, read_start) = (ref_pos, read_pos as i64);
            update_ref_and_read_pos(c, &mut ref_pos, &mut read_pos);
            AlignmentBlock {
                op: *c,
                ref_start,
                ref_stop: ref_pos - 1,
                read_start,
                read_stop: read_pos as i64 - 1,
            }
        })
        .collect()
}

/// Convert a cigar alignment into an ordered list of alignment blocks, one per cigar element
///
/// # Arguments
/// * `start` - 1-indexed reference position of the first aligned base
///
/// Hard-clip elements consume neither reference nor read positions, so hard clips should be
/// normalized to soft clips before decomposition when read positions need to line up with the
/// stored read sequence.
///
pub fn decompose_alignment(
    start: i64,
    cigar: &[Cigar],
) -> Result<Vec<AlignmentBlock>, MalformedCigarError> {
    if cigar.is_empty() {
        return Err(MalformedCigarError::Empty);
    }
    if let Some((index, c)) = cigar.iter().enumerate().find(|(_, c)| c.len() == 0) {
        return Err(MalformedCigarError::ZeroLengthElement {
            index,
            element: c.to_string(),
        });
    }
    Ok(get_alignment_blocks(start, cigar))
}

/// Read range from the first to the last non-clipped block
///
/// Returns None if the alignment is entirely clipped
///
pub fn get_mapped_read_range(blocks: &[AlignmentBlock]) -> Option<(i64, i64)> {
    let first = blocks.iter().find(|x| !is_clip(&x.op))?;
    let last = blocks.iter().rev().find(|x| !is_clip(&x.op))?;
    Some((first.read_start, last.read_stop))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_htslib::bam::record::CigarString;

    fn blocks_from_str(start: i64, cigar_str: &str) -> Vec<AlignmentBlock> {
        let cigar = CigarString::try_from(cigar_str).unwrap();
        decompose_alignment(start, &cigar).unwrap()
    }

    #[test]
    fn test_single_match_block() {
        let blocks = blocks_from_str(1000, "100M");
        assert_eq!(blocks.len(), 1);
        let b = &blocks[0];
        assert_eq!((b.ref_start, b.ref_stop), (1000, 1099));
        assert_eq!((b.read_start, b.read_stop), (1, 100));
        assert_eq!(b.ref_len(), 100);
        assert_eq!(b.read_len(), 100);
    }

    #[test]
    fn test_clipped_indel_blocks() {
        let blocks = blocks_from_str(100, "5S10M3D4I10M2N6M7S");
        let ref_ranges = blocks
            .iter()
            .map(|x| (x.ref_start, x.ref_stop))
            .collect::<Vec<_>>();
        let read_ranges = blocks
            .iter()
            .map(|x| (x.read_start, x.read_stop))
            .collect::<Vec<_>>();
        assert_eq!(
            ref_ranges,
            vec![
                (100, 99),
                (100, 109),
                (110, 112),
                (113, 112),
                (113, 122),
                (123, 124),
                (125, 130),
                (131, 130)
            ]
        );
        assert_eq!(
            read_ranges,
            vec![
                (1, 5),
                (6, 15),
                (16, 15),
                (16, 19),
                (20, 29),
                (30, 29),
                (30, 35),
                (36, 42)
            ]
        );
    }

    #[test]
    fn test_blocks_are_read_contiguous() {
        let blocks = blocks_from_str(50, "3S2M1I4M2D8M1I5S");
        for (a, b) in blocks.iter().zip(blocks.iter().skip(1)) {
            assert_eq!(a.read_stop + 1, b.read_start);
            assert!(b.ref_start >= a.ref_start);
        }
    }

    #[test]
    fn test_hard_clip_consumes_nothing() {
        let blocks = blocks_from_str(10, "5H10M");
        assert_eq!(blocks[0].read_len(), 0);
        assert_eq!(blocks[0].ref_len(), 0);
        assert_eq!((blocks[1].read_start, blocks[1].ref_start), (1, 10));
    }

    #[test]
    fn test_malformed_cigar() {
        assert_eq!(
            decompose_alignment(1, &[]),
            Err(MalformedCigarError::Empty)
        );

        let cigar = vec![Cigar::Match(10), Cigar::Del(0), Cigar::Match(5)];
        assert_eq!(
            decompose_alignment(1, &cigar),
            Err(MalformedCigarError::ZeroLengthElement {
                index: 1,
                element: "0D".to_string()
            })
        );
    }

    #[test]
    fn test_get_mapped_read_range() {
        let blocks = blocks_from_str(100, "10S20M5I20M15S");
        assert_eq!(get_mapped_read_range(&blocks), Some((11, 55)));

        let blocks = blocks_from_str(100, "10S");
        assert_eq!(get_mapped_read_range(&blocks), None);
    }
}
