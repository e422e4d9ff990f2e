//! CIGAR element classification and coordinate utilities
//!
//! All read offsets here assume hard clips have already been normalized to soft clips, so a
//! hard-clip element consumes neither read nor reference coordinates.
//!

use rust_htslib::bam::record::{Cigar, CigarString};

/// Is the cigar element any clip type?
///
pub fn is_clip(c: &Cigar) -> bool {
    matches!(c, Cigar::SoftClip(_) | Cigar::HardClip(_))
}

/// Is the cigar element any of the alignment match types?
///
pub fn is_alignment_match(c: &Cigar) -> bool {
    matches!(c, Cigar::Match(_) | Cigar::Equal(_) | Cigar::Diff(_))
}

pub fn is_indel(c: &Cigar) -> bool {
    matches!(c, Cigar::Ins(_) | Cigar::Del(_))
}

pub fn get_cigarseg_read_offset(c: &Cigar) -> usize {
    use Cigar::*;
    match c {
        Ins(len) | SoftClip(len) | Diff(len) | Equal(len) | Match(len) => *len as usize,
        _ => 0,
    }
}

pub fn get_cigarseg_ref_offset(c: &Cigar) -> i64 {
    use Cigar::*;
    match c {
        Del(len) | RefSkip(len) | Diff(len) | Equal(len) | Match(len) => *len as i64,
        _ => 0,
    }
}

/// A utility method to track ref and read positions while iterating through a cigar string
///
pub fn update_ref_and_read_pos(c: &Cigar, ref_pos: &mut i64, read_pos: &mut usize) {
    *read_pos += get_cigarseg_read_offset(c);
    *ref_pos += get_cigarseg_ref_offset(c);
}

/// Total read length implied by the cigar alignment, including soft-clipped bases
///
pub fn get_cigar_read_length(cigar: &[Cigar]) -> usize {
    cigar.iter().map(get_cigarseg_read_offset).sum()
}

/// Report the reference offset of the cigar alignment
///
pub fn get_cigar_ref_offset(cigar: &[Cigar]) -> i64 {
    cigar.iter().map(get_cigarseg_ref_offset).sum()
}

/// Count of read bases placed on the reference or inserted, excluding all clipping
///
/// This is the count used to decide if an indel has enough aligned sequence on either side.
///
pub fn get_unclipped_read_base_count(cigar: &[Cigar]) -> usize {
    cigar
        .iter()
        .filter(|x| !is_clip(x))
        .map(get_cigarseg_read_offset)
        .sum()
}

/// Return a copy of the cigar element with its length replaced
///
pub fn with_cigarseg_len(c: &Cigar, len: u32) -> Cigar {
    use Cigar::*;
    match c {
        Match(_) => Match(len),
        Ins(_) => Ins(len),
        Del(_) => Del(len),
        RefSkip(_) => RefSkip(len),
        SoftClip(_) => SoftClip(len),
        HardClip(_) => HardClip(len),
        Pad(_) => Pad(len),
        Equal(_) => Equal(len),
        Diff(_) => Diff(len),
    }
}

/// Compress CIGAR string down to canonical format:
///
/// 1. Convert any matching adjacent cigar elements into a single element
/// 2. Remove any zero-length elements
///
pub fn compress_cigar(cigar_in: &[Cigar]) -> Vec<Cigar> {
    let mut cigar_out: Vec<Cigar> = Vec::new();
    for elem in cigar_in.iter().filter(|x| x.len() > 0) {
        match cigar_out.last_mut() {
            Some(last) if std::mem::discriminant(last) == std::mem::discriminant(elem) => {
                *last = with_cigarseg_len(last, last.len() + elem.len());
            }
            _ => cigar_out.push(*elem),
        }
    }
    cigar_out
}

/// Accumulates cigar elements for one synthesized alignment
///
/// The builder is consumed by `finish`, so each assembled cigar is finalized exactly once.
///
#[derive(Default)]
pub struct CigarBuilder {
    elements: Vec<Cigar>,
}

impl CigarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, c: Cigar) -> Self {
        self.elements.push(c);
        self
    }

    pub fn extend(mut self, cigar: &[Cigar]) -> Self {
        self.elements.extend_from_slice(cigar);
        self
    }

    /// Finalize to canonical form, see `compress_cigar`
    pub fn finish(self) -> CigarString {
        CigarString(compress_cigar(&self.elements))
    }
}
