//! Move indels in an alignment to their leftmost equivalent position
//!
//! Combined chimeric alignments place each indel exactly where the two partial alignments meet,
//! which for indels in repetitive sequence is an arbitrary choice among equivalent positions.
//! Left-shifting gives every such indel a single canonical representation.
//!

use rust_htslib::bam::record::Cigar;

use crate::cigar_utils::{compress_cigar, is_alignment_match, update_ref_and_read_pos};

/// Count of positions an indel can be translated to the left without changing the alignment's
/// edit distance
///
/// Ranges are zero-indexed, half-open and start at the first position affected by the indel. For
/// instance the deletion 2M1D2M has ref range [2,3) and read range [2,2).
///
/// Base comparison is case-insensitive so that soft-masked reference sequence is handled.
///
fn get_left_homology_len(
    ref_seq: &[u8],
    ref_range: (i64, i64),
    read_seq: &[u8],
    read_range: (usize, usize),
) -> u32 {
    let max_offset = std::cmp::min(ref_range.0, read_range.0 as i64);
    let mut offset = 0;
    while offset < max_offset {
        let ref_base = ref_seq[(ref_range.1 - offset - 1) as usize];
        let read_base = read_seq[read_range.1 - offset as usize - 1];
        if !ref_base.eq_ignore_ascii_case(&read_base) {
            break;
        }
        offset += 1;
    }
    offset as u32
}

/// Adjacent insertion and deletion elements being shifted as a single event
struct IndelBlock {
    ref_start: i64,
    read_start: usize,
    del_size: u32,
    ins_size: u32,
}

/// Rebuilds a cigar with each indel block moved left into the preceding match block
///
struct LeftShiftBuilder<'a> {
    ref_seq: &'a [u8],
    read_seq: &'a [u8],

    /// Size of the match block which the next indel can shift into
    match_block_size: u32,

    indel_block: Option<IndelBlock>,
    shift_cigar: Vec<Cigar>,
}

impl<'a> LeftShiftBuilder<'a> {
    fn new(ref_seq: &'a [u8], read_seq: &'a [u8]) -> Self {
        Self {
            ref_seq,
            read_seq,
            match_block_size: 0,
            indel_block: None,
            shift_cigar: Vec::new(),
        }
    }

    fn add_element(&mut self, c: &Cigar, ref_pos: i64, read_pos: usize) {
        use Cigar::*;
        match c {
            Del(len) | Ins(len) if *len > 0 => {
                let block = self.indel_block.get_or_insert(IndelBlock {
                    ref_start: ref_pos,
                    read_start: read_pos,
                    del_size: 0,
                    ins_size: 0,
                });
                if let Del(_) = c {
                    block.del_size += len;
                } else {
                    block.ins_size += len;
                }
            }
            Del(_) | Ins(_) => {}
            Match(len) | Equal(len) | Diff(len) => {
                self.end_indel();
                self.match_block_size += len;
            }
            _ => self.add_other(Some(c)),
        }
    }

    fn end_indel(&mut self) {
        let Some(block) = self.indel_block.take() else {
            return;
        };

        let shift_len = get_left_homology_len(
            self.ref_seq,
            (block.ref_start, block.ref_start + block.del_size as i64),
            self.read_seq,
            (block.read_start, block.read_start + block.ins_size as usize),
        );

        let actual_shift_len = std::cmp::min(self.match_block_size, shift_len);
        let shifted_match_block_size = self.match_block_size - actual_shift_len;
        if shifted_match_block_size > 0 {
            self.shift_cigar.push(Cigar::Match(shifted_match_block_size));
        }
        self.match_block_size = actual_shift_len;

        // Combined insertion/deletion events are always written in "nImD" order
        if block.ins_size > 0 {
            self.shift_cigar.push(Cigar::Ins(block.ins_size));
        }
        if block.del_size > 0 {
            self.shift_cigar.push(Cigar::Del(block.del_size));
        }
    }

    fn add_other(&mut self, c: Option<&Cigar>) {
        self.end_indel();
        if self.match_block_size > 0 {
            self.shift_cigar.push(Cigar::Match(self.match_block_size));
            self.match_block_size = 0;
        }
        if let Some(c) = c {
            self.shift_cigar.push(*c);
        }
    }

    fn finish(mut self) -> Vec<Cigar> {
        self.add_other(None);
        self.shift_cigar
    }
}

/// Convert indels at either edge of the alignment into soft-clips
///
/// Leading deletions are dropped and leading insertions become soft-clipped bases. The same
/// applies to trailing indels.
///
/// Returns the reference distance removed from the start of the alignment
///
fn clean_up_cigar_edge_indels(cigar: &mut [Cigar]) -> i64 {
    fn update_element(c: &mut Cigar) -> i64 {
        match *c {
            Cigar::Del(len) => {
                *c = Cigar::SoftClip(0);
                len as i64
            }
            Cigar::Ins(len) => {
                *c = Cigar::SoftClip(len);
                0
            }
            _ => 0,
        }
    }

    let mut del_shift = 0;
    for c in cigar.iter_mut().take_while(|x| !is_alignment_match(x)) {
        del_shift += update_element(c);
    }

    for c in cigar
        .iter_mut()
        .rev()
        .take_while(|x| !is_alignment_match(x))
    {
        update_element(c);
    }

    del_shift
}

/// Left-shift all indels in the input cigar
///
/// # Arguments
/// * `ref_pos` - Zero-indexed position of the alignment start in `ref_seq`
/// * `ref_seq` - Reference sequence containing the full aligned region
/// * `read_seq` - Read sequence, including any soft-clipped bases
///
/// Indels never shift past the start of the match block preceding them, so they can't move into
/// soft-clipped sequence or past another indel. X/= match states are not preserved.
///
/// Returns a 2-tuple of:
/// 1. Shifted zero-indexed ref pos
/// 2. Shifted alignment cigar
///
pub fn left_shift_indels(
    ref_pos: i64,
    cigar: &[Cigar],
    ref_seq: &[u8],
    read_seq: &[u8],
) -> (i64, Vec<Cigar>) {
    let mut ref_head_pos = ref_pos;
    let mut read_head_pos = 0;

    let mut builder = LeftShiftBuilder::new(ref_seq, read_seq);
    for c in cigar.iter() {
        builder.add_element(c, ref_head_pos, read_head_pos);
        update_ref_and_read_pos(c, &mut ref_head_pos, &mut read_head_pos);
    }
    let mut shift_cigar = builder.finish();

    let ref_pos_shift = clean_up_cigar_edge_indels(&mut shift_cigar);
    (ref_pos + ref_pos_shift, compress_cigar(&shift_cigar))
}

#[cfg(test)]
mod tests {
    use super::*;
    use Cigar::*;

    #[test]
    fn test_left_homology_len() {
        // Deletion of one 'C' from "ABCCDE"
        assert_eq!(get_left_homology_len(b"ABCCDE", (3, 4), b"ABCDE", (3, 3)), 1);

        // Insertion of one 'C' into "ABCDE"
        assert_eq!(get_left_homology_len(b"ABCDE", (3, 3), b"ABCCDE", (3, 4)), 1);

        assert_eq!(get_left_homology_len(b"ABCDE", (2, 3), b"ABDE", (2, 2)), 0);
    }

    #[test]
    fn test_shift_without_indels() {
        let cigar = vec![SoftClip(2), Match(2), SoftClip(2)];
        let (shift_ref_pos, shift_cigar) = left_shift_indels(4, &cigar, b"XXABCCDEXX", b"ABCCDE");
        assert_eq!(shift_ref_pos, 4);
        assert_eq!(shift_cigar, cigar);
    }

    #[test]
    fn test_shift_insertion() {
        let cigar = vec![Match(3), Ins(1), Match(2)];
        let (shift_ref_pos, shift_cigar) = left_shift_indels(2, &cigar, b"XXABCDEXX", b"ABCCDE");
        assert_eq!(shift_ref_pos, 2);
        assert_eq!(shift_cigar, vec![Match(2), Ins(1), Match(3)]);
    }

    #[test]
    fn test_shift_homopolymer_deletion() {
        let cigar = vec![Match(6), Del(2), Match(3)];
        let ref_seq = b"XXTGAAAAAAGCXX";
        let read_seq = b"TGAAAAGCX";
        let (shift_ref_pos, shift_cigar) = left_shift_indels(2, &cigar, ref_seq, read_seq);
        assert_eq!(shift_ref_pos, 2);
        assert_eq!(shift_cigar, vec![Match(2), Del(2), Match(7)]);
    }

    #[test]
    fn test_shift_stops_at_soft_clip() {
        let cigar = vec![SoftClip(2), Match(1), Del(1), Match(2)];
        let ref_seq = b"XXXCCDEXX";
        let read_seq = b"CCCDE";
        let (shift_ref_pos, shift_cigar) = left_shift_indels(3, &cigar, ref_seq, read_seq);

        // The deletion shifts to the alignment edge and is removed:
        assert_eq!(shift_ref_pos, 4);
        assert_eq!(shift_cigar, vec![SoftClip(2), Match(3)]);
    }

    #[test]
    fn test_shift_insertion_to_edge() {
        let cigar = vec![Match(1), Ins(1), Match(2)];
        let (shift_ref_pos, shift_cigar) = left_shift_indels(4, &cigar, b"XXABCDEXX", b"CCDE");
        assert_eq!(shift_ref_pos, 4);
        assert_eq!(shift_cigar, vec![SoftClip(1), Match(3)]);
    }

    #[test]
    fn test_shift_indel_cluster() {
        let cigar = vec![Match(4), Del(2), Ins(2), Match(1)];
        let (shift_ref_pos, shift_cigar) =
            left_shift_indels(2, &cigar, b"XXABBBABFXX", b"ABBBBBF");
        assert_eq!(shift_ref_pos, 2);
        assert_eq!(shift_cigar, vec![Match(3), Ins(2), Del(2), Match(2)]);
    }
}
