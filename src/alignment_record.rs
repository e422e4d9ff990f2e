//! Minimal alignment record used by chimera combination and breakpoint extraction
//!

use rust_htslib::bam::{self, record::Cigar, record::CigarString};
use simple_error::{SimpleResult, bail};

use crate::alignment_block::{AlignmentBlock, decompose_alignment, get_mapped_read_range};
use crate::cigar_utils::get_cigar_ref_offset;
use crate::errors::MalformedCigarError;

/// Base used to rematerialize hard-clipped read positions
const HARD_CLIP_PAD_BASE: u8 = b'N';

/// The subset of alignment record information needed to combine chimeras and extract breakpoints
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlignmentRecord {
    pub qname: String,

    /// Reference sequence name
    pub chrom: String,

    /// 1-indexed reference position of the first aligned base
    pub pos: i64,

    pub is_fwd_strand: bool,
    pub cigar: CigarString,

    /// Stored read bases, in alignment orientation
    pub seq: Vec<u8>,

    pub mapq: u8,

    /// False for secondary and supplementary alignments
    pub is_primary: bool,
}

impl AlignmentRecord {
    /// Convert from an htslib bam record
    ///
    /// Only the fields used by this crate are transferred, aux tags are dropped.
    ///
    pub fn from_bam_record(header: &bam::HeaderView, record: &bam::Record) -> SimpleResult<Self> {
        let qname = String::from_utf8_lossy(record.qname()).to_string();
        if record.is_unmapped() || record.tid() < 0 {
            bail!("Can't convert unmapped bam record for read '{qname}'");
        }
        let chrom = String::from_utf8_lossy(header.tid2name(record.tid() as u32)).to_string();
        Ok(Self {
            qname,
            chrom,
            pos: record.pos() + 1,
            is_fwd_strand: !record.is_reverse(),
            cigar: record.cigar().take(),
            seq: record.seq().as_bytes(),
            mapq: record.mapq(),
            is_primary: !(record.is_secondary() || record.is_supplementary()),
        })
    }

    pub fn read_len(&self) -> usize {
        self.seq.len()
    }

    /// Single letter strand label used in breakpoint labels
    pub fn strand_label(&self) -> char {
        if self.is_fwd_strand { 'F' } else { 'R' }
    }

    /// 1-indexed position of the last reference base covered by the alignment
    pub fn get_alignment_end(&self) -> i64 {
        self.pos + get_cigar_ref_offset(&self.cigar) - 1
    }

    pub fn blocks(&self) -> Result<Vec<AlignmentBlock>, MalformedCigarError> {
        decompose_alignment(self.pos, &self.cigar)
    }

    /// Mapped read range, see `get_mapped_read_range`
    pub fn get_mapped_read_range(&self) -> Option<(i64, i64)> {
        get_mapped_read_range(&self.blocks().ok()?)
    }

    /// Convert all hard clips to soft clips, padding the stored read sequence with 'N' bases so
    /// that read coordinates remain consistent with the cigar
    ///
    /// The record is unchanged unless the alignment starts or ends with a hard clip.
    ///
    pub fn replace_hard_clips(&mut self) {
        let is_edge_hard_clip = |c: Option<&Cigar>| matches!(c, Some(Cigar::HardClip(_)));
        if !(is_edge_hard_clip(self.cigar.first()) || is_edge_hard_clip(self.cigar.last())) {
            return;
        }

        let mut leading_pad = Vec::new();
        let mut cigar = Vec::with_capacity(self.cigar.len());
        for (index, c) in self.cigar.iter().enumerate() {
            if let Cigar::HardClip(len) = c {
                let pad = std::iter::repeat_n(HARD_CLIP_PAD_BASE, *len as usize);
                if index == 0 {
                    leading_pad.extend(pad);
                } else {
                    self.seq.extend(pad);
                }
                cigar.push(Cigar::SoftClip(*len));
            } else {
                cigar.push(*c);
            }
        }
        if !leading_pad.is_empty() {
            leading_pad.append(&mut self.seq);
            self.seq = leading_pad;
        }
        self.cigar = CigarString(cigar);
    }
}
