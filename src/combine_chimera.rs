//! Combine chimeric partial alignments of one read caused by an indel
//!
//! When an aligner can't extend through an indel it may instead report two clipped partial
//! alignments of the read on either side of the event. This module recognizes that pattern and
//! synthesizes the single alignment which explains the whole read with an explicit insertion or
//! deletion.
//!

use log::{debug, info};
use rayon::prelude::*;
use rust_htslib::bam::record::{Cigar, CigarString};
use simple_error::SimpleResult;

use crate::alignment_block::AlignmentBlock;
use crate::alignment_record::AlignmentRecord;
use crate::cigar_utils::{
    CigarBuilder, get_cigar_read_length, get_unclipped_read_base_count, is_indel,
    with_cigarseg_len,
};
use crate::errors::MalformedCigarError;
use crate::genome_ref::ReferenceSource;
use crate::indel_shift::left_shift_indels;
use crate::run_stats::ChimeraCombineStats;
use crate::settings::{ChimeraSettings, validate_chimera_settings};

/// Reasons two partial alignments were not combined
///
/// Except for `MalformedCigar`, none of these are errors. A declined read group should be passed
/// through unchanged.
///
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    strum::EnumCount,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum ChimeraDecline {
    /// Read groups are only combined when exactly two alignments remain after insert pruning
    ReadGroupSize,
    ReferenceMismatch,
    StrandMismatch,

    /// At least one alignment has fewer than two cigar elements
    ShortCigar,
    GapTooLarge,

    /// Combination requires exactly one primary alignment to take record details from
    NoUniquePrimary,

    /// The right alignment must start with a soft-clip and the left must end with one
    NotClipBounded,

    /// The right alignment starts with an insertion after its leading soft-clip is removed
    LeadingInsertion,

    /// Resolving the overlap between the two alignments would consume a whole cigar element, so
    /// these are alternate mappings of the same read segment rather than a split alignment
    AlternateMapping,

    /// Read length and read gap imply different insertion sizes
    InconsistentInsertion,
    NonPositiveInsertion,
    InsufficientIndelBuffer,
    ReadLengthMismatch,

    /// An input alignment has an empty cigar or a zero-length cigar element
    MalformedCigar(MalformedCigarError),
}

impl From<MalformedCigarError> for ChimeraDecline {
    fn from(err: MalformedCigarError) -> Self {
        Self::MalformedCigar(err)
    }
}

/// Two alignments of one read which could be the two sides of a split-by-indel alignment
///
/// The pair is ordered by reference start position, and holds the alignment blocks of each side.
///
pub struct ChimericPair<'a> {
    left: &'a AlignmentRecord,
    right: &'a AlignmentRecord,
    left_blocks: Vec<AlignmentBlock>,
    right_blocks: Vec<AlignmentBlock>,
}

impl<'a> ChimericPair<'a> {
    /// Check that two alignments are candidates for combination
    ///
    /// Both cigars must decompose into alignment blocks. The alignments must be on the same
    /// chromosome and strand, have at least two cigar elements each, and have start positions
    /// separated by less than `max_gap_length`.
    ///
    /// When the start positions are equal read2 is treated as the left alignment.
    ///
    pub fn new(
        read1: &'a AlignmentRecord,
        read2: &'a AlignmentRecord,
        max_gap_length: i64,
    ) -> Result<Self, ChimeraDecline> {
        use ChimeraDecline::*;
        let blocks1 = read1.blocks()?;
        let blocks2 = read2.blocks()?;

        if read1.chrom != read2.chrom {
            Err(ReferenceMismatch)
        } else if read1.is_fwd_strand != read2.is_fwd_strand {
            Err(StrandMismatch)
        } else if read1.cigar.len() < 2 || read2.cigar.len() < 2 {
            Err(ShortCigar)
        } else if (read1.pos - read2.pos).abs() >= max_gap_length {
            Err(GapTooLarge)
        } else if read1.pos < read2.pos {
            Ok(Self {
                left: read1,
                right: read2,
                left_blocks: blocks1,
                right_blocks: blocks2,
            })
        } else {
            Ok(Self {
                left: read2,
                right: read1,
                left_blocks: blocks2,
                right_blocks: blocks1,
            })
        }
    }

    fn get_top_hit(&self) -> Result<&'a AlignmentRecord, ChimeraDecline> {
        match (self.left.is_primary, self.right.is_primary) {
            (true, false) => Ok(self.left),
            (false, true) => Ok(self.right),
            _ => Err(ChimeraDecline::NoUniquePrimary),
        }
    }
}

/// Shorten the last cigar element by trim_len
///
fn trim_rightmost_element(cigar: &mut [Cigar], trim_len: i64) -> Result<(), ChimeraDecline> {
    let last = cigar
        .last_mut()
        .ok_or(ChimeraDecline::AlternateMapping)?;
    let new_len = last.len() as i64 - trim_len;
    if new_len < 1 {
        return Err(ChimeraDecline::AlternateMapping);
    }
    *last = with_cigarseg_len(last, new_len as u32);
    Ok(())
}

/// Lengthen the first cigar element by pad_len
///
fn pad_leftmost_element(cigar: &mut [Cigar], pad_len: i64) {
    if let Some(first) = cigar.first_mut() {
        *first = with_cigarseg_len(first, first.len() + pad_len as u32);
    }
}

/// Order alignments by mapped read start position, then by mapped read end position
///
/// Entirely clipped alignments are sorted first.
///
fn sort_by_mapped_read_position(records: &mut [AlignmentRecord]) {
    records.sort_by_cached_key(|x| x.get_mapped_read_range().unwrap_or((-1, -1)));
}

/// Remove a middle alignment which likely represents inserted sequence between the other two
///
/// This applies only to exactly three alignments sorted by mapped read position. The middle
/// alignment is removed if its mapped read range spans (within a small tolerance) the gap between
/// the other two alignments, so that the remaining pair can be combined into an insertion.
///
fn prune_likely_insert(records: &mut Vec<AlignmentRecord>) {
    const READ_POS_TOLERANCE: i64 = 5;

    if records.len() != 3 {
        return;
    }

    let ranges = records
        .iter()
        .map(|x| x.get_mapped_read_range().unwrap_or((-1, -1)))
        .collect::<Vec<_>>();
    let (first, middle, last) = (ranges[0], ranges[1], ranges[2]);
    if middle.0 <= first.1 + READ_POS_TOLERANCE && middle.1 >= last.0 - READ_POS_TOLERANCE {
        records.remove(1);
    }
}

/// Alignments for one read after chimera processing
pub struct ProcessedReadGroup {
    /// Either the single combined alignment, or all input alignments after hard-clip
    /// normalization
    pub records: Vec<AlignmentRecord>,

    /// The reason the alignments were not combined, None if combination succeeded
    pub decline: Option<ChimeraDecline>,
}

impl ProcessedReadGroup {
    pub fn is_combined(&self) -> bool {
        self.decline.is_none()
    }
}

pub struct ChimeraCombiner {
    settings: ChimeraSettings,

    /// Reference used to left-shift indels in output alignments, if any
    reference: Option<Box<dyn ReferenceSource>>,
}

impl ChimeraCombiner {
    /// Create a combiner which leaves output indels where they are found
    pub fn try_new(settings: ChimeraSettings) -> SimpleResult<Self> {
        validate_chimera_settings(&settings)?;
        Ok(Self {
            settings,
            reference: None,
        })
    }

    /// Left-shift indels in all output alignments against this reference
    pub fn with_reference(mut self, reference: impl ReferenceSource + 'static) -> Self {
        self.reference = Some(Box::new(reference));
        self
    }

    pub fn settings(&self) -> &ChimeraSettings {
        &self.settings
    }

    /// Combine the two alignments of a chimeric pair into a single alignment with an explicit
    /// insertion or deletion
    ///
    /// The combined record copies all details from the primary alignment of the pair, except for
    /// an updated start position, cigar and mapping quality. The mapping quality is the mean of
    /// the two input alignments.
    ///
    /// Both alignments are expected to have hard clips already converted to soft clips.
    ///
    pub fn combine(&self, pair: &ChimericPair) -> Result<AlignmentRecord, ChimeraDecline> {
        let (left, right) = (pair.left, pair.right);
        let top_hit = pair.get_top_hit()?;

        let is_soft_clip = |c: Option<&Cigar>| matches!(c, Some(Cigar::SoftClip(_)));
        if !(is_soft_clip(right.cigar.first()) && is_soft_clip(left.cigar.last())) {
            return Err(ChimeraDecline::NotClipBounded);
        }

        // Drop the trailing clip of the left alignment and the leading clip of the right
        let mut left_cigar = left.cigar.0[..left.cigar.len() - 1].to_vec();
        let mut right_cigar = right.cigar.0[1..].to_vec();

        if matches!(right_cigar.first(), Some(Cigar::Ins(_))) {
            return Err(ChimeraDecline::LeadingInsertion);
        }

        // ChimericPair ensures each cigar has at least 2 elements
        let left_blocks = &pair.left_blocks;
        let right_blocks = &pair.right_blocks;
        let last_left_block = &left_blocks[left_blocks.len() - 2];
        let first_right_block = &right_blocks[1];

        let right_start = first_right_block.ref_start;
        let right_read_start = first_right_block.read_start;
        let mut left_stop = last_left_block.ref_stop;
        let mut left_read_stop = last_left_block.read_stop;

        // Remove bases shared by the two alignments in either coordinate system from the left side
        if left_stop >= right_start || left_read_stop >= right_read_start {
            let trim_len = std::cmp::max(
                left_stop - right_start + 1,
                left_read_stop - right_read_start + 1,
            );
            trim_rightmost_element(&mut left_cigar, trim_len)?;
            left_stop -= trim_len;
            left_read_stop -= trim_len;
        }

        let alignment_gap = right_start - left_stop - 1;
        let read_gap = right_read_start - left_read_stop - 1;

        let read_len = top_hit.read_len() as i64;
        let indel = if alignment_gap > 0 && read_gap == 0 {
            Cigar::Del(alignment_gap as u32)
        } else {
            let aligned_len =
                (get_cigar_read_length(&left_cigar) + get_cigar_read_length(&right_cigar)) as i64;
            let insert_len = read_len - aligned_len - alignment_gap;
            if insert_len != read_gap - alignment_gap {
                return Err(ChimeraDecline::InconsistentInsertion);
            }
            if insert_len < 1 {
                return Err(ChimeraDecline::NonPositiveInsertion);
            }

            // Reference bases skipped next to the insertion are mismatches, so absorb them into
            // the right side alignment
            if alignment_gap > 0 {
                pad_leftmost_element(&mut right_cigar, alignment_gap);
            }
            Cigar::Ins(insert_len as u32)
        };

        let min_buffer = self.settings.min_indel_buffer as usize;
        if min_buffer > 0
            && (get_unclipped_read_base_count(&left_cigar) < min_buffer
                || get_unclipped_read_base_count(&right_cigar) < min_buffer)
        {
            return Err(ChimeraDecline::InsufficientIndelBuffer);
        }

        let cigar = CigarBuilder::new()
            .extend(&left_cigar)
            .push(indel)
            .extend(&right_cigar)
            .finish();

        if get_cigar_read_length(&cigar) as i64 != read_len {
            return Err(ChimeraDecline::ReadLengthMismatch);
        }

        let mut combined = top_hit.clone();
        combined.pos = left_blocks[0].ref_start;
        combined.cigar = cigar;
        combined.mapq = ((left.mapq as u16 + right.mapq as u16) / 2) as u8;
        Ok(combined)
    }

    /// Move all indels in the record to their leftmost equivalent position
    ///
    /// The record is unchanged when no reference is set, or when the alignment can't be checked
    /// against the reference.
    ///
    fn left_shift_record(&self, record: &mut AlignmentRecord) {
        let Some(reference) = self.reference.as_deref() else {
            return;
        };
        if !record.cigar.iter().any(is_indel) {
            return;
        }
        let Some(chrom_seq) = reference.get_chrom_seq(&record.chrom) else {
            debug!(
                "No reference sequence for chromosome '{}', indels in read '{}' not shifted",
                record.chrom, record.qname
            );
            return;
        };
        if record.pos < 1
            || record.get_alignment_end() > chrom_seq.len() as i64
            || get_cigar_read_length(&record.cigar) != record.read_len()
        {
            debug!(
                "Alignment of read '{}' is inconsistent with the reference, indels not shifted",
                record.qname
            );
            return;
        }

        let (shift_pos, shift_cigar) =
            left_shift_indels(record.pos - 1, &record.cigar, chrom_seq, &record.seq);
        record.pos = shift_pos + 1;
        record.cigar = CigarString(shift_cigar);
    }

    /// Attempt to combine all alignments of one read into a single alignment
    ///
    /// # Arguments
    /// * `records` - All alignments for one read name
    ///
    pub fn process_read_group(&self, mut records: Vec<AlignmentRecord>) -> ProcessedReadGroup {
        for record in records.iter_mut() {
            record.replace_hard_clips();
        }

        sort_by_mapped_read_position(&mut records);
        prune_likely_insert(&mut records);

        let result = if records.len() == 2 {
            ChimericPair::new(
                &records[0],
                &records[1],
                self.settings.max_chimera_gap_length,
            )
            .and_then(|pair| self.combine(&pair))
        } else {
            Err(ChimeraDecline::ReadGroupSize)
        };

        let mut processed = match result {
            Ok(combined) => {
                debug!(
                    "Combined chimeric alignments of read '{}' into {}:{} {}",
                    combined.qname, combined.chrom, combined.pos, combined.cigar
                );
                ProcessedReadGroup {
                    records: vec![combined],
                    decline: None,
                }
            }
            Err(reason) => {
                if let Some(record) = records.first() {
                    debug!(
                        "Chimeric alignments of read '{}' not combined: {reason:?}",
                        record.qname
                    );
                }
                ProcessedReadGroup {
                    records,
                    decline: Some(reason),
                }
            }
        };

        for record in processed.records.iter_mut() {
            self.left_shift_record(record);
        }
        processed
    }
}

/// Process alignments for many reads in parallel
///
/// Output alignments are returned in the same read group order as the input.
///
pub fn combine_read_groups(
    combiner: &ChimeraCombiner,
    read_groups: Vec<Vec<AlignmentRecord>>,
) -> (Vec<AlignmentRecord>, ChimeraCombineStats) {
    let processed = read_groups
        .into_par_iter()
        .map(|x| combiner.process_read_group(x))
        .collect::<Vec<_>>();

    let mut stats = ChimeraCombineStats::default();
    let mut records = Vec::new();
    for read_group in processed {
        stats.add_read_group(read_group.decline);
        records.extend(read_group.records);
    }

    info!(
        "Combined chimeric alignments in {} of {} read groups",
        stats.combined_count, stats.read_group_count
    );

    (records, stats)
}
