//! Breakpoint extraction from reads split across two alignments
//!

use log::{debug, info};
use rayon::prelude::*;
use rust_htslib::bam::record::Cigar;
use simple_error::SimpleResult;

use super::breakpoint::Breakpoint;
use super::target_regions::{AllTargetRegions, TargetRegionFilter};
use crate::alignment_record::AlignmentRecord;
use crate::errors::MalformedCigarError;
use crate::run_stats::BreakpointExtractStats;
use crate::settings::{SvCandidateSettings, validate_sv_candidate_settings};

/// Reasons a read group did not produce a breakpoint
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    strum::EnumCount,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum ExtractDecline {
    /// Breakpoints are only extracted from reads with exactly two alignments
    ReadGroupSize,
    LowMapq,
    NoUniquePrimary,
    OutsideTargetRegions,

    /// The split position implied by the secondary alignment is past the end of the primary read
    SplitOutsideRead,

    /// An input alignment has an empty cigar or a zero-length cigar element
    MalformedCigar(MalformedCigarError),
}

impl From<MalformedCigarError> for ExtractDecline {
    fn from(err: MalformedCigarError) -> Self {
        Self::MalformedCigar(err)
    }
}

pub struct BreakpointExtractor {
    settings: SvCandidateSettings,
    target_regions: Box<dyn TargetRegionFilter>,
}

impl BreakpointExtractor {
    /// Create an extractor which accepts reads from all target regions
    pub fn try_new(settings: SvCandidateSettings) -> SimpleResult<Self> {
        validate_sv_candidate_settings(&settings)?;
        Ok(Self {
            settings,
            target_regions: Box::new(AllTargetRegions),
        })
    }

    pub fn with_target_regions(mut self, target_regions: impl TargetRegionFilter + 'static) -> Self {
        self.target_regions = Box::new(target_regions);
        self
    }

    /// Get the breakpoint described by a read split into one primary and one secondary alignment
    ///
    /// When the secondary alignment starts with a hard-clip, the read is split after the clipped
    /// length, the left side of the junction is in the primary alignment and the right side starts
    /// at the secondary alignment start. Otherwise the read is split after the secondary read
    /// length, the left side of the junction is in the secondary alignment and the right side
    /// starts at the primary alignment start.
    ///
    /// Supporting bases are taken from the primary read sequence on each side of the split
    /// position, up to the configured flank size.
    ///
    pub fn extract(
        &self,
        primary: &AlignmentRecord,
        secondary: &AlignmentRecord,
    ) -> Result<Breakpoint, ExtractDecline> {
        primary.blocks()?;
        secondary.blocks()?;

        if !self.target_regions.accept(primary, secondary) {
            return Err(ExtractDecline::OutsideTargetRegions);
        }

        let (split_index, left, right) = match secondary.cigar.first() {
            Some(Cigar::HardClip(len)) => (*len as usize, primary, secondary),
            _ => (secondary.read_len(), secondary, primary),
        };

        let read_len = primary.read_len();
        if split_index > read_len {
            return Err(ExtractDecline::SplitOutsideRead);
        }

        let flank_size = self.settings.breakpoint_flank_size;
        let bases_start = split_index.saturating_sub(flank_size);
        let bases_end = std::cmp::min(split_index + flank_size, read_len);

        Ok(Breakpoint {
            left_chrom: left.chrom.clone(),
            left_pos: left.pos + split_index as i64,
            right_chrom: right.chrom.clone(),
            right_pos: right.pos,
            left_strand: left.strand_label(),
            right_strand: right.strand_label(),
            bases: primary.seq[bases_start..bases_end].to_vec(),
            read_name: primary.qname.clone(),
        })
    }

    /// Extract a breakpoint from all alignments of one read
    ///
    pub fn process_read_group(
        &self,
        records: &[AlignmentRecord],
    ) -> Result<Breakpoint, ExtractDecline> {
        if records.len() != 2 {
            return Err(ExtractDecline::ReadGroupSize);
        }
        if records.iter().any(|x| x.mapq < self.settings.min_sv_mapq) {
            return Err(ExtractDecline::LowMapq);
        }

        let (primary, secondary) = match (records[0].is_primary, records[1].is_primary) {
            (true, false) => (&records[0], &records[1]),
            (false, true) => (&records[1], &records[0]),
            _ => return Err(ExtractDecline::NoUniquePrimary),
        };

        let breakpoint = self.extract(primary, secondary)?;
        debug!(
            "Extracted breakpoint {} from read '{}'",
            breakpoint.get_label(),
            primary.qname
        );
        Ok(breakpoint)
    }
}

/// Extract breakpoints from many reads in parallel
///
/// Breakpoints are returned in read group order.
///
pub fn extract_read_groups(
    extractor: &BreakpointExtractor,
    read_groups: &[Vec<AlignmentRecord>],
) -> (Vec<Breakpoint>, BreakpointExtractStats) {
    let results = read_groups
        .par_iter()
        .map(|x| extractor.process_read_group(x))
        .collect::<Vec<_>>();

    let mut stats = BreakpointExtractStats::default();
    let mut breakpoints = Vec::new();
    for result in results {
        match result {
            Ok(breakpoint) => {
                stats.add_read_group(None);
                breakpoints.push(breakpoint);
            }
            Err(reason) => stats.add_read_group(Some(reason)),
        }
    }

    info!(
        "Extracted {} breakpoints from {} read groups",
        stats.breakpoint_count, stats.read_group_count
    );

    (breakpoints, stats)
}
