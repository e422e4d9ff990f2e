//! Tunable parameters for chimera combination and SV candidate clustering
//!
//! Settings structs can be flattened into a clap command-line parser by client tools, or
//! deserialized from json. Missing json fields take the same defaults as the command-line.
//!

use clap::Args;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail};

/// Partial alignments of one read with starts further apart than this are never combined
pub const MAX_CHIMERA_GAP_LENGTH: i64 = 2000;

pub const BREAKPOINT_CLUSTER_WINDOW: i64 = 1000;

/// Read bases taken on each side of the split position as breakpoint supporting sequence
pub const BREAKPOINT_FLANK_SIZE: usize = 100;

pub const MIN_SV_MAPQ: u8 = 20;

#[derive(Args, Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ChimeraSettings {
    /// Maximum distance between the alignment start positions of two partial alignments for them
    /// to be considered for combination into one indel-containing alignment
    #[arg(long, default_value_t = MAX_CHIMERA_GAP_LENGTH)]
    pub max_chimera_gap_length: i64,

    /// Minimum number of non-clipped bases required between a combined indel and either end of
    /// the alignment. A value of 0 disables this check.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub min_indel_buffer: i64,
}

impl Default for ChimeraSettings {
    fn default() -> Self {
        Self {
            max_chimera_gap_length: MAX_CHIMERA_GAP_LENGTH,
            min_indel_buffer: 0,
        }
    }
}

pub fn validate_chimera_settings(settings: &ChimeraSettings) -> SimpleResult<()> {
    if settings.max_chimera_gap_length < 1 {
        bail!(
            "max-chimera-gap-length must be greater than 0, found {}",
            settings.max_chimera_gap_length
        );
    }
    if settings.min_indel_buffer < 0 {
        bail!(
            "min-indel-buffer can't be negative, found {}",
            settings.min_indel_buffer
        );
    }
    Ok(())
}

#[derive(Args, Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SvCandidateSettings {
    /// Read bases taken from each side of the split position as breakpoint supporting sequence.
    /// This is typically set to the sequencing read length.
    #[arg(long, default_value_t = BREAKPOINT_FLANK_SIZE)]
    pub breakpoint_flank_size: usize,

    /// Minimum MAPQ required for both alignments of a split read to extract a breakpoint
    #[arg(long, default_value_t = MIN_SV_MAPQ)]
    pub min_sv_mapq: u8,

    /// Maximum distance of both breakpoint positions from the first position of a breakpoint
    /// group for the breakpoint to join the group
    #[arg(long, default_value_t = BREAKPOINT_CLUSTER_WINDOW, allow_negative_numbers = true)]
    pub breakpoint_cluster_window: i64,
}

impl Default for SvCandidateSettings {
    fn default() -> Self {
        Self {
            breakpoint_flank_size: BREAKPOINT_FLANK_SIZE,
            min_sv_mapq: MIN_SV_MAPQ,
            breakpoint_cluster_window: BREAKPOINT_CLUSTER_WINDOW,
        }
    }
}

pub fn validate_sv_candidate_settings(settings: &SvCandidateSettings) -> SimpleResult<()> {
    if settings.breakpoint_flank_size == 0 {
        bail!("breakpoint-flank-size must be greater than 0");
    }
    if settings.breakpoint_cluster_window < 0 {
        bail!(
            "breakpoint-cluster-window can't be negative, found {}",
            settings.breakpoint_cluster_window
        );
    }
    Ok(())
}
