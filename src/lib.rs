//! Post-processing of split short-read alignments
//!
//! Two partial alignments of one read split by an indel are combined into a single alignment with
//! an explicit insertion or deletion (`combine_chimera`). Reads split across two disjoint loci are
//! converted into structural variant breakpoint candidates, which are clustered and written out
//! with their supporting read bases (`sv_candidates`).
//!

pub mod alignment_block;
pub mod alignment_record;
pub mod cigar_utils;
pub mod combine_chimera;
pub mod errors;
pub mod genome_ref;
pub mod indel_shift;
pub mod run_stats;
pub mod settings;
pub mod sv_candidates;

pub use alignment_block::{AlignmentBlock, decompose_alignment};
pub use alignment_record::AlignmentRecord;
pub use combine_chimera::{
    ChimeraCombiner, ChimeraDecline, ChimericPair, ProcessedReadGroup, combine_read_groups,
};
pub use errors::MalformedCigarError;
pub use genome_ref::{GenomeRef, ReferenceSource};
pub use settings::{ChimeraSettings, SvCandidateSettings};
