//! Structural variant breakpoint candidates from split read alignments
//!
//! Reads aligned in two pieces to disjoint loci are converted into breakpoints, which are then
//! clustered into groups likely to describe the same structural variant. Each group member is
//! written out with its supporting read bases for downstream realignment.
//!

mod breakpoint;
mod cluster;
mod extract;
mod output;
pub mod target_regions;

pub use breakpoint::*;
pub use cluster::*;
pub use extract::*;
pub use output::*;
