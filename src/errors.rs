//! Typed errors for structurally invalid alignment input
//!

use thiserror::Error;

/// Fatal structural problem in a cigar alignment
///
/// This is only raised for input which can't be interpreted at all. Alignments which are valid
/// but unsuitable for combination or breakpoint extraction are reported through the other decline
/// reasons instead.
///
#[derive(Clone, Debug, Default, Error, Eq, PartialEq)]
pub enum MalformedCigarError {
    #[default]
    #[error("cigar alignment has no elements")]
    Empty,

    #[error("cigar element {index} ('{element}') has zero length")]
    ZeroLengthElement { index: usize, element: String },
}
