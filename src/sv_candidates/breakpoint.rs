//! Breakpoint junction between two loci
//!

use std::cmp::Ordering;

/// Junction between two loci implied by a read split across both of them
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Breakpoint {
    pub left_chrom: String,

    /// 1-indexed position of the left side of the junction
    pub left_pos: i64,

    pub right_chrom: String,

    /// 1-indexed position of the right side of the junction
    pub right_pos: i64,

    /// Strand of the alignment anchoring each side, either 'F' or 'R'
    pub left_strand: char,
    pub right_strand: char,

    /// Read bases flanking the split position
    pub bases: Vec<u8>,

    pub read_name: String,
}

/// Replace underscores in a chromosome name, so that it can't be confused with the label delimiter
fn get_escaped_chrom_name(chrom: &str) -> String {
    chrom.replace('_', "+")
}

impl Breakpoint {
    /// Clustering order, by left locus then right locus
    pub fn cmp_position(&self, other: &Self) -> Ordering {
        (&self.left_chrom, self.left_pos, &self.right_chrom, self.right_pos).cmp(&(
            &other.left_chrom,
            other.left_pos,
            &other.right_chrom,
            other.right_pos,
        ))
    }

    /// Underscore-delimited breakpoint description, not including the group id
    ///
    /// Underscores in chromosome names are replaced with '+'.
    ///
    pub fn get_label(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}_{}",
            get_escaped_chrom_name(&self.left_chrom),
            self.left_pos,
            get_escaped_chrom_name(&self.right_chrom),
            self.right_pos,
            self.read_name,
            self.left_strand,
            self.right_strand
        )
    }
}
