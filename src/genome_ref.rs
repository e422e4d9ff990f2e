//! Reference sequence access for alignment normalization
//!

use std::collections::HashMap;

/// Source of whole-chromosome reference sequences
pub trait ReferenceSource: Send + Sync {
    /// Return the full sequence of the named chromosome, or None if it is not available
    fn get_chrom_seq(&self, chrom: &str) -> Option<&[u8]>;
}

/// Reference sequences held in memory
#[derive(Default)]
pub struct GenomeRef {
    /// A map from chrom name to chrom sequence
    pub chroms: HashMap<String, Vec<u8>>,
}

impl ReferenceSource for GenomeRef {
    fn get_chrom_seq(&self, chrom: &str) -> Option<&[u8]> {
        self.chroms.get(chrom).map(|x| x.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_chrom_seq() {
        let mut genome_ref = GenomeRef::default();
        genome_ref
            .chroms
            .insert("chr1".to_string(), b"ACGTACGT".to_vec());

        assert_eq!(genome_ref.get_chrom_seq("chr1"), Some(&b"ACGTACGT"[..]));
        assert_eq!(genome_ref.get_chrom_seq("chr2"), None);
    }
}
