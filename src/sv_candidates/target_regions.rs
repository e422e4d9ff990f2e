//! Restrict breakpoint extraction to reads split across a pair of target regions
//!
//! Simulated evaluation reads can carry the two regions they were drawn from in the read name.
//! Production runs use `AllTargetRegions`, which accepts every read.
//!

use itertools::Itertools;

use crate::alignment_record::AlignmentRecord;

pub trait TargetRegionFilter: Send + Sync {
    /// True if breakpoints should be extracted from this split read
    fn accept(&self, primary: &AlignmentRecord, secondary: &AlignmentRecord) -> bool;
}

pub struct AllTargetRegions;

impl TargetRegionFilter for AllTargetRegions {
    fn accept(&self, _primary: &AlignmentRecord, _secondary: &AlignmentRecord) -> bool {
        true
    }
}

/// Reference region parsed from a read name, using 1-indexed closed coordinates
#[derive(Debug, Eq, PartialEq)]
struct TargetRegion {
    chrom: String,
    start: i64,
    stop: i64,
}

impl TargetRegion {
    /// Parse a region from underscore-delimited fields
    ///
    /// The chromosome name may itself contain underscores, so the region start and stop are found
    /// by position from the end of the field list, after `trailing_field_count` unrelated fields.
    ///
    fn from_fields(fields: &[&str], trailing_field_count: usize) -> Option<Self> {
        let chrom_field_count = fields.len().checked_sub(2 + trailing_field_count)?;
        if chrom_field_count == 0 {
            return None;
        }
        let chrom = fields[..chrom_field_count].join("_");
        let start = fields[chrom_field_count].parse::<i64>().ok()?;
        let stop = fields[chrom_field_count + 1].parse::<i64>().ok()?;
        Some(Self { chrom, start, stop })
    }

    fn overlaps(&self, record: &AlignmentRecord) -> bool {
        self.chrom == record.chrom
            && record.pos <= self.stop
            && record.get_alignment_end() >= self.start
    }
}

/// Read names of the form `chrA_start_stop__chrB_start_stop_x_y`
///
/// A read is accepted when region A overlaps either alignment of the split read and region B also
/// overlaps either alignment. Reads with names not matching this pattern are always accepted.
///
pub struct ReadNameTargetRegions;

impl ReadNameTargetRegions {
    fn parse_read_name(read_name: &str) -> Option<(TargetRegion, TargetRegion)> {
        let (region1, region2) = read_name.split("__").collect_tuple()?;
        let region1 = TargetRegion::from_fields(&region1.split('_').collect_vec(), 0)?;
        let region2 = TargetRegion::from_fields(&region2.split('_').collect_vec(), 2)?;
        Some((region1, region2))
    }
}

impl TargetRegionFilter for ReadNameTargetRegions {
    fn accept(&self, primary: &AlignmentRecord, secondary: &AlignmentRecord) -> bool {
        match Self::parse_read_name(&primary.qname) {
            Some((region1, region2)) => {
                let overlaps_either = |x: &TargetRegion| x.overlaps(primary) || x.overlaps(secondary);
                overlaps_either(&region1) && overlaps_either(&region2)
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_record::test_utils::get_test_record;

    #[test]
    fn test_parse_read_name() {
        let (region1, region2) =
            ReadNameTargetRegions::parse_read_name("chrUn_gl000220_100_200__chr2_5000_5100_7_3")
                .unwrap();
        assert_eq!(
            region1,
            TargetRegion {
                chrom: "chrUn_gl000220".to_string(),
                start: 100,
                stop: 200,
            }
        );
        assert_eq!(
            region2,
            TargetRegion {
                chrom: "chr2".to_string(),
                start: 5000,
                stop: 5100,
            }
        );

        let (_, region2) =
            ReadNameTargetRegions::parse_read_name("chr1_100_200__chrUn_gl000220_5000_5100_7_3")
                .unwrap();
        assert_eq!(region2.chrom, "chrUn_gl000220");

        assert!(ReadNameTargetRegions::parse_read_name("read1").is_none());
        assert!(ReadNameTargetRegions::parse_read_name("chr1_100__chr2_5000_5100_7_3").is_none());
        assert!(ReadNameTargetRegions::parse_read_name("chr1_a_200__chr2_5000_5100_7_3").is_none());
    }

    #[test]
    fn test_read_name_target_regions() {
        let filter = ReadNameTargetRegions;
        let name = "chr1_100_200__chr2_5000_5100_7_3";
        let primary = get_test_record(name, "chr1", 150, "50M50S", true);
        let secondary = get_test_record(name, "chr2", 5050, "50H50M", false);
        assert!(filter.accept(&primary, &secondary));

        let secondary = get_test_record(name, "chr2", 6000, "50H50M", false);
        assert!(!filter.accept(&primary, &secondary));

        let secondary = get_test_record(name, "chr3", 5050, "50H50M", false);
        assert!(!filter.accept(&primary, &secondary));

        // Regions can be matched by either alignment:
        let primary = get_test_record(name, "chr2", 5050, "50M50S", true);
        let secondary = get_test_record(name, "chr1", 101, "50H50M", false);
        assert!(filter.accept(&primary, &secondary));
    }

    #[test]
    fn test_unencoded_read_name() {
        let primary = get_test_record("read1", "chr1", 150, "50M50S", true);
        let secondary = get_test_record("read1", "chr2", 5050, "50H50M", false);
        assert!(ReadNameTargetRegions.accept(&primary, &secondary));
        assert!(AllTargetRegions.accept(&primary, &secondary));
    }
}
