//! Single-sweep clustering of breakpoints from nearby split reads
//!

use std::collections::HashSet;

use log::info;
use simple_error::SimpleResult;

use super::breakpoint::Breakpoint;
use crate::run_stats::ClusterStats;
use crate::settings::{SvCandidateSettings, validate_sv_candidate_settings};

/// Breakpoints likely to describe the same structural variant
///
#[derive(Debug)]
pub struct BreakpointGroup {
    pub group_id: usize,
    pub left_chrom: String,
    pub right_chrom: String,

    /// Min and max left position over all group members
    pub left_start: i64,
    pub left_stop: i64,

    /// Min and max right position over all group members
    pub right_start: i64,
    pub right_stop: i64,

    pub breakpoints: Vec<Breakpoint>,

    /// Supporting base sequences of all group members
    sequences: HashSet<Vec<u8>>,

    /// Count of breakpoints skipped due to duplicated supporting bases
    pub duplicate_sequence_count: usize,
}

impl BreakpointGroup {
    fn new(group_id: usize, breakpoint: Breakpoint) -> Self {
        let mut sequences = HashSet::new();
        sequences.insert(breakpoint.bases.clone());
        Self {
            group_id,
            left_chrom: breakpoint.left_chrom.clone(),
            right_chrom: breakpoint.right_chrom.clone(),
            left_start: breakpoint.left_pos,
            left_stop: breakpoint.left_pos,
            right_start: breakpoint.right_pos,
            right_stop: breakpoint.right_pos,
            breakpoints: vec![breakpoint],
            sequences,
            duplicate_sequence_count: 0,
        }
    }

    /// Add breakpoint to the group unless another member already has the same supporting bases
    ///
    /// A skipped breakpoint does not change the group's position ranges.
    ///
    fn add_breakpoint(&mut self, breakpoint: Breakpoint) {
        if self.sequences.contains(&breakpoint.bases) {
            self.duplicate_sequence_count += 1;
            return;
        }
        self.left_start = std::cmp::min(self.left_start, breakpoint.left_pos);
        self.left_stop = std::cmp::max(self.left_stop, breakpoint.left_pos);
        self.right_start = std::cmp::min(self.right_start, breakpoint.right_pos);
        self.right_stop = std::cmp::max(self.right_stop, breakpoint.right_pos);
        self.sequences.insert(breakpoint.bases.clone());
        self.breakpoints.push(breakpoint);
    }

    fn should_merge(&self, breakpoint: &Breakpoint, window: i64) -> bool {
        self.left_chrom == breakpoint.left_chrom
            && self.right_chrom == breakpoint.right_chrom
            && (breakpoint.left_pos - self.left_start).abs() <= window
            && (breakpoint.right_pos - self.right_start).abs() <= window
    }

    /// True if the group could still accept breakpoints at or after this one in sorted order
    fn is_active(&self, breakpoint: &Breakpoint, window: i64) -> bool {
        self.left_chrom == breakpoint.left_chrom && self.left_start >= breakpoint.left_pos - window
    }

    /// Label for one member of the group
    pub fn get_member_label(&self, breakpoint: &Breakpoint) -> String {
        format!("BP_{}_{}", self.group_id, breakpoint.get_label())
    }
}

/// Clusters breakpoints into groups
///
/// Group ids are assigned from a counter owned by each clusterer, so that repeated clustering
/// runs are reproducible. Clusterers for independent input shards can be given disjoint id ranges
/// with `with_first_group_id`.
///
pub struct BreakpointClusterer {
    window: i64,
    next_group_id: usize,
}

impl BreakpointClusterer {
    pub fn try_new(settings: &SvCandidateSettings) -> SimpleResult<Self> {
        validate_sv_candidate_settings(settings)?;
        Ok(Self {
            window: settings.breakpoint_cluster_window,
            next_group_id: 1,
        })
    }

    pub fn with_first_group_id(mut self, group_id: usize) -> Self {
        self.next_group_id = group_id;
        self
    }

    /// The id which will be assigned to the next new group
    pub fn next_group_id(&self) -> usize {
        self.next_group_id
    }

    /// Cluster breakpoints in a single sweep over position-sorted input
    ///
    /// Each breakpoint is merged into the first active group with matching chromosomes and both
    /// positions within the clustering window of the group's start positions, or else starts a new
    /// group. Groups are returned in creation order.
    ///
    pub fn cluster(&mut self, mut breakpoints: Vec<Breakpoint>) -> Vec<BreakpointGroup> {
        breakpoints.sort_by(|a, b| a.cmp_position(b));

        let mut groups: Vec<BreakpointGroup> = Vec::new();

        // Indexes of groups which can still accept breakpoints
        let mut active_groups: Vec<usize> = Vec::new();

        for breakpoint in breakpoints {
            let merge_index = active_groups
                .iter()
                .copied()
                .find(|&i| groups[i].should_merge(&breakpoint, self.window));
            active_groups.retain(|&i| groups[i].is_active(&breakpoint, self.window));

            match merge_index {
                Some(i) => groups[i].add_breakpoint(breakpoint),
                None => {
                    groups.push(BreakpointGroup::new(self.next_group_id, breakpoint));
                    self.next_group_id += 1;
                    active_groups.push(groups.len() - 1);
                }
            }
        }

        groups
    }
}

pub fn get_cluster_stats(groups: &[BreakpointGroup]) -> ClusterStats {
    let breakpoint_count = groups
        .iter()
        .map(|x| x.breakpoints.len() + x.duplicate_sequence_count)
        .sum();
    let stats = ClusterStats {
        breakpoint_count,
        breakpoint_group_count: groups.len(),
        duplicate_sequence_count: groups.iter().map(|x| x.duplicate_sequence_count).sum(),
    };
    info!(
        "Clustered {} breakpoints into {} groups",
        stats.breakpoint_count, stats.breakpoint_group_count
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sv_candidates::breakpoint::test_utils::get_test_breakpoint;

    fn get_clusterer() -> BreakpointClusterer {
        BreakpointClusterer::try_new(&SvCandidateSettings::default()).unwrap()
    }

    #[test]
    fn test_merge_nearby_breakpoints() {
        let mut clusterer = get_clusterer();
        let groups = clusterer.cluster(vec![
            get_test_breakpoint("chr1", 1005, "chr2", 5004, b"ACGTT"),
            get_test_breakpoint("chr1", 1000, "chr2", 5000, b"ACGTA"),
        ]);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.group_id, 1);
        assert_eq!(group.breakpoints.len(), 2);
        assert_eq!(group.breakpoints[0].left_pos, 1000);
        assert_eq!((group.left_start, group.left_stop), (1000, 1005));
        assert_eq!((group.right_start, group.right_stop), (5000, 5004));
        assert_eq!(
            group.get_member_label(&group.breakpoints[1]),
            "BP_1_chr1_1005_chr2_5004_read1005_F_R"
        );
    }

    #[test]
    fn test_duplicate_sequence() {
        let mut clusterer = get_clusterer();
        let groups = clusterer.cluster(vec![
            get_test_breakpoint("chr1", 1000, "chr2", 5000, b"ACGT"),
            get_test_breakpoint("chr1", 1005, "chr2", 4990, b"ACGT"),
        ]);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.breakpoints.len(), 1);
        assert_eq!(group.duplicate_sequence_count, 1);
        assert_eq!((group.left_start, group.left_stop), (1000, 1000));
        assert_eq!((group.right_start, group.right_stop), (5000, 5000));

        let stats = get_cluster_stats(&groups);
        assert_eq!(stats.breakpoint_count, 2);
        assert_eq!(stats.duplicate_sequence_count, 1);
    }

    #[test]
    fn test_window_boundary() {
        let mut clusterer = get_clusterer();
        let groups = clusterer.cluster(vec![
            get_test_breakpoint("chr1", 1000, "chr2", 5000, b"A"),
            get_test_breakpoint("chr1", 2000, "chr2", 6000, b"C"),
        ]);
        assert_eq!(groups.len(), 1);

        let groups = clusterer.cluster(vec![
            get_test_breakpoint("chr1", 1000, "chr2", 5000, b"A"),
            get_test_breakpoint("chr1", 2001, "chr2", 5000, b"C"),
        ]);
        assert_eq!(groups.len(), 2);

        let groups = clusterer.cluster(vec![
            get_test_breakpoint("chr1", 1000, "chr2", 5000, b"A"),
            get_test_breakpoint("chr1", 1000, "chr2", 6001, b"C"),
        ]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_group_active_at_window_boundary() {
        // The group stays active when the breakpoint is exactly one window from its left start
        let mut clusterer = get_clusterer();
        let groups = clusterer.cluster(vec![
            get_test_breakpoint("chr1", 1000, "chr2", 5000, b"A"),
            get_test_breakpoint("chr1", 2000, "chr2", 5000, b"C"),
            get_test_breakpoint("chr1", 2000, "chr2", 5001, b"G"),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].breakpoints.len(), 3);
        assert_eq!((groups[0].left_start, groups[0].left_stop), (1000, 2000));
    }

    #[test]
    fn test_chrom_mismatch() {
        let mut clusterer = get_clusterer();
        let groups = clusterer.cluster(vec![
            get_test_breakpoint("chr1", 1000, "chr2", 5000, b"A"),
            get_test_breakpoint("chr1", 1000, "chr3", 5000, b"C"),
            get_test_breakpoint("chr4", 1000, "chr2", 5000, b"G"),
        ]);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_first_matching_group() {
        // The second breakpoint starts a new group because its right position is too far from
        // the first group, the third breakpoint could join either group, and joins the first.
        let mut clusterer = get_clusterer();
        let groups = clusterer.cluster(vec![
            get_test_breakpoint("chr1", 1000, "chr2", 5000, b"A"),
            get_test_breakpoint("chr1", 1100, "chr2", 6500, b"C"),
            get_test_breakpoint("chr1", 1200, "chr2", 5800, b"G"),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].breakpoints.len(), 2);
        assert_eq!(groups[0].right_stop, 5800);
        assert_eq!(groups[1].breakpoints.len(), 1);
    }

    #[test]
    fn test_group_ids() {
        let breakpoints = vec![
            get_test_breakpoint("chr1", 1000, "chr2", 5000, b"A"),
            get_test_breakpoint("chr3", 1000, "chr2", 5000, b"C"),
        ];

        let mut clusterer = get_clusterer();
        let groups = clusterer.cluster(breakpoints.clone());
        assert_eq!(
            groups.iter().map(|x| x.group_id).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(clusterer.next_group_id(), 3);

        let mut clusterer = get_clusterer().with_first_group_id(100);
        let groups = clusterer.cluster(breakpoints.clone());
        assert_eq!(
            groups.iter().map(|x| x.group_id).collect::<Vec<_>>(),
            vec![100, 101]
        );

        // Independent clusterers produce the same result:
        let groups1 = get_clusterer().cluster(breakpoints.clone());
        let groups2 = get_clusterer().cluster(breakpoints);
        for (g1, g2) in groups1.iter().zip(groups2.iter()) {
            assert_eq!(g1.group_id, g2.group_id);
            assert_eq!(g1.breakpoints, g2.breakpoints);
        }
    }
}
