//! Track outcome counts for chimera combination and breakpoint extraction
//!

use std::collections::BTreeMap;
use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, try_with};
use strum::IntoEnumIterator;

use crate::combine_chimera::ChimeraDecline;
use crate::sv_candidates::ExtractDecline;

/// Decline count map with an entry for every decline reason, so that zero counts still show up in
/// json output
///
fn get_empty_decline_counts<T>() -> BTreeMap<String, usize>
where
    T: IntoEnumIterator + Into<&'static str>,
{
    T::iter()
        .map(|x| {
            let reason: &'static str = x.into();
            (reason.to_string(), 0)
        })
        .collect()
}

fn merge_decline_counts(counts: &mut BTreeMap<String, usize>, other: &BTreeMap<String, usize>) {
    for (reason, count) in other.iter() {
        *counts.entry(reason.clone()).or_default() += count;
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChimeraCombineStats {
    pub read_group_count: usize,
    pub combined_count: usize,

    /// Count of declined read groups for each decline reason
    pub decline_counts: BTreeMap<String, usize>,
}

impl Default for ChimeraCombineStats {
    fn default() -> Self {
        Self {
            read_group_count: 0,
            combined_count: 0,
            decline_counts: get_empty_decline_counts::<ChimeraDecline>(),
        }
    }
}

impl ChimeraCombineStats {
    pub fn add_read_group(&mut self, decline: Option<ChimeraDecline>) {
        self.read_group_count += 1;
        match decline {
            None => self.combined_count += 1,
            Some(reason) => {
                let reason: &'static str = reason.into();
                *self.decline_counts.entry(reason.to_string()).or_default() += 1;
            }
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.read_group_count += other.read_group_count;
        self.combined_count += other.combined_count;
        merge_decline_counts(&mut self.decline_counts, &other.decline_counts);
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BreakpointExtractStats {
    pub read_group_count: usize,
    pub breakpoint_count: usize,

    /// Count of read groups which did not produce a breakpoint for each decline reason
    pub decline_counts: BTreeMap<String, usize>,
}

impl Default for BreakpointExtractStats {
    fn default() -> Self {
        Self {
            read_group_count: 0,
            breakpoint_count: 0,
            decline_counts: get_empty_decline_counts::<ExtractDecline>(),
        }
    }
}

impl BreakpointExtractStats {
    pub fn add_read_group(&mut self, decline: Option<ExtractDecline>) {
        self.read_group_count += 1;
        match decline {
            None => self.breakpoint_count += 1,
            Some(reason) => {
                let reason: &'static str = reason.into();
                *self.decline_counts.entry(reason.to_string()).or_default() += 1;
            }
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.read_group_count += other.read_group_count;
        self.breakpoint_count += other.breakpoint_count;
        merge_decline_counts(&mut self.decline_counts, &other.decline_counts);
    }
}

#[derive(Default, Deserialize, Serialize)]
pub struct ClusterStats {
    pub breakpoint_count: usize,
    pub breakpoint_group_count: usize,

    /// Breakpoints not added to a group because the group already has a member with identical
    /// supporting bases
    pub duplicate_sequence_count: usize,
}

#[derive(Default, Deserialize, Serialize)]
pub struct RunStats {
    pub combine_stats: ChimeraCombineStats,
    pub extract_stats: BreakpointExtractStats,
    pub cluster_stats: ClusterStats,
}

/// Write run_stats structure out in json format
pub fn write_run_stats(filename: &Utf8Path, run_stats: &RunStats) -> SimpleResult<()> {
    info!("Writing run statistics to file: '{filename}'");

    let f = try_with!(
        File::create(filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    try_with!(
        serde_json::to_writer_pretty(&f, &run_stats),
        "Unable to write run statistics to json file: '{filename}'"
    );
    Ok(())
}

pub fn read_run_stats(filename: &Utf8Path) -> SimpleResult<RunStats> {
    use std::io::BufReader;

    let file = try_with!(
        File::open(filename),
        "Unable to read run statistics json file: '{filename}'"
    );
    let reader = BufReader::new(file);
    let run_stats = try_with!(
        serde_json::from_reader(reader),
        "Unable to parse run statistics from json file: '{filename}'"
    );
    Ok(run_stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use strum::EnumCount;

    #[test]
    fn test_combine_stats() {
        let mut stats = ChimeraCombineStats::default();
        assert_eq!(stats.decline_counts.len(), ChimeraDecline::COUNT);

        stats.add_read_group(None);
        stats.add_read_group(Some(ChimeraDecline::GapTooLarge));
        stats.add_read_group(Some(ChimeraDecline::GapTooLarge));

        let mut total = ChimeraCombineStats::default();
        total.merge(&stats);
        total.merge(&stats);
        assert_eq!(total.read_group_count, 6);
        assert_eq!(total.combined_count, 2);
        assert_eq!(total.decline_counts["GapTooLarge"], 4);
        assert_eq!(total.decline_counts["ShortCigar"], 0);
    }

    #[test]
    fn test_extract_stats() {
        let mut stats = BreakpointExtractStats::default();
        assert_eq!(stats.decline_counts.len(), ExtractDecline::COUNT);

        stats.add_read_group(Some(ExtractDecline::LowMapq));
        stats.add_read_group(None);
        assert_eq!(stats.read_group_count, 2);
        assert_eq!(stats.breakpoint_count, 1);
        assert_eq!(stats.decline_counts["LowMapq"], 1);
    }

    #[test]
    fn test_run_stats_file() {
        let dir = tempfile::tempdir().unwrap();
        let filename = Utf8PathBuf::from_path_buf(dir.path().join("run_stats.json")).unwrap();

        let mut run_stats = RunStats::default();
        run_stats.combine_stats.add_read_group(None);
        run_stats.cluster_stats.breakpoint_group_count = 3;
        write_run_stats(&filename, &run_stats).unwrap();

        let run_stats = read_run_stats(&filename).unwrap();
        assert_eq!(run_stats.combine_stats.combined_count, 1);
        assert_eq!(run_stats.cluster_stats.breakpoint_group_count, 3);
    }
}
