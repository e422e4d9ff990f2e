//! Fasta-style output of clustered breakpoint candidates
//!

use std::fs::File;
use std::io::{self, BufWriter, Write};

use camino::Utf8Path;
use log::info;
use simple_error::{SimpleResult, try_with};

use super::cluster::BreakpointGroup;

/// Write the supporting bases of every breakpoint group member as a fasta-style record
///
/// Each record is a `>` prefixed member label line followed by a single line of bases.
///
/// Returns true if any record was written.
///
pub fn write_breakpoint_candidates<W: Write>(
    writer: &mut W,
    groups: &[BreakpointGroup],
) -> io::Result<bool> {
    let mut has_candidates = false;
    for group in groups.iter() {
        for breakpoint in group.breakpoints.iter() {
            writeln!(writer, ">{}", group.get_member_label(breakpoint))?;
            writer.write_all(&breakpoint.bases)?;
            writer.write_all(b"\n")?;
            has_candidates = true;
        }
    }
    Ok(has_candidates)
}

pub fn write_breakpoint_candidates_file(
    filename: &Utf8Path,
    groups: &[BreakpointGroup],
) -> SimpleResult<bool> {
    info!("Writing breakpoint candidate sequences to file: '{filename}'");

    let f = try_with!(
        File::create(filename),
        "Unable to create breakpoint candidate file: '{filename}'"
    );
    let mut writer = BufWriter::new(f);
    let has_candidates = try_with!(
        write_breakpoint_candidates(&mut writer, groups),
        "Unable to write breakpoint candidates to file: '{filename}'"
    );
    try_with!(
        writer.flush(),
        "Unable to write breakpoint candidates to file: '{filename}'"
    );
    Ok(has_candidates)
}
