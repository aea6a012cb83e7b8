use simfs_core::{CheckReport, DirEntry, InodeMetadata, PoolStatus, TreeEntry};
use std::io::{self, Write};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub fn timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok())
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| secs.to_string())
}

pub fn entries(out: &mut dyn Write, entries: &[DirEntry]) -> io::Result<()> {
    for entry in entries {
        writeln!(out, "{}", entry.name)?;
    }
    Ok(())
}

pub fn tree(out: &mut dyn Write, walk: &[TreeEntry]) -> io::Result<()> {
    for entry in walk {
        writeln!(out, "{}{}", "  ".repeat(entry.depth), entry.name)?;
    }
    Ok(())
}

pub fn detail(out: &mut dyn Write, meta: &InodeMetadata) -> io::Result<()> {
    writeln!(out, "Inode number: {}", meta.inode)?;
    writeln!(out, "Type: {}", meta.kind)?;
    writeln!(out, "Size: {} bytes", meta.size)?;
    writeln!(out, "Created: {}", timestamp(meta.created))?;
    writeln!(out, "Modified: {}", timestamp(meta.modified))?;
    let blocks: Vec<String> = meta.blocks.iter().map(ToString::to_string).collect();
    writeln!(out, "Data blocks: {}", blocks.join(" "))
}

pub fn status(out: &mut dyn Write, status: &PoolStatus) -> io::Result<()> {
    writeln!(out, "Superblock Information:")?;
    writeln!(out, "  Total blocks: {}", status.total_blocks)?;
    writeln!(out, "  Block size: {} bytes", status.block_size)?;
    writeln!(out, "  Free blocks: {}", status.free_blocks)?;
    writeln!(out, "  Used blocks: {}", status.used_blocks())?;
    writeln!(out, "  Total inodes: {}", status.total_inodes)?;
    writeln!(out, "  Free inodes: {}", status.free_inodes)?;
    writeln!(out, "  Used inodes: {}", status.used_inodes())?;
    writeln!(out, "  Root inode: {}", status.root_inode)
}

pub fn check(out: &mut dyn Write, report: &CheckReport) -> io::Result<()> {
    if report.is_clean() {
        return writeln!(out, "Filesystem is consistent");
    }
    for problem in &report.problems {
        writeln!(out, "fsck: {}", problem)?;
    }
    writeln!(out, "{} problem(s) found", report.problems.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reports_used_counts() {
        let fs = simfs_core::FileSystem::new(simfs_core::FsConfig::default()).unwrap();
        let mut out = Vec::new();
        status(&mut out, &fs.pool_status()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  Used blocks: 0\n"));
        assert!(text.contains("  Used inodes: 1\n"));
    }

    #[test]
    fn epoch_formats_as_rfc3339() {
        assert_eq!(timestamp(0), "1970-01-01T00:00:00Z");
    }
}
