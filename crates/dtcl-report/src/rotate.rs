use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    active_test_number, archived_file_name, numbered_name, unreadable_archive_name, ReportError, ReportHeader,
};

#[derive(Debug, Default)]
pub struct RotationSummary {
    /// New locations of the archived reports.
    pub archived: Vec<PathBuf>,
    /// Reports that could not be moved and are still in place, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Moves previous reports out of the way before a new run starts.
///
/// Archive names come from the Date/Time fields in each report's own header,
/// never from filesystem timestamps. A name already taken in the archive gets
/// a `_<n>` suffix; a report whose header cannot be read is archived as
/// `<testNumber>_log_unreadable.txt`. Only filesystem failures leave a report
/// in place.
pub struct LogRotator;

impl LogRotator {
    /// Best effort: a report that cannot be archived is logged and skipped,
    /// the rest are still processed. A missing source directory is a no-op.
    pub fn archive(source_dir: &Path, archive_dir: &Path) -> RotationSummary {
        let mut summary = RotationSummary::default();

        let entries = match std::fs::read_dir(source_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return summary,
            Err(e) => {
                warn!(dir = %source_dir.display(), error = %e, "cannot list report directory");
                return summary;
            }
        };

        let mut candidates: Vec<(PathBuf, String)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                active_test_number(&name).map(|tn| (entry.path(), tn.to_string()))
            })
            .collect();
        candidates.sort();

        for (path, name_test_number) in candidates {
            match Self::archive_one(&path, &name_test_number, archive_dir) {
                Ok(target) => {
                    info!(from = %path.display(), to = %target.display(), "archived report");
                    summary.archived.push(target);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "report left in place");
                    summary.skipped.push((path, e.to_string()));
                }
            }
        }
        summary
    }

    fn archive_one(path: &Path, name_test_number: &str, archive_dir: &Path) -> Result<PathBuf, ReportError> {
        let bytes = std::fs::read(path).map_err(ReportError::io("read", path))?;
        let name = match ReportHeader::parse(&String::from_utf8_lossy(&bytes)) {
            Ok(header) => {
                let test_number = if header.test_number.is_empty() {
                    name_test_number
                } else {
                    header.test_number.as_str()
                };
                archived_file_name(test_number, &header.date, &header.time)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable report header; archiving under fallback name");
                unreadable_archive_name(name_test_number)
            }
        };

        std::fs::create_dir_all(archive_dir).map_err(ReportError::io("create", archive_dir))?;
        let target = free_target(archive_dir, &name);
        std::fs::rename(path, &target).map_err(ReportError::io("move", path))?;
        Ok(target)
    }
}

/// First of `name`, `name_1`, `name_2`, ... not yet present in `dir`.
fn free_target(dir: &Path, name: &str) -> PathBuf {
    let first = dir.join(name);
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(numbered_name(name, n)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn report_text(test_no: &str, date: &str, time: &str) -> String {
        format!(
            "title\nDate            : {date}\nTime            : {time}\nTest No         : {test_no}\n\n{}\n{}\n",
            crate::COLUMN_TITLE,
            crate::SEPARATOR
        )
    }

    #[test]
    fn archives_using_header_date_time() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("TestLog");
        std::fs::write(dir.path().join("T42_log.txt"), report_text("T42", "05-03-2024", "14-22-01")).unwrap();

        let s = LogRotator::archive(dir.path(), &archive);
        assert_eq!(s.archived, vec![archive.join("T42_log_05-03-2024_14-22-01.txt")]);
        assert!(s.skipped.is_empty());
        assert!(!dir.path().join("T42_log.txt").exists());
        assert!(archive.join("T42_log_05-03-2024_14-22-01.txt").exists());
    }

    #[test]
    fn empty_source_is_a_no_op() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("TestLog");
        std::fs::create_dir_all(&archive).unwrap();
        std::fs::write(archive.join("old_log_01-01-2020_00-00-00.txt"), "x").unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();

        let s = LogRotator::archive(&src, &archive);
        assert!(s.archived.is_empty() && s.skipped.is_empty());
        assert_eq!(std::fs::read_dir(&archive).unwrap().count(), 1);

        // missing directory behaves the same
        let s = LogRotator::archive(&dir.path().join("nope"), &archive);
        assert!(s.archived.is_empty() && s.skipped.is_empty());
    }

    #[test]
    fn malformed_report_is_archived_under_fallback_name() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("TestLog");
        std::fs::write(dir.path().join("A_log.txt"), "no header here\n").unwrap();
        std::fs::write(dir.path().join("B_log.txt"), report_text("B", "01-02-2024", "03-04-05")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let s = LogRotator::archive(dir.path(), &archive);
        assert_eq!(
            s.archived,
            vec![archive.join("A_log_unreadable.txt"), archive.join("B_log_01-02-2024_03-04-05.txt")]
        );
        assert!(s.skipped.is_empty());
        assert_eq!(std::fs::read_to_string(archive.join("A_log_unreadable.txt")).unwrap(), "no header here\n");
        assert!(!dir.path().join("A_log.txt").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn taken_archive_name_gets_a_counter() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("TestLog");
        std::fs::create_dir_all(&archive).unwrap();
        std::fs::write(archive.join("C_log_01-02-2024_03-04-05.txt"), "older").unwrap();
        std::fs::write(archive.join("C_log_01-02-2024_03-04-05_1.txt"), "old").unwrap();
        std::fs::write(dir.path().join("C_log.txt"), report_text("C", "01-02-2024", "03-04-05")).unwrap();

        let s = LogRotator::archive(dir.path(), &archive);
        assert_eq!(s.archived, vec![archive.join("C_log_01-02-2024_03-04-05_2.txt")]);
        assert!(s.skipped.is_empty());
        assert_eq!(std::fs::read_to_string(archive.join("C_log_01-02-2024_03-04-05.txt")).unwrap(), "older");
        assert!(!dir.path().join("C_log.txt").exists());
    }

    #[test]
    fn unusable_archive_dir_leaves_report_in_place() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("TestLog");
        std::fs::write(&archive, "not a directory").unwrap();
        std::fs::write(dir.path().join("D_log.txt"), report_text("D", "01-02-2024", "03-04-05")).unwrap();

        let s = LogRotator::archive(dir.path(), &archive);
        assert!(s.archived.is_empty());
        assert_eq!(s.skipped.len(), 1);
        assert!(dir.path().join("D_log.txt").exists());
    }

    #[test]
    fn falls_back_to_file_name_test_number() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("OldLog");
        std::fs::write(dir.path().join("Z9_log.txt"), "Date: 02-02-2022\nTime: 10-00-00\n").unwrap();
        let s = LogRotator::archive(dir.path(), &archive);
        assert_eq!(s.archived, vec![archive.join("Z9_log_02-02-2022_10-00-00.txt")]);
    }
}
