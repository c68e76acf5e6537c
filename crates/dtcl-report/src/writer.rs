use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dtcl_core::{PerformanceResult, TestRunRecord};
use tracing::{debug, info};

use crate::{
    active_file_name, find_field, iteration_line, now_stamps, performance_lines, LogDirectoryState, LogRotator,
    ReportError, ReportHeader, ReportLayout, LABEL_DATE, LABEL_ITERATION, LABEL_TIME,
};

/// Report operations the orchestrator drives.
///
/// Edits are whole-file read-modify-write; callers must not point two
/// writers at the same report concurrently.
pub trait ReportWriter: Send + Sync {
    /// Where `create_new_report` would place the report. Touches nothing.
    fn report_path(&self, run: &TestRunRecord, board_id: u8) -> PathBuf;
    /// Archive earlier reports in the target directory, then write a fresh
    /// header. Returns the new report's path. An earlier report that could not
    /// be archived is never overwritten; that case is `ReportError::Collision`.
    fn create_new_report(&self, run: &TestRunRecord, board_id: u8) -> Result<PathBuf, ReportError>;
    fn edit_header_date_time(&self, path: &Path, date: &str, time: &str) -> Result<(), ReportError>;
    fn edit_iteration_and_duration(&self, path: &Path, iteration: u32, duration: &str) -> Result<(), ReportError>;
    fn append_iteration_duration(&self, path: &Path, iteration: u32, duration: &str) -> Result<(), ReportError>;
    fn append_entry(&self, path: &Path, text: &str) -> Result<(), ReportError>;
    fn append_performance_result(
        &self,
        path: &Path,
        with_cart: bool,
        result: &PerformanceResult,
        iteration_completed: u32,
    ) -> Result<(), ReportError>;
}

pub struct FsReportWriter {
    pub layout: ReportLayout,
    channels: Mutex<LogDirectoryState>,
}

impl FsReportWriter {
    pub fn new(layout: ReportLayout) -> Self {
        Self { layout, channels: Mutex::new(LogDirectoryState::new()) }
    }

    /// Active report registered for a multiplexer channel.
    pub fn channel_report(&self, channel: u32) -> Option<PathBuf> {
        self.channels().get(channel).map(Path::to_path_buf)
    }

    fn channels(&self) -> std::sync::MutexGuard<'_, LogDirectoryState> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `create_new_report` with an explicit header date and time.
    pub fn create_new_report_at(
        &self,
        run: &TestRunRecord,
        board_id: u8,
        date: &str,
        time: &str,
    ) -> Result<PathBuf, ReportError> {
        let path = self.report_path(run, board_id);
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let archive = self.layout.archive_dir(&dir, run.channel_no);
        std::fs::create_dir_all(&dir).map_err(ReportError::io("create", &dir))?;

        let rotated = LogRotator::archive(&dir, &archive);
        if !rotated.archived.is_empty() || !rotated.skipped.is_empty() {
            info!(
                archived = rotated.archived.len(),
                skipped = rotated.skipped.len(),
                dir = %dir.display(),
                "rotated previous reports"
            );
        }

        if path.exists() {
            return Err(ReportError::Collision(path));
        }

        let header = ReportHeader::for_run(run, date, time);
        write_lines(&path, &header.render())?;

        if let Some(channel) = run.channel_no {
            self.channels().register(channel, path.clone());
        }
        info!(path = %path.display(), slot = run.slot.slot_number, "created report");
        Ok(path)
    }
}

impl ReportWriter for FsReportWriter {
    fn report_path(&self, run: &TestRunRecord, board_id: u8) -> PathBuf {
        self.layout
            .report_dir(board_id, run.slot.slot_number, run.channel_no)
            .join(active_file_name(&run.test_number))
    }

    fn create_new_report(&self, run: &TestRunRecord, board_id: u8) -> Result<PathBuf, ReportError> {
        let (date, time) = now_stamps();
        self.create_new_report_at(run, board_id, &date, &time)
    }

    fn edit_header_date_time(&self, path: &Path, date: &str, time: &str) -> Result<(), ReportError> {
        rewrite_header(path, |lines| {
            set_field_value(lines, LABEL_DATE, date)?;
            set_field_value(lines, LABEL_TIME, time)
        })
    }

    fn edit_iteration_and_duration(&self, path: &Path, iteration: u32, duration: &str) -> Result<(), ReportError> {
        rewrite_header(path, |lines| {
            let idx = field_index(lines, LABEL_ITERATION)?;
            lines[idx] = iteration_line(iteration, duration);
            Ok(())
        })
    }

    fn append_iteration_duration(&self, path: &Path, iteration: u32, duration: &str) -> Result<(), ReportError> {
        append_lines(path, &[format!("Iteration {iteration} completed, Duration: {duration}")])
    }

    fn append_entry(&self, path: &Path, text: &str) -> Result<(), ReportError> {
        append_lines(path, &[text.to_string()])
    }

    fn append_performance_result(
        &self,
        path: &Path,
        with_cart: bool,
        result: &PerformanceResult,
        iteration_completed: u32,
    ) -> Result<(), ReportError> {
        append_lines(path, &performance_lines(with_cart, result, iteration_completed))
    }
}

/// Parse the header of the report at `path`.
pub fn read_header(path: &Path) -> Result<ReportHeader, ReportError> {
    let text = std::fs::read_to_string(path).map_err(ReportError::io("read", path))?;
    ReportHeader::parse(&text)
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), ReportError> {
    let mut text = lines.join("\n");
    text.push('\n');
    std::fs::write(path, text).map_err(ReportError::io("write", path))
}

/// Reports are never created by appending; a missing file is an error.
fn append_lines(path: &Path, lines: &[String]) -> Result<(), ReportError> {
    let mut f = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(ReportError::io("open", path))?;
    for line in lines {
        writeln!(f, "{line}").map_err(ReportError::io("append", path))?;
    }
    Ok(())
}

fn field_index(lines: &[String], label: &'static str) -> Result<usize, ReportError> {
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    find_field(&refs, label).ok_or(ReportError::MissingField { label })
}

/// Replace what follows the first colon of the `label` line.
fn set_field_value(lines: &mut [String], label: &'static str, value: &str) -> Result<(), ReportError> {
    let idx = field_index(lines, label)?;
    let prefix = match lines[idx].split_once(':') {
        Some((prefix, _)) => prefix.to_string(),
        None => return Err(ReportError::MalformedHeader { label, line: lines[idx].clone() }),
    };
    lines[idx] = format!("{prefix}: {value}");
    Ok(())
}

/// Read the whole report, apply `edit` to its lines, and replace the file.
fn rewrite_header<F>(path: &Path, edit: F) -> Result<(), ReportError>
where
    F: FnOnce(&mut Vec<String>) -> Result<(), ReportError>,
{
    let text = std::fs::read_to_string(path).map_err(ReportError::io("read", path))?;
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    edit(&mut lines)?;

    let mut out = lines.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    let tmp = path.with_extension("txt.tmp");
    std::fs::write(&tmp, out).map_err(ReportError::io("write", &tmp))?;
    std::fs::rename(&tmp, path).map_err(ReportError::io("replace", path))?;
    debug!(path = %path.display(), "rewrote report header");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtcl_core::{CartType, Outcome, SlotInfo};
    use tempfile::tempdir;

    fn run(slot: u8, channel_no: Option<u32>) -> TestRunRecord {
        let mut slot = SlotInfo::new(slot);
        slot.cart_detected(CartType::Darin1);
        TestRunRecord {
            test_number: "T7".into(),
            inspector_name: "QA".into(),
            dtc_serial: "D-1".into(),
            unit_serial: "U-1".into(),
            with_cart: true,
            slot,
            channel_no,
        }
    }

    fn writer(root: &Path) -> FsReportWriter {
        FsReportWriter::new(ReportLayout::new(root.to_path_buf(), 0xFF))
    }

    #[test]
    fn create_writes_header_into_slot_dir() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path());
        let path = w.create_new_report_at(&run(2, None), 1, "05-03-2024", "14-22-01").unwrap();
        assert_eq!(path, dir.path().join("PC_Log/Slot-2/T7_log.txt"));
        let h = read_header(&path).unwrap();
        assert_eq!(h.date, "05-03-2024");
        assert_eq!(h.cart_type.as_deref(), Some("Darin1"));
        assert!(w.channel_report(0).is_none());
    }

    #[test]
    fn create_rotates_previous_report() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path());
        let first = w.create_new_report_at(&run(1, None), 1, "01-01-2024", "08-00-00").unwrap();
        w.append_entry(&first, "first run").unwrap();
        let second = w.create_new_report_at(&run(1, None), 1, "02-01-2024", "09-00-00").unwrap();
        assert_eq!(first, second);

        let archived = dir.path().join("PC_Log/Slot-1/TestLog/T7_log_01-01-2024_08-00-00.txt");
        assert!(std::fs::read_to_string(archived).unwrap().contains("first run"));
        assert!(!std::fs::read_to_string(&second).unwrap().contains("first run"));
    }

    #[test]
    fn runs_in_the_same_second_keep_every_report() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path());
        for run_data in ["run A data", "run B data", "run C data"] {
            let path = w.create_new_report_at(&run(1, None), 1, "01-01-2024", "08-00-00").unwrap();
            w.append_entry(&path, run_data).unwrap();
        }

        let archive = dir.path().join("PC_Log/Slot-1/TestLog");
        let first = std::fs::read_to_string(archive.join("T7_log_01-01-2024_08-00-00.txt")).unwrap();
        let second = std::fs::read_to_string(archive.join("T7_log_01-01-2024_08-00-00_1.txt")).unwrap();
        assert!(first.contains("run A data"));
        assert!(second.contains("run B data"));
        let active = std::fs::read_to_string(dir.path().join("PC_Log/Slot-1/T7_log.txt")).unwrap();
        assert!(active.contains("run C data"));
    }

    #[test]
    fn headerless_report_survives_new_report() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path());
        let slot_dir = dir.path().join("PC_Log/Slot-1");
        std::fs::create_dir_all(&slot_dir).unwrap();
        std::fs::write(slot_dir.join("T7_log.txt"), "precious history\n").unwrap();

        let path = w.create_new_report_at(&run(1, None), 1, "01-01-2024", "08-00-00").unwrap();
        assert!(read_header(&path).is_ok());
        let kept = std::fs::read_to_string(slot_dir.join("TestLog/T7_log_unreadable.txt")).unwrap();
        assert_eq!(kept, "precious history\n");
    }

    #[test]
    fn report_that_cannot_be_archived_is_not_overwritten() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path());
        let slot_dir = dir.path().join("PC_Log/Slot-1");
        std::fs::create_dir_all(&slot_dir).unwrap();
        std::fs::write(slot_dir.join("TestLog"), "blocks the archive dir").unwrap();
        std::fs::write(slot_dir.join("T7_log.txt"), "precious history\n").unwrap();

        let err = w.create_new_report_at(&run(1, None), 1, "01-01-2024", "08-00-00").unwrap_err();
        assert!(matches!(err, ReportError::Collision(ref p) if *p == slot_dir.join("T7_log.txt")));
        assert_eq!(std::fs::read_to_string(slot_dir.join("T7_log.txt")).unwrap(), "precious history\n");
    }

    #[test]
    fn reserved_board_shares_one_flat_report() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path());
        assert_eq!(w.report_path(&run(1, None), 0xFF), dir.path().join("PC_Log/T7_log.txt"));
        assert_eq!(w.report_path(&run(1, None), 0xFF), w.report_path(&run(3, None), 0xFF));
        assert_ne!(w.report_path(&run(1, None), 2), w.report_path(&run(3, None), 2));
        assert!(!dir.path().join("PC_Log").exists());
    }

    #[test]
    fn channel_report_is_registered() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path());
        let path = w.create_new_report_at(&run(1, Some(4)), 1, "01-01-2024", "08-00-00").unwrap();
        assert_eq!(path, dir.path().join("Mux/ChannelNo-4/T7_log.txt"));
        assert_eq!(w.channel_report(4), Some(path));
    }

    #[test]
    fn date_time_edit_changes_only_those_lines() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path());
        let path = w.create_new_report_at(&run(1, None), 1, "01-01-2024", "08-00-00").unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        w.edit_header_date_time(&path, "05-03-2024", "14-22-01").unwrap();
        let after = std::fs::read_to_string(&path).unwrap();

        let changed: Vec<(&str, &str)> = before
            .lines()
            .zip(after.lines())
            .filter(|(a, b)| a != b)
            .collect();
        assert_eq!(
            changed,
            vec![
                ("Date            : 01-01-2024", "Date            : 05-03-2024"),
                ("Time            : 08-00-00", "Time            : 14-22-01"),
            ]
        );
        assert_eq!(before.lines().count(), after.lines().count());
        assert!(after.ends_with('\n'));
    }

    #[test]
    fn iteration_edit_keeps_entries() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path());
        let path = w.create_new_report_at(&run(1, None), 1, "01-01-2024", "08-00-00").unwrap();
        let r = PerformanceResult::uniform(Outcome::Pass, "01-01-2024 08-00-05");
        w.append_performance_result(&path, true, &r, 1).unwrap();
        w.edit_iteration_and_duration(&path, 1, "00:00:05").unwrap();
        w.append_iteration_duration(&path, 1, "00:00:05").unwrap();

        let h = read_header(&path).unwrap();
        assert_eq!((h.iteration, h.duration.as_str()), (1, "00:00:05"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("Iteration Number")).count(), 1);
        assert!(text.contains("Read             1             PASS"));
        assert!(text.ends_with("Iteration 1 completed, Duration: 00:00:05\n"));
    }

    #[test]
    fn append_to_missing_report_fails() {
        let dir = tempdir().unwrap();
        let w = writer(dir.path());
        let err = w.append_entry(&dir.path().join("none_log.txt"), "x").unwrap_err();
        assert!(matches!(err, ReportError::Io { op: "open", .. }));
        assert!(!dir.path().join("none_log.txt").exists());
    }

    #[test]
    fn edit_without_iteration_line_reports_missing_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("X_log.txt");
        std::fs::write(&path, "Date: 1\nTime: 2\n").unwrap();
        let err = writer(dir.path()).edit_iteration_and_duration(&path, 3, "00:00:01").unwrap_err();
        assert!(matches!(err, ReportError::MissingField { label: LABEL_ITERATION }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Date: 1\nTime: 2\n");
    }
}
