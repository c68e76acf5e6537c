use std::path::{Path, PathBuf};

const PC_LOG_DIR: &str = "PC_Log";
const PC_ARCHIVE_DIR: &str = "TestLog";
const MUX_DIR: &str = "Mux";
const MUX_ARCHIVE_DIR: &str = "OldLog";
const ACTIVE_SUFFIX: &str = "_log.txt";

/// Where reports for a board/slot/channel live.
///
/// - channel given: `<root>/Mux/ChannelNo-<n>/`, archive `OldLog/`
/// - board reporting the reserved id: `<root>/PC_Log/`, archive `TestLog/`
/// - otherwise: `<root>/PC_Log/Slot-<n>/`, archive `TestLog/`
#[derive(Clone, Debug)]
pub struct ReportLayout {
    pub root: PathBuf,
    pub reserved_board_id: u8,
}

impl ReportLayout {
    pub fn new(root: PathBuf, reserved_board_id: u8) -> Self {
        Self { root, reserved_board_id }
    }

    pub fn report_dir(&self, board_id: u8, slot: u8, channel: Option<u32>) -> PathBuf {
        match channel {
            Some(ch) => self.root.join(MUX_DIR).join(format!("ChannelNo-{ch}")),
            None if board_id == self.reserved_board_id => self.root.join(PC_LOG_DIR),
            None => self.root.join(PC_LOG_DIR).join(format!("Slot-{slot}")),
        }
    }

    pub fn archive_dir(&self, report_dir: &Path, channel: Option<u32>) -> PathBuf {
        match channel {
            Some(_) => report_dir.join(MUX_ARCHIVE_DIR),
            None => report_dir.join(PC_ARCHIVE_DIR),
        }
    }
}

pub fn active_file_name(test_number: &str) -> String {
    format!("{test_number}{ACTIVE_SUFFIX}")
}

pub fn archived_file_name(test_number: &str, date: &str, time: &str) -> String {
    format!(
        "{}_log_{}_{}.txt",
        sanitize_component(test_number),
        sanitize_component(date),
        sanitize_component(time)
    )
}

/// Archive name for a report whose header could not be read.
pub fn unreadable_archive_name(test_number: &str) -> String {
    format!("{test_number}_log_unreadable.txt")
}

/// `name` with `_<n>` inserted before the extension.
pub fn numbered_name(name: &str, n: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{n}.{ext}"),
        None => format!("{name}_{n}"),
    }
}

/// Test number of an active report file name (`<testNumber>_log.txt`).
pub fn active_test_number(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(ACTIVE_SUFFIX)
        .filter(|stem| !stem.is_empty())
}

fn sanitize_component(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | ' ' => '-',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ReportLayout {
        ReportLayout::new(PathBuf::from("/r"), 0xFF)
    }

    #[test]
    fn slot_board_gets_slot_dir() {
        let dir = layout().report_dir(1, 3, None);
        assert_eq!(dir, PathBuf::from("/r/PC_Log/Slot-3"));
        assert_eq!(layout().archive_dir(&dir, None), PathBuf::from("/r/PC_Log/Slot-3/TestLog"));
    }

    #[test]
    fn reserved_board_gets_flat_dir() {
        assert_eq!(layout().report_dir(0xFF, 3, None), PathBuf::from("/r/PC_Log"));
    }

    #[test]
    fn channel_wins_over_board_and_slot() {
        let dir = layout().report_dir(0xFF, 2, Some(5));
        assert_eq!(dir, PathBuf::from("/r/Mux/ChannelNo-5"));
        assert_eq!(layout().archive_dir(&dir, Some(5)), PathBuf::from("/r/Mux/ChannelNo-5/OldLog"));
    }

    #[test]
    fn file_names() {
        assert_eq!(active_file_name("T42"), "T42_log.txt");
        assert_eq!(archived_file_name("T42", "05-03-2024", "14-22-01"), "T42_log_05-03-2024_14-22-01.txt");
        assert_eq!(archived_file_name("T42", "05/03/2024", "14:22:01"), "T42_log_05-03-2024_14-22-01.txt");
        assert_eq!(active_test_number("T42_log.txt"), Some("T42"));
        assert_eq!(active_test_number("T42_log_05-03-2024_14-22-01.txt"), None);
        assert_eq!(active_test_number("_log.txt"), None);
        assert_eq!(unreadable_archive_name("T42"), "T42_log_unreadable.txt");
        assert_eq!(numbered_name("T42_log_05-03-2024_14-22-01.txt", 2), "T42_log_05-03-2024_14-22-01_2.txt");
    }
}
