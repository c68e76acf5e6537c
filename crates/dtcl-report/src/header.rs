use dtcl_core::TestRunRecord;

use crate::ReportError;

pub const REPORT_TITLE: &str = "                DTCL Cartridge Write Test Report";
pub const COLUMN_TITLE: &str = "Test             Itrn No         PASS/FAIL          Date          Time";
pub const SEPARATOR: &str = "----------------------------------------------------------------------";

pub const LABEL_DATE: &str = "Date";
pub const LABEL_TIME: &str = "Time";
pub const LABEL_UNIT_SERIAL: &str = "Unit Serial";
pub const LABEL_DTC_SERIAL: &str = "DTC Serial";
pub const LABEL_TEST_NO: &str = "Test No";
pub const LABEL_INSPECTOR: &str = "Inspector's Name";
pub const LABEL_CART_TYPE: &str = "Cartridge type";
pub const LABEL_ITERATION: &str = "Iteration Number";

const LABEL_WIDTH: usize = 16;
const DURATION_TAG: &str = "Duration:";
const ZERO_DURATION: &str = "00:00:00";

pub fn field_line(label: &str, value: &str) -> String {
    format!("{label:<LABEL_WIDTH$}: {value}")
}

pub fn iteration_line(iteration: u32, duration: &str) -> String {
    format!("{LABEL_ITERATION:<LABEL_WIDTH$}: {iteration}    {DURATION_TAG} {duration}")
}

/// Lines of the header block: everything before the column title, or the
/// whole text if the title is missing.
pub fn header_block<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    match lines.iter().position(|l| *l == COLUMN_TITLE) {
        Some(end) => &lines[..end],
        None => lines,
    }
}

/// Index of the header line that starts with `label`.
pub fn find_field(lines: &[&str], label: &str) -> Option<usize> {
    header_block(lines).iter().position(|l| l.starts_with(label))
}

fn value_of(line: &str) -> Option<&str> {
    line.split_once(':').map(|(_, v)| v.trim())
}

/// Typed view of a report's header block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportHeader {
    pub date: String,
    pub time: String,
    pub unit_serial: String,
    /// Present only for reports written with a cartridge.
    pub dtc_serial: Option<String>,
    pub test_number: String,
    pub inspector_name: String,
    pub cart_type: Option<String>,
    pub iteration: u32,
    pub duration: String,
}

impl ReportHeader {
    pub fn for_run(run: &TestRunRecord, date: &str, time: &str) -> Self {
        Self {
            date: date.to_string(),
            time: time.to_string(),
            unit_serial: run.unit_serial.clone(),
            dtc_serial: run.with_cart.then(|| run.dtc_serial.clone()),
            test_number: run.test_number.clone(),
            inspector_name: run.inspector_name.clone(),
            cart_type: run.with_cart.then(|| run.slot.detected_cart_type.to_string()),
            iteration: 0,
            duration: ZERO_DURATION.to_string(),
        }
    }

    /// The full header block, title through separator.
    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![
            REPORT_TITLE.to_string(),
            field_line(LABEL_DATE, &self.date),
            field_line(LABEL_TIME, &self.time),
            field_line(LABEL_UNIT_SERIAL, &self.unit_serial),
        ];
        if let Some(dtc) = &self.dtc_serial {
            lines.push(field_line(LABEL_DTC_SERIAL, dtc));
        }
        lines.push(field_line(LABEL_TEST_NO, &self.test_number));
        lines.push(field_line(LABEL_INSPECTOR, &self.inspector_name));
        if let Some(cart) = &self.cart_type {
            lines.push(field_line(LABEL_CART_TYPE, cart));
        }
        lines.push(iteration_line(self.iteration, &self.duration));
        lines.push(String::new());
        lines.push(COLUMN_TITLE.to_string());
        lines.push(SEPARATOR.to_string());
        lines
    }

    /// Recover the header from a report's text. Date and Time are required;
    /// the other fields default to empty when absent.
    pub fn parse(text: &str) -> Result<Self, ReportError> {
        let lines: Vec<&str> = text.lines().collect();
        let block = header_block(&lines);

        let optional = |label: &'static str| -> Option<String> {
            block
                .iter()
                .find(|l| l.starts_with(label))
                .and_then(|l| value_of(l))
                .map(str::to_string)
        };
        let required = |label: &'static str| -> Result<String, ReportError> {
            let line = block
                .iter()
                .find(|l| l.starts_with(label))
                .ok_or(ReportError::MissingField { label })?;
            match value_of(line) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                _ => Err(ReportError::MalformedHeader { label, line: line.to_string() }),
            }
        };

        let (iteration, duration) = match block.iter().find(|l| l.starts_with(LABEL_ITERATION)) {
            Some(line) => parse_iteration_line(line)?,
            None => (0, ZERO_DURATION.to_string()),
        };

        Ok(Self {
            date: required(LABEL_DATE)?,
            time: required(LABEL_TIME)?,
            unit_serial: optional(LABEL_UNIT_SERIAL).unwrap_or_default(),
            dtc_serial: optional(LABEL_DTC_SERIAL),
            test_number: optional(LABEL_TEST_NO).unwrap_or_default(),
            inspector_name: optional(LABEL_INSPECTOR).unwrap_or_default(),
            cart_type: optional(LABEL_CART_TYPE),
            iteration,
            duration,
        })
    }
}

fn parse_iteration_line(line: &str) -> Result<(u32, String), ReportError> {
    let malformed = || ReportError::MalformedHeader { label: LABEL_ITERATION, line: line.to_string() };
    let rest = line.split_once(':').map(|(_, v)| v).ok_or_else(malformed)?;
    let (count, duration) = match rest.split_once(DURATION_TAG) {
        Some((c, d)) => (c, d.trim().to_string()),
        None => (rest, ZERO_DURATION.to_string()),
    };
    let iteration = count.trim().parse().map_err(|_| malformed())?;
    Ok((iteration, duration))
}
