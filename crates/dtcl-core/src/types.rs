use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::{CartType, Outcome};

/// One physical bay. Created at detection time and updated in place as
/// cartridges come and go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotInfo {
    pub slot_number: u8,
    pub detected_cart_type: CartType,
    pub is_cart_detected: bool,
    pub report_file_path: Option<PathBuf>,
}

impl SlotInfo {
    pub fn new(slot_number: u8) -> Self {
        Self {
            slot_number,
            detected_cart_type: CartType::Unknown,
            is_cart_detected: false,
            report_file_path: None,
        }
    }

    pub fn cart_detected(&mut self, cart_type: CartType) {
        self.detected_cart_type = cart_type;
        self.is_cart_detected = true;
    }

    pub fn cart_removed(&mut self) {
        self.detected_cart_type = CartType::Unknown;
        self.is_cart_detected = false;
    }
}

/// Identity of one report. Fixed once the report has been created.
#[derive(Clone, Debug)]
pub struct TestRunRecord {
    pub test_number: String,
    pub inspector_name: String,
    pub dtc_serial: String,
    pub unit_serial: String,
    pub with_cart: bool,
    pub slot: SlotInfo,
    pub channel_no: Option<u32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepResult {
    /// Raw outcome token. Anything but PASS/FAIL is dropped when formatted.
    pub outcome: String,
    /// `dd-mm-YYYY HH-MM-SS`
    pub timestamp: String,
}

impl StepResult {
    pub fn new(outcome: Outcome, timestamp: impl Into<String>) -> Self {
        Self {
            outcome: outcome.as_str().to_string(),
            timestamp: timestamp.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerformanceResult {
    pub loop_back: StepResult,
    pub erase: StepResult,
    pub write: StepResult,
    pub read: StepResult,
}

impl PerformanceResult {
    /// Same verdict for every sub-test, stamped with one timestamp.
    pub fn uniform(outcome: Outcome, timestamp: &str) -> Self {
        Self {
            loop_back: StepResult::new(outcome, timestamp),
            erase: StepResult::new(outcome, timestamp),
            write: StepResult::new(outcome, timestamp),
            read: StepResult::new(outcome, timestamp),
        }
    }
}
