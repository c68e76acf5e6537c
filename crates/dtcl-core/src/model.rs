use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CartType {
    #[default]
    Unknown,
    Darin1,
    Darin2,
    Darin3,
}

impl CartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartType::Unknown => "Unknown",
            CartType::Darin1 => "Darin1",
            CartType::Darin2 => "Darin2",
            CartType::Darin3 => "Darin3",
        }
    }
}

impl fmt::Display for CartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown cartridge type `{0}`")]
pub struct ParseCartTypeError(pub String);

impl FromStr for CartType {
    type Err = ParseCartTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(CartType::Unknown),
            "darin1" => Ok(CartType::Darin1),
            "darin2" => Ok(CartType::Darin2),
            "darin3" => Ok(CartType::Darin3),
            other => Err(ParseCartTypeError(other.to_string())),
        }
    }
}

/// Verdict of one performance sub-test as written into the report.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "PASS",
            Outcome::Fail => "FAIL",
        }
    }

    /// Accepts "PASS"/"FAIL" in any case; anything else is `None`.
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("PASS") {
            Some(Outcome::Pass)
        } else if token.eq_ignore_ascii_case("FAIL") {
            Some(Outcome::Fail)
        } else {
            None
        }
    }
}

/// How a slot's result code is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotClass {
    Success,
    MissingHeader,
    Failure,
}

/// What the orchestrator does with the remaining slots of an iteration
/// after one of them fails.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    Continue,
    AbortSlots,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}
