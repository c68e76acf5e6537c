use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dtcl_core::FailurePolicy;
use serde::{Deserialize, Serialize};

pub const MAX_SLOT: u8 = 4;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub run: RunConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    pub report: ReportConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub iterations: u32,
    pub target_slots: Vec<u8>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub interactive: bool,
    pub upload_path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub inter_iteration_delay_ms: u64,
    pub settle_delay_ms: u64,
    pub detect_poll_attempts: u32,
    pub detect_poll_interval_ms: u64,
    pub progress_step: u8,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            inter_iteration_delay_ms: 1000,
            settle_delay_ms: 100,
            detect_poll_attempts: 10,
            detect_poll_interval_ms: 500,
            progress_step: 25,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    pub log_root: String,
    pub test_number: String,
    pub inspector_name: String,
    pub unit_serial: String,
    #[serde(default)]
    pub dtc_serial: String,
    #[serde(default)]
    pub with_cart: bool,
    #[serde(default)]
    pub channel: Option<u32>,
    #[serde(default)]
    pub messages_path: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub port: Option<String>,
    /// Board id that selects the flat `PC_Log/` layout.
    pub reserved_board_id: u8,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self { port: None, reserved_board_id: 0xFF }
    }
}

impl HarnessConfig {
    pub fn default_for(test_number: &str) -> Self {
        Self {
            run: RunConfig {
                iterations: 1000,
                target_slots: vec![1],
                failure_policy: FailurePolicy::Continue,
                interactive: false,
                upload_path: "upload".to_string(),
            },
            timing: TimingConfig::default(),
            report: ReportConfig {
                log_root: ".".to_string(),
                test_number: test_number.to_string(),
                inspector_name: String::new(),
                unit_serial: String::new(),
                dtc_serial: String::new(),
                with_cart: true,
                channel: None,
                messages_path: None,
            },
            hardware: HardwareConfig::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: HarnessConfig = toml::from_str(&s).with_context(|| "parse harness.toml")?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(".dtcl").join("harness.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.run.target_slots.is_empty() {
            bail!("no target slots configured");
        }
        if let Some(bad) = self.run.target_slots.iter().find(|s| !(1..=MAX_SLOT).contains(*s)) {
            bail!("slot {bad} out of range 1..={MAX_SLOT}");
        }
        if self.timing.progress_step == 0 || self.timing.progress_step > 100 {
            bail!("progress_step must be within 1..=100");
        }
        if self.report.test_number.trim().is_empty() {
            bail!("report.test_number must not be empty");
        }
        if self.report.test_number.contains(['/', '\\']) {
            bail!("report.test_number `{}` must not contain path separators", self.report.test_number);
        }
        Ok(())
    }

    pub fn log_root(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.report.log_root).to_string())
    }

    pub fn messages_path(&self) -> Option<PathBuf> {
        self.report
            .messages_path
            .as_deref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).to_string()))
    }

    pub fn inter_iteration_delay(&self) -> Duration {
        Duration::from_millis(self.timing.inter_iteration_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.timing.settle_delay_ms)
    }

    pub fn detect_poll_interval(&self) -> Duration {
        Duration::from_millis(self.timing.detect_poll_interval_ms)
    }
}
