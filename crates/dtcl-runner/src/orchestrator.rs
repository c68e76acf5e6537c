use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use dtcl_core::{
    decide_after_slot, FailurePolicy, NullProgress, Outcome, PerformanceResult, ProgressSink, RunSummary, SessionId,
    SlotClass, SlotDecision, TestRunRecord, DTCL_NO_RESPONSE,
};
use dtcl_hw::wait_for_hardware;
use dtcl_report::{format_duration, now_stamps, now_timestamp};
use tracing::{debug, error, info, info_span, warn};

use crate::{CommandBracket, HarnessConfig, HarnessContext, Milestone, ProgressRelay, ReportConfig, SlotWriteExecutor};

/// Resolved knobs for one run.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub upload_path: PathBuf,
    pub failure_policy: FailurePolicy,
    pub inter_iteration_delay: Duration,
    pub settle_delay: Duration,
    pub detect_attempts: u32,
    pub detect_interval: Duration,
    pub progress_step: u8,
    pub report: ReportConfig,
}

impl RunSettings {
    pub fn from_config(cfg: &HarnessConfig) -> Self {
        Self {
            upload_path: PathBuf::from(shellexpand::tilde(&cfg.run.upload_path).to_string()),
            failure_policy: cfg.run.failure_policy,
            inter_iteration_delay: cfg.inter_iteration_delay(),
            settle_delay: cfg.settle_delay(),
            detect_attempts: cfg.timing.detect_poll_attempts,
            detect_interval: cfg.detect_poll_interval(),
            progress_step: cfg.timing.progress_step,
            report: cfg.report.clone(),
        }
    }
}

/// Drives the iteration loop over the target slots.
///
/// Slot failures and faults are counted, never fatal. The only early exit is
/// a board that never shows up during detection.
pub struct TestOrchestrator<'a> {
    ctx: &'a mut HarnessContext,
    settings: RunSettings,
    bracket: CommandBracket,
    milestones: Option<Sender<Milestone>>,
    session: SessionId,
}

impl<'a> TestOrchestrator<'a> {
    pub fn new(ctx: &'a mut HarnessContext, settings: RunSettings) -> Self {
        let bracket = CommandBracket::new(settings.settle_delay);
        Self { ctx, settings, bracket, milestones: None, session: SessionId::new() }
    }

    /// Forward coarse progress milestones to `tx` as well as the log.
    pub fn with_milestones(mut self, tx: Sender<Milestone>) -> Self {
        self.milestones = Some(tx);
        self
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn is_command_in_progress(&self) -> bool {
        self.bracket.is_in_progress()
    }

    pub fn run(&mut self, target_slots: &[u8], iterations: u32) -> RunSummary {
        let span = info_span!("soak_run", session = %self.session);
        let _entered = span.enter();
        let mut summary = RunSummary::default();

        let detected = wait_for_hardware(
            self.ctx.hardware.as_ref(),
            self.settings.detect_attempts,
            self.settings.detect_interval,
        );
        if !detected {
            error!("hardware not detected; no iterations run");
            return summary;
        }
        summary.detected = true;
        self.ctx.drain_events();
        info!(slots = ?target_slots, iterations, policy = ?self.settings.failure_policy, "soak run starting");

        let reports = self.create_reports(target_slots);
        let mut relay = match ProgressRelay::spawn(self.settings.progress_step, self.milestones.clone()) {
            Ok(relay) => Some(relay),
            Err(e) => {
                warn!(error = %e, "progress relay unavailable; running without progress");
                None
            }
        };

        self.stamp_start(&reports);
        let started = Instant::now();
        for iteration in 1..=iterations {
            self.ctx.drain_events();
            let sink = relay.as_ref().and_then(ProgressRelay::sink);
            let progress: &dyn ProgressSink = match &sink {
                Some(sink) => sink,
                None => &NullProgress,
            };

            let this = &*self;
            let outcome = catch_unwind(AssertUnwindSafe(|| this.run_iteration(iteration, target_slots, &reports, progress)));
            let success = match outcome {
                Ok(success) => success,
                Err(payload) => {
                    let fault = panic_message(payload.as_ref());
                    error!(iteration, %fault, "iteration faulted");
                    self.note_all(&reports, &format!("Iteration {iteration} aborted: {fault}"));
                    false
                }
            };
            summary.record(success);
            debug!(iteration, success, "iteration recorded");
            self.note_progress(&reports, iteration, started.elapsed());

            if iteration < iterations && !self.settings.inter_iteration_delay.is_zero() {
                std::thread::sleep(self.settings.inter_iteration_delay);
            }
        }

        if let Some(relay) = relay.as_mut() {
            relay.shutdown();
        }
        self.finish_reports(&reports, &summary, started.elapsed());
        info!(%summary, "soak run complete");
        summary
    }

    /// One report per distinct report path; slots mapping onto the same path
    /// (flat or channel layouts) share the first slot's report.
    fn create_reports(&mut self, target_slots: &[u8]) -> BTreeMap<u8, PathBuf> {
        let board_id = self.ctx.hardware.board_id();
        let mut reports: BTreeMap<u8, PathBuf> = BTreeMap::new();

        for &slot_no in target_slots {
            let Some(slot) = self.ctx.slot(slot_no).cloned() else {
                warn!(slot = slot_no, "no such slot; not reported");
                continue;
            };
            let run = TestRunRecord {
                test_number: self.settings.report.test_number.clone(),
                inspector_name: self.settings.report.inspector_name.clone(),
                dtc_serial: self.settings.report.dtc_serial.clone(),
                unit_serial: self.settings.report.unit_serial.clone(),
                with_cart: self.settings.report.with_cart,
                slot,
                channel_no: self.settings.report.channel,
            };

            let planned = self.ctx.reports.report_path(&run, board_id);
            let path = if reports.values().any(|p| *p == planned) {
                debug!(slot = slot_no, path = %planned.display(), "sharing report with an earlier slot");
                planned
            } else {
                match self.ctx.reports.create_new_report(&run, board_id) {
                    Ok(path) => path,
                    Err(e) => {
                        warn!(slot = slot_no, error = %e, "report not created; slot runs unlogged");
                        continue;
                    }
                }
            };
            if let Some(info) = self.ctx.slot_mut(slot_no) {
                info.report_file_path = Some(path.clone());
            }
            reports.insert(slot_no, path);
        }
        reports
    }

    fn run_iteration(
        &self,
        iteration: u32,
        target_slots: &[u8],
        reports: &BTreeMap<u8, PathBuf>,
        progress: &dyn ProgressSink,
    ) -> bool {
        let executor = SlotWriteExecutor {
            hardware: self.ctx.hardware.as_ref(),
            confirm: self.ctx.confirm.as_ref(),
            progress,
            upload_path: &self.settings.upload_path,
        };

        let mut all_passed = true;
        for (idx, &slot_no) in target_slots.iter().enumerate() {
            let is_last = idx + 1 == target_slots.len();
            let code = {
                let _command = self.bracket.pre_command(slot_no);
                match self.ctx.slot(slot_no) {
                    Some(slot) => executor.execute(slot),
                    None => DTCL_NO_RESPONSE,
                }
            };

            let class = SlotClass::from_code(code);
            let verdict = decide_after_slot(slot_no, class, code, is_last, self.settings.failure_policy);
            let passed = class == SlotClass::Success;
            if passed {
                info!(iteration, slot = slot_no, "{}", verdict.message);
            } else {
                warn!(iteration, slot = slot_no, code, "{}", verdict.message);
            }
            all_passed &= passed;
            self.record_slot(reports, slot_no, iteration, passed);

            if verdict.decision == SlotDecision::StopSlots {
                break;
            }
        }
        all_passed
    }

    fn record_slot(&self, reports: &BTreeMap<u8, PathBuf>, slot: u8, iteration: u32, passed: bool) {
        let Some(path) = reports.get(&slot) else {
            return;
        };
        let outcome = if passed { Outcome::Pass } else { Outcome::Fail };
        let result = PerformanceResult::uniform(outcome, &now_timestamp());
        if let Err(e) = self
            .ctx
            .reports
            .append_performance_result(path, self.settings.report.with_cart, &result, iteration)
        {
            warn!(slot, iteration, error = %e, "performance entry not written");
        }
    }

    /// Header Date/Time record when the iterations began rather than when the
    /// report file was created.
    fn stamp_start(&self, reports: &BTreeMap<u8, PathBuf>) {
        let (date, time) = now_stamps();
        for path in distinct(reports) {
            if let Err(e) = self.ctx.reports.edit_header_date_time(path, &date, &time) {
                warn!(path = %path.display(), error = %e, "start time not stamped");
            }
        }
    }

    fn note_progress(&self, reports: &BTreeMap<u8, PathBuf>, iteration: u32, elapsed: Duration) {
        let duration = format_duration(elapsed);
        for path in distinct(reports) {
            if let Err(e) = self.ctx.reports.edit_iteration_and_duration(path, iteration, &duration) {
                warn!(path = %path.display(), iteration, error = %e, "iteration header not updated");
            }
        }
    }

    fn note_all(&self, reports: &BTreeMap<u8, PathBuf>, text: &str) {
        for path in distinct(reports) {
            if let Err(e) = self.ctx.reports.append_entry(path, text) {
                warn!(path = %path.display(), error = %e, "report note not written");
            }
        }
    }

    fn finish_reports(&self, reports: &BTreeMap<u8, PathBuf>, summary: &RunSummary, elapsed: Duration) {
        let duration = format_duration(elapsed);
        for path in distinct(reports) {
            let written = self
                .ctx
                .reports
                .append_iteration_duration(path, summary.total, &duration)
                .and_then(|()| {
                    self.ctx
                        .reports
                        .append_entry(path, &format!("Session {}: {summary}", self.session))
                });
            if let Err(e) = written {
                warn!(path = %path.display(), error = %e, "run summary not written");
            }
        }
    }
}

fn distinct(reports: &BTreeMap<u8, PathBuf>) -> BTreeSet<&PathBuf> {
    reports.values().collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic payload not a string".to_string()
    }
}
