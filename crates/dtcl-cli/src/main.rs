use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dtcl_core::{CartType, ConfirmationGate};
use dtcl_hitl::{AutoConfirm, ConsoleConfirm, MessageCatalog};
use dtcl_hw::{HardwareEvent, ScriptedWriter, SimulatedHardware};
use dtcl_report::{FsReportWriter, ReportLayout};
use dtcl_runner::{HarnessConfig, HarnessContext, RunSettings, TestOrchestrator};

const DEFAULT_TEST_NUMBER: &str = "TEST-001";

#[derive(Parser)]
#[command(name = "dtcl-soak", version, about = "Repeated cartridge write test across loader slots")]
struct Cli {
    /// Serial port of the loader board
    port: Option<String>,

    /// Iterations to run (overrides the config file)
    iterations: Option<u32>,

    /// Config file (default .dtcl/harness.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target slots in order, e.g. 1,2
    #[arg(long, value_delimiter = ',')]
    slots: Vec<u8>,

    /// Ask on the console instead of auto-confirming
    #[arg(long)]
    interactive: bool,

    /// Append diagnostics to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Result code the simulated writer returns
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    sim_code: i32,

    /// Cartridge type the simulated board reports in each target slot
    #[arg(long, default_value = "Darin1")]
    sim_cart: CartType,

    /// Write the default config and exit
    #[arg(long)]
    init: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let root = std::env::current_dir()?;
    let cfg_path = cli.config.clone().unwrap_or_else(|| HarnessConfig::config_path(&root));

    if cli.init {
        if cfg_path.exists() {
            println!("Config already present at {}", cfg_path.display());
        } else {
            HarnessConfig::default_for(DEFAULT_TEST_NUMBER).save_to(&cfg_path)?;
            println!("Wrote default config to {}", cfg_path.display());
        }
        return Ok(());
    }

    let mut cfg = if cfg_path.exists() {
        HarnessConfig::load_from(&cfg_path)?
    } else {
        let cfg = HarnessConfig::default_for(DEFAULT_TEST_NUMBER);
        cfg.save_to(&cfg_path)?;
        info!(path = %cfg_path.display(), "wrote default config");
        cfg
    };
    if let Some(port) = cli.port {
        cfg.hardware.port = Some(port);
    }
    if let Some(iterations) = cli.iterations {
        cfg.run.iterations = iterations;
    }
    if !cli.slots.is_empty() {
        cfg.run.target_slots = cli.slots;
    }
    cfg.run.interactive |= cli.interactive;
    cfg.validate()?;

    let catalog = match cfg.messages_path() {
        Some(path) => MessageCatalog::load(&path)?,
        None => MessageCatalog::default(),
    };
    let confirm: Box<dyn ConfirmationGate> = if cfg.run.interactive {
        Box::new(ConsoleConfirm::new(catalog, BufReader::new(std::io::stdin()), std::io::stdout()))
    } else {
        Box::new(AutoConfirm::new(catalog))
    };

    let hardware = simulated_board(&cfg, cli.sim_cart, cli.sim_code);
    let reports = FsReportWriter::new(ReportLayout::new(cfg.log_root(), cfg.hardware.reserved_board_id));
    let mut ctx = HarnessContext::new(hardware, Box::new(reports), confirm);

    let mut orchestrator = TestOrchestrator::new(&mut ctx, RunSettings::from_config(&cfg));
    let summary = orchestrator.run(&cfg.run.target_slots, cfg.run.iterations);
    let session = orchestrator.session().clone();

    if !summary.detected {
        bail!(
            "hardware not detected on {}",
            cfg.hardware.port.as_deref().unwrap_or("default port")
        );
    }
    println!("Session {session}");
    println!("{summary}");
    for slot in ctx.slots() {
        if let Some(path) = &slot.report_file_path {
            println!("Slot {}: {}", slot.slot_number, path.display());
        }
    }
    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}

/// The device protocol lives outside this workspace; the binary drives the
/// scripted board so the harness can be exercised end to end.
fn simulated_board(cfg: &HarnessConfig, cart_type: CartType, code: i32) -> Arc<SimulatedHardware> {
    info!(
        port = cfg.hardware.port.as_deref().unwrap_or("-"),
        %cart_type,
        code,
        "using simulated loader board"
    );
    let hw = SimulatedHardware::new().with_writer(cart_type, Arc::new(ScriptedWriter::always(code)));
    for &slot in &cfg.run.target_slots {
        hw.emit(HardwareEvent::CartDetected { slot, cart_type });
    }
    Arc::new(hw)
}
