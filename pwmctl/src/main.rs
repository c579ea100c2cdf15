mod cli;
mod config;

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use dotenv::dotenv;
use log::{debug, info};
use sysinfo::System;
use pwmctl_pwm::channel::{PwmChip, PwmDriver, PwmExtension, PwmPin};
use pwmctl_pwm::control::PwmContext;
use pwmctl_pwm::{ControlFs, MockControl, PwmExecutor, PwmOp, PwmRequest, ResultCode};
use crate::cli::{Command, USAGE};
use crate::config::Config;

fn load_config() -> eyre::Result<Config> {
    let mut config = Config::load_or_create(&Config::path())?;
    config.apply_env()?;
    Ok(config)
}

fn run_job(ctx: PwmContext, workers: usize, op: PwmOp, request: PwmRequest) -> eyre::Result<()> {
    let pin = request.pin;
    let mut executor = PwmExecutor::new(ctx, workers)?;
    debug!("{:?} started.", executor);

    let outcome = Rc::new(Cell::new(None));
    let slot = outcome.clone();
    executor.submit(op, request, move |request| slot.set(request.result));
    executor.run_until_idle();

    let result = outcome.get().unwrap_or(ResultCode::SysFailure);
    println!("{} pwm{}: {}", op, pin, result);
    if !result.is_ok() {
        eyre::bail!("{} on pwm{} failed: {}", op, pin, result);
    }
    Ok(())
}

fn print_status(ctx: PwmContext, pin: u32) -> eyre::Result<()> {
    let chip = PwmChip::new(ctx);
    match chip.count() {
        Ok(count) => println!("{:?}: {} channels", chip, count),
        Err(err) => debug!("Reading channel count failed: {}", err),
    }

    let channel = chip.get_pin(pin)?;
    println!("pwm{}:", pin);
    println!("  period:     {} ns ({:?})", channel.period_ns()?, channel.period()?);
    println!("  duty_cycle: {} ns ({:.1}%)", channel.duty_ns()?, channel.duty_cycle()? * 100.0);
    println!("  enabled:    {}", channel.is_enabled()?);
    Ok(())
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    let invocation = match cli::parse_args(std::env::args().skip(1)) {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("error: {}\n\n{}", err, USAGE);
            std::process::exit(2);
        }
    };

    const UNKNOWN_STR: &str = "???";
    debug!(
        "{} kernel {} on {}",
        System::name().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
    );

    let config = load_config()?;
    debug!("Using {:?}", config);

    let control: Arc<dyn ControlFs> = if invocation.dry_run {
        info!("Dry run, no control file will be touched");
        Arc::new(MockControl::new())
    } else {
        Arc::new(config.control())
    };
    let ctx = PwmContext::new(config.layout(), control);

    match invocation.command {
        Command::Job { op, request } => run_job(ctx, config.workers, op, request),
        Command::Status { pin } => print_status(ctx, pin),
    }
}
