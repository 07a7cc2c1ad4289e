mod console;
mod delay;
#[cfg(feature = "rpi")]
mod rpi;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use console::ConsoleBackend;
use delay::ThreadDelay;
use log::*;
use shift_lights_core::{
    Direction, GpioBackend, PatternSequencer, PinAssignment, RegisterConfig, RegisterController,
    ShowConfig, backend::SimulatedRegister,
};

/// Set by ctrl-c. Whatever pattern is playing stops after its next hold.
static STOP: AtomicBool = AtomicBool::new(false);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// print the outputs to the terminal
    Sim,
    /// a register wired to a Raspberry Pi header. needs the "rpi" feature
    Rpi,
}

/// Play light patterns on a 74HC595 shift register.
///
/// Skips a light across until the first ctrl-c, then plays the example show until the second.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// serial data line (DS)
    #[arg(long)]
    data: Option<u8>,

    /// store clock line (ST_CP)
    #[arg(long)]
    store_clock: Option<u8>,

    /// shift clock line (SH_CP)
    #[arg(long)]
    shift_clock: Option<u8>,

    /// line that powers the register
    #[arg(long, conflicts_with = "no_power")]
    power: Option<u8>,

    /// the register is on a constant supply. it gets cleared by shifting in zeros
    #[arg(long)]
    no_power: bool,

    #[arg(long, default_value_t = RegisterConfig::DEFAULT_WIDTH)]
    width: usize,

    /// warn about lines that are already in use
    #[arg(long)]
    warnings: bool,

    /// hold for the skip across. defaults to 130ms
    #[arg(long)]
    hold_ms: Option<u64>,

    /// hold for the example show. defaults to 40ms
    #[arg(long)]
    show_hold_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = Backend::Sim)]
    backend: Backend,
}

impl Args {
    fn register_config(&self) -> RegisterConfig {
        let default = PinAssignment::default();

        let mut pins = PinAssignment::new(
            self.data.unwrap_or(default.data()),
            self.store_clock.unwrap_or(default.store_clock()),
            self.shift_clock.unwrap_or(default.shift_clock()),
        );

        if !self.no_power {
            if let Some(power) = self.power.or(default.power()) {
                pins = pins.with_power(power);
            }
        }

        RegisterConfig::new(pins)
            .with_width(self.width)
            .with_warnings(self.warnings)
    }

    fn show_config(&self) -> ShowConfig {
        let mut show = ShowConfig::default();

        if let Some(x) = self.hold_ms {
            show.demo_hold = Duration::from_millis(x);
        }
        if let Some(x) = self.show_hold_ms {
            show.show_hold = Duration::from_millis(x);
        }

        show
    }
}

fn run<B>(backend: B, config: RegisterConfig, show: ShowConfig) -> anyhow::Result<()>
where
    B: GpioBackend,
    B::Error: Send + Sync + 'static,
{
    let register = RegisterController::new(backend, config)?;

    let mut sequencer = PatternSequencer::new(register, ThreadDelay).with_interrupt(&STOP);

    info!("skipping across. press ctrl-c for the show");
    sequencer.run_until_interrupted(show.shutdown_hold, |x| {
        x.skip_across(Direction::LeftToRight, show.demo_hold)?;
        x.skip_across(Direction::RightToLeft, show.demo_hold)
    })?;

    STOP.store(false, Ordering::SeqCst);

    info!("example show. press ctrl-c to stop");
    sequencer.run_until_interrupted(show.shutdown_hold, |x| x.example_show(show.show_hold))?;

    sequencer.release()?;

    info!("lights out");

    Ok(())
}

#[cfg(feature = "rpi")]
fn run_rpi(config: RegisterConfig, show: ShowConfig) -> anyhow::Result<()> {
    let backend = rpi::RppalBackend::try_new()?;
    run(backend, config, show)
}

#[cfg(not(feature = "rpi"))]
fn run_rpi(_config: RegisterConfig, _show: ShowConfig) -> anyhow::Result<()> {
    anyhow::bail!("this build has no Raspberry Pi support. rebuild with `--features rpi`")
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_nanos()
        .init();

    let args = Args::parse();
    debug!("{:?}", args);

    let config = args.register_config();
    let show = args.show_config();

    ctrlc::set_handler(|| {
        STOP.store(true, Ordering::SeqCst);
    })?;

    match args.backend {
        Backend::Sim => {
            let sim = SimulatedRegister::new(config.pins, config.width);
            run(ConsoleBackend::new(sim), config, show)
        }
        Backend::Rpi => run_rpi(config, show),
    }
}
