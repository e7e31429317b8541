use std::error::Error;
use std::fs::File;
use std::time::Duration;

use chip8_driver::config::DriverConfig;
use chip8_driver::display::TermDisplay;
use chip8_driver::driver::Driver;
use chip8_driver::input::TermInput;
use chip8_driver::machine::{Chip8, Machine};
use chip8_driver::memory::{VIDEO_HEIGHT, VIDEO_WIDTH};
use clap::Parser;
use log::info;

mod cli;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = cli::Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DriverConfig::load(path)?,
        None => DriverConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    drive(machine()?, &cli, &config)
}

#[cfg(feature = "native")]
fn machine() -> Result<chip8_driver::native::NativeMachine, Box<dyn Error>> {
    Ok(chip8_driver::native::NativeMachine::acquire().ok_or("the native machine is already in use")?)
}

#[cfg(not(feature = "native"))]
fn machine() -> Result<chip8_driver::machine::DummyMachine, Box<dyn Error>> {
    // no machine library linked; show the test card instead
    info!("built without the native machine, using the test card");
    Ok(chip8_driver::machine::DummyMachine::new().with_draw_signals(&[1]))
}

fn drive<M: Machine>(machine: M, cli: &cli::Cli, config: &DriverConfig) -> Result<(), Box<dyn Error>> {
    // initialise; a machine that isn't ready never gets a frame
    let mut chip8 = Chip8::initialize(machine, VIDEO_WIDTH as u32, VIDEO_HEIGHT as u32)?;

    // load a program
    if let Some(path) = &cli.rom {
        info!("loading {}", path.display());
        let mut f = File::open(path)?;
        chip8.load_rom(&mut f)?;
    }

    let mut driver = Driver::new(chip8, config)?;
    let frames = {
        let mut input = TermInput::new(Duration::from_millis(config.key_hold_ms))?;
        let mut display = TermDisplay::new()?;
        driver.run(&mut display, &mut input)
    };

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..2 + VIDEO_HEIGHT {
        println!();
    }
    info!("stopped after {} frames", frames?);
    Ok(())
}
