//! ## Design
//!
//! Host-side driver for a CHIP-8 that lives in someone else's module. We
//! don't execute instructions; we decide *when* the machine ticks, and show
//! what it did.
//!
//! * the machine is a call table behind the `Machine` trait; the only way
//!   to use one is through `Chip8`, which you only get from a checked
//!   initialize
//! * video and registers are read through borrowed views, never copied
//! * fixed logical tick rate, decoupled from the frame rate by an
//!   accumulator that moves in whole ticks (no drift)
//! * draw signals of all the ticks in a frame are OR-ed; the screen is only
//!   repainted when that says so, the register readout every frame
//! * display, input and machine are all traits, so the terminal front end
//!   and the native library can be swapped for dummies in tests
//!
//! Model
//!
//! host loop (one callback per frame, timestamp in ms)
//!  |-- input events  -> InputMapper -> set_key_down / set_key_up
//!  |-- Driver::frame(ts)
//!  |    |-- TimestepScheduler: n = floor((ts - last) / period); last += n * period
//!  |    |-- n x tick(), draw |= signal
//!  |    |-- HudUpdater: PC + V0..VF as decimal text
//!  |    `-- Renderer: if draw { clear; one SxS square per lit pixel }
//!  `-- Display::draw(surface, hud)
pub mod config;
pub mod display;
pub mod driver;
pub mod error;
pub mod hud;
pub mod input;
pub mod machine;
pub mod memory;
#[cfg(feature = "native")]
pub mod native;
pub mod scheduler;
