//! # driver
//!
//! One `frame(ts)` call per presentation frame:
//!  * the scheduler works out how many ticks are due and issues them,
//!    OR-ing their draw signals
//!  * the HUD is refreshed (always)
//!  * the screen is repainted (only if a tick asked for it)
//!
//! Everything happens inside that one call, so no tick ever runs while a
//! view onto the machine is being read. The borrow checker holds us to
//! that: views borrow the `Chip8` handle, ticks need it mutably.
use crate::config::DriverConfig;
use crate::display::{Display, DisplayList, Renderer};
use crate::error::DriverError;
use crate::hud::{HudPanel, HudUpdater};
use crate::input::{Input, InputMapper, KeyEvent};
use crate::machine::{Chip8, Machine};
use crate::scheduler::TimestepScheduler;
use log::{error, info};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub ticks: u64,
    pub draw: bool,
    pub hud_written: bool,
}

pub struct Driver<M: Machine> {
    chip8: Chip8<M>,
    config: DriverConfig,
    scheduler: TimestepScheduler,
    renderer: Renderer,
    hud: HudUpdater,
    input: InputMapper,
    surface: DisplayList,
    panel: HudPanel,
    frames: u64,
    halted: bool,
}

impl<M: Machine> Driver<M> {
    /// wrap an initialized machine; nothing runs until the first frame
    pub fn new(chip8: Chip8<M>, config: &DriverConfig) -> Result<Self, DriverError> {
        config.validate()?;
        let renderer = Renderer::new(config.scale);
        let (width, height) = renderer.surface_size();
        let hud = if config.hud_change_detection {
            HudUpdater::with_change_detection()
        } else {
            HudUpdater::new()
        };
        Ok(Driver {
            chip8,
            config: config.clone(),
            scheduler: TimestepScheduler::new(config.period_ms)
                .with_tick_cap(config.max_ticks_per_frame),
            renderer,
            hud,
            input: InputMapper::new(config.keymap),
            surface: DisplayList::new(width, height),
            panel: HudPanel::new(),
            frames: 0,
            halted: false,
        })
    }

    /// the presentation callback. a fault halts the driver for good.
    pub fn frame(&mut self, ts: f64) -> Result<FrameReport, DriverError> {
        if self.halted {
            return Err(DriverError::Halted);
        }
        match self.step(ts) {
            Ok(report) => {
                self.frames += 1;
                Ok(report)
            }
            Err(e) => {
                error!("halting after frame {}: {}", self.frames, e);
                self.halted = true;
                Err(e)
            }
        }
    }

    fn step(&mut self, ts: f64) -> Result<FrameReport, DriverError> {
        let batch = self.scheduler.run_frame(ts, &mut self.chip8)?;
        let hud_written = self
            .hud
            .update(self.chip8.pc(), &self.chip8.registers()?, &mut self.panel);
        self.renderer
            .render(batch.draw, &self.chip8.video()?, &mut self.surface);
        Ok(FrameReport {
            ticks: batch.ticks,
            draw: batch.draw,
            hud_written,
        })
    }

    pub fn key_down(&mut self, label: &str) -> Option<u32> {
        if self.halted {
            return None;
        }
        self.input.key_down(label, &mut self.chip8)
    }

    pub fn key_up(&mut self, label: &str) -> Option<u32> {
        if self.halted {
            return None;
        }
        self.input.key_up(label, &mut self.chip8)
    }

    /// initialize the machine again and start over from a bootstrap frame
    pub fn reinitialize(self) -> Result<Self, DriverError> {
        let chip8 = self.chip8.reinitialize()?;
        Driver::new(chip8, &self.config)
    }

    /// Present frames until the input says quit, the frame limit is reached
    /// or something fails. Frames are paced at `frame_rate` and stamped in
    /// milliseconds since the loop started. Returns the number of frames run.
    pub fn run(
        &mut self,
        display: &mut impl Display,
        input: &mut impl Input,
    ) -> Result<u64, DriverError> {
        let period = Duration::from_secs_f64(1.0 / self.config.frame_rate);
        let start = Instant::now();
        let mut next = start;
        info!(
            "running at {} frames/s, one tick per {}ms",
            self.config.frame_rate, self.config.period_ms
        );
        loop {
            for event in input.poll_events()? {
                match event {
                    KeyEvent::Down(label) => {
                        self.key_down(&label);
                    }
                    KeyEvent::Up(label) => {
                        self.key_up(&label);
                    }
                    KeyEvent::Quit => {
                        info!("quit after {} frames", self.frames);
                        return Ok(self.frames);
                    }
                }
            }

            let ts = start.elapsed().as_secs_f64() * 1000.0;
            self.frame(ts)?;
            display.draw(&self.surface, &self.panel)?;

            if let Some(limit) = self.config.frame_limit {
                if self.frames >= limit {
                    info!("frame limit {} reached", limit);
                    return Ok(self.frames);
                }
            }

            next += period;
            let now = Instant::now();
            if next > now {
                spin_sleep::sleep(next - now);
            } else {
                // running late; don't try to make the frames up
                next = now;
            }
        }
    }

    pub fn chip8(&self) -> &Chip8<M> {
        &self.chip8
    }

    pub fn surface(&self) -> &DisplayList {
        &self.surface
    }

    pub fn panel(&self) -> &HudPanel {
        &self.panel
    }

    pub fn scheduler(&self) -> &TimestepScheduler {
        &self.scheduler
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}
