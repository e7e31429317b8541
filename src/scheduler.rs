use crate::error::DriverError;
use crate::machine::{Chip8, Machine};
use log::{debug, warn};

/// what one frame's tick batch did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickBatch {
    pub ticks: u64,
    /// OR of the draw signals of exactly these ticks
    pub draw: bool,
}

/// Fixed timestep accumulator. Frames arrive whenever the host feels like
/// it; the machine runs at one tick per `period_ms`.
///
/// The accumulator only ever moves in whole periods, so the fractional
/// remainder of each frame is kept for the next one and logical time never
/// drifts from wall-clock time.
#[derive(Debug, Clone)]
pub struct TimestepScheduler {
    last_frame: Option<f64>,
    period_ms: f64,
    max_ticks_per_frame: Option<u64>,
}

impl TimestepScheduler {
    pub fn new(period_ms: f64) -> Self {
        assert!(period_ms > 0.0, "tick period must be positive");
        TimestepScheduler {
            last_frame: None,
            period_ms,
            max_ticks_per_frame: None,
        }
    }

    /// limit catch-up bursts; the backlog is carried into later frames
    pub fn with_tick_cap(mut self, cap: Option<u64>) -> Self {
        self.max_ticks_per_frame = cap;
        self
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    pub fn last_frame_timestamp(&self) -> Option<f64> {
        self.last_frame
    }

    /// how many ticks are due at `ts`, moving the accumulator on by exactly
    /// that many periods. the first call only starts the clock.
    pub fn due_ticks(&mut self, ts: f64) -> u64 {
        let last = match self.last_frame {
            None => {
                self.last_frame = Some(ts);
                return 0;
            }
            Some(last) => last,
        };
        // a clock going backwards owes us nothing
        if ts <= last {
            return 0;
        }
        let due = ((ts - last) / self.period_ms).floor() as u64;
        let n = match self.max_ticks_per_frame {
            Some(cap) if due > cap => {
                warn!("{} ticks due, capped at {}", due, cap);
                cap
            }
            _ => due,
        };
        self.last_frame = Some(last + n as f64 * self.period_ms);
        n
    }

    /// issue this frame's ticks to the machine. stops at the first fault;
    /// the accumulator has already moved on by then.
    pub fn run_frame<M: Machine>(
        &mut self,
        ts: f64,
        chip8: &mut Chip8<M>,
    ) -> Result<TickBatch, DriverError> {
        let ticks = self.due_ticks(ts);
        let mut draw = false;
        for _ in 0..ticks {
            draw |= chip8.tick()?;
        }
        if ticks > 0 {
            debug!("frame at {:.3}ms: {} ticks, draw={}", ts, ticks, draw);
        }
        Ok(TickBatch { ticks, draw })
    }
}
