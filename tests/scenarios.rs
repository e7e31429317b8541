use chip8_driver::config::DriverConfig;
use chip8_driver::driver::{Driver, FrameReport};
use chip8_driver::error::DriverError;
use chip8_driver::machine::{Chip8, DummyMachine, KeyCall};

fn driver(m: DummyMachine) -> Result<Driver<DummyMachine>, DriverError> {
    Driver::new(Chip8::initialize(m, 64, 32)?, &DriverConfig::default())
}

#[test]
fn bootstrap_frame_only_refreshes_hud() -> Result<(), DriverError> {
    let mut d = driver(DummyMachine::new())?;
    assert_eq!(
        d.frame(0.0)?,
        FrameReport {
            ticks: 0,
            draw: false,
            hud_written: true
        }
    );
    assert_eq!(d.panel().pc(), "512");
    assert_eq!(d.chip8().machine().ticks(), 0);
    Ok(())
}

#[test]
fn sixteen_ms_is_four_ticks() -> Result<(), DriverError> {
    let mut d = driver(DummyMachine::blank())?;
    d.frame(0.0)?;
    assert_eq!(d.frame(16.0)?.ticks, 4);
    assert_eq!(d.scheduler().last_frame_timestamp(), Some(16.0));
    Ok(())
}

#[test]
fn short_frame_issues_nothing() -> Result<(), DriverError> {
    let mut d = driver(DummyMachine::blank())?;
    d.frame(0.0)?;
    let r = d.frame(3.0)?;
    assert_eq!(r.ticks, 0);
    assert!(!r.draw);
    assert!(r.hud_written);
    assert_eq!(d.scheduler().last_frame_timestamp(), Some(0.0));
    Ok(())
}

#[test]
fn key_down_is_lowercased_code_point() -> Result<(), DriverError> {
    let mut d = driver(DummyMachine::blank())?;
    assert_eq!(d.key_down("A"), Some(97));
    assert_eq!(d.chip8().machine().key_log(), &[KeyCall::Down(97)]);
    Ok(())
}

#[test]
fn lit_pixel_becomes_square() -> Result<(), DriverError> {
    let m = DummyMachine::blank().with_draw_signals(&[1]);
    let mut c = Chip8::initialize(m, 64, 32)?;
    c.machine_mut().poke_video(5 * 64 + 10, 1);
    let mut d = Driver::new(c, &DriverConfig::default())?;
    d.frame(0.0)?;
    assert!(d.frame(4.0)?.draw);
    assert_eq!(d.surface().rects().len(), 1);
    assert!(d.surface().has_square(100, 50, 10));
    Ok(())
}

#[test]
fn long_run_does_not_drift() -> Result<(), DriverError> {
    let mut d = driver(DummyMachine::blank())?;
    // uneven frame spacing, 10 seconds of it
    let mut ts = 0.0;
    let mut ticks = 0;
    for k in 0..700u32 {
        ts += 10.0 + (k % 7) as f64 * 1.3;
        ticks += d.frame(ts)?.ticks;
    }
    let first = 10.0;
    let ideal = ((ts - first) / 4.0).floor() as u64;
    assert!(ideal - ticks <= 1, "ideal {} got {}", ideal, ticks);
    Ok(())
}
