use crate::memory::{RegisterView, REGISTER_COUNT};

/// Text elements the HUD writes into: one for the PC, one per register.
pub trait HudText {
    fn set_pc_text(&mut self, text: &str);

    fn set_register_text(&mut self, index: usize, text: &str);
}

/// The readout itself, as plain strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HudPanel {
    pc: String,
    registers: [String; REGISTER_COUNT],
    writes: u64,
}

impl HudPanel {
    pub fn new() -> Self {
        HudPanel::default()
    }

    pub fn pc(&self) -> &str {
        &self.pc
    }

    pub fn register(&self, index: usize) -> &str {
        &self.registers[index]
    }

    /// number of individual element writes so far
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl HudText for HudPanel {
    fn set_pc_text(&mut self, text: &str) {
        self.pc.clear();
        self.pc.push_str(text);
        self.writes += 1;
    }

    fn set_register_text(&mut self, index: usize, text: &str) {
        self.registers[index].clear();
        self.registers[index].push_str(text);
        self.writes += 1;
    }
}

/// Refreshes the readout once per frame, ticks or no ticks.
#[derive(Debug, Clone, Default)]
pub struct HudUpdater {
    change_detection: bool,
    last: Option<(u16, [u8; REGISTER_COUNT])>,
}

impl HudUpdater {
    /// writes every frame, even if nothing moved
    pub fn new() -> Self {
        HudUpdater::default()
    }

    /// skips the writes when PC and registers match the last ones written
    pub fn with_change_detection() -> Self {
        HudUpdater {
            change_detection: true,
            last: None,
        }
    }

    /// forget what was last written, so the next update always writes
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// returns whether the text elements were written
    pub fn update(&mut self, pc: u16, registers: &RegisterView, out: &mut impl HudText) -> bool {
        let snapshot = (pc, registers.snapshot());
        if self.change_detection && self.last == Some(snapshot) {
            return false;
        }
        out.set_pc_text(&pc.to_string());
        for (i, v) in registers.iter().enumerate() {
            out.set_register_text(i, &v.to_string());
        }
        self.last = Some(snapshot);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;
    use crate::machine::{Chip8, DummyMachine};

    #[test]
    fn test_decimal_text() -> Result<(), DriverError> {
        let mut c = Chip8::initialize(DummyMachine::blank(), 64, 32)?;
        for _ in 0..12 {
            c.tick()?;
        }
        let mut panel = HudPanel::new();
        assert!(HudUpdater::new().update(c.pc(), &c.registers()?, &mut panel));
        // 0x200 + 12 * 2
        assert_eq!(panel.pc(), "536");
        assert_eq!(panel.register(0), "12");
        assert_eq!(panel.register(15), "0");
        assert_eq!(panel.writes(), 17);
        Ok(())
    }

    #[test]
    fn test_writes_every_frame() -> Result<(), DriverError> {
        let c = Chip8::initialize(DummyMachine::blank(), 64, 32)?;
        let mut hud = HudUpdater::new();
        let mut panel = HudPanel::new();
        for _ in 0..3 {
            assert!(hud.update(c.pc(), &c.registers()?, &mut panel));
        }
        assert_eq!(panel.writes(), 3 * 17);
        Ok(())
    }

    #[test]
    fn test_change_detection() -> Result<(), DriverError> {
        let mut c = Chip8::initialize(DummyMachine::blank(), 64, 32)?;
        let mut hud = HudUpdater::with_change_detection();
        let mut panel = HudPanel::new();
        assert!(hud.update(c.pc(), &c.registers()?, &mut panel));
        assert!(!hud.update(c.pc(), &c.registers()?, &mut panel));
        c.tick()?;
        assert!(hud.update(c.pc(), &c.registers()?, &mut panel));
        assert_eq!(panel.register(0), "1");
        hud.reset();
        assert!(hud.update(c.pc(), &c.registers()?, &mut panel));
        Ok(())
    }
}
