use crate::error::DriverError;
use crate::machine::Machine;

// NB. views never copy; they re-read the machine's memory every time

/// display width in pixels
pub const VIDEO_WIDTH: usize = 64;
/// display height in pixels
pub const VIDEO_HEIGHT: usize = 32;
/// one byte per pixel, rows first
pub const VIDEO_SIZE: usize = VIDEO_WIDTH * VIDEO_HEIGHT;
/// V0..VF
pub const REGISTER_COUNT: usize = 16;

/// Base addresses of the exported buffers, fetched once per initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ViewAnchors {
    pub video: usize,
    pub registers: usize,
}

impl ViewAnchors {
    /// ask the machine where its buffers live, and check it can actually
    /// serve both windows at the required length
    pub fn acquire(machine: &impl Machine) -> Result<Self, DriverError> {
        let anchors = ViewAnchors {
            video: machine.get_video(),
            registers: machine.get_register_file(),
        };
        get_ro_slice(machine, "video", anchors.video, VIDEO_SIZE)?;
        get_ro_slice(machine, "register file", anchors.registers, REGISTER_COUNT)?;
        Ok(anchors)
    }
}

/// The two buffers a machine exports, as `(base, size)` pairs. Backends
/// that can't bounds-check arbitrary addresses record these once after a
/// successful initialize and answer `region` from them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportedRegions {
    video: (usize, usize),
    registers: (usize, usize),
}

impl ExportedRegions {
    pub fn record(video: usize, registers: usize) -> Self {
        ExportedRegions {
            video: (video, VIDEO_SIZE),
            registers: (registers, REGISTER_COUNT),
        }
    }

    /// does a window of `len` bytes at `addr` sit inside one export
    pub fn covers(&self, addr: usize, len: usize) -> bool {
        addr != 0
            && [self.video, self.registers]
                .iter()
                .any(|&(base, size)| addr == base && len <= size)
    }
}

/// get a r/o slice of the machine's memory, or explain why not
pub(crate) fn get_ro_slice<'m>(
    machine: &'m impl Machine,
    name: &'static str,
    addr: usize,
    len: usize,
) -> Result<&'m [u8], DriverError> {
    match machine.region(addr, len) {
        Some(bytes) if bytes.len() == len => Ok(bytes),
        _ => Err(DriverError::View { name, addr, len }),
    }
}

/// Read-only window onto the machine's 64x32 video buffer.
#[derive(Debug, Clone, Copy)]
pub struct VideoView<'m> {
    bytes: &'m [u8],
}

impl<'m> VideoView<'m> {
    pub(crate) fn new(bytes: &'m [u8]) -> Self {
        debug_assert_eq!(bytes.len(), VIDEO_SIZE);
        VideoView { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// any nonzero byte is a lit pixel
    pub fn is_lit(&self, x: usize, y: usize) -> bool {
        self.bytes[y * VIDEO_WIDTH + x] != 0
    }

    /// (x, y) of every lit pixel, in buffer order
    pub fn lit_pixels(&self) -> impl Iterator<Item = (usize, usize)> + 'm {
        self.bytes
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b != 0)
            .map(|(i, _)| (i % VIDEO_WIDTH, i / VIDEO_WIDTH))
    }

    pub fn as_slice(&self) -> &'m [u8] {
        self.bytes
    }
}

/// Read-only window onto the machine's 16 general purpose registers.
#[derive(Debug, Clone, Copy)]
pub struct RegisterView<'m> {
    bytes: &'m [u8],
}

impl<'m> RegisterView<'m> {
    pub(crate) fn new(bytes: &'m [u8]) -> Self {
        debug_assert_eq!(bytes.len(), REGISTER_COUNT);
        RegisterView { bytes }
    }

    /// value of Vx
    pub fn get(&self, x: usize) -> u8 {
        self.bytes[x]
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + 'm {
        self.bytes.iter().copied()
    }

    /// the only way to keep register values past the view's lifetime
    pub fn snapshot(&self) -> [u8; REGISTER_COUNT] {
        let mut regs = [0; REGISTER_COUNT];
        regs.copy_from_slice(self.bytes);
        regs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{Chip8, DummyMachine, DUMMY_REGISTER_ADDR, DUMMY_VIDEO_ADDR};

    #[test]
    fn test_anchors_from_machine() -> Result<(), DriverError> {
        let mut m = DummyMachine::new();
        m.initialize(64, 32);
        let a = ViewAnchors::acquire(&m)?;
        assert_eq!(a.video, DUMMY_VIDEO_ADDR);
        assert_eq!(a.registers, DUMMY_REGISTER_ADDR);
        Ok(())
    }

    #[test]
    fn test_out_of_range_view_rejected() {
        let m = DummyMachine::new();
        match get_ro_slice(&m, "video", 0xffff, VIDEO_SIZE) {
            Err(DriverError::View { name, addr, len }) => {
                assert_eq!(name, "video");
                assert_eq!(addr, 0xffff);
                assert_eq!(len, VIDEO_SIZE);
            }
            other => panic!("expected a view error, got {:?}", other),
        }
    }

    #[test]
    fn test_exported_regions() {
        let e = ExportedRegions::record(0x4000, 0x5000);
        assert!(e.covers(0x4000, VIDEO_SIZE));
        assert!(e.covers(0x5000, REGISTER_COUNT));
        assert!(e.covers(0x5000, 1));
        assert!(!e.covers(0x4000, VIDEO_SIZE + 1));
        assert!(!e.covers(0x5000, REGISTER_COUNT + 1));
        // only the base of an export, never an offset into it
        assert!(!e.covers(0x4001, 1));
    }

    #[test]
    fn test_null_export_covers_nothing() {
        assert!(!ExportedRegions::default().covers(0, 0));
        assert!(!ExportedRegions::record(0, 0).covers(0, 1));
    }

    #[test]
    fn test_video_view_coordinates() -> Result<(), DriverError> {
        let mut c = Chip8::initialize(DummyMachine::blank(), 64, 32)?;
        c.machine_mut().poke_video(5 * 64 + 10, 1);
        c.machine_mut().poke_video(2047, 0xff);
        let v = c.video()?;
        assert_eq!(v.len(), VIDEO_SIZE);
        assert!(v.is_lit(10, 5));
        assert!(v.is_lit(63, 31));
        assert!(!v.is_lit(0, 0));
        assert_eq!(v.lit_pixels().collect::<Vec<_>>(), vec![(10, 5), (63, 31)]);
        Ok(())
    }

    #[test]
    fn test_register_view_rereads_machine() -> Result<(), DriverError> {
        let mut c = Chip8::initialize(DummyMachine::blank(), 64, 32)?;
        assert_eq!(c.registers()?.get(0), 0);
        c.tick()?;
        c.tick()?;
        // fresh view, same anchor, new contents
        let r = c.registers()?;
        assert_eq!(r.get(0), 2);
        assert_eq!(r.snapshot()[0], 2);
        assert_eq!(r.iter().count(), REGISTER_COUNT);
        Ok(())
    }
}
