//! # machine
//!
//! The CHIP-8 itself lives outside this crate. All we get is a small call
//! table:
//!  * initialize(width, height) -> status   -- must come first, 0 is success
//!  * tick() -> 0/1                         -- one step; 1 asks for a redraw
//!  * get_video() / get_register_file()     -- base addresses, stable until
//!                                             the next initialize
//!  * get_pc()                              -- fetched fresh every time
//!  * set_key_down(code) / set_key_up(code) -- takes effect on later ticks
//!
//! `Chip8` is what you get back from a *checked* initialize; nothing else
//! in the driver can touch a machine that hasn't been through it.
use crate::error::{DriverError, MachineFault};
use crate::memory::{self, RegisterView, VideoView, ViewAnchors, REGISTER_COUNT, VIDEO_SIZE};
use log::{error, info};
use std::collections::VecDeque;
use std::io;

/// Call table of the external virtual machine.
pub trait Machine {
    /// must be called exactly once before anything else; 0 means ready
    fn initialize(&mut self, width: u32, height: u32) -> i32;

    /// copy a program into the machine's program space. not every call
    /// table has one.
    #[allow(unused)]
    fn load_rom(&mut self, rom: &[u8]) -> Result<(), MachineFault> {
        Err(MachineFault("ROM loading not supported".to_string()))
    }

    /// advance one logical step, returning the draw signal
    fn tick(&mut self) -> Result<u8, MachineFault>;

    /// base address of the 64x32 video buffer
    fn get_video(&self) -> usize;

    /// base address of V0..VF
    fn get_register_file(&self) -> usize;

    fn get_pc(&self) -> u16;

    fn set_key_down(&mut self, code: u32);

    fn set_key_up(&mut self, code: u32);

    /// r/o access to `len` bytes of machine memory at `addr`, if the machine
    /// exports that much there
    fn region(&self, addr: usize, len: usize) -> Option<&[u8]>;
}

/// An initialized machine, plus the view anchors fetched from it.
pub struct Chip8<M: Machine> {
    machine: M,
    anchors: ViewAnchors,
    width: u32,
    height: u32,
}

impl<M: Machine> Chip8<M> {
    /// run the machine's initialize and refuse to go any further unless it
    /// reports success
    pub fn initialize(mut machine: M, width: u32, height: u32) -> Result<Self, DriverError> {
        let status = machine.initialize(width, height);
        if status != 0 {
            error!("machine initialize({}, {}) returned {}", width, height, status);
            return Err(DriverError::Init { status });
        }
        let anchors = ViewAnchors::acquire(&machine)?;
        info!(
            "machine ready: video at 0x{:04x}, registers at 0x{:04x}",
            anchors.video, anchors.registers
        );
        Ok(Chip8 {
            machine,
            anchors,
            width,
            height,
        })
    }

    /// initialize the same machine again; the old view anchors are thrown
    /// away and fetched fresh. a failure drops the machine with the handle.
    pub fn reinitialize(self) -> Result<Self, DriverError> {
        let Chip8 {
            machine,
            width,
            height,
            ..
        } = self;
        Chip8::initialize(machine, width, height)
    }

    /// load a chip8 program
    pub fn load_rom(&mut self, reader: &mut impl io::Read) -> Result<(), DriverError> {
        let mut rom = Vec::new();
        let len = reader.read_to_end(&mut rom)?;
        self.machine.load_rom(&rom)?;
        info!("loaded {} byte program", len);
        Ok(())
    }

    /// one logical step; true if the machine wants the screen redrawn
    pub fn tick(&mut self) -> Result<bool, DriverError> {
        Ok(self.machine.tick()? != 0)
    }

    pub fn video(&self) -> Result<VideoView<'_>, DriverError> {
        let bytes = memory::get_ro_slice(&self.machine, "video", self.anchors.video, VIDEO_SIZE)?;
        Ok(VideoView::new(bytes))
    }

    pub fn registers(&self) -> Result<RegisterView<'_>, DriverError> {
        let bytes = memory::get_ro_slice(
            &self.machine,
            "register file",
            self.anchors.registers,
            REGISTER_COUNT,
        )?;
        Ok(RegisterView::new(bytes))
    }

    pub fn pc(&self) -> u16 {
        self.machine.get_pc()
    }

    pub fn set_key_down(&mut self, code: u32) {
        self.machine.set_key_down(code)
    }

    pub fn set_key_up(&mut self, code: u32) {
        self.machine.set_key_up(code)
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut M {
        &mut self.machine
    }
}

/// dummy machine layout; roughly the COSMAC VIP 4K map
pub const DUMMY_MEMORY_SIZE: usize = 0x1000;
pub const DUMMY_PROGRAM_ADDR: usize = 0x0200;
pub const DUMMY_REGISTER_ADDR: usize = 0x06f0;
pub const DUMMY_VIDEO_ADDR: usize = 0x0800;

/// a key line change seen by the dummy machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCall {
    Down(u32),
    Up(u32),
}

/// Stand-in machine with no instruction set. Each tick moves the PC on by
/// one instruction and counts into V0; draw signals come from a script.
/// Useful for testing the driver, and for looking at the test card.
pub struct DummyMachine {
    memory: Box<[u8]>,
    pc: u16,
    ticks: u64,
    initialized: bool,
    test_card: bool,
    init_status: i32,
    draw_signals: VecDeque<u8>,
    fault_at: Option<u64>,
    keys: Vec<KeyCall>,
}

impl DummyMachine {
    /// shows the test card after initialize
    pub fn new() -> Self {
        DummyMachine {
            memory: vec![0u8; DUMMY_MEMORY_SIZE].into_boxed_slice(),
            pc: DUMMY_PROGRAM_ADDR as u16,
            ticks: 0,
            initialized: false,
            test_card: true,
            init_status: 0,
            draw_signals: VecDeque::new(),
            fault_at: None,
            keys: Vec::new(),
        }
    }

    /// blank screen after initialize
    pub fn blank() -> Self {
        DummyMachine {
            test_card: false,
            ..DummyMachine::new()
        }
    }

    /// make initialize report `status`
    pub fn with_init_status(mut self, status: i32) -> Self {
        self.init_status = status;
        self
    }

    /// draw signals handed out by successive ticks; 0 once they run out
    pub fn with_draw_signals(mut self, signals: &[u8]) -> Self {
        self.draw_signals = signals.iter().copied().collect();
        self
    }

    /// fail the tick that would be tick number `n` (counting from 0)
    pub fn with_fault_at(mut self, n: u64) -> Self {
        self.fault_at = Some(n);
        self
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn key_log(&self) -> &[KeyCall] {
        &self.keys
    }

    pub fn poke_video(&mut self, i: usize, value: u8) {
        self.memory[DUMMY_VIDEO_ADDR + i] = value;
    }

    fn draw_test_card(&mut self) {
        let video = &mut self.memory[DUMMY_VIDEO_ADDR..DUMMY_VIDEO_ADDR + VIDEO_SIZE];
        for (i, px) in video.iter_mut().enumerate() {
            *px = 1 & (CHIP8_TEST_CARD[i / 8] >> (7 - i % 8));
        }
    }
}

impl Default for DummyMachine {
    fn default() -> Self {
        DummyMachine::new()
    }
}

impl Machine for DummyMachine {
    fn initialize(&mut self, width: u32, height: u32) -> i32 {
        if self.init_status != 0 {
            return self.init_status;
        }
        if (width as usize, height as usize) != (memory::VIDEO_WIDTH, memory::VIDEO_HEIGHT) {
            return -1;
        }
        self.memory[DUMMY_REGISTER_ADDR..DUMMY_REGISTER_ADDR + REGISTER_COUNT].fill(0);
        self.memory[DUMMY_VIDEO_ADDR..DUMMY_VIDEO_ADDR + VIDEO_SIZE].fill(0);
        if self.test_card {
            self.draw_test_card();
        }
        self.pc = DUMMY_PROGRAM_ADDR as u16;
        self.ticks = 0;
        self.initialized = true;
        0
    }

    fn load_rom(&mut self, rom: &[u8]) -> Result<(), MachineFault> {
        let space = DUMMY_REGISTER_ADDR - DUMMY_PROGRAM_ADDR;
        if rom.len() > space {
            return Err(MachineFault(format!(
                "program is {} bytes, only {} fit",
                rom.len(),
                space
            )));
        }
        self.memory[DUMMY_PROGRAM_ADDR..DUMMY_PROGRAM_ADDR + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    fn tick(&mut self) -> Result<u8, MachineFault> {
        if !self.initialized {
            return Err(MachineFault("tick before initialize".to_string()));
        }
        if self.fault_at == Some(self.ticks) {
            return Err(MachineFault(format!("scripted fault at tick {}", self.ticks)));
        }
        self.ticks += 1;
        let span = (DUMMY_MEMORY_SIZE - DUMMY_PROGRAM_ADDR) as u16;
        self.pc = DUMMY_PROGRAM_ADDR as u16 + (self.pc - DUMMY_PROGRAM_ADDR as u16 + 2) % span;
        self.memory[DUMMY_REGISTER_ADDR] = self.ticks as u8;
        Ok(self.draw_signals.pop_front().unwrap_or(0))
    }

    fn get_video(&self) -> usize {
        DUMMY_VIDEO_ADDR
    }

    fn get_register_file(&self) -> usize {
        DUMMY_REGISTER_ADDR
    }

    fn get_pc(&self) -> u16 {
        self.pc
    }

    fn set_key_down(&mut self, code: u32) {
        self.keys.push(KeyCall::Down(code));
    }

    fn set_key_up(&mut self, code: u32) {
        self.keys.push(KeyCall::Up(code));
    }

    fn region(&self, addr: usize, len: usize) -> Option<&[u8]> {
        self.memory.get(addr..addr.checked_add(len)?)
    }
}


/// this is a display test card suitable for CHIP8, one bit per pixel
#[rustfmt::skip]
pub const CHIP8_TEST_CARD: [u8; 256] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // 00
    0x80, 0x00, 0x00, 0x01, 0x80, 0x00, 0x00, 0x01, // 01
    0x80, 0x00, 0x00, 0x03, 0xc2, 0x41, 0x55, 0x55, // 02
    0x81, 0xff, 0xff, 0xc5, 0xa2, 0x40, 0xaa, 0xa9, // 03
    0x80, 0x00, 0x00, 0x09, 0x92, 0x41, 0x55, 0x55, // 04
    0x81, 0xff, 0xff, 0xc1, 0x82, 0x40, 0xaa, 0xa9, // 05
    0xa0, 0x00, 0x00, 0x01, 0x83, 0xc1, 0x55, 0x55, // 06
    0xa1, 0xff, 0xff, 0xc1, 0x80, 0x00, 0xaa, 0xa9, // 07
    0xa0, 0x00, 0x00, 0x00, 0x00, 0x01, 0x55, 0x55, // 08
    0xa1, 0xff, 0xff, 0xc0, 0x00, 0x00, 0xaa, 0xa9, // 09
    0xbc, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // 10
    0x81, 0xff, 0xff, 0xc0, 0x00, 0x00, 0x00, 0x01, // 11
    0x88, 0x00, 0x00, 0x01, 0x80, 0x00, 0x00, 0x11, // 12
    0x91, 0xff, 0xff, 0xc1, 0x80, 0x00, 0x00, 0x09, // 13
    0xa0, 0x00, 0x00, 0x01, 0x80, 0x00, 0x00, 0x05, // 14
    0xff, 0x80, 0x00, 0x1f, 0xf8, 0x00, 0x01, 0xff, // 15
    0xff, 0x80, 0x00, 0x1f, 0xf8, 0x00, 0x01, 0xff, // 16
    0xa0, 0x00, 0x00, 0x01, 0x80, 0x00, 0x00, 0x05, // 17
    0x90, 0x00, 0x00, 0x01, 0x85, 0x55, 0x55, 0x09, // 18
    0x88, 0x00, 0x00, 0x01, 0x85, 0x55, 0x55, 0x11, // 19
    0x80, 0x00, 0x00, 0x00, 0x05, 0x55, 0x55, 0x01, // 20
    0x80, 0x00, 0x00, 0x00, 0x05, 0x55, 0x55, 0x3d, // 21
    0x95, 0x55, 0x40, 0x00, 0x05, 0x55, 0x55, 0x25, // 22
    0xaa, 0xaa, 0x80, 0x00, 0x05, 0x55, 0x55, 0x3d, // 23
    0x95, 0x55, 0x40, 0x01, 0x85, 0x55, 0x55, 0x29, // 24
    0xaa, 0xaa, 0x83, 0xc1, 0x85, 0x55, 0x55, 0x25, // 25
    0x95, 0x55, 0x41, 0x41, 0x85, 0x55, 0x55, 0x01, // 26
    0xaa, 0xaa, 0x81, 0x49, 0x95, 0x55, 0x55, 0x01, // 27
    0x95, 0x55, 0x41, 0x45, 0xa5, 0x55, 0x55, 0x01, // 28
    0xaa, 0xaa, 0x83, 0xc3, 0xc5, 0x55, 0x55, 0x01, // 29
    0x80, 0x00, 0x00, 0x01, 0x80, 0x00, 0x00, 0x01, // 30
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // 31
];
