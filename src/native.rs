//! Binding to the external machine library (`libchip8`).
//!
//! The library keeps a single machine in static storage and exports the
//! `CHIP8_wasm_*` call table. Link it with
//! `RUSTFLAGS="-L /path/to/libchip8"` and `--features native`.
//!
//! # Safety
//! The library's machine is global, so at most one `NativeMachine` may exist
//! at a time; `NativeMachine::acquire` enforces that. Memory handed out by
//! `region` is only ever the two exported buffers, and only for as long as
//! the `NativeMachine` is borrowed, so no tick can run while it is read.
//! The buffer addresses are asked for once, straight after a successful
//! initialize, and forgotten when the machine is initialized again.
//!
//! The library has no ROM entry point in its call table, so `load_rom`
//! reports a fault.

use crate::error::MachineFault;
use crate::machine::Machine;
use crate::memory::ExportedRegions;
use log::debug;
use std::os::raw::{c_int, c_uint};
use std::slice;
use std::sync::atomic::{AtomicBool, Ordering};

#[link(name = "chip8")]
#[allow(non_snake_case)]
extern "C" {
    fn CHIP8_wasm_initialize(width: c_int, height: c_int) -> c_int;
    fn CHIP8_wasm_tick() -> c_int;
    fn CHIP8_wasm_get_video() -> *const u8;
    fn CHIP8_wasm_get_register_file() -> *const u8;
    fn CHIP8_wasm_get_PC() -> c_uint;
    fn CHIP8_wasm_set_key_down(code: c_int);
    fn CHIP8_wasm_set_key_up(code: c_int);
}

static ACQUIRED: AtomicBool = AtomicBool::new(false);

/// Capability for the library's one machine.
pub struct NativeMachine {
    exports: Option<ExportedRegions>,
}

impl NativeMachine {
    /// None if another `NativeMachine` is still alive
    pub fn acquire() -> Option<Self> {
        if ACQUIRED.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(NativeMachine { exports: None })
    }
}

impl Drop for NativeMachine {
    fn drop(&mut self) {
        ACQUIRED.store(false, Ordering::Release);
    }
}

impl Machine for NativeMachine {
    fn initialize(&mut self, width: u32, height: u32) -> i32 {
        self.exports = None;
        let status = unsafe { CHIP8_wasm_initialize(width as c_int, height as c_int) };
        if status == 0 {
            let exports = ExportedRegions::record(self.get_video(), self.get_register_file());
            debug!("native exports: {:?}", exports);
            self.exports = Some(exports);
        }
        status
    }

    fn tick(&mut self) -> Result<u8, MachineFault> {
        match unsafe { CHIP8_wasm_tick() } {
            0 => Ok(0),
            1 => Ok(1),
            other => Err(MachineFault(format!("tick returned {}", other))),
        }
    }

    fn get_video(&self) -> usize {
        unsafe { CHIP8_wasm_get_video() as usize }
    }

    fn get_register_file(&self) -> usize {
        unsafe { CHIP8_wasm_get_register_file() as usize }
    }

    fn get_pc(&self) -> u16 {
        unsafe { CHIP8_wasm_get_PC() as u16 }
    }

    fn set_key_down(&mut self, code: u32) {
        unsafe { CHIP8_wasm_set_key_down(code as c_int) }
    }

    fn set_key_up(&mut self, code: u32) {
        unsafe { CHIP8_wasm_set_key_up(code as c_int) }
    }

    fn region(&self, addr: usize, len: usize) -> Option<&[u8]> {
        match self.exports {
            Some(exports) if exports.covers(addr, len) => {}
            _ => return None,
        }
        // SAFETY: addr is the start of an exported buffer of at least len
        // bytes, and the library only writes it during tick(&mut self)
        Some(unsafe { slice::from_raw_parts(addr as *const u8, len) })
    }
}
