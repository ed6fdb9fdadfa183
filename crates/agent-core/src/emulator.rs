//! Boundary the agent uses to read emulated memory and inject input.
//!
//! The concrete emulator lives elsewhere; the mapper and control loop only ever
//! see these two narrow traits, so tests can substitute synthetic buffers.

use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use byteorder::{LittleEndian, ReadBytesExt};

/// GBA pad buttons, as exposed by the emulator's keypad interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    Start,
    Select,
    Up,
    Down,
    Left,
    Right,
    L,
    R,
}

impl Button {
    pub const ALL: [Button; 10] = [
        Button::A,
        Button::B,
        Button::Start,
        Button::Select,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::L,
        Button::R,
    ];

    /// The four directional buttons, the minimal action vocabulary for walking.
    pub const DPAD: [Button; 4] = [Button::Up, Button::Down, Button::Left, Button::Right];

    pub fn name(self) -> &'static str {
        match self {
            Button::A => "A",
            Button::B => "B",
            Button::Start => "START",
            Button::Select => "SELECT",
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
            Button::L => "L",
            Button::R => "R",
        }
    }

    pub fn from_name(name: &str) -> Option<Button> {
        match name.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Button::A),
            "B" => Some(Button::B),
            "START" => Some(Button::Start),
            "SELECT" => Some(Button::Select),
            "UP" => Some(Button::Up),
            "DOWN" => Some(Button::Down),
            "LEFT" => Some(Button::Left),
            "RIGHT" => Some(Button::Right),
            "L" => Some(Button::L),
            "R" => Some(Button::R),
            _ => None,
        }
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Synchronous little-endian reads over the emulated address space.
///
/// No caching and no side effects: every call reflects live emulator state.
/// An `Err` means the emulator or its memory bus is not available yet (no core
/// attached, no ROM loaded); reads on a live core are expected to succeed for
/// any address the emulator exposes.
pub trait MemoryRead: Send + Sync {
    fn load_u8(&self, addr: u32) -> anyhow::Result<u8>;
    fn load_u16(&self, addr: u32) -> anyhow::Result<u16>;
    fn load_u32(&self, addr: u32) -> anyhow::Result<u32>;
}

/// Named-button press/release primitives.
///
/// Implementations must tolerate repeated presses and press-without-release.
pub trait InputPad: Send + Sync {
    fn press(&self, button: Button) -> anyhow::Result<()>;
    fn release(&self, button: Button) -> anyhow::Result<()>;
}

impl<M: MemoryRead + ?Sized> MemoryRead for Arc<M> {
    fn load_u8(&self, addr: u32) -> anyhow::Result<u8> {
        (**self).load_u8(addr)
    }

    fn load_u16(&self, addr: u32) -> anyhow::Result<u16> {
        (**self).load_u16(addr)
    }

    fn load_u32(&self, addr: u32) -> anyhow::Result<u32> {
        (**self).load_u32(addr)
    }
}

impl<P: InputPad + ?Sized> InputPad for Arc<P> {
    fn press(&self, button: Button) -> anyhow::Result<()> {
        (**self).press(button)
    }

    fn release(&self, button: Button) -> anyhow::Result<()> {
        (**self).release(button)
    }
}

/// An owned capture of one window of emulated RAM.
///
/// Reads outside the window yield zero rather than failing: the memory layer
/// has no bounds contract, anomalies are the mapper's problem. Used by tests
/// and for decoding offline RAM dumps.
#[derive(Debug, Clone)]
pub struct RamSnapshot {
    base: u32,
    bytes: Vec<u8>,
}

impl RamSnapshot {
    pub fn new(base: u32, bytes: Vec<u8>) -> Self {
        Self { base, bytes }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    fn cursor_at(&self, addr: u32, len: usize) -> Option<Cursor<&[u8]>> {
        let off = addr.checked_sub(self.base)? as usize;
        if off.checked_add(len)? > self.bytes.len() {
            return None;
        }
        let mut cur = Cursor::new(self.bytes.as_slice());
        cur.set_position(off as u64);
        Some(cur)
    }
}

impl MemoryRead for RamSnapshot {
    fn load_u8(&self, addr: u32) -> anyhow::Result<u8> {
        match self.cursor_at(addr, 1) {
            Some(mut cur) => cur.read_u8().context("snapshot u8 read"),
            None => Ok(0),
        }
    }

    fn load_u16(&self, addr: u32) -> anyhow::Result<u16> {
        match self.cursor_at(addr, 2) {
            Some(mut cur) => cur.read_u16::<LittleEndian>().context("snapshot u16 read"),
            None => Ok(0),
        }
    }

    fn load_u32(&self, addr: u32) -> anyhow::Result<u32> {
        match self.cursor_at(addr, 4) {
            Some(mut cur) => cur.read_u32::<LittleEndian>().context("snapshot u32 read"),
            None => Ok(0),
        }
    }
}
