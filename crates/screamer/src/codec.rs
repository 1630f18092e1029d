//! Indirect codec register bank.
//!
//! The codec sits behind a classic index/data pair: CODEC_ADDR selects one of
//! eight slots and CODEC_DATA reads or writes it. Slot contents are kept as
//! opaque 12-bit words; volume, mute and mux encodings are owned by the guest
//! driver.

use crate::regs::{CODEC_ADDR_MASK, CODEC_DATA_MASK};

pub const CODEC_REG_COUNT: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct CodecRegisters {
    addr: u8,
    regs: [u32; CODEC_REG_COUNT],
}

impl CodecRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn addr(&self) -> u32 {
        u32::from(self.addr)
    }

    pub fn select(&mut self, addr: u32) {
        self.addr = (addr & CODEC_ADDR_MASK) as u8;
    }

    pub fn data(&self) -> u32 {
        self.regs[self.addr as usize]
    }

    pub fn write_data(&mut self, value: u32) {
        self.regs[self.addr as usize] = value & CODEC_DATA_MASK;
    }

    /// Direct slot access for the embedding machine.
    pub fn get(&self, index: usize) -> Option<u32> {
        self.regs.get(index).copied()
    }

    pub fn as_slice(&self) -> &[u32; CODEC_REG_COUNT] {
        &self.regs
    }
}
