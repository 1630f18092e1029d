//! MMIO register layout and bit definitions for the Screamer audio block.
//!
//! The macio cell decodes the register index from `offset >> 4`, so every
//! 32-bit register sits at the start of its own 16-byte slot. Bytes 4..=15 of
//! each slot are padding.

use bitflags::bitflags;

pub const SCREAMER_CONTROL: u64 = 0x00;
pub const SCREAMER_RATE: u64 = 0x10;
pub const SCREAMER_THRESHOLD: u64 = 0x20;
pub const SCREAMER_BYTE_COUNT: u64 = 0x30;
pub const SCREAMER_CODEC_ADDR: u64 = 0x40;
pub const SCREAMER_CODEC_DATA: u64 = 0x50;

/// Size of the register block.
pub const SCREAMER_MMIO_SIZE: u64 = 0x60;

const REG_SHIFT: u32 = 4;
const REG_WIDTH: u64 = 4;

/// Number of primary registers.
pub const PRIMARY_REG_COUNT: usize = 6;

/// THRESHOLD holds a byte count up to the ring capacity (0x4000).
pub const THRESHOLD_MASK: u32 = 0x7fff;

pub const CODEC_ADDR_MASK: u32 = 0x7;
/// Codec registers are 12-bit words.
pub const CODEC_DATA_MASK: u32 = 0x0fff;

/// Byte of CONTROL that carries the read-to-clear latches.
pub const CONTROL_LATCH_BYTE: u8 = 1;

bitflags! {
    /// CONTROL register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Control: u32 {
        const TX_ENABLE = 1 << 0;
        const RX_ENABLE = 1 << 1;

        const OVERRUN = 1 << 8;
        const UNDERRUN = 1 << 9;

        const TX_EMPTY = 1 << 16;
        const TX_FULL = 1 << 17;
        const RX_EMPTY = 1 << 18;
        const RX_FULL = 1 << 19;
    }
}

impl Control {
    /// Bits the guest may set.
    pub const WRITABLE: Self = Self::TX_ENABLE.union(Self::RX_ENABLE);
    /// Read-to-clear status latches.
    pub const LATCHES: Self = Self::OVERRUN.union(Self::UNDERRUN);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScreamerReg {
    Control,
    Rate,
    Threshold,
    ByteCount,
    CodecAddr,
    CodecData,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DecodedByte {
    pub reg: ScreamerReg,
    /// Byte lane within the 32-bit register (0 = least significant).
    pub byte: u8,
}

impl ScreamerReg {
    pub fn decode(offset: u64) -> Option<Self> {
        match offset {
            SCREAMER_CONTROL => Some(Self::Control),
            SCREAMER_RATE => Some(Self::Rate),
            SCREAMER_THRESHOLD => Some(Self::Threshold),
            SCREAMER_BYTE_COUNT => Some(Self::ByteCount),
            SCREAMER_CODEC_ADDR => Some(Self::CodecAddr),
            SCREAMER_CODEC_DATA => Some(Self::CodecData),
            _ => None,
        }
    }

    /// Decode the register covering a single byte offset.
    pub fn decode_byte(offset: u64) -> Option<DecodedByte> {
        if offset >= SCREAMER_MMIO_SIZE {
            return None;
        }
        let base = (offset >> REG_SHIFT) << REG_SHIFT;
        let lane = offset - base;
        if lane >= REG_WIDTH {
            return None;
        }
        Some(DecodedByte {
            reg: Self::decode(base)?,
            byte: lane as u8,
        })
    }

    pub fn offset(self) -> u64 {
        match self {
            Self::Control => SCREAMER_CONTROL,
            Self::Rate => SCREAMER_RATE,
            Self::Threshold => SCREAMER_THRESHOLD,
            Self::ByteCount => SCREAMER_BYTE_COUNT,
            Self::CodecAddr => SCREAMER_CODEC_ADDR,
            Self::CodecData => SCREAMER_CODEC_DATA,
        }
    }

    pub fn is_read_only(self) -> bool {
        matches!(self, Self::ByteCount)
    }
}
