//! PowerMac "Screamer" audio codec and DMA streaming engine.
//!
//! The engine sits between a guest-programmed DBDMA channel pair and a host
//! audio backend:
//!
//! - guest register accesses go through [`Screamer::mmio_read`] / [`Screamer::mmio_write`]
//! - the DMA channel manager calls [`Screamer::on_dma_transfer`] (or
//!   [`Screamer::on_dma_request`] for guest-memory descriptors)
//! - the machine's audio timer calls [`Screamer::tick`] or [`Screamer::advance_to`]
//!
//! Everything runs on the device model's dispatch thread; nothing here blocks
//! or locks.

pub mod codec;
pub mod config;
pub mod device;
pub mod dma;
pub mod error;
pub mod irq;
pub mod rate;
pub mod regs;
pub mod ring;
pub mod sink;
mod stream;

pub use config::{IrqAssignment, MachineKind, ScreamerConfig};
pub use device::{Device, Screamer};
pub use dma::{Direction, DmaChannelId, DmaControllerId, DmaTransfer, GuestMemory};
pub use error::{AudioError, BindingError, ConfigurationError, Result, ScreamerError};
pub use irq::{IrqCause, IrqKind, IrqLine, NullIrqLine, ScreamerIrqs};
pub use rate::{FrameClock, SampleRate, SUPPORTED_RATES_HZ};
pub use ring::RingBuffer;
pub use sink::{AudioBackend, MemoryAudioBackend, SampleFormat, VoiceId};

/// Capacity of each direction's ring buffer.
pub const SCREAMER_BUFFER_SIZE: usize = 0x4000;

/// Output channel count.
pub const CHANNELS: u8 = 2;

/// One frame: a 16-bit sample per channel.
pub const FRAME_BYTES: usize = CHANNELS as usize * SAMPLE_FORMAT.bytes_per_sample();

/// Sample layout handed to the host backend.
pub const SAMPLE_FORMAT: SampleFormat = SampleFormat::S16Be;
