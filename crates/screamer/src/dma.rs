//! DMA bridge between the DBDMA channel manager and the ring buffers.
//!
//! The engine only records which controller and channels it is bound to; the
//! channel manager owns the channels and calls back into the engine for each
//! transfer.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::device::Screamer;
use crate::error::BindingError;
use crate::irq::{IrqCause, IrqKind};
use crate::regs::Control;

/// Channels per DBDMA controller.
pub const DBDMA_CHANNELS: u8 = 32;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Direction {
    /// Guest -> host (playback).
    Tx,
    /// Host -> guest (capture).
    Rx,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Tx => Direction::Rx,
            Direction::Rx => Direction::Tx,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DmaChannelId(pub u8);

impl fmt::Display for DmaChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Index of a DMA controller in the machine's device registry.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DmaControllerId(pub u32);

/// Guest physical memory as seen by a bus-master transfer.
pub trait GuestMemory {
    fn read_physical(&mut self, paddr: u64, buf: &mut [u8]);
    fn write_physical(&mut self, paddr: u64, buf: &[u8]);
}

/// Flat RAM starting at guest physical address 0. Out-of-range bytes read as
/// zero and writes to them are dropped.
impl GuestMemory for Vec<u8> {
    fn read_physical(&mut self, paddr: u64, buf: &mut [u8]) {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = usize::try_from(paddr)
                .ok()
                .and_then(|p| p.checked_add(i))
                .and_then(|p| self.get(p).copied())
                .unwrap_or(0);
        }
    }

    fn write_physical(&mut self, paddr: u64, buf: &[u8]) {
        for (i, b) in buf.iter().enumerate() {
            let Some(p) = usize::try_from(paddr).ok().and_then(|p| p.checked_add(i)) else {
                return;
            };
            if let Some(slot) = self.get_mut(p) {
                *slot = *b;
            }
        }
    }
}

/// Result of one DMA transfer callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DmaTransfer {
    /// Bytes the channel offered (TX) or asked for (RX).
    pub requested: usize,
    /// Bytes actually moved through the ring.
    pub moved: usize,
}

impl DmaTransfer {
    pub fn is_short(&self) -> bool {
        self.moved < self.requested
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct DmaBridge {
    controller: Option<DmaControllerId>,
    tx: Option<DmaChannelId>,
    rx: Option<DmaChannelId>,
    registered: bool,
    scratch: Vec<u8>,
}

impl DmaBridge {
    fn channel(&self, direction: Direction) -> Option<DmaChannelId> {
        match direction {
            Direction::Tx => self.tx,
            Direction::Rx => self.rx,
        }
    }

    fn slot(&mut self, direction: Direction) -> &mut Option<DmaChannelId> {
        match direction {
            Direction::Tx => &mut self.tx,
            Direction::Rx => &mut self.rx,
        }
    }
}

fn check_range(channel: DmaChannelId) -> Result<(), BindingError> {
    if channel.0 >= DBDMA_CHANNELS {
        return Err(BindingError::InvalidChannel(channel));
    }
    Ok(())
}

impl Screamer {
    /// Bind both directions to `controller`. Must happen once, before the
    /// guest enables either direction.
    pub fn register_dma(
        &mut self,
        controller: DmaControllerId,
        tx: DmaChannelId,
        rx: DmaChannelId,
    ) -> Result<(), BindingError> {
        if self.dma.registered {
            return Err(BindingError::AlreadyRegistered);
        }
        if self.control.intersects(Control::WRITABLE) {
            return Err(BindingError::EngineActive);
        }
        if tx == rx {
            return Err(BindingError::SameChannel(tx));
        }
        check_range(tx)?;
        check_range(rx)?;

        debug!(?controller, %tx, %rx, "screamer dma registered");
        self.dma.controller = Some(controller);
        self.dma.tx = Some(tx);
        self.dma.rx = Some(rx);
        self.dma.registered = true;
        Ok(())
    }

    /// Bind (or rebind) a single direction. The previous channel for that
    /// direction, if any, is dropped. The two directions never share a channel.
    pub fn register_channel(
        &mut self,
        direction: Direction,
        channel: DmaChannelId,
    ) -> Result<(), BindingError> {
        check_range(channel)?;
        if self.dma.channel(direction.opposite()) == Some(channel) {
            return Err(BindingError::SameChannel(channel));
        }
        let slot = self.dma.slot(direction);
        if let Some(old) = slot.replace(channel) {
            if old != channel {
                debug!(?direction, %old, new = %channel, "screamer dma channel replaced");
            }
        }
        Ok(())
    }

    pub fn dma_controller(&self) -> Option<DmaControllerId> {
        self.dma.controller
    }

    pub fn dma_channel(&self, direction: Direction) -> Option<DmaChannelId> {
        self.dma.channel(direction)
    }

    /// Transfer callback from the channel manager.
    ///
    /// TX: `buf` holds guest bytes; whatever does not fit is dropped and
    /// reported as overrun. RX: `buf` is filled from the capture ring, with any
    /// shortfall zero-filled and reported as underrun.
    pub fn on_dma_transfer(
        &mut self,
        direction: Direction,
        buf: &mut [u8],
    ) -> Result<DmaTransfer, BindingError> {
        if self.dma.channel(direction).is_none() {
            warn!(?direction, "screamer dma transfer on unbound direction");
            return Err(BindingError::Unbound(direction));
        }

        let requested = buf.len();
        let enabled = match direction {
            Direction::Tx => self.tx_enabled(),
            Direction::Rx => self.rx_enabled(),
        };
        if !enabled {
            trace!(?direction, requested, "screamer dma transfer while disabled");
            return Ok(DmaTransfer {
                requested,
                moved: 0,
            });
        }

        let moved = match direction {
            Direction::Tx => self.tx_transfer(buf),
            Direction::Rx => self.rx_transfer(buf),
        };
        Ok(DmaTransfer { requested, moved })
    }

    /// Descriptor-driven variant: move `len` bytes between guest memory at
    /// `addr` and the ring for `direction`.
    pub fn on_dma_request(
        &mut self,
        direction: Direction,
        mem: &mut dyn GuestMemory,
        addr: u64,
        len: usize,
    ) -> Result<DmaTransfer, BindingError> {
        let mut scratch = std::mem::take(&mut self.dma.scratch);
        scratch.clear();
        scratch.resize(len, 0);

        if direction == Direction::Tx {
            mem.read_physical(addr, &mut scratch);
        }
        let result = self.on_dma_transfer(direction, &mut scratch);
        if direction == Direction::Rx && result.is_ok() && self.rx_enabled() {
            mem.write_physical(addr, &scratch);
        }

        self.dma.scratch = scratch;
        result
    }

    fn tx_transfer(&mut self, buf: &[u8]) -> usize {
        let accepted = self.tx_ring.push(buf);
        if accepted < buf.len() {
            trace!(offered = buf.len(), accepted, "screamer tx overrun");
            self.set_latch(Control::OVERRUN);
            // Ask the channel to throttle.
            self.irqs.raise(IrqCause::Throttle);
        } else {
            self.irqs.clear(IrqKind::TxDma);
        }
        accepted
    }

    fn rx_transfer(&mut self, buf: &mut [u8]) -> usize {
        let read = self.rx_ring.pop_into(buf);
        if read < buf.len() {
            buf[read..].fill(0);
            trace!(wanted = buf.len(), read, "screamer rx underrun");
            self.set_latch(Control::UNDERRUN);
        } else {
            self.irqs.clear(IrqKind::RxDma);
        }
        read
    }
}
