//! Interrupt signaling: edge pulses on the device and DMA lines.

use std::fmt;

/// A single interrupt input on the platform interrupt controller.
pub trait IrqLine {
    fn set_level(&self, level: bool);

    /// Edge-triggered assertion.
    fn pulse(&self) {
        self.set_level(true);
        self.set_level(false);
    }
}

/// Line that goes nowhere; used when the machine leaves a line unwired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIrqLine;

impl IrqLine for NullIrqLine {
    fn set_level(&self, _level: bool) {}
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum IrqKind {
    /// Consolidated status interrupt (latch changes).
    Device,
    /// Transmit DMA: refill request or throttle.
    TxDma,
    /// Receive DMA: captured data ready.
    RxDma,
}

impl IrqKind {
    pub const ALL: [IrqKind; 3] = [IrqKind::Device, IrqKind::TxDma, IrqKind::RxDma];

    fn index(self) -> usize {
        match self {
            IrqKind::Device => 0,
            IrqKind::TxDma => 1,
            IrqKind::RxDma => 2,
        }
    }
}

/// The three lines the engine drives, supplied by the machine.
pub struct ScreamerIrqs {
    pub device: Box<dyn IrqLine>,
    pub tx_dma: Box<dyn IrqLine>,
    pub rx_dma: Box<dyn IrqLine>,
}

impl Default for ScreamerIrqs {
    fn default() -> Self {
        Self {
            device: Box::new(NullIrqLine),
            tx_dma: Box::new(NullIrqLine),
            rx_dma: Box::new(NullIrqLine),
        }
    }
}

impl ScreamerIrqs {
    fn line(&self, kind: IrqKind) -> &dyn IrqLine {
        match kind {
            IrqKind::Device => self.device.as_ref(),
            IrqKind::TxDma => self.tx_dma.as_ref(),
            IrqKind::RxDma => self.rx_dma.as_ref(),
        }
    }
}

/// Event that asks for an interrupt. Several causes can share one line.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum IrqCause {
    /// A status latch went 0 -> 1.
    Status,
    /// Playback ring fell below the threshold.
    Refill,
    /// A TX transfer did not fit in the playback ring.
    Throttle,
    /// Capture ring reached the threshold.
    DataReady,
}

impl IrqCause {
    pub const ALL: [IrqCause; 4] = [
        IrqCause::Status,
        IrqCause::Refill,
        IrqCause::Throttle,
        IrqCause::DataReady,
    ];

    /// Line this cause is signalled on.
    pub fn line(self) -> IrqKind {
        match self {
            IrqCause::Status => IrqKind::Device,
            IrqCause::Refill | IrqCause::Throttle => IrqKind::TxDma,
            IrqCause::DataReady => IrqKind::RxDma,
        }
    }

    fn index(self) -> usize {
        match self {
            IrqCause::Status => 0,
            IrqCause::Refill => 1,
            IrqCause::Throttle => 2,
            IrqCause::DataReady => 3,
        }
    }
}

/// Coalescing front-end for the IRQ lines.
///
/// Each cause pulses its line on the first `raise` after the line was last
/// cleared; further raises of that cause are absorbed until `clear` re-arms it.
/// Distinct causes on the same line coalesce independently.
pub struct InterruptSignals {
    lines: ScreamerIrqs,
    pending: [bool; 4],
    pulses: [u64; 3],
}

impl fmt::Debug for InterruptSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptSignals")
            .field("pending", &self.pending)
            .field("pulses", &self.pulses)
            .finish_non_exhaustive()
    }
}

impl InterruptSignals {
    pub fn new(lines: ScreamerIrqs) -> Self {
        Self {
            lines,
            pending: [false; 4],
            pulses: [0; 3],
        }
    }

    /// Raise `cause`, returning whether a pulse was emitted.
    pub fn raise(&mut self, cause: IrqCause) -> bool {
        let i = cause.index();
        if self.pending[i] {
            return false;
        }
        self.pending[i] = true;
        let kind = cause.line();
        self.pulses[kind.index()] += 1;
        tracing::trace!(?kind, ?cause, "screamer irq pulse");
        self.lines.line(kind).pulse();
        true
    }

    /// Re-arm every cause signalled on `kind`.
    pub fn clear(&mut self, kind: IrqKind) {
        for cause in IrqCause::ALL {
            if cause.line() == kind {
                self.pending[cause.index()] = false;
            }
        }
    }

    /// Whether any cause on `kind` is waiting to be serviced.
    pub fn is_pending(&self, kind: IrqKind) -> bool {
        IrqCause::ALL
            .iter()
            .any(|cause| cause.line() == kind && self.pending[cause.index()])
    }

    pub fn is_raised(&self, cause: IrqCause) -> bool {
        self.pending[cause.index()]
    }

    /// Total pulses emitted on `kind` since creation.
    pub fn pulse_count(&self, kind: IrqKind) -> u64 {
        self.pulses[kind.index()]
    }

    /// Re-arm every line. Pulse counters are diagnostics and survive.
    pub fn reset(&mut self) {
        self.pending = [false; 4];
    }
}
