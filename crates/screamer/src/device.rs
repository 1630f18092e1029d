//! Screamer device: register file, reset and teardown.

use tracing::{debug, trace};

use crate::codec::CodecRegisters;
use crate::config::ScreamerConfig;
use crate::dma::DmaBridge;
use crate::error::{Result, ScreamerError};
use crate::irq::{InterruptSignals, IrqCause, IrqKind, ScreamerIrqs};
use crate::rate::{FrameClock, SampleRate};
use crate::regs::*;
use crate::ring::RingBuffer;
use crate::sink::{AudioBackend, VoiceId};
use crate::{CHANNELS, SAMPLE_FORMAT, SCREAMER_BUFFER_SIZE};

/// Capability set shared by register-mapped device models.
pub trait Device {
    /// Host-side resources borrowed for teardown.
    type Host: ?Sized;

    fn mmio_read(&mut self, offset: u64, size: usize) -> u64;
    fn mmio_write(&mut self, offset: u64, size: usize, value: u64);

    /// Return guest-visible state to power-on values.
    fn reset(&mut self);

    /// Release host resources. Consumes the device so nothing can outlive them.
    fn teardown(self, host: &mut Self::Host)
    where
        Self: Sized;
}

/// One Screamer instance.
#[derive(Debug)]
pub struct Screamer {
    // Register file.
    pub(crate) control: Control,
    pub(crate) latches: Control,
    pub(crate) rate: SampleRate,
    pub(crate) threshold: u32,
    pub(crate) codec: CodecRegisters,

    // Playback ring (TX DMA -> host) and capture ring (host -> RX DMA).
    pub(crate) tx_ring: RingBuffer,
    pub(crate) rx_ring: RingBuffer,

    pub(crate) clock: FrameClock,
    pub(crate) frames: u64,

    pub(crate) dma: DmaBridge,
    pub(crate) irqs: InterruptSignals,
    pub(crate) voice: VoiceId,

    power_on_rate: SampleRate,
    power_on_threshold: u32,
}

impl Screamer {
    /// Create the device and open its host voice.
    pub fn new(
        config: &ScreamerConfig,
        irqs: ScreamerIrqs,
        audio: &mut dyn AudioBackend,
    ) -> Result<Self> {
        config.validate()?;
        let voice = audio.open(SAMPLE_FORMAT, CHANNELS)?;
        debug!(
            ?voice,
            rate = config.sample_rate.hz(),
            machine = ?config.machine,
            "screamer created"
        );

        Ok(Self {
            control: Control::empty(),
            latches: Control::empty(),
            rate: config.sample_rate,
            threshold: config.threshold,
            codec: CodecRegisters::new(),
            tx_ring: RingBuffer::new(SCREAMER_BUFFER_SIZE),
            rx_ring: RingBuffer::new(SCREAMER_BUFFER_SIZE),
            clock: FrameClock::new(config.sample_rate, 0),
            frames: 0,
            dma: DmaBridge::default(),
            irqs: InterruptSignals::new(irqs),
            voice,
            power_on_rate: config.sample_rate,
            power_on_threshold: config.threshold,
        })
    }

    /// Create the device and bind the DMA channels named in `config`.
    ///
    /// A binding failure closes the voice again before returning.
    pub fn attach(
        config: &ScreamerConfig,
        irqs: ScreamerIrqs,
        audio: &mut dyn AudioBackend,
        controller: crate::dma::DmaControllerId,
    ) -> Result<Self> {
        let mut dev = Self::new(config, irqs, audio)?;
        if let Err(err) = dev.register_dma(controller, config.tx_channel(), config.rx_channel()) {
            dev.teardown_inner(audio);
            return Err(ScreamerError::Binding(err));
        }
        Ok(dev)
    }

    pub fn voice(&self) -> VoiceId {
        self.voice
    }

    /// Sample rate most recently programmed (already clamped).
    pub fn sample_rate(&self) -> SampleRate {
        self.rate
    }

    /// Rate the tick clock is currently running at.
    pub fn active_rate(&self) -> SampleRate {
        self.clock.rate()
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn codec(&self) -> &CodecRegisters {
        &self.codec
    }

    pub fn tx_ring(&self) -> &RingBuffer {
        &self.tx_ring
    }

    pub fn rx_ring(&self) -> &RingBuffer {
        &self.rx_ring
    }

    /// Ticks delivered while a direction was enabled.
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn tx_enabled(&self) -> bool {
        self.control.contains(Control::TX_ENABLE)
    }

    pub fn rx_enabled(&self) -> bool {
        self.control.contains(Control::RX_ENABLE)
    }

    /// Latches currently set, without clearing them.
    pub fn latches(&self) -> Control {
        self.latches
    }

    pub fn irq_pulse_count(&self, kind: IrqKind) -> u64 {
        self.irqs.pulse_count(kind)
    }

    pub fn irq_pending(&self, kind: IrqKind) -> bool {
        self.irqs.is_pending(kind)
    }

    /// Whether `cause` has pulsed and is still waiting to be serviced.
    pub fn irq_raised(&self, cause: IrqCause) -> bool {
        self.irqs.is_raised(cause)
    }

    pub fn mmio_read(&mut self, offset: u64, size: usize) -> u64 {
        let mut out = 0u64;
        for i in 0..size.min(8) {
            out |= u64::from(self.mmio_read_u8(offset + i as u64)) << (i * 8);
        }
        out
    }

    pub fn mmio_write(&mut self, offset: u64, size: usize, value: u64) {
        // Whole-register stores take the direct path so RATE is clamped once.
        if size == 4 {
            if let Some(reg) = ScreamerReg::decode(offset) {
                self.write_reg(reg, value as u32);
                return;
            }
        }
        for i in 0..size.min(8) {
            let b = ((value >> (i * 8)) & 0xff) as u8;
            self.mmio_write_u8(offset + i as u64, b);
        }
    }

    fn mmio_read_u8(&mut self, offset: u64) -> u8 {
        let Some(decoded) = ScreamerReg::decode_byte(offset) else {
            trace!(offset, "screamer read from unmapped offset");
            return 0;
        };
        let shift = u32::from(decoded.byte) * 8;
        let value = ((self.read_reg(decoded.reg) >> shift) & 0xff) as u8;

        if decoded.reg == ScreamerReg::Control && decoded.byte == CONTROL_LATCH_BYTE {
            self.clear_latches();
        }
        value
    }

    fn mmio_write_u8(&mut self, offset: u64, value: u8) {
        let Some(decoded) = ScreamerReg::decode_byte(offset) else {
            trace!(offset, value, "screamer write to unmapped offset");
            return;
        };
        if decoded.reg.is_read_only() {
            trace!(offset, value, "screamer write to read-only register");
            return;
        }
        let shift = u32::from(decoded.byte) * 8;
        let mask = 0xffu32 << shift;
        let current = self.read_reg(decoded.reg);
        self.write_reg(decoded.reg, (current & !mask) | (u32::from(value) << shift));
    }

    /// Side-effect-free register value.
    fn read_reg(&self, reg: ScreamerReg) -> u32 {
        match reg {
            ScreamerReg::Control => (self.control | self.latches | self.occupancy_bits()).bits(),
            ScreamerReg::Rate => self.rate.hz(),
            ScreamerReg::Threshold => self.threshold,
            ScreamerReg::ByteCount => {
                (self.tx_ring.len() as u32 & 0xffff) | ((self.rx_ring.len() as u32 & 0xffff) << 16)
            }
            ScreamerReg::CodecAddr => self.codec.addr(),
            ScreamerReg::CodecData => self.codec.data(),
        }
    }

    fn write_reg(&mut self, reg: ScreamerReg, value: u32) {
        match reg {
            ScreamerReg::Control => self.write_control(value),
            ScreamerReg::Rate => {
                let rate = SampleRate::nearest(value);
                if rate.hz() != value {
                    debug!(requested = value, clamped = rate.hz(), "screamer rate clamped");
                }
                self.rate = rate;
            }
            ScreamerReg::Threshold => {
                self.threshold = (value & THRESHOLD_MASK).min(SCREAMER_BUFFER_SIZE as u32);
            }
            ScreamerReg::CodecAddr => self.codec.select(value),
            ScreamerReg::CodecData => self.codec.write_data(value),
            ScreamerReg::ByteCount => {}
        }
    }

    fn write_control(&mut self, value: u32) {
        let old = self.control;
        let new = Control::from_bits_truncate(value) & Control::WRITABLE;
        self.control = new;

        // Enabling a direction flushes whatever stale bytes it still holds.
        if !old.contains(Control::TX_ENABLE) && new.contains(Control::TX_ENABLE) {
            debug!(stale = self.tx_ring.len(), "screamer tx enabled");
            self.tx_ring.clear();
            self.irqs.clear(IrqKind::TxDma);
        } else if old.contains(Control::TX_ENABLE) && !new.contains(Control::TX_ENABLE) {
            debug!(queued = self.tx_ring.len(), "screamer tx disabled");
        }

        if !old.contains(Control::RX_ENABLE) && new.contains(Control::RX_ENABLE) {
            debug!(stale = self.rx_ring.len(), "screamer rx enabled");
            self.rx_ring.clear();
            self.irqs.clear(IrqKind::RxDma);
        } else if old.contains(Control::RX_ENABLE) && !new.contains(Control::RX_ENABLE) {
            debug!(queued = self.rx_ring.len(), "screamer rx disabled");
        }
    }

    fn occupancy_bits(&self) -> Control {
        let mut bits = Control::empty();
        bits.set(Control::TX_EMPTY, self.tx_ring.is_empty());
        bits.set(Control::TX_FULL, self.tx_ring.is_full());
        bits.set(Control::RX_EMPTY, self.rx_ring.is_empty());
        bits.set(Control::RX_FULL, self.rx_ring.is_full());
        bits
    }

    /// Set a status latch. The device line pulses only on a 0 -> 1 transition.
    pub(crate) fn set_latch(&mut self, latch: Control) {
        if self.latches.contains(latch) {
            return;
        }
        self.latches |= latch;
        debug!(?latch, "screamer status latch set");
        self.irqs.raise(IrqCause::Status);
    }

    fn clear_latches(&mut self) {
        if self.latches.is_empty() {
            return;
        }
        self.latches = Control::empty();
        self.irqs.clear(IrqKind::Device);
    }

    fn teardown_inner(&mut self, audio: &mut dyn AudioBackend) {
        debug!(voice = ?self.voice, "screamer teardown");
        self.tx_ring.clear();
        self.rx_ring.clear();
        audio.close(self.voice);
    }
}

impl Device for Screamer {
    type Host = dyn AudioBackend;

    fn mmio_read(&mut self, offset: u64, size: usize) -> u64 {
        Screamer::mmio_read(self, offset, size)
    }

    fn mmio_write(&mut self, offset: u64, size: usize, value: u64) {
        Screamer::mmio_write(self, offset, size, value)
    }

    fn reset(&mut self) {
        self.control = Control::empty();
        self.latches = Control::empty();
        self.rate = self.power_on_rate;
        self.threshold = self.power_on_threshold;
        self.codec.reset();
        self.tx_ring.clear();
        self.rx_ring.clear();
        self.clock = FrameClock::new(self.power_on_rate, self.clock.last_ns());
        self.frames = 0;
        self.irqs.reset();
    }

    fn teardown(mut self, host: &mut Self::Host) {
        self.teardown_inner(host);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryAudioBackend;

    fn screamer() -> Screamer {
        let mut audio = MemoryAudioBackend::new();
        Screamer::new(&ScreamerConfig::default(), ScreamerIrqs::default(), &mut audio).unwrap()
    }

    #[test]
    fn control_ignores_undefined_and_read_only_bits() {
        let mut dev = screamer();
        dev.mmio_write(SCREAMER_CONTROL, 4, 0xffff_ffff);
        let v = dev.mmio_read(SCREAMER_CONTROL, 4) as u32;
        assert_eq!(v & 0xff, (Control::TX_ENABLE | Control::RX_ENABLE).bits());
        assert_eq!(dev.latches(), Control::empty());
        // Both rings are empty after enabling.
        assert_ne!(v & Control::TX_EMPTY.bits(), 0);
        assert_ne!(v & Control::RX_EMPTY.bits(), 0);
        assert_eq!(v & !(Control::WRITABLE | Control::TX_EMPTY | Control::RX_EMPTY).bits(), 0);
    }

    #[test]
    fn byte_count_is_read_only() {
        let mut dev = screamer();
        dev.mmio_write(SCREAMER_BYTE_COUNT, 4, 0x1234_5678);
        assert_eq!(dev.mmio_read(SCREAMER_BYTE_COUNT, 4), 0);

        dev.tx_ring.push(&[0; 8]);
        dev.mmio_write(SCREAMER_BYTE_COUNT, 1, 0xff);
        dev.mmio_write(SCREAMER_BYTE_COUNT + 2, 2, 0xffff);
        assert_eq!(dev.mmio_read(SCREAMER_BYTE_COUNT, 4), 8);
        assert!(ScreamerReg::ByteCount.is_read_only());
    }

    #[test]
    fn threshold_is_clamped_to_capacity() {
        let mut dev = screamer();
        dev.mmio_write(SCREAMER_THRESHOLD, 4, 0x7fff);
        assert_eq!(dev.threshold(), SCREAMER_BUFFER_SIZE as u32);
        dev.mmio_write(SCREAMER_THRESHOLD, 4, 0xffff_0100);
        assert_eq!(dev.threshold(), 0x100);
    }

    #[test]
    fn latch_byte_read_clears_latches() {
        let mut dev = screamer();
        dev.set_latch(Control::UNDERRUN);
        assert_eq!(dev.irq_pulse_count(IrqKind::Device), 1);

        // Reading byte 0 alone leaves the latches in place.
        dev.mmio_read(SCREAMER_CONTROL, 1);
        assert_eq!(dev.latches(), Control::UNDERRUN);

        let byte1 = dev.mmio_read(SCREAMER_CONTROL + 1, 1) as u32;
        assert_eq!(byte1 << 8, Control::UNDERRUN.bits());
        assert_eq!(dev.latches(), Control::empty());
        assert!(!dev.irq_pending(IrqKind::Device));
    }
}
