//! Host-side streaming: the per-frame tick and the clock that paces it.

use tracing::{debug, trace};

use crate::device::Screamer;
use crate::irq::IrqCause;
use crate::regs::Control;
use crate::sink::AudioBackend;
use crate::{FRAME_BYTES, SCREAMER_BUFFER_SIZE};

/// Upper bound on ticks run by one `advance_to` call. Past this many frames
/// the playback ring has been drained completely, so further ticks could only
/// emit silence.
const MAX_TICKS_PER_ADVANCE: u64 = (SCREAMER_BUFFER_SIZE / FRAME_BYTES) as u64;

impl Screamer {
    /// Nanoseconds between ticks at the active rate.
    pub fn tick_interval_ns(&self) -> u64 {
        self.clock.rate().tick_interval_ns()
    }

    /// Move one frame in each enabled direction.
    pub fn tick(&mut self, audio: &mut dyn AudioBackend) {
        // Tick boundary: a rate programmed since the last tick takes over here.
        if self.clock.rate() != self.rate {
            debug!(
                from = self.clock.rate().hz(),
                to = self.rate.hz(),
                "screamer rate change"
            );
            self.clock.set_rate(self.rate);
        }

        let tx = self.tx_enabled();
        let rx = self.rx_enabled();
        if tx {
            self.play_frame(audio);
        }
        if rx {
            self.capture_frame(audio);
        }
        if tx || rx {
            self.frames += 1;
        }
    }

    /// Run every tick that falls due up to `now_ns` (guest time). Returns the
    /// number of ticks run.
    pub fn advance_to(&mut self, now_ns: u64, audio: &mut dyn AudioBackend) -> u64 {
        let due = self.clock.advance_to(now_ns);
        if !self.tx_enabled() && !self.rx_enabled() {
            if self.clock.rate() != self.rate {
                self.clock.set_rate(self.rate);
            }
            return 0;
        }

        let run = due.min(MAX_TICKS_PER_ADVANCE);
        if run < due {
            debug!(due, run, "screamer dropping overdue ticks");
        }
        for _ in 0..run {
            self.tick(audio);
        }
        run
    }

    fn play_frame(&mut self, audio: &mut dyn AudioBackend) {
        let mut frame = [0u8; FRAME_BYTES];
        let got = self.tx_ring.pop_into(&mut frame);
        if got < FRAME_BYTES {
            // Silence is zero for signed PCM.
            frame[got..].fill(0);
            trace!(got, "screamer playback underrun");
            self.set_latch(Control::UNDERRUN);
        }
        audio.write(self.voice, &frame);

        if self.threshold != 0 && self.tx_ring.len() < self.threshold as usize {
            self.irqs.raise(IrqCause::Refill);
        }
    }

    fn capture_frame(&mut self, audio: &mut dyn AudioBackend) {
        let mut frame = [0u8; FRAME_BYTES];
        let got = audio.read(self.voice, &mut frame);
        if got < FRAME_BYTES {
            frame[got..].fill(0);
        }

        // Only whole frames enter the ring so the guest always reads aligned samples.
        if self.rx_ring.free() < FRAME_BYTES {
            trace!("screamer capture overrun");
            self.set_latch(Control::OVERRUN);
        } else {
            self.rx_ring.push(&frame);
        }

        if self.threshold != 0 && self.rx_ring.len() >= self.threshold as usize {
            self.irqs.raise(IrqCause::DataReady);
        }
    }
}
