#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use screamer::regs::{Control, SCREAMER_CONTROL};
use screamer::{
    DmaControllerId, IrqLine, MemoryAudioBackend, Screamer, ScreamerConfig, ScreamerIrqs,
};

/// Records every level change so tests can count edges.
#[derive(Clone, Default)]
pub struct TestIrqLine(pub Rc<RefCell<Vec<bool>>>);

impl TestIrqLine {
    /// Number of rising edges seen.
    pub fn pulses(&self) -> usize {
        self.0.borrow().iter().filter(|level| **level).count()
    }
}

impl IrqLine for TestIrqLine {
    fn set_level(&self, level: bool) {
        self.0.borrow_mut().push(level);
    }
}

/// Route engine logs through the test harness's captured output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

pub struct Harness {
    pub dev: Screamer,
    pub audio: MemoryAudioBackend,
    pub device_irq: TestIrqLine,
    pub tx_irq: TestIrqLine,
    pub rx_irq: TestIrqLine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ScreamerConfig::default())
    }

    pub fn with_config(config: ScreamerConfig) -> Self {
        init_tracing();
        let device_irq = TestIrqLine::default();
        let tx_irq = TestIrqLine::default();
        let rx_irq = TestIrqLine::default();
        let irqs = ScreamerIrqs {
            device: Box::new(device_irq.clone()),
            tx_dma: Box::new(tx_irq.clone()),
            rx_dma: Box::new(rx_irq.clone()),
        };
        let mut audio = MemoryAudioBackend::new();
        let dev = Screamer::attach(&config, irqs, &mut audio, DmaControllerId(0)).unwrap();
        Self {
            dev,
            audio,
            device_irq,
            tx_irq,
            rx_irq,
        }
    }

    pub fn enable(&mut self, bits: Control) {
        self.dev.mmio_write(SCREAMER_CONTROL, 4, u64::from(bits.bits()));
    }

    pub fn tick(&mut self) {
        self.dev.tick(&mut self.audio);
    }

    pub fn played(&self) -> &[u8] {
        self.audio.played(self.dev.voice())
    }
}
