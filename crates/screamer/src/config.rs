//! Device configuration supplied by the machine builder.

use serde::{Deserialize, Serialize};

use crate::dma::DmaChannelId;
use crate::error::ConfigurationError;
use crate::rate::SampleRate;
use crate::SCREAMER_BUFFER_SIZE;

/// DBDMA channel the macio cell wires to Screamer output.
pub const DEFAULT_TX_DMA_CHANNEL: u8 = 0x10;
/// DBDMA channel the macio cell wires to Screamer input.
pub const DEFAULT_RX_DMA_CHANNEL: u8 = 0x12;

/// PowerMac generation, which decides the interrupt numbering.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineKind {
    /// Grackle/Heathrow (Beige G3).
    OldWorld,
    /// UniNorth/KeyLargo (mac99).
    #[default]
    NewWorld,
}

/// Interrupt controller inputs the three Screamer lines are wired to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct IrqAssignment {
    pub device: u32,
    pub tx_dma: u32,
    pub rx_dma: u32,
}

impl MachineKind {
    pub fn irq_assignment(self) -> IrqAssignment {
        match self {
            MachineKind::OldWorld => IrqAssignment {
                device: 0x11,
                tx_dma: 0x08,
                rx_dma: 0x09,
            },
            MachineKind::NewWorld => IrqAssignment {
                device: 0x18,
                tx_dma: 0x09,
                rx_dma: 0x0a,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreamerConfig {
    /// Power-on sample rate. Must be one of the codec's supported rates.
    pub sample_rate: SampleRate,
    /// Power-on THRESHOLD register value (0 disables threshold interrupts).
    pub threshold: u32,
    pub machine: MachineKind,
    pub tx_dma_channel: u8,
    pub rx_dma_channel: u8,
}

impl Default for ScreamerConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::DEFAULT,
            threshold: 0,
            machine: MachineKind::default(),
            tx_dma_channel: DEFAULT_TX_DMA_CHANNEL,
            rx_dma_channel: DEFAULT_RX_DMA_CHANNEL,
        }
    }
}

impl ScreamerConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.threshold as usize > SCREAMER_BUFFER_SIZE {
            return Err(ConfigurationError::ThresholdTooLarge(self.threshold));
        }
        Ok(())
    }

    pub fn tx_channel(&self) -> DmaChannelId {
        DmaChannelId(self.tx_dma_channel)
    }

    pub fn rx_channel(&self) -> DmaChannelId {
        DmaChannelId(self.rx_dma_channel)
    }

    pub fn irq_assignment(&self) -> IrqAssignment {
        self.machine.irq_assignment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = ScreamerConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.sample_rate.hz(), 44_100);
        assert_eq!(cfg.tx_channel(), DmaChannelId(0x10));
        assert_eq!(cfg.rx_channel(), DmaChannelId(0x12));
    }

    #[test]
    fn threshold_above_capacity_is_rejected() {
        let cfg = ScreamerConfig {
            threshold: SCREAMER_BUFFER_SIZE as u32 + 1,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigurationError::ThresholdTooLarge(0x4001))
        );
    }

    #[test]
    fn old_and_new_world_irq_numbers() {
        let old = MachineKind::OldWorld.irq_assignment();
        assert_eq!((old.device, old.tx_dma, old.rx_dma), (0x11, 0x08, 0x09));
        let new = MachineKind::NewWorld.irq_assignment();
        assert_eq!((new.device, new.tx_dma, new.rx_dma), (0x18, 0x09, 0x0a));
    }
}
