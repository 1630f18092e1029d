mod common;

use common::Harness;
use screamer::regs::{Control, SCREAMER_CONTROL, SCREAMER_RATE, SCREAMER_THRESHOLD};
use screamer::{Direction, IrqKind, FRAME_BYTES};

#[test]
fn tick_on_empty_buffer_plays_silence_and_latches_underrun_once() {
    let mut h = Harness::new();
    h.enable(Control::TX_ENABLE);

    h.tick();

    assert_eq!(h.played(), &[0u8; FRAME_BYTES]);
    assert!(h.dev.latches().contains(Control::UNDERRUN));
    assert_eq!(h.device_irq.pulses(), 1);

    // Still empty: the latch is already set, so no further device pulse.
    h.tick();
    assert_eq!(h.played().len(), 2 * FRAME_BYTES);
    assert_eq!(h.device_irq.pulses(), 1);
    assert_eq!(h.tx_irq.pulses(), 0);
}

#[test]
fn reading_the_latch_rearms_the_device_irq() {
    let mut h = Harness::new();
    h.enable(Control::TX_ENABLE);
    h.tick();
    assert_eq!(h.device_irq.pulses(), 1);

    let status = h.dev.mmio_read(SCREAMER_CONTROL, 4) as u32;
    assert_ne!(status & Control::UNDERRUN.bits(), 0);
    assert_eq!(h.dev.mmio_read(SCREAMER_CONTROL, 4) as u32 & Control::UNDERRUN.bits(), 0);

    h.tick();
    assert_eq!(h.device_irq.pulses(), 2);
}

#[test]
fn queued_frames_reach_the_host_in_order() {
    let mut h = Harness::new();
    h.enable(Control::TX_ENABLE);

    let mut pcm = vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
    let t = h.dev.on_dma_transfer(Direction::Tx, &mut pcm).unwrap();
    assert!(!t.is_short());

    h.tick();
    h.tick();
    assert_eq!(h.played(), &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
    assert!(h.dev.latches().is_empty());
    assert_eq!(h.dev.frames_processed(), 2);
}

#[test]
fn partial_frame_is_padded_with_silence() {
    let mut h = Harness::new();
    h.enable(Control::TX_ENABLE);

    h.dev.on_dma_transfer(Direction::Tx, &mut [0x7f, 0x01]).unwrap();
    h.tick();

    assert_eq!(h.played(), &[0x7f, 0x01, 0, 0]);
    assert!(h.dev.latches().contains(Control::UNDERRUN));
    assert_eq!(h.device_irq.pulses(), 1);
}

#[test]
fn ticks_do_nothing_while_disabled() {
    let mut h = Harness::new();
    h.tick();
    assert!(h.played().is_empty());
    assert_eq!(h.dev.frames_processed(), 0);
    assert_eq!(h.device_irq.pulses(), 0);
}

#[test]
fn unsupported_rate_is_clamped_and_retimes_the_next_tick() {
    let mut h = Harness::new();
    assert_eq!(h.dev.tick_interval_ns(), 22_676);

    h.dev.mmio_write(SCREAMER_RATE, 4, 1);
    assert_eq!(h.dev.mmio_read(SCREAMER_RATE, 4), 7350);
    assert_eq!(h.dev.sample_rate().hz(), 7350);

    // Nothing is retimed until the next tick boundary.
    assert_eq!(h.dev.active_rate().hz(), 44_100);
    assert_eq!(h.dev.tick_interval_ns(), 22_676);

    h.tick();
    assert_eq!(h.dev.active_rate().hz(), 7350);
    assert_eq!(h.dev.tick_interval_ns(), 136_054);
}

#[test]
fn advance_to_runs_ticks_at_the_programmed_rate() {
    let mut h = Harness::new();
    h.dev.mmio_write(SCREAMER_RATE, 4, 22_050);
    h.enable(Control::TX_ENABLE);
    h.tick();

    // 10ms at 22.05kHz.
    let ran = h.dev.advance_to(10_000_000, &mut h.audio);
    assert_eq!(ran, 220);
    assert_eq!(h.dev.frames_processed(), 221);
    assert_eq!(h.played().len(), 221 * FRAME_BYTES);
}

#[test]
fn advance_to_bounds_work_after_a_long_stall() {
    let mut h = Harness::new();
    h.enable(Control::TX_ENABLE);

    let ran = h.dev.advance_to(60 * 1_000_000_000, &mut h.audio);
    assert_eq!(ran, (screamer::SCREAMER_BUFFER_SIZE / FRAME_BYTES) as u64);
}

#[test]
fn low_water_threshold_requests_more_data() {
    let mut h = Harness::new();
    h.dev.mmio_write(SCREAMER_THRESHOLD, 4, 8);
    h.enable(Control::TX_ENABLE);

    h.dev
        .on_dma_transfer(Direction::Tx, &mut [1u8; 12])
        .unwrap();
    h.tick(); // 8 bytes left: not below threshold
    assert_eq!(h.tx_irq.pulses(), 0);

    h.tick(); // 4 bytes left
    assert_eq!(h.tx_irq.pulses(), 1);
    h.tick(); // still low, request already outstanding
    assert_eq!(h.tx_irq.pulses(), 1);
    assert!(h.dev.irq_pending(IrqKind::TxDma));

    // Servicing the request re-arms the line.
    h.dev.on_dma_transfer(Direction::Tx, &mut [2u8; 4]).unwrap();
    assert!(!h.dev.irq_pending(IrqKind::TxDma));
    h.tick();
    assert_eq!(h.tx_irq.pulses(), 2);
}
