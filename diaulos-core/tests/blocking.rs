//! Cross-context tests: a foreground thread blocked against a pumped
//! interrupt side.
//!
//! The engine's blocking operations spin until the interrupt context frees
//! the condition they wait on. Here the foreground runs on a spawned
//! thread while the main thread plays the interrupt context, servicing
//! transmit events whenever the mock reports the drain is live.

use std::thread;

use diaulos_core::{BaudDivisor, Serial, SerialConfig};
use diaulos_hal_mock::MockUart;

const BAUD: BaudDivisor = BaudDivisor(25);

/// Service transmit events until the wire holds `expected` bytes.
fn pump_until(serial: &Serial<MockUart<1>, 1, 8, 8>, expected: usize) {
    while serial.device().wire(0).len() < expected {
        if serial.device().tx_interrupt_enabled(0) {
            serial.on_transmit(0);
        } else {
            thread::yield_now();
        }
    }
}

#[test]
fn write_backpressure_blocks_until_drained() {
    let serial: Serial<MockUart<1>, 1, 8, 8> =
        Serial::new(MockUart::new(), SerialConfig::new());
    serial.init(0, BAUD);

    // Five times the usable ring capacity; the writer must block and
    // resume repeatedly as the drain frees slots.
    let data: Vec<u8> = (0..35).collect();

    thread::scope(|scope| {
        let writer = scope.spawn(|| {
            for &byte in &data {
                serial.write(0, byte);
            }
        });
        pump_until(&serial, data.len());
        writer.join().unwrap();
    });

    assert_eq!(serial.device().wire(0).as_slice(), data.as_slice());
    assert!(serial.tx_empty(0));
}

#[test]
fn read_blocking_returns_the_arriving_byte() {
    let serial: Serial<MockUart<1>, 1, 8, 8> =
        Serial::new(MockUart::new(), SerialConfig::new());
    serial.init(0, BAUD);

    thread::scope(|scope| {
        let reader = scope.spawn(|| serial.read_blocking(0));

        serial.device().set_rx_data(0, b'Z');
        serial.on_receive(0);

        assert_eq!(reader.join().unwrap(), b'Z');
    });
}

#[test]
fn set_flow_serializes_control_bytes() {
    let serial: Serial<MockUart<1>, 1, 8, 8> =
        Serial::new(MockUart::new(), SerialConfig::with_flow_control());
    serial.init(0, BAUD);

    thread::scope(|scope| {
        let foreground = scope.spawn(|| {
            // Back-to-back toggles: the second call must find the first
            // control byte already handed to the hardware.
            serial.set_flow(0, false);
            serial.set_flow(0, true);
        });
        pump_until(&serial, 2);
        foreground.join().unwrap();
    });

    assert_eq!(serial.device().wire(0).as_slice(), &[0x13, 0x11][..]);
}

#[test]
fn set_flow_ignores_matching_state() {
    let serial: Serial<MockUart<1>, 1, 8, 8> =
        Serial::new(MockUart::new(), SerialConfig::with_flow_control());
    serial.init(0, BAUD);

    // Flow starts on; asking for on again must not emit anything or block.
    serial.set_flow(0, true);
    assert!(serial.device().wire(0).is_empty());
    assert!(!serial.device().tx_interrupt_enabled(0));
}

#[test]
fn close_drains_queued_bytes_before_deactivating() {
    let serial: Serial<MockUart<1>, 1, 8, 8> =
        Serial::new(MockUart::new(), SerialConfig::new());
    serial.init(0, BAUD);
    serial.write(0, b'b');
    serial.write(0, b'y');
    serial.write(0, b'e');

    thread::scope(|scope| {
        let closer = scope.spawn(|| serial.close(0));
        while serial.device().is_active(0) {
            if serial.device().tx_interrupt_enabled(0) {
                serial.on_transmit(0);
            } else {
                thread::yield_now();
            }
        }
        closer.join().unwrap();
    });

    assert_eq!(serial.device().wire(0).as_slice(), &b"bye"[..]);
    assert!(!serial.device().is_active(0));
    assert!(serial.tx_empty(0));
}
