//! Bonobo - Hot-wire Foam Cutter Firmware
//!
//! Main firmware binary for RP2040 boards carrying an Arduino CNC shield.
//! Reads G-code lines from the serial console and drives four stepper axes
//! (two per wire tower) to cut wing and fuselage profiles.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use bonobo_core::command::Controller;
use bonobo_core::config::{parse_config, MachineConfig};
use bonobo_hal_rp2040::pins::{SERIAL_RX_PIN, SERIAL_TX_PIN};
use bonobo_hal_rp2040::{build_stepper_bank, EmbassyClock, PinBank, PinBankPeripherals};

mod channels;
mod tasks;

/// Embedded machine configuration (validated by build.rs)
/// Edit machine.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../machine.toml");

/// UART ring buffer sizes
///
/// The RX buffer holds what the host sends while a long move is running.
const UART_TX_BUF: usize = 256;
const UART_RX_BUF: usize = 256;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; UART_TX_BUF]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; UART_RX_BUF]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Bonobo firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Configuration loaded: coupling={}, feedrate={} mm/s, baud={}",
        config.coupling, config.default_feedrate, config.serial.baud_rate
    );

    if config.serial.tx_pin.pin != SERIAL_TX_PIN || config.serial.rx_pin.pin != SERIAL_RX_PIN {
        warn!(
            "Serial console is fixed to UART0 on gpio{}/gpio{}, ignoring configured pins",
            SERIAL_TX_PIN, SERIAL_RX_PIN
        );
    }

    // Split the peripherals: numbered GPIOs for the motor table, typed
    // UART0 pins for the console
    let (pins, serial) = PinBankPeripherals::from_peripherals(p);
    let mut pin_bank = PinBank::new(pins);

    let motors = match config.motor_table() {
        Ok(motors) => motors,
        Err(e) => panic!("Incomplete motor table: {}", e),
    };
    let stepper_bank = match build_stepper_bank(&mut pin_bank, &motors, config.pulse_width_us) {
        Ok(bank) => bank,
        Err(e) => panic!("Stepper pins unavailable: {}", e),
    };
    info!("Stepper bank initialized, drivers disabled");

    let controller = match Controller::new(&config, stepper_bank, EmbassyClock::new()) {
        Ok(controller) => controller,
        Err(e) => panic!("Controller setup failed: {}", e),
    };

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.serial.baud_rate;

    let tx_buf = TX_BUF.init([0u8; UART_TX_BUF]);
    let rx_buf = RX_BUF.init([0u8; UART_RX_BUF]);

    let uart = Uart::new_blocking(serial.uart0, serial.uart0_tx, serial.uart0_rx, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", config.serial.baud_rate);

    // Spawn tasks
    spawner.spawn(tasks::serial_rx_task(rx)).unwrap();
    spawner.spawn(tasks::controller_task(controller, tx)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded machine configuration
///
/// build.rs rejects an invalid machine.toml, so the fallback only guards
/// against a parser mismatch between host and target.
fn load_config() -> MachineConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {}", e);
            warn!("Using Arduino CNC shield defaults");
            MachineConfig::cnc_shield()
        }
    }
}
