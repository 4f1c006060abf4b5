//! Pin allocation for config-driven hardware setup
//!
//! Provides a way to get GPIO pins by number at runtime, so the motor pin
//! table comes from `machine.toml` rather than being hardcoded.
//!
//! GPIO0/GPIO1 carry the UART0 console and are handed out typed through
//! [`RemainingPeripherals`]; every other GPIO goes into the [`PinBank`].

use embassy_rp::gpio::AnyPin;
use embassy_rp::Peri;
use embassy_rp::Peripherals;

/// Number of GPIOs on the RP2040
pub const GPIO_COUNT: usize = 30;

/// Console UART TX
pub const SERIAL_TX_PIN: u8 = 0;

/// Console UART RX
pub const SERIAL_RX_PIN: u8 = 1;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin(u8),
    /// Pin already taken
    AlreadyTaken(u8),
    /// Pin reserved for the console UART
    Reserved(u8),
}

/// Pin bank that holds the free GPIO pins and allows taking them by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT],
}

impl PinBank {
    /// Create a pin bank owning every non-console GPIO
    pub fn new(pins: PinBankPeripherals) -> Self {
        Self {
            pins: [
                None,
                None,
                Some(pins.pin2.into()),
                Some(pins.pin3.into()),
                Some(pins.pin4.into()),
                Some(pins.pin5.into()),
                Some(pins.pin6.into()),
                Some(pins.pin7.into()),
                Some(pins.pin8.into()),
                Some(pins.pin9.into()),
                Some(pins.pin10.into()),
                Some(pins.pin11.into()),
                Some(pins.pin12.into()),
                Some(pins.pin13.into()),
                Some(pins.pin14.into()),
                Some(pins.pin15.into()),
                Some(pins.pin16.into()),
                Some(pins.pin17.into()),
                Some(pins.pin18.into()),
                Some(pins.pin19.into()),
                Some(pins.pin20.into()),
                Some(pins.pin21.into()),
                Some(pins.pin22.into()),
                Some(pins.pin23.into()),
                Some(pins.pin24.into()),
                Some(pins.pin25.into()),
                Some(pins.pin26.into()),
                Some(pins.pin27.into()),
                Some(pins.pin28.into()),
                Some(pins.pin29.into()),
            ],
        }
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        if usize::from(pin_num) >= GPIO_COUNT {
            return Err(PinError::InvalidPin(pin_num));
        }
        if pin_num == SERIAL_TX_PIN || pin_num == SERIAL_RX_PIN {
            return Err(PinError::Reserved(pin_num));
        }
        self.pins[usize::from(pin_num)]
            .take()
            .ok_or(PinError::AlreadyTaken(pin_num))
    }

    /// Check if a pin is available
    pub fn is_available(&self, pin_num: u8) -> bool {
        self.pins
            .get(usize::from(pin_num))
            .is_some_and(|slot| slot.is_some())
    }
}

/// GPIOs moved into the [`PinBank`]
pub struct PinBankPeripherals {
    pub pin2: Peri<'static, embassy_rp::peripherals::PIN_2>,
    pub pin3: Peri<'static, embassy_rp::peripherals::PIN_3>,
    pub pin4: Peri<'static, embassy_rp::peripherals::PIN_4>,
    pub pin5: Peri<'static, embassy_rp::peripherals::PIN_5>,
    pub pin6: Peri<'static, embassy_rp::peripherals::PIN_6>,
    pub pin7: Peri<'static, embassy_rp::peripherals::PIN_7>,
    pub pin8: Peri<'static, embassy_rp::peripherals::PIN_8>,
    pub pin9: Peri<'static, embassy_rp::peripherals::PIN_9>,
    pub pin10: Peri<'static, embassy_rp::peripherals::PIN_10>,
    pub pin11: Peri<'static, embassy_rp::peripherals::PIN_11>,
    pub pin12: Peri<'static, embassy_rp::peripherals::PIN_12>,
    pub pin13: Peri<'static, embassy_rp::peripherals::PIN_13>,
    pub pin14: Peri<'static, embassy_rp::peripherals::PIN_14>,
    pub pin15: Peri<'static, embassy_rp::peripherals::PIN_15>,
    pub pin16: Peri<'static, embassy_rp::peripherals::PIN_16>,
    pub pin17: Peri<'static, embassy_rp::peripherals::PIN_17>,
    pub pin18: Peri<'static, embassy_rp::peripherals::PIN_18>,
    pub pin19: Peri<'static, embassy_rp::peripherals::PIN_19>,
    pub pin20: Peri<'static, embassy_rp::peripherals::PIN_20>,
    pub pin21: Peri<'static, embassy_rp::peripherals::PIN_21>,
    pub pin22: Peri<'static, embassy_rp::peripherals::PIN_22>,
    pub pin23: Peri<'static, embassy_rp::peripherals::PIN_23>,
    pub pin24: Peri<'static, embassy_rp::peripherals::PIN_24>,
    pub pin25: Peri<'static, embassy_rp::peripherals::PIN_25>,
    pub pin26: Peri<'static, embassy_rp::peripherals::PIN_26>,
    pub pin27: Peri<'static, embassy_rp::peripherals::PIN_27>,
    pub pin28: Peri<'static, embassy_rp::peripherals::PIN_28>,
    pub pin29: Peri<'static, embassy_rp::peripherals::PIN_29>,
}

impl PinBankPeripherals {
    /// Split Embassy Peripherals into bank pins and everything else
    pub fn from_peripherals(p: Peripherals) -> (Self, RemainingPeripherals) {
        let pins = Self {
            pin2: p.PIN_2,
            pin3: p.PIN_3,
            pin4: p.PIN_4,
            pin5: p.PIN_5,
            pin6: p.PIN_6,
            pin7: p.PIN_7,
            pin8: p.PIN_8,
            pin9: p.PIN_9,
            pin10: p.PIN_10,
            pin11: p.PIN_11,
            pin12: p.PIN_12,
            pin13: p.PIN_13,
            pin14: p.PIN_14,
            pin15: p.PIN_15,
            pin16: p.PIN_16,
            pin17: p.PIN_17,
            pin18: p.PIN_18,
            pin19: p.PIN_19,
            pin20: p.PIN_20,
            pin21: p.PIN_21,
            pin22: p.PIN_22,
            pin23: p.PIN_23,
            pin24: p.PIN_24,
            pin25: p.PIN_25,
            pin26: p.PIN_26,
            pin27: p.PIN_27,
            pin28: p.PIN_28,
            pin29: p.PIN_29,
        };
        let remaining = RemainingPeripherals {
            uart0: p.UART0,
            uart0_tx: p.PIN_0,
            uart0_rx: p.PIN_1,
        };
        (pins, remaining)
    }
}

/// Peripherals that remain after creating the PinBank
pub struct RemainingPeripherals {
    pub uart0: Peri<'static, embassy_rp::peripherals::UART0>,
    pub uart0_tx: Peri<'static, embassy_rp::peripherals::PIN_0>,
    pub uart0_rx: Peri<'static, embassy_rp::peripherals::PIN_1>,
}
