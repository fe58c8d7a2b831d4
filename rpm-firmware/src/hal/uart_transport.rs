// UART Transport - serielle Verbindung zum ELM327 OBD-II Adapter
//
// Der Adapter hängt über eine HC-05 Bluetooth-Brücke an UART1.

use esp_hal::Blocking;
use esp_hal::uart::{Config as UartConfig, Uart};
use rpm_core::{SerialTransport, TransportError};

use crate::config::OBD_UART_BAUDRATE;

/// Blocking UART, aber nur non-blocking genutzt:
/// gelesen wird ausschließlich, was bereits im RX-FIFO liegt.
pub struct UartTransport<'a> {
    uart: Uart<'a, Blocking>,
}

impl<'a> UartTransport<'a> {
    /// Initialisiert UART1 mit `OBD_UART_BAUDRATE` (8N1)
    ///
    /// # Parameter
    /// - `uart1`: UART1 Peripheral
    /// - `tx`: GPIO4 → RX des Adapters
    /// - `rx`: GPIO5 ← TX des Adapters
    pub fn new(
        uart1: esp_hal::peripherals::UART1<'a>,
        tx: esp_hal::peripherals::GPIO4<'a>,
        rx: esp_hal::peripherals::GPIO5<'a>,
    ) -> Result<Self, esp_hal::uart::ConfigError> {
        let config = UartConfig::default().with_baudrate(OBD_UART_BAUDRATE);
        let uart = Uart::new(uart1, config)?.with_tx(tx).with_rx(rx);
        Ok(Self { uart })
    }
}

impl SerialTransport for UartTransport<'_> {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        // read() würde blockieren, wenn der FIFO leer ist
        if !self.uart.read_ready() {
            return Ok(0);
        }
        self.uart.read(buf).map_err(|_| TransportError::ReadFailed)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut remaining = bytes;
        while !remaining.is_empty() {
            let written = self
                .uart
                .write(remaining)
                .map_err(|_| TransportError::WriteFailed)?;
            remaining = &remaining[written..];
        }
        Ok(())
    }
}
