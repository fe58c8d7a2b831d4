// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die Traits aus rpm-core für die ESP32-C6 Peripherie,
// damit die Poll-Logik ohne Hardware testbar bleibt.

pub mod bt_state;
pub mod led_writer;
pub mod uart_transport;

pub use bt_state::BtStatePin;
pub use led_writer::RmtLedWriter;
pub use uart_transport::UartTransport;
