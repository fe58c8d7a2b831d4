// Bluetooth STATE-Pin - Verbindungsstatus zum OBD-Adapter
//
// Das HC-05 Modul zieht STATE auf HIGH, solange die Verbindung steht.

use esp_hal::gpio::{Input, InputConfig, Pull};
use rpm_core::ConnectionSense;

pub struct BtStatePin<'a> {
    pin: Input<'a>,
}

impl<'a> BtStatePin<'a> {
    /// Pull-Down: ein nicht angeschlossenes Modul zählt als getrennt
    pub fn new(gpio7: esp_hal::peripherals::GPIO7<'a>) -> Self {
        let pin = Input::new(gpio7, InputConfig::default().with_pull(Pull::Down));
        Self { pin }
    }
}

impl ConnectionSense for BtStatePin<'_> {
    fn is_connected(&mut self) -> bool {
        self.pin.is_high()
    }
}
