//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware-Zugriff
//! ohne konkrete Implementierung.

use rgb::RGB8;

/// Fehler-Typ für LED-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedError {
    WriteFailed,
    /// Segment-Index existiert auf diesem Display nicht
    UnknownSegment,
}

/// Fehler-Typ für die serielle Verbindung zum OBD-Adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    ReadFailed,
    WriteFailed,
}

/// Trait für SmartLED Hardware-Zugriff
///
/// Abstrahiert den Zugriff auf RGB LEDs (WS2812/Neopixel).
///
/// # Implementierungen
/// - **Production:** RmtLedWriter (ESP32 RMT Peripheral)
/// - **Testing:** MockLedWriter (in-memory Mock)
pub trait SmartLedWriter: Send {
    /// Schreibt eine RGB-Farbe auf die LED
    ///
    /// # Fehlerbehandlung
    /// Gibt `LedError::WriteFailed` zurück wenn Hardware-Zugriff fehlschlägt
    fn write(&mut self, color: RGB8) -> Result<(), LedError>;
}

/// Byte-orientierter Kanal zum OBD-II Adapter (UART / Bluetooth-Brücke)
///
/// Beide Operationen dürfen NICHT blockieren: der Poller läuft kooperativ
/// in einer Tick-Schleife.
pub trait SerialTransport {
    /// Liest nur die bereits gepufferten Bytes in `buf`
    ///
    /// Gibt `Ok(0)` zurück, wenn aktuell nichts anliegt.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Sendet `bytes` (fire-and-forget)
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// Anzeige-Senke für ein LED-Segment
///
/// # Implementierungen
/// - **Production:** [`crate::SegmentDisplay`] über einen `SmartLedWriter`
/// - **Testing:** MockDisplay (zeichnet Aufrufe auf)
pub trait DisplaySink {
    /// Setzt die Helligkeit des Segments in Prozent (0..=100)
    fn set_intensity(&mut self, segment: usize, percent: u8) -> Result<(), LedError>;

    /// Schaltet das Segment an oder aus
    fn set_on(&mut self, segment: usize, on: bool) -> Result<(), LedError>;
}

/// Verbindungsstatus zum OBD-Adapter (z.B. STATE-Pin des Bluetooth-Moduls)
pub trait ConnectionSense {
    fn is_connected(&mut self) -> bool;
}
