//! Core Types für den RPM-Meter
//!
//! Datenstrukturen ohne Hardware-Dependencies

use heapless::{String, Vec};

use crate::config::RpmMeterConfig;
use crate::obd::{RpmFrame, is_line_break};

/// Maximale Größe des Antwort-Puffers in Bytes
///
/// Eine RPM-Antwort inkl. Echo und Prompt ist ca. 20 Bytes lang.
pub const RESPONSE_CAPACITY: usize = 64;

/// Akkumulierender Empfangspuffer für Adapter-Antworten
///
/// Begrenzt auf [`RESPONSE_CAPACITY`]. Läuft er über, werden die ältesten
/// Bytes verworfen, damit der neueste Frame erhalten bleibt.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    bytes: Vec<u8, RESPONSE_CAPACITY>,
}

impl RawResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Hängt `data` an, verdrängt bei Überlauf die ältesten Bytes
    pub fn push_latest(&mut self, data: &[u8]) {
        // Nur die letzten RESPONSE_CAPACITY Bytes von `data` können überleben
        let data = &data[data.len().saturating_sub(RESPONSE_CAPACITY)..];

        let overflow = (self.bytes.len() + data.len()).saturating_sub(RESPONSE_CAPACITY);
        if overflow > 0 {
            let len = self.bytes.len();
            self.bytes.copy_within(overflow..len, 0);
            self.bytes.truncate(len - overflow);
        }

        // Passt nach dem Verdrängen immer
        let _ = self.bytes.extend_from_slice(data);
    }

    /// Verwirft die ersten `count` Bytes (bereits dekodierter Frame)
    pub fn discard_front(&mut self, count: usize) {
        let count = count.min(self.bytes.len());
        let len = self.bytes.len();
        self.bytes.copy_within(count..len, 0);
        self.bytes.truncate(len - count);
    }

    /// Behält nur eine angefangene, noch nicht abgeschlossene letzte Zeile
    ///
    /// Wird nach jedem Dekodier-Versuch aufgerufen: abgeschlossene Zeilen
    /// sind verarbeitet, ein halber Frame wird im nächsten Zyklus ergänzt.
    pub fn retain_partial_line(&mut self) {
        // Ohne Zeilenumbruch ist alles (noch) eine angefangene Zeile
        if let Some(pos) = self.bytes.iter().rposition(|&b| is_line_break(b)) {
            let len = self.bytes.len();
            self.bytes.copy_within(pos + 1..len, 0);
            self.bytes.truncate(len - pos - 1);
        }
    }
}

/// Letzter erfolgreich dekodierter RPM-Wert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpmReading {
    /// Die vier Hex-Ziffern aus der Antwort, z.B. `"1AF8"`
    pub raw_hex: String<4>,
    pub rpm: u16,
    pub timestamp_ms: u64,
}

impl RpmReading {
    pub fn from_frame(frame: RpmFrame, timestamp_ms: u64) -> Self {
        Self {
            raw_hex: frame.raw_hex(),
            rpm: frame.rpm(),
            timestamp_ms,
        }
    }
}

/// Zustand der Poll-Schleife
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
    /// Zeitpunkt der letzten Anfrage, `None` vor dem ersten Zyklus
    pub last_request_ms: Option<u64>,
    pub refresh_interval_ms: u32,
    pub connected: bool,
}

impl PollState {
    pub fn new(refresh_interval_ms: u32) -> Self {
        Self {
            last_request_ms: None,
            refresh_interval_ms,
            connected: false,
        }
    }

    /// Ist seit der letzten Anfrage mindestens ein Intervall vergangen?
    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_request_ms {
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.refresh_interval_ms),
            None => true,
        }
    }
}

/// Status-Snapshot für Channel-Kommunikation
///
/// Wird vom RPM-Task an HTTP/WebSocket-Clients gebroadcastet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpmStatus {
    pub rpm: u16,
    pub intensity: u8,
    pub connected: bool,
    /// RPM am oder über dem Maximum (Warn-Blinken aktiv)
    pub warning: bool,
    pub config: RpmMeterConfig,
}

/// Konfigurations-Kommando
///
/// Wird vom WebSocket an den RPM-Task gesendet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Komplette (bereits validierte) Konfiguration übernehmen
    Apply(RpmMeterConfig),
    /// Nur das Enable-Flag umschalten
    SetEnabled(bool),
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for RpmReading {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "RpmReading {{ hex: {}, rpm: {}, at: {}ms }}",
            self.raw_hex.as_str(),
            self.rpm,
            self.timestamp_ms
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RpmStatus {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "RpmStatus {{ rpm: {}, intensity: {}%, connected: {}, warning: {}, enabled: {} }}",
            self.rpm,
            self.intensity,
            self.connected,
            self.warning,
            self.config.enabled()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigCommand {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ConfigCommand::Apply(config) => defmt::write!(fmt, "Apply({})", config),
            ConfigCommand::SetEnabled(enabled) => defmt::write!(fmt, "SetEnabled({})", enabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_latest_drops_oldest() {
        let mut response = RawResponse::new();
        response.push_latest(&[b'a'; RESPONSE_CAPACITY - 2]);
        response.push_latest(b"wxyz");

        assert_eq!(response.len(), RESPONSE_CAPACITY);
        assert!(response.as_bytes().ends_with(b"wxyz"));
        assert_eq!(response.as_bytes()[0], b'a');
    }

    #[test]
    fn test_push_latest_oversized_chunk() {
        let mut response = RawResponse::new();
        response.push_latest(b"old");

        let mut chunk = [b'x'; RESPONSE_CAPACITY + 10];
        chunk[RESPONSE_CAPACITY + 9] = b'!';
        response.push_latest(&chunk);

        assert_eq!(response.len(), RESPONSE_CAPACITY);
        assert_eq!(response.as_bytes()[RESPONSE_CAPACITY - 1], b'!');
    }

    #[test]
    fn test_retain_partial_line() {
        let mut response = RawResponse::new();
        response.push_latest(b"410C0C00\r\r>41 0C 1A");
        response.retain_partial_line();
        assert_eq!(response.as_bytes(), b"41 0C 1A");

        response.push_latest(b"410C0C00\r>");
        response.retain_partial_line();
        assert!(response.is_empty());
    }

    #[test]
    fn test_discard_front_keeps_tail() {
        let mut response = RawResponse::new();
        response.push_latest(b"410C1AF8 41 0C");
        response.discard_front(8);
        assert_eq!(response.as_bytes(), b" 41 0C");

        response.discard_front(100);
        assert!(response.is_empty());
    }

    #[test]
    fn test_poll_state_is_due() {
        let mut state = PollState::new(200);
        assert!(state.is_due(0));

        state.last_request_ms = Some(1000);
        assert!(!state.is_due(1199));
        assert!(state.is_due(1200));
        // Uhr läuft rückwärts → nicht fällig, kein Überlauf
        assert!(!state.is_due(500));
    }
}
