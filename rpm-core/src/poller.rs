//! RPM Poller - Zustandsmaschine der OBD-Abfrage
//!
//! Wird kooperativ über [`RpmPoller::tick`] getrieben (z.B. alle 5 ms aus
//! einem Embassy-Task). Pro fälligem Zyklus:
//!
//! 1. **Idle**    - warten bis `refresh_interval_ms` vergangen ist
//! 2. **Drain**   - gepufferte Bytes vom Adapter lesen (non-blocking)
//! 3. **Request** - `010C` (Engine RPM) senden
//! 4. **Decode**  - `41 0C A B` suchen, `((A * 256) + B) / 4`
//! 5. **Publish** - bei neuem Wert Helligkeit an das Display geben
//!
//! Unabhängig davon blinkt das Segment, solange die Drehzahl am Maximum ist.
//! Ohne Bluetooth-Verbindung (oder deaktiviert) zeigt es 100% zum Kalibrieren.

use crate::config::RpmMeterConfig;
use crate::display::SEGMENT_INDEX;
use crate::logic::{CALIBRATION_INTENSITY, rpm_to_intensity};
use crate::obd::{DecodeError, RPM_REQUEST, locate_rpm_frame};
use crate::traits::{DisplaySink, LedError, SerialTransport, TransportError};
use crate::types::{PollState, RawResponse, RpmReading, RpmStatus};

/// Bytes pro `read_available()` Aufruf
const DRAIN_CHUNK_SIZE: usize = 16;

/// Maximale Anzahl Reads pro Zyklus (begrenzt die Tick-Dauer)
const MAX_DRAIN_READS: usize = 8;

/// Ergebnis eines Ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickEvent {
    /// Getrennt oder deaktiviert: Display steht auf Kalibrier-Helligkeit
    Calibrating,
    /// Intervall noch nicht abgelaufen
    Waiting,
    /// Ein Poll-Zyklus wurde ausgeführt
    Polled(PollReport),
}

/// Details eines Poll-Zyklus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollReport {
    /// Gelesene Bytes oder Lesefehler
    pub drained: Result<usize, TransportError>,
    pub request: Result<(), TransportError>,
    /// Neue Drehzahl oder warum keine dekodiert wurde
    pub decoded: Result<u16, DecodeError>,
    /// An das Display gegebene Helligkeit (nur bei Änderung)
    pub published: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisplayMode {
    Unknown,
    Calibration,
    Live,
}

pub struct RpmPoller<T: SerialTransport, D: DisplaySink> {
    transport: T,
    display: D,
    config: RpmMeterConfig,
    state: PollState,
    response: RawResponse,
    reading: Option<RpmReading>,
    last_published: Option<u16>,
    intensity: u8,
    segment_on: bool,
    mode: DisplayMode,
    last_flash_toggle_ms: u64,
}

impl<T: SerialTransport, D: DisplaySink> RpmPoller<T, D> {
    pub fn new(transport: T, display: D, config: RpmMeterConfig) -> Self {
        Self {
            transport,
            display,
            config,
            state: PollState::new(config.refresh_interval_ms()),
            response: RawResponse::new(),
            reading: None,
            last_published: None,
            intensity: 0,
            segment_on: false,
            mode: DisplayMode::Unknown,
            last_flash_toggle_ms: 0,
        }
    }

    /// Ein Durchlauf der Poll-Schleife
    ///
    /// `now_ms` ist eine monotone Uhr, `link_up` der Zustand des
    /// Bluetooth-STATE-Pins. Ein `Err` bedeutet nur, dass ein Display-Write
    /// fehlgeschlagen ist; der Poller wiederholt ihn im nächsten Zyklus.
    pub fn tick(&mut self, now_ms: u64, link_up: bool) -> Result<TickEvent, LedError> {
        self.state.connected = link_up;

        if !link_up || !self.config.enabled() {
            self.show_calibration()?;
            return Ok(TickEvent::Calibrating);
        }

        if self.mode != DisplayMode::Live {
            // Nach Kalibrierung den aktuellen Wert neu anzeigen
            self.mode = DisplayMode::Live;
            self.last_published = None;
        }

        let event = if self.state.is_due(now_ms) {
            self.state.last_request_ms = Some(now_ms);
            TickEvent::Polled(self.poll_cycle(now_ms)?)
        } else {
            TickEvent::Waiting
        };

        self.update_warning(now_ms)?;
        Ok(event)
    }

    /// Übernimmt eine neue Konfiguration (Config-API)
    ///
    /// Der nächste Zyklus veröffentlicht neu, da sich `max_rpm` geändert
    /// haben kann.
    pub fn apply_config(&mut self, config: RpmMeterConfig) {
        self.config = config;
        self.state.refresh_interval_ms = config.refresh_interval_ms();
        self.last_published = None;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.apply_config(self.config.with_enabled(enabled));
    }

    pub fn config(&self) -> &RpmMeterConfig {
        &self.config
    }

    pub fn poll_state(&self) -> &PollState {
        &self.state
    }

    pub fn reading(&self) -> Option<&RpmReading> {
        self.reading.as_ref()
    }

    /// Zuletzt dekodierte Drehzahl (0 vor der ersten Antwort)
    pub fn current_rpm(&self) -> u16 {
        self.reading.as_ref().map_or(0, |reading| reading.rpm)
    }

    pub fn status(&self) -> RpmStatus {
        RpmStatus {
            rpm: self.current_rpm(),
            intensity: self.intensity,
            connected: self.state.connected,
            warning: self.mode == DisplayMode::Live && self.is_over_max(),
            config: self.config,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    fn poll_cycle(&mut self, now_ms: u64) -> Result<PollReport, LedError> {
        let drained = self.drain();
        let request = self.transport.write_all(RPM_REQUEST);

        let decoded = match locate_rpm_frame(self.response.as_bytes()) {
            Ok(found) => {
                // Frame ist verarbeitet, auch ohne abschließendes `\r`
                self.response.discard_front(found.end);
                let reading = RpmReading::from_frame(found.frame, now_ms);
                let rpm = reading.rpm;
                self.reading = Some(reading);
                Ok(rpm)
            }
            // Alter Wert bleibt stehen
            Err(err) => Err(err),
        };
        self.response.retain_partial_line();

        let published = self.publish()?;

        Ok(PollReport {
            drained,
            request,
            decoded,
            published,
        })
    }

    fn drain(&mut self) -> Result<usize, TransportError> {
        let mut chunk = [0u8; DRAIN_CHUNK_SIZE];
        let mut total = 0;

        for _ in 0..MAX_DRAIN_READS {
            let n = self.transport.read_available(&mut chunk)?.min(chunk.len());
            if n == 0 {
                break;
            }
            self.response.push_latest(&chunk[..n]);
            total += n;
        }

        Ok(total)
    }

    fn publish(&mut self) -> Result<Option<u8>, LedError> {
        let rpm = self.current_rpm();
        if self.last_published == Some(rpm) {
            return Ok(None);
        }

        let intensity = rpm_to_intensity(rpm, self.config.max_rpm());
        self.display.set_intensity(SEGMENT_INDEX, intensity)?;
        self.intensity = intensity;

        // Während der Warnung gehört an/aus dem Blink-Timer
        if !self.segment_on && !self.is_over_max() {
            self.display.set_on(SEGMENT_INDEX, true)?;
            self.segment_on = true;
        }

        self.last_published = Some(rpm);
        Ok(Some(intensity))
    }

    fn update_warning(&mut self, now_ms: u64) -> Result<(), LedError> {
        if self.is_over_max() {
            let elapsed = now_ms.saturating_sub(self.last_flash_toggle_ms);
            if elapsed >= u64::from(self.config.flash_interval_ms()) {
                self.display.set_on(SEGMENT_INDEX, !self.segment_on)?;
                self.segment_on = !self.segment_on;
                self.last_flash_toggle_ms = now_ms;
            }
        } else if !self.segment_on {
            self.display.set_on(SEGMENT_INDEX, true)?;
            self.segment_on = true;
        }
        Ok(())
    }

    fn show_calibration(&mut self) -> Result<(), LedError> {
        if self.mode == DisplayMode::Calibration {
            return Ok(());
        }

        self.display.set_intensity(SEGMENT_INDEX, CALIBRATION_INTENSITY)?;
        self.intensity = CALIBRATION_INTENSITY;
        self.display.set_on(SEGMENT_INDEX, true)?;
        self.segment_on = true;

        // Reste der alten Verbindung verwerfen, auch den letzten Messwert:
        // nach dem Reconnect zählt nur frisch dekodierte Drehzahl
        self.response.clear();
        self.reading = None;
        self.mode = DisplayMode::Calibration;
        Ok(())
    }

    fn is_over_max(&self) -> bool {
        self.current_rpm() >= self.config.max_rpm()
    }
}
