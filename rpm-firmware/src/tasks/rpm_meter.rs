// RPM Meter Task - Pollt den OBD-II Adapter und steuert das LED-Segment
use defmt::{debug, error, info, warn};
use embassy_time::{Duration, Instant, Timer};
use esp_hal_smartled::smart_led_buffer;
use rpm_core::{DecodeError, TickEvent};

use crate::config::{
    LED_COUNT, RMT_CLOCK_MHZ, SEGMENT_COLOR, STATUS_HEARTBEAT_MS, TICK_INTERVAL_MS,
};
use crate::hal::{BtStatePin, RmtLedWriter, UartTransport};
use crate::{
    ConfigCommand, ConfigCommandReceiver, ConnectionSense, DisplaySink, RpmMeterConfig,
    RpmPoller, RpmStatus, RpmStatusPublisher, SegmentDisplay, SerialTransport,
};

/// RPM Meter Logic - Testbare Business Logic ohne Hardware-Abhängigkeit
///
/// Diese Funktion enthält die komplette Steuerungs-Schleife:
/// - Übernimmt Config-Kommandos vom WebSocket
/// - Liest den Bluetooth-STATE und treibt den Poller (`tick`)
/// - Broadcastet den Status bei Änderung, mindestens jede Sekunde
///
/// # Trait-basierte Abstraktion
/// - `T: SerialTransport` - UART (Production) oder Mock
/// - `D: DisplaySink` - LED-Segment (Production) oder Mock
/// - `C: ConnectionSense` - STATE-Pin (Production) oder Mock
pub async fn rpm_meter_logic<T, D, C>(
    mut poller: RpmPoller<T, D>,
    mut link: C,
    status_publisher: RpmStatusPublisher,
    command_receiver: ConfigCommandReceiver,
) where
    T: SerialTransport,
    D: DisplaySink,
    C: ConnectionSense,
{
    let mut last_status: Option<RpmStatus> = None;
    let mut last_broadcast_ms = 0u64;
    let mut was_connected: Option<bool> = None;

    loop {
        // Prüfe auf eingehende Kommandos vom WebSocket (non-blocking)
        if let Ok(cmd) = command_receiver.try_receive() {
            info!("RPM: Command received: {}", cmd);
            match cmd {
                ConfigCommand::Apply(config) => poller.apply_config(config),
                ConfigCommand::SetEnabled(enabled) => poller.set_enabled(enabled),
            }
        }

        let connected = link.is_connected();
        if was_connected != Some(connected) {
            if connected {
                info!("RPM: OBD adapter connected");
            } else {
                warn!("RPM: OBD adapter disconnected, showing calibration intensity");
            }
            was_connected = Some(connected);
        }

        let now_ms = Instant::now().as_millis();
        match poller.tick(now_ms, connected) {
            Ok(TickEvent::Polled(report)) => {
                if let Err(e) = report.request {
                    error!("RPM: Failed to send PID request: {}", e);
                }
                if let Err(e) = report.drained {
                    warn!("RPM: Failed to read adapter response: {}", e);
                }
                match report.decoded {
                    Ok(rpm) => debug!("RPM: {} rpm", rpm),
                    // Vor der ersten Antwort normal
                    Err(DecodeError::TooShort) => debug!("RPM: No response yet"),
                    Err(e) => debug!("RPM: Response not decoded: {}", e),
                }
                if let Some(intensity) = report.published {
                    debug!("RPM: Segment intensity {}%", intensity);
                }
            }
            Ok(_) => {}
            Err(e) => error!("RPM: Failed to write to LED: {}", e),
        }

        // Nur bei Änderung (oder als Heartbeat) publishen
        let status = poller.status();
        let heartbeat_due = now_ms.saturating_sub(last_broadcast_ms) >= STATUS_HEARTBEAT_MS;
        if last_status != Some(status) || heartbeat_due {
            status_publisher.publish_immediate(status); // Broadcast an alle Subscribers
            last_status = Some(status);
            last_broadcast_ms = now_ms;
        }

        // Async Delay: gibt CPU an WiFi/HTTP Tasks zurück
        Timer::after(Duration::from_millis(TICK_INTERVAL_MS)).await;
    }
}

/// RPM Meter Task - Embassy Task für parallele Ausführung
///
/// Dieser Task übernimmt die Hardware-Initialisierung und ruft dann
/// die testbare `rpm_meter_logic()` Funktion auf.
///
/// # Parameter
/// - `gpio8`, `rmt_peripheral`: LED-Datenleitung und RMT für WS2812
/// - `uart1`, `uart_tx`, `uart_rx`: Serielle Verbindung zum OBD-Adapter
/// - `gpio7`: STATE-Pin des Bluetooth-Moduls
/// - `status_publisher`: PubSub Publisher für Status-Broadcasts
/// - `command_receiver`: Channel Receiver für Config-Kommandos
#[allow(clippy::too_many_arguments)]
#[embassy_executor::task]
pub async fn rpm_meter_task(
    gpio8: esp_hal::peripherals::GPIO8<'static>,
    rmt_peripheral: esp_hal::peripherals::RMT<'static>,
    uart1: esp_hal::peripherals::UART1<'static>,
    uart_tx: esp_hal::peripherals::GPIO4<'static>,
    uart_rx: esp_hal::peripherals::GPIO5<'static>,
    gpio7: esp_hal::peripherals::GPIO7<'static>,
    status_publisher: RpmStatusPublisher,
    command_receiver: ConfigCommandReceiver,
) {
    // Buffer für SmartLED Daten erstellen
    let mut rmt_buffer = smart_led_buffer!(LED_COUNT);

    let led = match RmtLedWriter::new(gpio8, rmt_peripheral, RMT_CLOCK_MHZ, &mut rmt_buffer) {
        Ok(led) => led,
        Err(e) => {
            error!("RPM: LED init failed: {}", e);
            return;
        }
    };

    let transport = match UartTransport::new(uart1, uart_tx, uart_rx) {
        Ok(transport) => transport,
        Err(_) => {
            error!("RPM: UART init failed");
            return;
        }
    };

    let config = RpmMeterConfig::default();
    info!("RPM: Starting with {}", config);

    let display = SegmentDisplay::new(led, SEGMENT_COLOR);
    let poller = RpmPoller::new(transport, display, config);

    // Business Logic aufrufen (testbar!)
    rpm_meter_logic(
        poller,
        BtStatePin::new(gpio7),
        status_publisher,
        command_receiver,
    )
    .await;
}
