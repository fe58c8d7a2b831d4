// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen
#![allow(dead_code)]

use rgb::RGB8;

// ============================================================================
// LED Konfiguration
// ============================================================================

/// GPIO-Pin für die RGB LED (WS2812/Neopixel)
pub const LED_GPIO_PIN: u8 = 8;

/// Grundfarbe des RPM-Segments bei 100% Helligkeit
/// Gedimmt für Augenschonung, die Drehzahl skaliert diesen Wert herunter
pub const SEGMENT_COLOR: RGB8 = RGB8 { r: 64, g: 12, b: 0 };

/// RMT Taktfrequenz in MHz
/// 80 MHz ist optimal für WS2812 LED-Timing
pub const RMT_CLOCK_MHZ: u32 = 80;

/// Anzahl der LEDs im Strip
pub const LED_COUNT: usize = 1;

// ============================================================================
// OBD-II Adapter Konfiguration
// ============================================================================

/// UART Baudrate zum ELM327 (HC-05 Bluetooth-Brücke)
pub const OBD_UART_BAUDRATE: u32 = 38400;

/// GPIO-Pin UART TX (ESP32 → Adapter RX)
pub const OBD_UART_TX_PIN: u8 = 4;

/// GPIO-Pin UART RX (Adapter TX → ESP32)
pub const OBD_UART_RX_PIN: u8 = 5;

/// GPIO-Pin für den STATE-Ausgang des Bluetooth-Moduls
/// HIGH = Verbindung zum OBD-Adapter steht
pub const BT_STATE_GPIO_PIN: u8 = 7;

/// Tick-Intervall der Poll-Schleife in Millisekunden
/// Die eigentliche Abfragerate kommt aus `RpmMeterConfig::refresh_rate_hz`
pub const TICK_INTERVAL_MS: u64 = 5;

/// Spätestens nach dieser Zeit wird der Status erneut gebroadcastet,
/// auch wenn er sich nicht geändert hat (für neu verbundene Clients)
pub const STATUS_HEARTBEAT_MS: u64 = 1000;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Wartezeit nach einem WiFi-Fehler in Sekunden
pub const WIFI_RETRY_DELAY_SECS: u64 = 5;

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

// ============================================================================
// HTTP Server Konfiguration
// ============================================================================

/// HTTP Port für Status-Seite und WebSocket
pub const HTTP_PORT: u16 = 80;

/// Anzahl paralleler HTTP-Server-Tasks
pub const HTTP_TASK_COUNT: usize = 3;

/// HTTP Buffer-Größe in Bytes
/// Für HTTP Request/Response Headers und Body
pub const HTTP_BUFFER_SIZE: usize = 1024;

/// TCP RX Buffer-Größe in Bytes
pub const TCP_RX_BUFFER_SIZE: usize = 1024;

/// TCP TX Buffer-Größe in Bytes
pub const TCP_TX_BUFFER_SIZE: usize = 1024;

/// WebSocket Message Buffer-Größe in Bytes
/// Config-Nachrichten sind < 128 Bytes
pub const WEBSOCKET_BUFFER_SIZE: usize = 256;

/// JSON Serialisierungs-Buffer für WebSocket State-Updates
/// Für {"type":"state","enable":true,"bt_state":true,"last_rpm":7500,...}
pub const JSON_STATE_BUFFER_SIZE: usize = 256;

/// JSON Serialisierungs-Buffer für WebSocket Error-Messages
pub const JSON_ERROR_BUFFER_SIZE: usize = 128;
