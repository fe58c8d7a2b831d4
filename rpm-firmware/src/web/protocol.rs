// WebSocket-Protokoll-Definitionen
// Definiert die JSON-Nachrichten der State/Config API

use serde::{Deserialize, Serialize};

use crate::{ConfigCommand, RpmMeterConfig, RpmStatus};

/// Client → Server Nachrichten
/// Kommandos vom Browser an den ESP32
///
/// Hinweis: Flache Struktur mit optionalen Feldern für serde-json-core Kompatibilität
///
/// - `{"type":"set_enable","enable":false}`
/// - `{"type":"set_config","config":{"enable":true,"max_rpm":6500,"refresh_rate_hz":10,"flash_rate_hz":20}}`
///
/// `set_config` ersetzt die komplette Konfiguration: fehlende Felder fallen
/// auf die Defaults zurück (auch `enable` → `true`), nicht auf die aktuellen
/// Werte. Nur den Schalter ändern geht über `set_enable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WsClientMessage {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    #[serde(default)]
    pub enable: Option<bool>,
    /// Wird beim Parsen validiert (max_rpm > 0, Raten 1..=1000)
    #[serde(default)]
    pub config: Option<RpmMeterConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    SetEnable,
    SetConfig,
}

impl WsClientMessage {
    /// Übersetzt die Nachricht in ein Kommando für den RPM-Task
    pub fn into_command(self) -> Option<ConfigCommand> {
        match self.msg_type {
            MessageType::SetEnable => self.enable.map(ConfigCommand::SetEnabled),
            MessageType::SetConfig => self.config.map(ConfigCommand::Apply),
        }
    }
}

/// Server → Client Nachrichten
/// State-Updates und Fehler vom ESP32 an den Browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum WsServerMessage {
    #[serde(rename = "state")]
    State {
        enable: bool,
        bt_state: bool,
        last_rpm: u16,
        intensity: u8,
        warning: bool,
        max_rpm: u16,
        refresh_rate_hz: u16,
        flash_rate_hz: u16,
        timestamp_ms: u64,
    },
    #[serde(rename = "error")]
    Error { message: &'static str },
}

impl WsServerMessage {
    pub fn state(status: &RpmStatus, timestamp_ms: u64) -> Self {
        WsServerMessage::State {
            enable: status.config.enabled(),
            bt_state: status.connected,
            last_rpm: status.rpm,
            intensity: status.intensity,
            warning: status.warning,
            max_rpm: status.config.max_rpm(),
            refresh_rate_hz: status.config.refresh_rate_hz(),
            flash_rate_hz: status.config.flash_rate_hz(),
            timestamp_ms,
        }
    }
}
