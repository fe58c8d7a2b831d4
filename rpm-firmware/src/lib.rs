// Library-Root: Wiederverwendbare Logik und Module
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod config;
pub mod hal;
pub mod tasks;
pub mod web;

// Re-exports von rpm-core
pub use rpm_core::{
    ConfigCommand, ConnectionSense, DisplaySink, LedError, RpmMeterConfig, RpmPoller, RpmStatus,
    SegmentDisplay, SerialTransport, SmartLedWriter,
};

// Embassy Channel-Typen
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};

// ============================================================================
// Type-Aliase für Channel-Typen
// ============================================================================
//
// Statt:  Publisher<'static, NoopRawMutex, RpmStatus, 2, 4, 1>
// Nutze:  RpmStatusPublisher

/// PubSubChannel für RPM-Status-Broadcasts
/// - 2: Nachrichten-Kapazität im Queue
/// - 4: Maximale Anzahl Subscribers (WebSocket-Clients)
/// - 1: Publisher (RPM-Task)
pub type RpmStatusChannel = PubSubChannel<NoopRawMutex, RpmStatus, 2, 4, 1>;

/// Publisher für RPM-Status-Broadcasts
pub type RpmStatusPublisher = Publisher<'static, NoopRawMutex, RpmStatus, 2, 4, 1>;

/// Subscriber für RPM-Status-Broadcasts
pub type RpmStatusSubscriber = Subscriber<'static, NoopRawMutex, RpmStatus, 2, 4, 1>;

/// Channel für Config-Kommandos (WebSocket → RPM Task)
/// - 2: Nachrichten-Kapazität
pub type ConfigCommandChannel = embassy_sync::channel::Channel<NoopRawMutex, ConfigCommand, 2>;

/// Sender für Config-Kommandos
pub type ConfigCommandSender = Sender<'static, NoopRawMutex, ConfigCommand, 2>;

/// Receiver für Config-Kommandos (RPM Task empfängt)
pub type ConfigCommandReceiver = Receiver<'static, NoopRawMutex, ConfigCommand, 2>;
