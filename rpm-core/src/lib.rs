//! RPM Core - Platform-agnostic Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert Traits, die OBD-II Dekodierung und den RPM-Poller.

#![no_std]

pub mod config;
pub mod display;
pub mod logic;
pub mod obd;
pub mod poller;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use config::{ConfigError, RpmMeterConfig};
pub use display::{SEGMENT_INDEX, SegmentDisplay};
pub use logic::{CALIBRATION_INTENSITY, rate_to_interval_ms, rpm_to_intensity, scale_color};
pub use obd::{
    DecodeError, FrameMatch, RPM_REQUEST, RpmFrame, decode_rpm, locate_rpm_frame,
    parse_rpm_response,
};
pub use poller::{PollReport, RpmPoller, TickEvent};
pub use traits::{
    ConnectionSense, DisplaySink, LedError, SerialTransport, SmartLedWriter, TransportError,
};
pub use types::{ConfigCommand, PollState, RawResponse, RpmReading, RpmStatus};
