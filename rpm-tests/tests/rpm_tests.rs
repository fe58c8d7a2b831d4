//! Integration Tests für RPM-Poller und OBD-Dekodierung
//!
//! Diese Tests laufen auf dem Host (x86_64) und nutzen Mock-Hardware
//! (Adapter, Display, LED Writer).

use rgb::RGB8;
use rpm_core::{
    ConfigError, DecodeError, DisplaySink, LedError, RpmMeterConfig, RpmPoller, SEGMENT_INDEX,
    SegmentDisplay, SerialTransport, SmartLedWriter, TickEvent, TransportError, decode_rpm,
    parse_rpm_response, rpm_to_intensity,
};

// ============================================================================
// Mock OBD-Adapter
// ============================================================================

/// Simuliert einen ELM327: jede Anfrage schiebt die nächste vorbereitete
/// Antwort in den Empfangspuffer.
#[derive(Default)]
pub struct MockTransport {
    pub replies: Vec<Vec<u8>>,
    pub pending: Vec<u8>,
    pub written: Vec<Vec<u8>>,
    pub fail_next_read: bool,
    pub fail_next_write: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.as_bytes().to_vec()).collect(),
            ..Self::default()
        }
    }
}

impl SerialTransport for MockTransport {
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if self.fail_next_read {
            self.fail_next_read = false;
            return Err(TransportError::ReadFailed);
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(TransportError::WriteFailed);
        }

        self.written.push(bytes.to_vec());
        if !self.replies.is_empty() {
            let reply = self.replies.remove(0);
            self.pending.extend_from_slice(&reply);
        }
        Ok(())
    }
}

// ============================================================================
// Mock Display
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCall {
    Intensity(u8),
    On(bool),
}

#[derive(Default)]
pub struct MockDisplay {
    pub calls: Vec<DisplayCall>,
    pub intensity: Option<u8>,
    pub on: bool,
    pub fail_next_write: bool,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&mut self, segment: usize) -> Result<(), LedError> {
        assert_eq!(segment, SEGMENT_INDEX);
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(LedError::WriteFailed);
        }
        Ok(())
    }
}

impl DisplaySink for MockDisplay {
    fn set_intensity(&mut self, segment: usize, percent: u8) -> Result<(), LedError> {
        self.check(segment)?;
        self.intensity = Some(percent);
        self.calls.push(DisplayCall::Intensity(percent));
        Ok(())
    }

    fn set_on(&mut self, segment: usize, on: bool) -> Result<(), LedError> {
        self.check(segment)?;
        self.on = on;
        self.calls.push(DisplayCall::On(on));
        Ok(())
    }
}

// ============================================================================
// Mock LED Writer
// ============================================================================

#[derive(Default)]
pub struct MockLedWriter {
    pub last_color: Option<RGB8>,
    pub write_count: usize,
    pub fail_next_write: bool,
}

impl MockLedWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SmartLedWriter for MockLedWriter {
    fn write(&mut self, color: RGB8) -> Result<(), LedError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(LedError::WriteFailed);
        }

        self.last_color = Some(color);
        self.write_count += 1;
        Ok(())
    }
}

fn config(max_rpm: u16) -> RpmMeterConfig {
    RpmMeterConfig::new(true, max_rpm, 5, 20).unwrap()
}

fn poller(replies: &[&str], config: RpmMeterConfig) -> RpmPoller<MockTransport, MockDisplay> {
    RpmPoller::new(MockTransport::with_replies(replies), MockDisplay::new(), config)
}

fn expect_polled(event: TickEvent) -> rpm_core::PollReport {
    match event {
        TickEvent::Polled(report) => report,
        other => panic!("Expected Polled, got {:?}", other),
    }
}

// ============================================================================
// Tests: Dekodierung
// ============================================================================

#[test]
fn test_decode_matches_obd_formula() {
    for a in (0..=255u16).step_by(15) {
        for b in (0..=255u16).step_by(17) {
            let raw = format!("41 0C {:02X} {:02X}\r>", a, b);
            let frame = parse_rpm_response(raw.as_bytes()).unwrap();
            let expected = ((a * 256 + b) / 4) as u16;
            assert_eq!(frame.rpm(), expected, "A={:02X} B={:02X}", a, b);
            assert_eq!(decode_rpm(a as u8, b as u8), expected);
        }
    }
}

#[test]
fn test_decode_known_responses() {
    assert_eq!(parse_rpm_response(b"41 0C 0C 00").unwrap().rpm(), 768);
    assert_eq!(parse_rpm_response(b"41 0C 1A F8").unwrap().rpm(), 1726);
}

#[test]
fn test_decode_rejects_garbage() {
    assert_eq!(parse_rpm_response(b"41 0C"), Err(DecodeError::TooShort));
    assert_eq!(parse_rpm_response(b"UNABLE TO CONNECT\r>"), Err(DecodeError::NoFrame));
    assert_eq!(parse_rpm_response(b"41 0C ZZ ZZ\r>"), Err(DecodeError::InvalidHex));
}

// ============================================================================
// Tests: rpm_to_intensity()
// ============================================================================

#[test]
fn test_intensity_matches_clamped_formula() {
    for max_rpm in [1u16, 100, 1000, 7500, 16383] {
        for rpm in (0..=16383u16).step_by(97) {
            let expected = (u32::from(rpm) * 100 / u32::from(max_rpm)).min(100) as u8;
            assert_eq!(rpm_to_intensity(rpm, max_rpm), expected);
        }
    }
}

#[test]
fn test_intensity_zero_max_does_not_panic() {
    assert_eq!(rpm_to_intensity(3000, 0), 0);
}

// ============================================================================
// Tests: RpmPoller
// ============================================================================

#[test]
fn test_first_tick_requests_and_publishes_zero() {
    let mut poller = poller(&[], config(7500));

    let report = expect_polled(poller.tick(0, true).unwrap());

    assert_eq!(report.request, Ok(()));
    assert_eq!(report.decoded, Err(DecodeError::TooShort));
    assert_eq!(report.published, Some(0));
    assert_eq!(poller.transport().written, vec![b"010C1\r".to_vec()]);
    assert_eq!(poller.display().intensity, Some(0));
    assert!(poller.display().on);
}

#[test]
fn test_reply_is_decoded_on_next_cycle() {
    let mut poller = poller(&["010C1\r41 0C 1A F8\r\r>"], config(7500));

    poller.tick(0, true).unwrap();
    assert_eq!(poller.tick(100, true).unwrap(), TickEvent::Waiting);

    let report = expect_polled(poller.tick(200, true).unwrap());
    assert_eq!(report.decoded, Ok(1726));
    // 1726 * 100 / 7500 = 23
    assert_eq!(report.published, Some(23));
    assert_eq!(poller.display().intensity, Some(23));

    let reading = poller.reading().unwrap();
    assert_eq!(reading.rpm, 1726);
    assert_eq!(reading.raw_hex.as_str(), "1AF8");
    assert_eq!(reading.timestamp_ms, 200);
}

#[test]
fn test_unchanged_rpm_is_not_republished() {
    let mut poller = poller(&["41 0C 0C 00\r>", "41 0C 0C 00\r>"], config(7500));

    poller.tick(0, true).unwrap();
    let first = expect_polled(poller.tick(200, true).unwrap());
    let second = expect_polled(poller.tick(400, true).unwrap());

    assert_eq!(first.published, Some(10));
    assert_eq!(second.decoded, Ok(768));
    assert_eq!(second.published, None);
}

#[test]
fn test_short_response_keeps_previous_rpm() {
    let mut poller = poller(&["41 0C 1A F8\r>", "41 0C\r"], config(7500));

    poller.tick(0, true).unwrap();
    poller.tick(200, true).unwrap();
    assert_eq!(poller.current_rpm(), 1726);

    let report = expect_polled(poller.tick(400, true).unwrap());
    assert_eq!(report.decoded, Err(DecodeError::TooShort));
    assert_eq!(report.published, None);
    assert_eq!(poller.current_rpm(), 1726);
    assert_eq!(poller.display().intensity, Some(23));
}

#[test]
fn test_frame_split_across_cycles() {
    let mut poller = poller(&["010C1\r41 0C 1A", " F8\r\r>"], config(7500));

    poller.tick(0, true).unwrap();
    let first = expect_polled(poller.tick(200, true).unwrap());
    assert_eq!(first.decoded, Err(DecodeError::Truncated));

    let second = expect_polled(poller.tick(400, true).unwrap());
    assert_eq!(second.decoded, Ok(1726));
}

#[test]
fn test_disconnected_shows_calibration_without_request() {
    let mut poller = poller(&["41 0C 1A F8\r>"], config(7500));

    assert_eq!(poller.tick(0, false).unwrap(), TickEvent::Calibrating);
    assert!(poller.transport().written.is_empty());
    assert_eq!(poller.display().intensity, Some(100));
    assert!(poller.display().on);
    assert!(!poller.status().connected);

    // Kalibrierung wird nur einmal geschrieben
    let calls = poller.display().calls.len();
    assert_eq!(poller.tick(10, false).unwrap(), TickEvent::Calibrating);
    assert_eq!(poller.display().calls.len(), calls);
    assert!(poller.transport().written.is_empty());
}

#[test]
fn test_reconnect_republishes_live_value() {
    let mut poller = poller(&["41 0C 1A F8\r>", "41 0C 1A F8\r>"], config(7500));

    poller.tick(0, true).unwrap();
    poller.tick(200, true).unwrap();
    assert_eq!(poller.display().intensity, Some(23));

    poller.tick(300, false).unwrap();
    assert_eq!(poller.display().intensity, Some(100));
    assert_eq!(poller.current_rpm(), 0);

    let report = expect_polled(poller.tick(400, true).unwrap());
    assert_eq!(report.decoded, Ok(1726));
    assert_eq!(report.published, Some(23));
    assert_eq!(poller.display().intensity, Some(23));
}

#[test]
fn test_reconnect_does_not_warn_from_old_reading() {
    // 0x7F00 / 4 = 8128 > 7500
    let mut poller = poller(&["41 0C 7F 00\r>"], config(7500));

    poller.tick(0, true).unwrap();
    poller.tick(200, true).unwrap();
    assert!(poller.status().warning);

    poller.tick(300, false).unwrap();
    assert_eq!(poller.tick(305, true).unwrap(), TickEvent::Waiting);

    // Noch keine neue Antwort: kein Blinken, Segment bleibt an
    assert!(!poller.status().warning);
    assert!(poller.display().on);
    assert_eq!(poller.current_rpm(), 0);
    assert!(poller.reading().is_none());
}

#[test]
fn test_unterminated_frame_is_decoded_once() {
    let mut poller = poller(&["41 0C 1A F8"], config(7500));

    poller.tick(0, true).unwrap();
    let first = expect_polled(poller.tick(200, true).unwrap());
    assert_eq!(first.decoded, Ok(1726));

    // Adapter schweigt: alter Wert bleibt, Zeitstempel auch
    let second = expect_polled(poller.tick(400, true).unwrap());
    assert_eq!(second.drained, Ok(0));
    assert_eq!(second.decoded, Err(DecodeError::TooShort));
    assert_eq!(poller.current_rpm(), 1726);
    assert_eq!(poller.reading().unwrap().timestamp_ms, 200);
}

#[test]
fn test_bytes_after_unterminated_frame_are_kept() {
    let mut poller = poller(&["41 0C 0C 00 41 0C 1A", " F8\r>"], config(7500));

    poller.tick(0, true).unwrap();
    let first = expect_polled(poller.tick(200, true).unwrap());
    assert_eq!(first.decoded, Ok(768));

    let second = expect_polled(poller.tick(400, true).unwrap());
    assert_eq!(second.decoded, Ok(1726));
    assert_eq!(poller.reading().unwrap().timestamp_ms, 400);
}

#[test]
fn test_disabled_shows_calibration() {
    let mut poller = poller(&[], config(7500).with_enabled(false));

    assert_eq!(poller.tick(0, true).unwrap(), TickEvent::Calibrating);
    assert!(poller.transport().written.is_empty());
    assert_eq!(poller.display().intensity, Some(100));

    poller.set_enabled(true);
    expect_polled(poller.tick(10, true).unwrap());
    assert_eq!(poller.transport().written.len(), 1);
}

#[test]
fn test_publish_interval_respected() {
    let replies: Vec<String> = (1..=40).map(|i| format!("41 0C {:02X} 00\r>", i)).collect();
    let replies: Vec<&str> = replies.iter().map(String::as_str).collect();
    let mut poller = poller(&replies, config(16000));

    let mut publish_times = Vec::new();
    for now in (0..2000u64).step_by(7) {
        if let TickEvent::Polled(report) = poller.tick(now, true).unwrap() {
            if report.published.is_some() {
                publish_times.push(now);
            }
        }
    }

    assert!(publish_times.len() >= 5);
    for pair in publish_times.windows(2) {
        assert!(pair[1] - pair[0] >= 200, "publishes at {:?}", pair);
    }
}

#[test]
fn test_apply_config_republishes_with_new_max() {
    let mut poller = poller(&["41 0C 1A F8\r>", "41 0C 1A F8\r>"], config(7500));

    poller.tick(0, true).unwrap();
    poller.tick(200, true).unwrap();
    assert_eq!(poller.display().intensity, Some(23));

    poller.apply_config(RpmMeterConfig::new(true, 3452, 10, 20).unwrap());
    assert_eq!(poller.poll_state().refresh_interval_ms, 100);

    let report = expect_polled(poller.tick(300, true).unwrap());
    assert_eq!(report.published, Some(50));
}

#[test]
fn test_warning_flash_toggles_segment() {
    let mut poller = poller(
        &["41 0C 1A F8\r>", "41 0C 1A F8\r>", "41 0C 0C 00\r>"],
        config(1000),
    );

    poller.tick(0, true).unwrap();
    assert!(poller.display().on);

    // 1726 >= 1000: volle Helligkeit, Blinken mit 50 ms
    let report = expect_polled(poller.tick(200, true).unwrap());
    assert_eq!(report.published, Some(100));
    assert!(poller.status().warning);
    assert!(!poller.display().on);

    poller.tick(225, true).unwrap();
    assert!(!poller.display().on);
    poller.tick(250, true).unwrap();
    assert!(poller.display().on);
    poller.tick(300, true).unwrap();
    assert!(!poller.display().on);

    // 768 < 1000: Blinken endet, Segment wieder an
    for now in (305..=600u64).step_by(5) {
        poller.tick(now, true).unwrap();
    }
    assert_eq!(poller.current_rpm(), 768);
    assert!(!poller.status().warning);
    assert!(poller.display().on);
    assert_eq!(poller.display().intensity, Some(76));
}

#[test]
fn test_transport_errors_are_reported() {
    let mut poller = poller(&[], config(7500));
    poller.transport_mut().fail_next_read = true;
    poller.transport_mut().fail_next_write = true;

    let report = expect_polled(poller.tick(0, true).unwrap());
    assert_eq!(report.drained, Err(TransportError::ReadFailed));
    assert_eq!(report.request, Err(TransportError::WriteFailed));

    // Nächster Zyklus läuft normal weiter
    let report = expect_polled(poller.tick(200, true).unwrap());
    assert_eq!(report.drained, Ok(0));
    assert_eq!(report.request, Ok(()));
}

#[test]
fn test_display_failure_is_retried() {
    let mut display = MockDisplay::new();
    display.fail_next_write = true;
    let mut poller = RpmPoller::new(MockTransport::new(), display, config(7500));

    assert_eq!(poller.tick(0, true), Err(LedError::WriteFailed));

    let report = expect_polled(poller.tick(200, true).unwrap());
    assert_eq!(report.published, Some(0));
    assert!(poller.display().on);
}

#[test]
fn test_status_snapshot() {
    let mut poller = poller(&["41 0C 1A F8\r>"], config(7500));
    poller.tick(0, true).unwrap();
    poller.tick(200, true).unwrap();

    let status = poller.status();
    assert_eq!(status.rpm, 1726);
    assert_eq!(status.intensity, 23);
    assert!(status.connected);
    assert!(!status.warning);
    assert_eq!(status.config.max_rpm(), 7500);
}

// ============================================================================
// Tests: SegmentDisplay
// ============================================================================

#[test]
fn test_segment_display_scales_color() {
    let color = RGB8 { r: 200, g: 100, b: 0 };
    let mut display = SegmentDisplay::new(MockLedWriter::new(), color);

    display.set_on(SEGMENT_INDEX, true).unwrap();
    assert_eq!(display.writer().last_color, Some(color));

    display.set_intensity(SEGMENT_INDEX, 50).unwrap();
    assert_eq!(display.writer().last_color, Some(RGB8 { r: 100, g: 50, b: 0 }));
    assert_eq!(display.writer().write_count, 2);
}

#[test]
fn test_segment_display_off_is_black() {
    let mut display = SegmentDisplay::new(MockLedWriter::new(), RGB8 { r: 10, g: 0, b: 0 });

    display.set_on(SEGMENT_INDEX, true).unwrap();
    display.set_on(SEGMENT_INDEX, false).unwrap();

    assert!(!display.is_on());
    assert_eq!(display.writer().last_color, Some(RGB8::default()));
}

#[test]
fn test_segment_display_unknown_segment() {
    let mut display = SegmentDisplay::new(MockLedWriter::new(), RGB8 { r: 10, g: 0, b: 0 });

    assert_eq!(display.set_intensity(3, 50), Err(LedError::UnknownSegment));
    assert_eq!(display.writer().write_count, 0);
}

#[test]
fn test_segment_display_write_failure() {
    let mut writer = MockLedWriter::new();
    writer.fail_next_write = true;
    let mut display = SegmentDisplay::new(writer, RGB8 { r: 10, g: 0, b: 0 });

    assert_eq!(display.set_on(SEGMENT_INDEX, true), Err(LedError::WriteFailed));
    // Nächster Write klappt wieder
    assert!(display.set_intensity(SEGMENT_INDEX, 100).is_ok());
    assert_eq!(display.writer().last_color, Some(RGB8 { r: 10, g: 0, b: 0 }));
}

#[test]
fn test_poller_drives_segment_display() {
    let color = RGB8 { r: 0, g: 0, b: 200 };
    let display = SegmentDisplay::new(MockLedWriter::new(), color);
    let mut poller = RpmPoller::new(
        MockTransport::with_replies(&["41 0C 3A 98\r>"]),
        display,
        config(7500),
    );

    poller.tick(0, true).unwrap();
    poller.tick(200, true).unwrap();

    // 0x3A98 / 4 = 3750 → 50%
    assert_eq!(poller.current_rpm(), 3750);
    assert_eq!(poller.display().intensity(), 50);
    assert_eq!(
        poller.display().writer().last_color,
        Some(RGB8 { r: 0, g: 0, b: 100 })
    );
}

// ============================================================================
// Tests: JSON-Konfiguration
// ============================================================================

#[test]
fn test_config_from_json() {
    let json = r#"{"enable":false,"max_rpm":6000,"refresh_rate_hz":10,"flash_rate_hz":4}"#;
    let (config, _) = serde_json_core::from_str::<RpmMeterConfig>(json).unwrap();

    assert!(!config.enabled());
    assert_eq!(config.max_rpm(), 6000);
    assert_eq!(config.refresh_interval_ms(), 100);
    assert_eq!(config.flash_interval_ms(), 250);
}

#[test]
fn test_config_json_defaults() {
    let (config, _) = serde_json_core::from_str::<RpmMeterConfig>(r#"{"max_rpm":6500}"#).unwrap();

    assert!(config.enabled());
    assert_eq!(config.max_rpm(), 6500);
    assert_eq!(config.refresh_rate_hz(), 5);
    assert_eq!(config.flash_rate_hz(), 20);
}

#[test]
fn test_partial_json_config_replaces_enable_flag() {
    let mut poller = poller(&[], config(7500).with_enabled(false));
    assert_eq!(poller.tick(0, true).unwrap(), TickEvent::Calibrating);

    // Fehlendes "enable" heißt Default (an), nicht "unverändert"
    let (partial, _) =
        serde_json_core::from_str::<RpmMeterConfig>(r#"{"max_rpm":6500,"refresh_rate_hz":10}"#)
            .unwrap();
    poller.apply_config(partial);

    assert!(poller.config().enabled());
    expect_polled(poller.tick(10, true).unwrap());
    assert_eq!(poller.transport().written.len(), 1);
}

#[test]
fn test_config_json_rejects_zero_max_rpm() {
    let result = serde_json_core::from_str::<RpmMeterConfig>(r#"{"max_rpm":0}"#);
    assert!(result.is_err());

    let result = serde_json_core::from_str::<RpmMeterConfig>(r#"{"refresh_rate_hz":0}"#);
    assert!(result.is_err());
}

#[test]
fn test_config_to_json() {
    let mut buffer = [0u8; 128];
    let n = serde_json_core::to_slice(&RpmMeterConfig::default(), &mut buffer).unwrap();

    assert_eq!(
        core::str::from_utf8(&buffer[..n]).unwrap(),
        r#"{"enable":true,"max_rpm":7500,"refresh_rate_hz":5,"flash_rate_hz":20}"#
    );
}

#[test]
fn test_config_error_messages() {
    assert_eq!(
        ConfigError::ZeroMaxRpm.to_string(),
        "max_rpm must be greater than 0"
    );
    assert_eq!(
        ConfigError::RefreshRateOutOfRange.to_string(),
        "refresh_rate_hz must be in 1..=1000"
    );
}
