//! OBD-II Engine-RPM Protokoll
//!
//! Anfrage: Mode `01`, PID `0C` (ELM327 ASCII).
//! Antwort: `41 0C A B` → `RPM = ((A * 256) + B) / 4`
//!
//! Der Adapter liefert Echo, Leerzeichen, Zeilenenden und den `>` Prompt
//! mit. Statt fester Offsets wird die Antwort zeilenweise nach dem
//! `410C` Header durchsucht.

use heapless::{String, Vec};

use crate::types::RESPONSE_CAPACITY;

/// RPM-Anfrage inkl. Antwort-Anzahl `1` (ELM327 wartet nicht auf weitere ECUs)
pub const RPM_REQUEST: &[u8] = b"010C1\r";

/// Mindestlänge einer dekodierbaren Antwort: `410C` + 4 Hex-Ziffern
pub const MIN_FRAME_LEN: usize = 8;

/// Response-Header für Mode 01 / PID 0C (ohne Leerzeichen)
const RPM_HEADER: &[u8] = b"410C";

/// Fehler beim Dekodieren einer Adapter-Antwort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// Puffer kürzer als [`MIN_FRAME_LEN`]
    TooShort,
    /// Kein `41 0C` Header gefunden (z.B. "NO DATA", "SEARCHING...")
    NoFrame,
    /// Header gefunden, aber weniger als zwei Datenbytes
    Truncated,
    /// Datenbytes enthalten Nicht-Hex-Zeichen
    InvalidHex,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::TooShort => f.write_str("response too short"),
            DecodeError::NoFrame => f.write_str("no 41 0C frame in response"),
            DecodeError::Truncated => f.write_str("41 0C frame truncated"),
            DecodeError::InvalidHex => f.write_str("41 0C frame contains non-hex data"),
        }
    }
}

impl core::error::Error for DecodeError {}

/// Dekodierter RPM-Frame (die zwei Datenbytes A und B)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RpmFrame {
    pub a: u8,
    pub b: u8,
}

impl RpmFrame {
    pub fn rpm(&self) -> u16 {
        decode_rpm(self.a, self.b)
    }

    /// Die vier Hex-Ziffern des Frames, z.B. `"1AF8"`
    pub fn raw_hex(&self) -> String<4> {
        const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
        let mut hex = String::new();
        for byte in [self.a, self.b] {
            // Kapazität ist genau 4 Zeichen
            let _ = hex.push(char::from(DIGITS[usize::from(byte >> 4)]));
            let _ = hex.push(char::from(DIGITS[usize::from(byte & 0x0F)]));
        }
        hex
    }
}

/// OBD-II Formel für Engine-RPM
///
/// # Beispiele
///
/// ```
/// # use rpm_core::decode_rpm;
/// assert_eq!(decode_rpm(0x1A, 0xF8), 1726);
/// ```
pub fn decode_rpm(a: u8, b: u8) -> u16 {
    u16::from_be_bytes([a, b]) / 4
}

/// Gefundener Frame samt Position im Rohpuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameMatch {
    pub frame: RpmFrame,
    /// Index direkt hinter der letzten Datenziffer des Frames
    pub end: usize,
}

/// Sucht den letzten vollständigen RPM-Frame in einer Adapter-Antwort
///
/// Echo (`010C1`), Leerzeichen, `\r`/`\n` und der `>` Prompt werden
/// ignoriert. Enthält der Puffer mehrere Frames, gewinnt der neueste.
pub fn parse_rpm_response(raw: &[u8]) -> Result<RpmFrame, DecodeError> {
    locate_rpm_frame(raw).map(|found| found.frame)
}

/// Wie [`parse_rpm_response`], liefert zusätzlich das Frame-Ende
///
/// Der Poller verwirft damit den verarbeiteten Frame auch dann, wenn der
/// Adapter (noch) kein Zeilenende gesendet hat.
pub fn locate_rpm_frame(raw: &[u8]) -> Result<FrameMatch, DecodeError> {
    if raw.len() < MIN_FRAME_LEN {
        return Err(DecodeError::TooShort);
    }

    let mut latest: Result<FrameMatch, DecodeError> = Err(DecodeError::NoFrame);
    let mut line_start = 0;

    for line in raw.split(|&b| is_line_break(b)) {
        match parse_line(line) {
            Ok((frame, end_in_line)) => {
                latest = Ok(FrameMatch {
                    frame,
                    end: line_start + end_in_line,
                })
            }
            // Ein gefundener aber kaputter Frame ist aussagekräftiger als NoFrame
            Err(err) if latest.is_err() && err != DecodeError::NoFrame => latest = Err(err),
            Err(_) => {}
        }
        line_start += line.len() + 1;
    }

    latest
}

/// Zeilenende oder Prompt des ELM327
pub fn is_line_break(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n' | b'>')
}

/// Liefert den Frame und das Frame-Ende als Index in `line`
fn parse_line(line: &[u8]) -> Result<(RpmFrame, usize), DecodeError> {
    // Leerzeichen entfernen: "41 0C 1A F8" → "410C1AF8"
    let mut compact: Vec<u8, RESPONSE_CAPACITY> = Vec::new();
    for &byte in line.iter().filter(|b| !b.is_ascii_whitespace()) {
        if compact.push(byte.to_ascii_uppercase()).is_err() {
            break;
        }
    }

    // Letzter vollständiger Frame der Zeile: ein angefangener Frame aus dem
    // vorigen Zyklus kann direkt vor einem neuen stehen ("410C1AF8410C0C00")
    let mut header_seen = false;
    let mut data_start = None;
    for (pos, window) in compact.windows(RPM_HEADER.len()).enumerate() {
        if window == RPM_HEADER {
            header_seen = true;
            if compact.len() >= pos + MIN_FRAME_LEN {
                data_start = Some(pos + RPM_HEADER.len());
            }
        }
    }

    let start = match data_start {
        Some(start) => start,
        None if header_seen => return Err(DecodeError::Truncated),
        None => return Err(DecodeError::NoFrame),
    };
    let data = &compact[start..start + 4];

    let a = hex_byte(data[0], data[1]).ok_or(DecodeError::InvalidHex)?;
    let b = hex_byte(data[2], data[3]).ok_or(DecodeError::InvalidHex)?;
    Ok((RpmFrame { a, b }, line_offset(line, start + 4)))
}

/// Übersetzt eine Position im kompakten Text zurück in einen Index in `line`
fn line_offset(line: &[u8], compact_end: usize) -> usize {
    line.iter()
        .enumerate()
        .filter(|(_, b)| !b.is_ascii_whitespace())
        .nth(compact_end - 1)
        .map_or(line.len(), |(pos, _)| pos + 1)
}

fn hex_byte(high: u8, low: u8) -> Option<u8> {
    let high = char::from(high).to_digit(16)?;
    let low = char::from(low).to_digit(16)?;
    // to_digit(16) liefert max. 15, passt also immer in u8
    u8::try_from(high << 4 | low).ok()
}
