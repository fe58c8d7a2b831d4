//! Pure Business Logic Functions
//!
//! Funktionen ohne Hardware-Dependencies (testbar!)

use core::num::NonZeroU16;

use rgb::RGB8;

/// Volle Helligkeit in Prozent
pub const FULL_INTENSITY: u8 = 100;

/// Helligkeit im Kalibrier-Modus (Bluetooth getrennt oder Mod deaktiviert)
///
/// 100% erleichtert das Einstellen der Segment-Farbe.
pub const CALIBRATION_INTENSITY: u8 = FULL_INTENSITY;

/// Rechnet eine Drehzahl in eine Segment-Helligkeit um
///
/// `clamp(rpm * 100 / max_rpm, 0, 100)`. Bei `max_rpm == 0` wird `0`
/// zurückgegeben statt durch 0 zu teilen.
///
/// # Beispiele
///
/// ```
/// # use rpm_core::rpm_to_intensity;
/// assert_eq!(rpm_to_intensity(3750, 7500), 50);
/// assert_eq!(rpm_to_intensity(9000, 7500), 100);
/// ```
pub fn rpm_to_intensity(rpm: u16, max_rpm: u16) -> u8 {
    let percent = (u32::from(rpm) * u32::from(FULL_INTENSITY))
        .checked_div(u32::from(max_rpm))
        .unwrap_or(0);
    // min() garantiert 0..=100
    percent.min(u32::from(FULL_INTENSITY)) as u8
}

/// Rate in Hz → Intervall in Millisekunden (`1000 / rate_hz`)
pub fn rate_to_interval_ms(rate_hz: NonZeroU16) -> u32 {
    1000 / u32::from(rate_hz.get())
}

/// Skaliert eine Farbe auf `percent` Prozent Helligkeit
///
/// # Beispiele
///
/// ```
/// # use rgb::RGB8;
/// # use rpm_core::scale_color;
/// let color = RGB8 { r: 200, g: 100, b: 0 };
/// assert_eq!(scale_color(color, 50), RGB8 { r: 100, g: 50, b: 0 });
/// ```
pub fn scale_color(color: RGB8, percent: u8) -> RGB8 {
    let percent = u16::from(percent.min(FULL_INTENSITY));
    let scale = |channel: u8| (u16::from(channel) * percent / u16::from(FULL_INTENSITY)) as u8;
    RGB8 {
        r: scale(color.r),
        g: scale(color.g),
        b: scale(color.b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_linear() {
        assert_eq!(rpm_to_intensity(0, 7500), 0);
        assert_eq!(rpm_to_intensity(750, 7500), 10);
        assert_eq!(rpm_to_intensity(7500, 7500), 100);
    }

    #[test]
    fn test_intensity_truncates() {
        // 1726 * 100 / 7500 = 23.01
        assert_eq!(rpm_to_intensity(1726, 7500), 23);
        assert_eq!(rpm_to_intensity(74, 7500), 0);
    }

    #[test]
    fn test_intensity_clamped_above_max() {
        assert_eq!(rpm_to_intensity(16383, 7500), 100);
        assert_eq!(rpm_to_intensity(u16::MAX, 1), 100);
    }

    #[test]
    fn test_intensity_zero_max_rpm() {
        assert_eq!(rpm_to_intensity(0, 0), 0);
        assert_eq!(rpm_to_intensity(5000, 0), 0);
    }

    #[test]
    fn test_rate_to_interval() {
        let rate = |hz| NonZeroU16::new(hz).unwrap();
        assert_eq!(rate_to_interval_ms(rate(1)), 1000);
        assert_eq!(rate_to_interval_ms(rate(5)), 200);
        assert_eq!(rate_to_interval_ms(rate(3)), 333);
        assert_eq!(rate_to_interval_ms(rate(1000)), 1);
    }

    #[test]
    fn test_scale_color() {
        let color = RGB8 { r: 255, g: 40, b: 0 };
        assert_eq!(scale_color(color, 100), color);
        assert_eq!(scale_color(color, 0), RGB8::default());
        assert_eq!(scale_color(color, 50), RGB8 { r: 127, g: 20, b: 0 });
        // Über 100% wird nicht heller
        assert_eq!(scale_color(color, 250), color);
    }
}
