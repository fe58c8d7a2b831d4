//! Laufzeit-Konfiguration des RPM-Meters
//!
//! Kanonisches JSON-Schema (feature `serde`):
//!
//! ```json
//! { "enable": true, "max_rpm": 7500, "refresh_rate_hz": 5, "flash_rate_hz": 20 }
//! ```
//!
//! Fehlende Felder bekommen Default-Werte. Ungültige Werte werden schon
//! beim Laden abgelehnt, der Poller sieht nur validierte Konfigurationen.

use core::num::NonZeroU16;

/// Obergrenze für alle Raten: 1000 Hz entspricht einem Intervall von 1 ms
pub const MAX_RATE_HZ: u16 = 1000;

pub const DEFAULT_MAX_RPM: u16 = 7500;
pub const DEFAULT_REFRESH_RATE_HZ: u16 = 5;
pub const DEFAULT_FLASH_RATE_HZ: u16 = 20;

/// Fehler beim Validieren einer Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    ZeroMaxRpm,
    /// Rate ist 0 oder größer als [`MAX_RATE_HZ`]
    RefreshRateOutOfRange,
    FlashRateOutOfRange,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroMaxRpm => f.write_str("max_rpm must be greater than 0"),
            ConfigError::RefreshRateOutOfRange => {
                write!(f, "refresh_rate_hz must be in 1..={}", MAX_RATE_HZ)
            }
            ConfigError::FlashRateOutOfRange => {
                write!(f, "flash_rate_hz must be in 1..={}", MAX_RATE_HZ)
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// Validierte Konfiguration
///
/// Felder sind privat: eine `RpmMeterConfig` mit `max_rpm == 0` oder
/// einer Rate außerhalb von `1..=MAX_RATE_HZ` kann nicht existieren.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "ConfigFields", into = "ConfigFields")
)]
pub struct RpmMeterConfig {
    enabled: bool,
    max_rpm: NonZeroU16,
    refresh_rate_hz: NonZeroU16,
    flash_rate_hz: NonZeroU16,
}

impl RpmMeterConfig {
    pub fn new(
        enabled: bool,
        max_rpm: u16,
        refresh_rate_hz: u16,
        flash_rate_hz: u16,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled,
            max_rpm: NonZeroU16::new(max_rpm).ok_or(ConfigError::ZeroMaxRpm)?,
            refresh_rate_hz: checked_rate(refresh_rate_hz)
                .ok_or(ConfigError::RefreshRateOutOfRange)?,
            flash_rate_hz: checked_rate(flash_rate_hz).ok_or(ConfigError::FlashRateOutOfRange)?,
        })
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn max_rpm(&self) -> u16 {
        self.max_rpm.get()
    }

    pub fn refresh_rate_hz(&self) -> u16 {
        self.refresh_rate_hz.get()
    }

    pub fn flash_rate_hz(&self) -> u16 {
        self.flash_rate_hz.get()
    }

    /// Poll-Intervall in Millisekunden (`1000 / refresh_rate_hz`)
    pub fn refresh_interval_ms(&self) -> u32 {
        crate::logic::rate_to_interval_ms(self.refresh_rate_hz)
    }

    /// Blink-Intervall der Drehzahl-Warnung in Millisekunden
    pub fn flash_interval_ms(&self) -> u32 {
        crate::logic::rate_to_interval_ms(self.flash_rate_hz)
    }
}

impl Default for RpmMeterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_rpm: nonzero(DEFAULT_MAX_RPM),
            refresh_rate_hz: nonzero(DEFAULT_REFRESH_RATE_HZ),
            flash_rate_hz: nonzero(DEFAULT_FLASH_RATE_HZ),
        }
    }
}

fn checked_rate(rate_hz: u16) -> Option<NonZeroU16> {
    NonZeroU16::new(rate_hz).filter(|rate| rate.get() <= MAX_RATE_HZ)
}

const fn nonzero(value: u16) -> NonZeroU16 {
    match NonZeroU16::new(value) {
        Some(value) => value,
        None => panic!("default must be non-zero"),
    }
}

// ============================================================================
// JSON-Schema (optional feature)
// ============================================================================

/// Rohe JSON-Felder vor der Validierung
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct ConfigFields {
    enable: bool,
    max_rpm: u16,
    refresh_rate_hz: u16,
    flash_rate_hz: u16,
}

#[cfg(feature = "serde")]
impl Default for ConfigFields {
    fn default() -> Self {
        RpmMeterConfig::default().into()
    }
}

#[cfg(feature = "serde")]
impl TryFrom<ConfigFields> for RpmMeterConfig {
    type Error = ConfigError;

    fn try_from(fields: ConfigFields) -> Result<Self, Self::Error> {
        Self::new(
            fields.enable,
            fields.max_rpm,
            fields.refresh_rate_hz,
            fields.flash_rate_hz,
        )
    }
}

#[cfg(feature = "serde")]
impl From<RpmMeterConfig> for ConfigFields {
    fn from(config: RpmMeterConfig) -> Self {
        Self {
            enable: config.enabled(),
            max_rpm: config.max_rpm(),
            refresh_rate_hz: config.refresh_rate_hz(),
            flash_rate_hz: config.flash_rate_hz(),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RpmMeterConfig {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "RpmMeterConfig {{ enable: {}, max_rpm: {}, refresh: {}Hz, flash: {}Hz }}",
            self.enabled,
            self.max_rpm(),
            self.refresh_rate_hz(),
            self.flash_rate_hz()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RpmMeterConfig::default();
        assert!(config.enabled());
        assert_eq!(config.max_rpm(), 7500);
        assert_eq!(config.refresh_rate_hz(), 5);
        assert_eq!(config.flash_rate_hz(), 20);
        assert_eq!(config.refresh_interval_ms(), 200);
        assert_eq!(config.flash_interval_ms(), 50);
    }

    #[test]
    fn test_zero_max_rpm_rejected() {
        assert_eq!(
            RpmMeterConfig::new(true, 0, 5, 20),
            Err(ConfigError::ZeroMaxRpm)
        );
    }

    #[test]
    fn test_rates_out_of_range_rejected() {
        assert_eq!(
            RpmMeterConfig::new(true, 7000, 0, 20),
            Err(ConfigError::RefreshRateOutOfRange)
        );
        assert_eq!(
            RpmMeterConfig::new(true, 7000, 1001, 20),
            Err(ConfigError::RefreshRateOutOfRange)
        );
        assert_eq!(
            RpmMeterConfig::new(true, 7000, 5, 0),
            Err(ConfigError::FlashRateOutOfRange)
        );
    }

    #[test]
    fn test_with_enabled() {
        let config = RpmMeterConfig::default().with_enabled(false);
        assert!(!config.enabled());
        assert_eq!(config.max_rpm(), DEFAULT_MAX_RPM);
    }
}
