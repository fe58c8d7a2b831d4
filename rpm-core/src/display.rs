//! LED-Segment als Display-Senke
//!
//! Verbindet den [`DisplaySink`] des Pollers mit einem [`SmartLedWriter`]:
//! die Segment-Farbe wird mit der Helligkeit skaliert, ausgeschaltet wird
//! Schwarz geschrieben.

use rgb::RGB8;

use crate::logic::{FULL_INTENSITY, scale_color};
use crate::traits::{DisplaySink, LedError, SmartLedWriter};

/// Einziges Segment dieses Displays
pub const SEGMENT_INDEX: usize = 0;

pub struct SegmentDisplay<W: SmartLedWriter> {
    writer: W,
    color: RGB8,
    intensity: u8,
    on: bool,
}

impl<W: SmartLedWriter> SegmentDisplay<W> {
    /// Erstellt ein ausgeschaltetes Segment mit der Grundfarbe `color`
    pub fn new(writer: W, color: RGB8) -> Self {
        Self {
            writer,
            color,
            intensity: FULL_INTENSITY,
            on: false,
        }
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Farbe, die aktuell auf der LED liegen sollte
    pub fn current_color(&self) -> RGB8 {
        if self.on {
            scale_color(self.color, self.intensity)
        } else {
            RGB8::default()
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    fn render(&mut self) -> Result<(), LedError> {
        let color = self.current_color();
        self.writer.write(color)
    }

    fn check_segment(segment: usize) -> Result<(), LedError> {
        if segment == SEGMENT_INDEX {
            Ok(())
        } else {
            Err(LedError::UnknownSegment)
        }
    }
}

impl<W: SmartLedWriter> DisplaySink for SegmentDisplay<W> {
    fn set_intensity(&mut self, segment: usize, percent: u8) -> Result<(), LedError> {
        Self::check_segment(segment)?;
        self.intensity = percent.min(FULL_INTENSITY);
        self.render()
    }

    fn set_on(&mut self, segment: usize, on: bool) -> Result<(), LedError> {
        Self::check_segment(segment)?;
        self.on = on;
        self.render()
    }
}
