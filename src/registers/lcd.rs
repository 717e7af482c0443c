//! LCD controller command decode.
//!
//! The panel's display memory lives in the core; this side only classifies
//! LCD_CTRL bytes for diagnostics and tracks the contrast setting.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{LCD_CONTRAST_MASK, LCD_CONTRAST_MAX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LcdCommand {
    ColumnLow(u8),
    ColumnHigh(u8),
    StartLine(u8),
    SetContrast,
    ContrastValue(u8),
    SegmentReverse(bool),
    DarkerBias(bool),
    AllPixels(bool),
    InvertPixels(bool),
    Display(bool),
    Page(u8),
    ScanMirrored(bool),
    ReadModifyWriteStart,
    ReadModifyWriteEnd,
    Reset,
    Nop,
    /// Documented as able to damage the panel.
    Hazard(u8),
    Unknown(u8),
}

impl LcdCommand {
    #[must_use]
    pub fn decode(data: u8) -> Self {
        match data {
            0x00..=0x0F => LcdCommand::ColumnLow(data & 0x0F),
            0x10..=0x1F => LcdCommand::ColumnHigh(data & 0x0F),
            0x28..=0x2F => LcdCommand::Hazard(data),
            0x40..=0x7F => LcdCommand::StartLine(data & 0x3F),
            0x81 => LcdCommand::SetContrast,
            0xA0 | 0xA1 => LcdCommand::SegmentReverse(data & 1 != 0),
            0xA2 | 0xA3 => LcdCommand::DarkerBias(data & 1 != 0),
            0xA4 | 0xA5 => LcdCommand::AllPixels(data & 1 != 0),
            0xA6 | 0xA7 => LcdCommand::InvertPixels(data & 1 != 0),
            0xAC | 0xAD => LcdCommand::Hazard(data),
            0xAE | 0xAF => LcdCommand::Display(data & 1 != 0),
            0xB0..=0xB8 => LcdCommand::Page(data & 0x0F),
            0xC0..=0xC7 => LcdCommand::ScanMirrored(false),
            0xC8..=0xCF => LcdCommand::ScanMirrored(true),
            0xE0 => LcdCommand::ReadModifyWriteStart,
            0xE2 => LcdCommand::Reset,
            0xE3 => LcdCommand::Nop,
            0xEE => LcdCommand::ReadModifyWriteEnd,
            0xE1 | 0xE4..=0xED | 0xEF => LcdCommand::Hazard(data),
            0xF0..=0xFF => LcdCommand::Hazard(data),
            _ => LcdCommand::Unknown(data),
        }
    }

    #[must_use]
    pub fn is_hazard(&self) -> bool {
        matches!(self, LcdCommand::Hazard(_))
    }
}

impl fmt::Display for LcdCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LcdCommand::ColumnLow(v) => write!(f, "Set column low {v:x}"),
            LcdCommand::ColumnHigh(v) => write!(f, "Set column high {v:x}"),
            LcdCommand::StartLine(v) => write!(f, "Display start line {v}"),
            LcdCommand::SetContrast => write!(f, "Set contrast"),
            LcdCommand::ContrastValue(v) => write!(f, "Contrast 0x{v:02x}"),
            LcdCommand::SegmentReverse(false) => write!(f, "Segment driver direction normal"),
            LcdCommand::SegmentReverse(true) => write!(f, "Segment driver direction reverse"),
            LcdCommand::DarkerBias(false) => write!(f, "Normal voltage bias"),
            LcdCommand::DarkerBias(true) => write!(f, "Darker voltage bias"),
            LcdCommand::AllPixels(on) => write!(f, "Set all pixels {}", enable(*on)),
            LcdCommand::InvertPixels(on) => write!(f, "Invert all pixels {}", enable(*on)),
            LcdCommand::Display(true) => write!(f, "Display on"),
            LcdCommand::Display(false) => write!(f, "Display off"),
            LcdCommand::Page(p) => write!(f, "Set page {p}"),
            LcdCommand::ScanMirrored(false) => write!(f, "Scan direction normal"),
            LcdCommand::ScanMirrored(true) => write!(f, "Scan direction mirrored"),
            LcdCommand::ReadModifyWriteStart => write!(f, "Read modify write start"),
            LcdCommand::ReadModifyWriteEnd => write!(f, "Read modify write end"),
            LcdCommand::Reset => write!(f, "Reset display"),
            LcdCommand::Nop => write!(f, "No operation"),
            LcdCommand::Hazard(v) => write!(f, "Damage 0x{v:02x}"),
            LcdCommand::Unknown(v) => write!(f, "??? 0x{v:02x}"),
        }
    }
}

fn enable(on: bool) -> &'static str {
    if on {
        "enable"
    } else {
        "disable"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LcdController {
    contrast: u8,
    contrast_pending: bool,
}

impl LcdController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            contrast: LCD_CONTRAST_MAX,
            contrast_pending: false,
        }
    }

    /// Classifies an LCD_CTRL write. The byte after `SetContrast` is the
    /// contrast value itself.
    pub fn command(&mut self, data: u8) -> LcdCommand {
        if self.contrast_pending {
            self.contrast_pending = false;
            self.contrast = data & LCD_CONTRAST_MASK;
            LcdCommand::ContrastValue(self.contrast)
        } else {
            let cmd = LcdCommand::decode(data);
            self.contrast_pending = cmd == LcdCommand::SetContrast;
            cmd
        }
    }

    #[inline]
    #[must_use]
    pub fn contrast(&self) -> u8 {
        self.contrast
    }
}

impl Default for LcdController {
    fn default() -> Self {
        LcdController::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_families() {
        assert_eq!(LcdCommand::decode(0x05), LcdCommand::ColumnLow(5));
        assert_eq!(LcdCommand::decode(0x1A), LcdCommand::ColumnHigh(0xA));
        assert_eq!(LcdCommand::decode(0x40), LcdCommand::StartLine(0));
        assert_eq!(LcdCommand::decode(0x7F), LcdCommand::StartLine(0x3F));
        assert_eq!(LcdCommand::decode(0xAF), LcdCommand::Display(true));
        assert_eq!(LcdCommand::decode(0xAE), LcdCommand::Display(false));
        assert_eq!(LcdCommand::decode(0xB3), LcdCommand::Page(3));
        assert_eq!(LcdCommand::decode(0xB8), LcdCommand::Page(8));
        assert_eq!(LcdCommand::decode(0xB9), LcdCommand::Unknown(0xB9));
        assert_eq!(LcdCommand::decode(0xC8), LcdCommand::ScanMirrored(true));
        assert_eq!(LcdCommand::decode(0xA1), LcdCommand::SegmentReverse(true));
        assert_eq!(LcdCommand::decode(0xE0), LcdCommand::ReadModifyWriteStart);
        assert_eq!(LcdCommand::decode(0xEE), LcdCommand::ReadModifyWriteEnd);
        assert_eq!(LcdCommand::decode(0xE2), LcdCommand::Reset);
    }

    #[test]
    fn hazard_ranges() {
        for data in [0x28u8, 0x2F, 0xAC, 0xAD, 0xE1, 0xE4, 0xED, 0xEF, 0xF0, 0xF5, 0xFC, 0xFF] {
            assert!(LcdCommand::decode(data).is_hazard(), "0x{data:02x}");
        }
        for data in [0x20u8, 0x30, 0x80, 0x9F, 0xA8, 0xD0, 0xE3, 0xEE] {
            assert!(!LcdCommand::decode(data).is_hazard(), "0x{data:02x}");
        }
    }

    #[test]
    fn contrast_follows_set_contrast() {
        let mut lcd = LcdController::new();
        assert_eq!(lcd.contrast(), LCD_CONTRAST_MAX);
        assert_eq!(lcd.command(0x81), LcdCommand::SetContrast);
        assert_eq!(lcd.command(0xD5), LcdCommand::ContrastValue(0x15));
        assert_eq!(lcd.contrast(), 0x15);
        // Only the byte straight after 0x81 is a value.
        assert_eq!(lcd.command(0x05), LcdCommand::ColumnLow(5));
        assert_eq!(lcd.contrast(), 0x15);
    }

    #[test]
    fn display_strings() {
        assert_eq!(LcdCommand::Page(2).to_string(), "Set page 2");
        assert_eq!(LcdCommand::InvertPixels(true).to_string(), "Invert all pixels enable");
        assert_eq!(LcdCommand::Hazard(0xF1).to_string(), "Damage 0xf1");
    }
}
