use log::trace;
use serde::{Deserialize, Serialize};

use crate::consts::{LCD_CONTRAST_MAX, LCD_HEIGHT, LCD_PAGES, LCD_STRIDE, LCD_WIDTH};

pub const SCREEN_BUFFER_LEN: usize = LCD_WIDTH * LCD_HEIGHT;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Row 0 first.
    #[default]
    TopDown,
    /// Row 63 first, for texture uploaders with a bottom-left origin.
    BottomUp,
}

impl Orientation {
    #[inline]
    #[must_use]
    pub fn row(self, y: usize) -> usize {
        match self {
            Orientation::TopDown => y,
            Orientation::BottomUp => LCD_HEIGHT - 1 - y,
        }
    }
}

/// Intensity of a dark pixel. The contrast is clamped to `LCD_CONTRAST_MAX`.
#[inline]
#[must_use]
pub fn gray_level(contrast: u8) -> u8 {
    let c = u32::from(contrast.min(LCD_CONTRAST_MAX));
    let max = u32::from(LCD_CONTRAST_MAX);
    (255 * (max - c) / max) as u8
}

/// Converts the panel's planar memory (8 pages of `LCD_STRIDE` column bytes,
/// bit 0 on top) into one intensity byte per pixel. Storage is inverted: a
/// set bit is a blank pixel. Bytes missing from a short `planar` read as blank.
pub fn extract(planar: &[u8], contrast: u8, orientation: Orientation, out: &mut [u8]) {
    let dark = gray_level(contrast);
    for page in 0..LCD_PAGES {
        for x in 0..LCD_WIDTH {
            let data = planar.get(page * LCD_STRIDE + x).copied().unwrap_or(0xFF);
            for bit in 0..8 {
                let y = orientation.row(page * 8 + bit);
                out[y * LCD_WIDTH + x] = if (data >> bit) & 1 != 0 { 255 } else { dark };
            }
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Video {
    screen: Vec<u8>,
    orientation: Orientation,
    frames: u64,
    redraw_requested: bool,
}

impl Video {
    #[must_use]
    pub fn new(orientation: Orientation) -> Self {
        Self {
            screen: vec![255; SCREEN_BUFFER_LEN],
            orientation,
            frames: 0,
            redraw_requested: false,
        }
    }

    pub fn present(&mut self, planar: &[u8], contrast: u8) {
        extract(planar, contrast, self.orientation, &mut self.screen);
        self.frames += 1;
        self.redraw_requested = true;
        trace!("frame {} presented, contrast 0x{:02x}", self.frames, contrast);
    }

    /// Returns true once per presented frame.
    #[inline]
    pub fn redraw_requested(&mut self) -> bool {
        if self.redraw_requested {
            self.redraw_requested = false;
            true
        } else {
            false
        }
    }

    #[inline]
    #[must_use]
    pub fn screen(&self) -> &[u8] {
        &self.screen
    }

    #[inline]
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[inline]
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}
