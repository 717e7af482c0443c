//! Program Rendering Chip: the refresh controller.
//!
//! Every PRC tick advances a frame counter. While the fine rate nibble differs
//! from the match value derived from the coarse rate bits, each full count
//! bumps the fine nibble by one step; once they match, an active PRC completes
//! a frame on every tick and the fine nibble restarts its hunt.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::ram::Ram;

/// Match value for the fine rate nibble, keyed by the coarse rate bits.
#[must_use]
pub fn rate_match(coarse: u8) -> u8 {
    match coarse & PRC_RATE_COARSE {
        0x00 => 0x20, // /3
        0x02 => 0x50, // /6
        0x04 => 0x80, // /9
        0x06 => 0xB0, // /12
        0x08 => 0x10, // /2
        0x0A => 0x30, // /4
        0x0C => 0x50, // /6
        _ => 0x70,    // /8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrcTick {
    Counting,
    /// Fine nibble advanced one step towards the match value.
    Hunt,
    /// Matched but inactive, counter expired and the hunt restarts.
    Wrap,
    Frame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshController {
    mode: u8,
    rate: u8,
    rate_match: u8,
    counter: u8,
    map: u32,
}

impl RefreshController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: 0,
            rate: 0,
            rate_match: rate_match(0),
            counter: PRC_CNT_RESET,
            map: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> u8 {
        self.mode
    }

    pub fn set_mode(&mut self, data: u8) -> u8 {
        self.mode = data & PRC_MODE_MASK;
        self.mode
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.mode & PRC_MODE_ACTIVE != 0
    }

    #[inline]
    #[must_use]
    pub fn rate(&self) -> u8 {
        self.rate
    }

    #[inline]
    #[must_use]
    pub fn rate_match(&self) -> u8 {
        self.rate_match
    }

    #[inline]
    #[must_use]
    pub fn counter(&self) -> u8 {
        self.counter
    }

    /// PRC_RATE write. A change of the coarse bits restarts the hunt and picks
    /// a new match value; otherwise the fine nibble is left where it is.
    /// Returns whether the match value was recomputed.
    pub fn write_rate(&mut self, data: u8) -> bool {
        if (self.rate & PRC_RATE_COARSE) != (data & PRC_RATE_COARSE) {
            self.rate = data & 0x0F;
            self.rate_match = rate_match(data);
            trace!("PRC rate match -> 0x{:02x}", self.rate_match);
            true
        } else {
            self.rate = (self.rate & PRC_RATE_FINE) | (data & 0x0F);
            false
        }
    }

    #[inline]
    #[must_use]
    pub fn map(&self) -> u32 {
        self.map
    }

    /// Updates byte `index` (0 = LO, 1 = MID, 2 = HI) of the 24 bit map base.
    pub fn set_map_byte(&mut self, index: u8, data: u8) {
        let shift = 8 * u32::from(index.min(2));
        self.map = (self.map & !(0xFF << shift)) | (u32::from(data) << shift);
    }

    pub fn tick(&mut self) -> PrcTick {
        self.counter = self.counter.wrapping_add(1);
        if self.rate & PRC_RATE_FINE == self.rate_match {
            let mut state = PrcTick::Counting;
            if self.is_active() {
                self.counter = PRC_CNT_RESET;
                self.rate &= 0x0F;
                state = PrcTick::Frame;
            }
            if self.counter == PRC_CNT_TERMINAL {
                self.counter = PRC_CNT_RESET;
                self.rate &= 0x0F;
                state = PrcTick::Wrap;
            }
            state
        } else if self.counter == PRC_CNT_TERMINAL {
            self.counter = PRC_CNT_RESET;
            self.rate = self.rate.wrapping_add(PRC_RATE_STEP);
            PrcTick::Hunt
        } else {
            PrcTick::Counting
        }
    }

    /// Software render of the background map: RAM holds a 12 column tile map
    /// at `PRC_MAP_BASE`, tiles are 8 column bytes at `map + index * 8`.
    /// The composed bytes are written back to VRAM and returned laid out with
    /// the LCD's page stride.
    pub fn compose(&self, ram: &mut Ram) -> Vec<u8> {
        let mut planar = vec![0xFF; LCD_PAGES * LCD_STRIDE];
        let mut vram = PRC_VRAM_BASE;
        for page in 0..LCD_PAGES {
            for column in 0..LCD_WIDTH {
                let tile_index_addr =
                    PRC_MAP_BASE + (page as u16) * PRC_MAP_COLUMNS + (column as u16 >> 3);
                let tile = u32::from(ram.get(tile_index_addr));
                let tile_addr = self.map.wrapping_add(tile * 8) as u16;
                let data = ram.get(tile_addr.wrapping_add(column as u16 & 7));
                ram.set(vram, data);
                vram = vram.wrapping_add(1);
                planar[page * LCD_STRIDE + column] = data;
            }
        }
        planar
    }
}

impl Default for RefreshController {
    fn default() -> Self {
        RefreshController::new()
    }
}
