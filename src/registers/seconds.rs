use serde::{Deserialize, Serialize};

use crate::consts::{SEC_CNT_MASK, SEC_CTRL_ENABLE, SEC_CTRL_RESET};

/// 24 bit seconds counter behind SEC_CTRL / SEC_CNT_*.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecondsCounter {
    control: u8,
    count: u32,
}

impl SecondsCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn control(&self) -> u8 {
        self.control
    }

    /// Only the enable and reset bits are kept.
    #[inline]
    pub fn set_control(&mut self, data: u8) -> u8 {
        self.control = data & (SEC_CTRL_ENABLE | SEC_CTRL_RESET);
        self.control
    }

    #[inline]
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Byte `index` (0 = LSB) of the counter.
    #[inline]
    #[must_use]
    pub fn byte(&self, index: u8) -> u8 {
        (self.count >> (8 * u32::from(index.min(2)))) as u8
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.control & SEC_CTRL_ENABLE != 0
    }

    /// Runs once per core cycle. The reset bit wins over a same-cycle
    /// increment and keeps the counter pinned at zero while set.
    pub fn tick(&mut self, on_interval: bool) {
        if self.is_enabled() && on_interval {
            self.count = (self.count + 1) & SEC_CNT_MASK;
        }
        if self.control & SEC_CTRL_RESET != 0 {
            self.count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_intervals_when_enabled() {
        let mut sec = SecondsCounter::new();
        sec.tick(true);
        assert_eq!(sec.count(), 0);

        assert_eq!(sec.set_control(0xFD), SEC_CTRL_ENABLE);
        for n in 1..=300 {
            sec.tick(true);
            sec.tick(false);
            assert_eq!(sec.count(), n);
        }
        assert_eq!(sec.byte(0), (300 & 0xFF) as u8);
        assert_eq!(sec.byte(1), 1);
        assert_eq!(sec.byte(2), 0);
    }

    #[test]
    fn counter_wraps_at_24_bits() {
        let mut sec = SecondsCounter::new();
        sec.count = SEC_CNT_MASK;
        sec.set_control(SEC_CTRL_ENABLE);
        sec.tick(true);
        assert_eq!(sec.count(), 0);
    }

    #[test]
    fn reset_bit_pins_counter_to_zero() {
        let mut sec = SecondsCounter::new();
        sec.set_control(SEC_CTRL_ENABLE);
        for _ in 0..5 {
            sec.tick(true);
        }
        assert_eq!(sec.count(), 5);

        sec.set_control(SEC_CTRL_ENABLE | SEC_CTRL_RESET);
        sec.tick(true);
        assert_eq!(sec.count(), 0);
        sec.tick(true);
        assert_eq!(sec.count(), 0);

        sec.set_control(SEC_CTRL_ENABLE);
        sec.tick(true);
        assert_eq!(sec.count(), 1);
    }
}
