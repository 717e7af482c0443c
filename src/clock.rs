use serde::{Deserialize, Serialize};

/// Secondary real-time oscillator, toggled every `period` half cycles of the
/// core clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Oscillator {
    period: u64,
    next: u64,
    level: bool,
}

impl Oscillator {
    #[must_use]
    pub fn new(core_clock_hz: u32, rt_clock_hz: u32) -> Self {
        let period = oscillator_period(core_clock_hz, rt_clock_hz);
        Self {
            period,
            next: period,
            level: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn period(&self) -> u64 {
        self.period
    }

    #[inline]
    #[must_use]
    pub fn level(&self) -> bool {
        self.level
    }

    /// Toggles the output when `timestamp` reaches the next edge. Returns the
    /// new level if it changed.
    pub fn due(&mut self, timestamp: u64) -> Option<bool> {
        if timestamp < self.next {
            return None;
        }
        self.next = timestamp + self.period;
        self.level = !self.level;
        Some(self.level)
    }
}

/// Rounded ratio of the two clocks, never zero.
#[must_use]
pub fn oscillator_period(core_clock_hz: u32, rt_clock_hz: u32) -> u64 {
    let rt = u64::from(rt_clock_hz.max(1));
    ((u64::from(core_clock_hz) + rt / 2) / rt).max(1)
}

/// Seconds counter interval, on the half-cycle timestamp.
#[inline]
#[must_use]
pub fn on_seconds_interval(timestamp: u64, interval: u64) -> bool {
    interval != 0 && timestamp % interval == 0
}

/// Refresh controller tick, on the core cycle count `timestamp / 2 + 1`.
#[inline]
#[must_use]
pub fn on_prc_tick(timestamp: u64, interval: u64) -> bool {
    interval != 0 && (timestamp / 2 + 1) % interval == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{CORE_CLOCK_HZ, RT_CLOCK_HZ};

    #[test]
    fn period_is_rounded_ratio() {
        assert_eq!(oscillator_period(CORE_CLOCK_HZ, RT_CLOCK_HZ), 122);
        assert_eq!(oscillator_period(10, 4), 3);
        assert_eq!(oscillator_period(1, 0), 1);
    }

    #[test]
    fn oscillator_toggles_every_period() {
        let mut osc = Oscillator::new(CORE_CLOCK_HZ, RT_CLOCK_HZ);
        let mut edges = Vec::new();
        for ts in 0..500 {
            if let Some(level) = osc.due(ts) {
                edges.push((ts, level));
            }
        }
        assert_eq!(edges, vec![(122, true), (244, false), (366, true), (488, false)]);
    }

    #[test]
    fn intervals() {
        assert!(on_seconds_interval(0, 4_000_000));
        assert!(on_seconds_interval(8_000_000, 4_000_000));
        assert!(!on_seconds_interval(3, 4_000_000));
        assert!(!on_seconds_interval(0, 0));

        // Sampled once per step, on even timestamps.
        let ticks: Vec<u64> = (0..4000).step_by(2).filter(|&ts| on_prc_tick(ts, 855)).collect();
        assert_eq!(ticks, vec![1708, 3418]);
    }
}
