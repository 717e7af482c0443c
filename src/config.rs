use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::video::Orientation;

/// Which event hands a finished frame to the extractor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameSource {
    /// Frame-complete ticks of the refresh controller.
    #[default]
    RefreshController,
    /// Rising edge of the core's render-done line.
    CoreRenderDone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinxConfig {
    pub orientation: Orientation,
    pub frame_source: FrameSource,
    pub steps_per_frame: u32,
    /// Reset is held until the timestamp reaches this many half cycles.
    pub reset_half_cycles: u64,
    /// Interrupt acknowledges before this timestamp are not interrupt entries.
    pub irq_guard_half_cycles: u64,
    pub core_clock_hz: u32,
    pub rt_clock_hz: u32,
    pub seconds_tick_half_cycles: u64,
    pub prc_tick_cycles: u64,
    pub stack_limit: u16,
    /// Also present the key pad to the core on its key lines.
    pub forward_keys_to_core: bool,
}

impl Default for MinxConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::TopDown,
            frame_source: FrameSource::RefreshController,
            steps_per_frame: STEPS_PER_FRAME,
            reset_half_cycles: RESET_HALF_CYCLES,
            irq_guard_half_cycles: IRQ_GUARD_HALF_CYCLES,
            core_clock_hz: CORE_CLOCK_HZ,
            rt_clock_hz: RT_CLOCK_HZ,
            seconds_tick_half_cycles: SECONDS_TICK_HALF_CYCLES,
            prc_tick_cycles: PRC_TICK_CYCLES,
            stack_limit: STACK_LIMIT,
            forward_keys_to_core: true,
        }
    }
}
