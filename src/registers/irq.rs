use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::consts::{IRQ_ACT1_COPY_COMPLETE, IRQ_ACT1_RENDER_DONE};

bitflags! {
    /// Latched sources in IRQ_ACT1 that the bus layer raises itself.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct IrqAct1: u8 {
        const copy_complete = IRQ_ACT1_COPY_COMPLETE;
        const render_done   = IRQ_ACT1_RENDER_DONE;
    }
}

/// Write-one-to-clear: every bit set in `mask` clears the latched bit.
#[inline]
#[must_use]
pub fn acknowledge(latched: u8, mask: u8) -> u8 {
    latched & !mask
}

#[inline]
#[must_use]
pub fn raise(latched: u8, mask: u8) -> u8 {
    latched | mask
}
