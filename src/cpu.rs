//! Boundary to the clocked S1C88 core.
//!
//! The core is a black box: the driver drives its clock, reset and data input
//! lines, asks it to settle, then samples its pins and probe signals.

use std::collections::VecDeque;

use bitflags::bitflags;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::bus::BusStatus;

/// `micro_op` bit marking the last micro-op of an instruction.
pub const MICRO_OP_BOUNDARY: u64 = 0x1000;
/// Executing state of the core's sequencer.
pub const STATE_EXECUTE: u8 = 2;

bitflags! {
    /// "Not implemented" lines raised by the core.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CoreFaults: u8 {
        const addressing   = 0b0000_0001;
        const jump         = 0b0000_0010;
        const data_out     = 0b0000_0100;
        const mov_src      = 0b0000_1000;
        const write        = 0b0001_0000;
        const alu          = 0b0010_0000;
        const alu_dec_pack = 0b0100_0000;
        const divzero      = 0b1000_0000;
    }
}

/// External pins, sampled after every evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorePins {
    pub address: u32,
    pub bus_status: BusStatus,
    pub write: bool,
    pub data_out: u8,
    pub pl: bool,
    pub sync: bool,
    pub iack: bool,
}

/// Internal signals used for timing audit, fault reporting and frame capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreProbes {
    pub state: u8,
    pub microaddress: u16,
    pub extended_opcode: u16,
    pub top_address: u32,
    pub micro_op: u64,
    pub bus_ack: bool,
    pub faults: CoreFaults,
    pub sp: u16,
    /// Code bank register.
    pub cb: u8,
    pub irq_render_done: bool,
    pub irq_copy_complete: bool,
}

impl CoreProbes {
    #[inline]
    #[must_use]
    pub fn is_boundary_op(&self) -> bool {
        self.micro_op & MICRO_OP_BOUNDARY != 0
    }
}

pub trait CpuCore {
    fn set_clk(&mut self, level: bool);
    fn set_reset(&mut self, level: bool);
    fn set_rt_clk(&mut self, level: bool);
    fn set_data_in(&mut self, data: u8);
    /// Active-high key lines, for cores that model the key pad themselves.
    fn set_keys_active(&mut self, _keys: u8) {}
    /// Settles combinational logic after an input change.
    fn eval(&mut self);
    fn pins(&self) -> CorePins;
    fn probes(&self) -> CoreProbes;
    /// Planar LCD memory, 8 pages of 132 column bytes.
    fn lcd_memory(&self) -> Option<&[u8]> {
        None
    }
    fn lcd_contrast(&self) -> Option<u8> {
        None
    }
}

/// One step of scripted core output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptFrame {
    pub pins: CorePins,
    pub probes: CoreProbes,
}

/// A core that replays a queue of pin states, one per clock cycle, and
/// records what the bus hands back. Frames are consumed on the rising clock
/// edge while reset is released; an exhausted script idles.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCore {
    script: VecDeque<ScriptFrame>,
    current: ScriptFrame,
    clk: bool,
    reset: bool,
    rt_clk: bool,
    rt_edges: u64,
    keys_active: u8,
    reads: Vec<(u32, u8)>,
    lcd: Option<Vec<u8>>,
    contrast: Option<u8>,
}

impl ScriptedCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: ScriptFrame) -> &mut Self {
        self.script.push_back(frame);
        self
    }

    pub fn idle(&mut self, cycles: usize) -> &mut Self {
        for _ in 0..cycles {
            self.push(ScriptFrame::default());
        }
        self
    }

    pub fn read(&mut self, address: u32) -> &mut Self {
        self.push(ScriptFrame {
            pins: CorePins {
                address,
                bus_status: BusStatus::MemRead,
                ..CorePins::default()
            },
            ..ScriptFrame::default()
        })
    }

    pub fn write(&mut self, address: u32, data: u8) -> &mut Self {
        self.push(ScriptFrame {
            pins: CorePins {
                address,
                bus_status: BusStatus::MemWrite,
                write: true,
                data_out: data,
                ..CorePins::default()
            },
            ..ScriptFrame::default()
        })
    }

    /// A fetch cycle, `cycles - 1` execute cycles and the closing boundary
    /// cycle reporting `opcode`.
    pub fn instruction(&mut self, opcode: u16, cycles: usize) -> &mut Self {
        let busy = CorePins {
            pl: true,
            ..CorePins::default()
        };
        self.push(ScriptFrame {
            pins: CorePins { sync: true, ..busy },
            ..ScriptFrame::default()
        });
        for _ in 1..cycles {
            self.push(ScriptFrame {
                pins: busy,
                ..ScriptFrame::default()
            });
        }
        self.push(ScriptFrame {
            pins: CorePins {
                sync: true,
                ..CorePins::default()
            },
            probes: CoreProbes {
                extended_opcode: opcode,
                micro_op: MICRO_OP_BOUNDARY,
                ..CoreProbes::default()
            },
        })
    }

    /// Pulses the render-done line for one cycle.
    pub fn render_done(&mut self) -> &mut Self {
        self.push(ScriptFrame {
            probes: CoreProbes {
                irq_render_done: true,
                ..CoreProbes::default()
            },
            ..ScriptFrame::default()
        })
        .idle(1)
    }

    pub fn with_lcd(&mut self, planar: Vec<u8>, contrast: u8) -> &mut Self {
        self.lcd = Some(planar);
        self.contrast = Some(contrast);
        self
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Every `(address, data_in)` pair served to the core.
    #[must_use]
    pub fn reads(&self) -> &[(u32, u8)] {
        &self.reads
    }

    #[must_use]
    pub fn in_reset(&self) -> bool {
        self.reset
    }

    #[must_use]
    pub fn rt_edges(&self) -> u64 {
        self.rt_edges
    }

    #[must_use]
    pub fn keys_active(&self) -> u8 {
        self.keys_active
    }
}

impl CpuCore for ScriptedCore {
    fn set_clk(&mut self, level: bool) {
        if level && !self.clk && !self.reset {
            self.current = self.script.pop_front().unwrap_or_default();
        }
        self.clk = level;
    }

    fn set_reset(&mut self, level: bool) {
        self.reset = level;
        if level {
            self.current = ScriptFrame::default();
        }
    }

    fn set_rt_clk(&mut self, level: bool) {
        if level != self.rt_clk {
            self.rt_edges += 1;
        }
        self.rt_clk = level;
    }

    fn set_data_in(&mut self, data: u8) {
        trace!("scripted core < 0x{:06x} = 0x{:02x}", self.current.pins.address, data);
        self.reads.push((self.current.pins.address, data));
    }

    fn set_keys_active(&mut self, keys: u8) {
        self.keys_active = keys;
    }

    fn eval(&mut self) {}

    fn pins(&self) -> CorePins {
        self.current.pins
    }

    fn probes(&self) -> CoreProbes {
        self.current.probes
    }

    fn lcd_memory(&self) -> Option<&[u8]> {
        self.lcd.as_deref()
    }

    fn lcd_contrast(&self) -> Option<u8> {
        self.contrast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(core: &mut ScriptedCore) {
        core.set_clk(true);
        core.eval();
        core.set_clk(false);
        core.eval();
    }

    #[test]
    fn frames_advance_on_rising_edge_out_of_reset() {
        let mut core = ScriptedCore::new();
        core.read(0x2052).write(0x1000, 0xAA);
        core.set_reset(true);
        cycle(&mut core);
        assert_eq!(core.remaining(), 2);
        assert_eq!(core.pins().bus_status, BusStatus::Idle);

        core.set_reset(false);
        cycle(&mut core);
        assert_eq!(core.pins().bus_status, BusStatus::MemRead);
        assert_eq!(core.pins().address, 0x2052);
        core.set_data_in(0xFF);
        cycle(&mut core);
        assert!(core.pins().write);
        assert_eq!(core.pins().data_out, 0xAA);
        cycle(&mut core);
        assert_eq!(core.pins(), CorePins::default());
        assert_eq!(core.reads(), &[(0x2052, 0xFF)]);
    }

    #[test]
    fn instruction_shape() {
        let mut core = ScriptedCore::new();
        core.instruction(0x1CE, 3);
        assert_eq!(core.remaining(), 4);
        cycle(&mut core);
        assert!(core.pins().sync && core.pins().pl);
        cycle(&mut core);
        cycle(&mut core);
        assert!(!core.pins().sync && core.pins().pl);
        cycle(&mut core);
        assert!(core.pins().sync && !core.pins().pl);
        assert!(core.probes().is_boundary_op());
        assert_eq!(core.probes().extended_opcode, 0x1CE);
    }

    #[test]
    fn rt_clock_edges_are_counted() {
        let mut core = ScriptedCore::new();
        core.set_rt_clk(true);
        core.set_rt_clk(true);
        core.set_rt_clk(false);
        assert_eq!(core.rt_edges(), 2);
    }
}
