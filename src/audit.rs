//! Timing audit of the core against a per-opcode cycle table, plus fault
//! watch and coverage bookkeeping.

use core::fmt;

use hashbrown::HashMap;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::cpu::{CoreFaults, CorePins, CoreProbes, STATE_EXECUTE};
use crate::error::{MinxError, Result};
use crate::rom::Rom;

/// Extended opcode number of an instruction's leading bytes: plain opcodes
/// keep their value, the CE and CF pages map to 0x1xx and 0x2xx.
#[must_use]
pub fn extended_opcode(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [OPCODE_PREFIX_CE, op, ..] => Some(0x100 | u16::from(*op)),
        [OPCODE_PREFIX_CF, op, ..] => Some(0x200 | u16::from(*op)),
        [op, ..] => Some(u16::from(*op)),
        [] => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleEntry {
    pub cycles: u8,
    /// Zero when the instruction has no branch-taken variant.
    pub branch_cycles: u8,
}

impl CycleEntry {
    #[must_use]
    pub const fn new(cycles: u8, branch_cycles: u8) -> Self {
        Self {
            cycles,
            branch_cycles,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.cycles != 0
    }

    #[inline]
    #[must_use]
    pub fn matches(&self, observed: u8) -> bool {
        observed == self.cycles || (self.branch_cycles != 0 && observed == self.branch_cycles)
    }
}

impl fmt::Display for CycleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.branch_cycles == 0 {
            write!(f, "{}", self.cycles)
        } else {
            write!(f, "{}/{}", self.cycles, self.branch_cycles)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleTable {
    entries: Vec<CycleEntry>,
}

impl CycleTable {
    /// Table with every slot unknown.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: vec![CycleEntry::default(); OPCODE_SLOTS],
        }
    }

    /// Two bytes per slot, non-branch then branch-taken, in extended opcode
    /// order. A short table leaves the remaining slots unknown.
    pub fn from_flat(data: &[u8]) -> Result<Self> {
        if data.len() % 2 != 0 || data.len() > 2 * OPCODE_SLOTS {
            return Err(MinxError::CycleTable {
                line: 0,
                reason: format!("flat table of {} bytes", data.len()),
            });
        }
        let mut table = Self::new();
        for (slot, pair) in data.chunks_exact(2).enumerate() {
            table.entries[slot] = CycleEntry::new(pair[0], pair[1]);
        }
        Ok(table)
    }

    /// Text form, one `opcode cycles [branch_cycles]` per line. Opcodes are
    /// hex, either extended (`1CE`) or prefixed (`CE:CE`); cycles are
    /// decimal. `#` starts a comment.
    pub fn parse(text: &str) -> Result<Self> {
        let mut table = Self::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            let err = |reason: String| MinxError::CycleTable { line, reason };
            let mut fields = content.split_whitespace();
            let opcode = fields
                .next()
                .and_then(parse_opcode)
                .ok_or_else(|| err(format!("bad opcode in '{content}'")))?;
            let cycles = fields
                .next()
                .and_then(|f| f.parse::<u8>().ok())
                .ok_or_else(|| err(format!("bad cycle count in '{content}'")))?;
            let branch_cycles = match fields.next() {
                Some(f) => f
                    .parse::<u8>()
                    .map_err(|_| err(format!("bad branch cycle count in '{content}'")))?,
                None => 0,
            };
            if fields.next().is_some() {
                return Err(err(format!("trailing fields in '{content}'")));
            }
            table.set(opcode, CycleEntry::new(cycles, branch_cycles));
        }
        Ok(table)
    }

    pub fn set(&mut self, opcode: u16, entry: CycleEntry) {
        if let Some(slot) = self.entries.get_mut(opcode as usize) {
            *slot = entry;
        }
    }

    #[must_use]
    pub fn get(&self, opcode: u16) -> CycleEntry {
        self.entries.get(opcode as usize).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn known(&self) -> usize {
        self.entries.iter().filter(|e| e.is_known()).count()
    }
}

impl Default for CycleTable {
    fn default() -> Self {
        CycleTable::new()
    }
}

fn parse_hex(s: &str) -> Option<u16> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(s, 16).ok()
}

fn parse_opcode(field: &str) -> Option<u16> {
    let opcode = match field.split_once(':') {
        Some((prefix, op)) => {
            let prefix = u8::try_from(parse_hex(prefix)?).ok()?;
            let op = u8::try_from(parse_hex(op)?).ok()?;
            extended_opcode(&[prefix, op]).filter(|_| prefix == 0xCE || prefix == 0xCF)?
        }
        None => parse_hex(field)?,
    };
    ((opcode as usize) < OPCODE_SLOTS).then_some(opcode)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discrepancy {
    pub opcode: u16,
    pub expected: CycleEntry,
    pub observed: u8,
    pub timestamp: u64,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Discrepancy found in number of cycles of instruction 0x{:x}: {}, {}, timestamp: {}",
            self.opcode, self.observed, self.expected.cycles, self.timestamp
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreFault {
    InstructionNotImplemented { opcode: u16, address: u32 },
    Addressing { mode: u8 },
    Jump { target: u8 },
    DataOut,
    MovSrc,
    Write,
    Alu,
    AluDecPack,
    DivZero,
    StackOverflow { sp: u16 },
}

impl fmt::Display for CoreFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreFault::InstructionNotImplemented { opcode, address } => {
                write!(f, "Instruction 0x{opcode:x} not implemented at 0x{address:x}")
            }
            CoreFault::Addressing { mode } => write!(f, "Addressing not implemented error: 0x{mode:x}"),
            CoreFault::Jump { target } => write!(f, "Jump not implemented error, 0x{target:x}"),
            CoreFault::DataOut => write!(f, "Data-out not implemented error"),
            CoreFault::MovSrc => write!(f, "Mov src not implemented error"),
            CoreFault::Write => write!(f, "Write not implemented error"),
            CoreFault::Alu => write!(f, "Alu not implemented error"),
            CoreFault::AluDecPack => {
                write!(f, "Alu decimal and packed operations not implemented error")
            }
            CoreFault::DivZero => write!(f, "Division by zero exception not implemented error"),
            CoreFault::StackOverflow { sp } => write!(f, "Stack overflow, SP=0x{sp:04x}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auditor {
    table: CycleTable,
    cycles: u8,
    irq_processing: bool,
    executed: Vec<u64>,
    discrepancies: HashMap<u16, u32>,
    faults: u64,
    stack_limit: u16,
}

impl Auditor {
    #[must_use]
    pub fn new(table: CycleTable, stack_limit: u16) -> Self {
        Self {
            table,
            cycles: 0,
            irq_processing: false,
            executed: vec![0; OPCODE_SLOTS.div_ceil(64)],
            discrepancies: HashMap::new(),
            faults: 0,
            stack_limit,
        }
    }

    pub fn set_table(&mut self, table: CycleTable) {
        self.table = table;
    }

    #[inline]
    #[must_use]
    pub fn table(&self) -> &CycleTable {
        &self.table
    }

    #[inline]
    #[must_use]
    pub fn cycles(&self) -> u8 {
        self.cycles
    }

    #[inline]
    #[must_use]
    pub fn irq_processing(&self) -> bool {
        self.irq_processing
    }

    /// Compares the cycles counted since the last fetch with the table on an
    /// instruction boundary. The boundary closing an interrupt entry is
    /// skipped.
    pub fn observe_boundary(
        &mut self,
        pins: &CorePins,
        probes: &CoreProbes,
        timestamp: u64,
    ) -> Option<Discrepancy> {
        if !(pins.sync && !pins.pl && probes.is_boundary_op() && !pins.iack && !probes.bus_ack) {
            return None;
        }
        if self.irq_processing {
            self.irq_processing = false;
            return None;
        }

        let opcode = probes.extended_opcode;
        self.mark_executed(opcode);
        let expected = self.table.get(opcode);
        trace!(
            "[{}] boundary 0x{:03x} after {} cycles",
            timestamp,
            opcode,
            self.cycles
        );
        if !expected.is_known() || expected.matches(self.cycles) {
            return None;
        }
        *self.discrepancies.entry(opcode).or_insert(0) += 1;
        Some(Discrepancy {
            opcode,
            expected,
            observed: self.cycles,
            timestamp,
        })
    }

    /// Latches an interrupt entry. Returns true when it was latched.
    pub fn enter_interrupt(&mut self, pins: &CorePins, timestamp: u64, guard: u64) -> bool {
        if timestamp > guard && pins.iack && !pins.pl && pins.sync {
            self.irq_processing = true;
            true
        } else {
            false
        }
    }

    pub fn count_cycle(&mut self, pins: &CorePins, probes: &CoreProbes) {
        if pins.sync && pins.pl {
            self.cycles = 0;
        }
        if pins.pl && !probes.bus_ack {
            self.cycles = self.cycles.saturating_add(1);
        }
    }

    /// Implementation gaps reported by the core this cycle. The data-out
    /// line is sampled in the program-load phase, everything else outside it.
    pub fn check_faults(&mut self, pins: &CorePins, probes: &CoreProbes) -> Vec<CoreFault> {
        let mut out = Vec::new();
        let faults = probes.faults;
        if !pins.pl {
            if probes.state == STATE_EXECUTE
                && !probes.bus_ack
                && probes.microaddress == 0
                && probes.extended_opcode != OPCODE_HALT
            {
                out.push(CoreFault::InstructionNotImplemented {
                    opcode: probes.extended_opcode,
                    address: probes.top_address,
                });
            }
            if faults.contains(CoreFaults::addressing) {
                out.push(CoreFault::Addressing {
                    mode: ((probes.micro_op & 0x3F0_0000) >> 20) as u8,
                });
            }
            if faults.contains(CoreFaults::jump) {
                out.push(CoreFault::Jump {
                    target: ((probes.micro_op & 0x7_C000) >> 14) as u8,
                });
            }
            if faults.contains(CoreFaults::mov_src) {
                out.push(CoreFault::MovSrc);
            }
            if faults.contains(CoreFaults::write) {
                out.push(CoreFault::Write);
            }
            if faults.contains(CoreFaults::alu) {
                out.push(CoreFault::Alu);
            }
            if faults.contains(CoreFaults::alu_dec_pack) {
                out.push(CoreFault::AluDecPack);
            }
            if faults.contains(CoreFaults::divzero) {
                out.push(CoreFault::DivZero);
            }
            if probes.sp > self.stack_limit {
                out.push(CoreFault::StackOverflow { sp: probes.sp });
            }
        } else if faults.contains(CoreFaults::data_out) {
            out.push(CoreFault::DataOut);
        }
        self.faults += out.len() as u64;
        out
    }

    fn mark_executed(&mut self, opcode: u16) {
        let slot = opcode as usize;
        if slot < OPCODE_SLOTS {
            self.executed[slot / 64] |= 1 << (slot % 64);
        }
    }

    #[must_use]
    pub fn is_executed(&self, opcode: u16) -> bool {
        let slot = opcode as usize;
        slot < OPCODE_SLOTS && self.executed[slot / 64] & (1 << (slot % 64)) != 0
    }

    #[must_use]
    pub fn executed_count(&self) -> usize {
        self.executed.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[must_use]
    pub fn discrepancy_count(&self) -> u64 {
        self.discrepancies.values().map(|&n| u64::from(n)).sum()
    }

    #[must_use]
    pub fn discrepancies_for(&self, opcode: u16) -> u32 {
        self.discrepancies.get(&opcode).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn fault_count(&self) -> u64 {
        self.faults
    }

    #[must_use]
    pub fn coverage(&self, bios: &Rom, cart: &Rom) -> CoverageReport {
        let mut worst: Vec<(u16, u32)> = self.discrepancies.iter().map(|(&k, &v)| (k, v)).collect();
        worst.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        CoverageReport {
            bios_touched: bios.touched_count(),
            bios_len: bios.len(),
            cart_touched: cart.touched_count(),
            cart_len: cart.len(),
            executed: self.executed_count(),
            discrepancies: self.discrepancy_count(),
            worst,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    pub bios_touched: usize,
    pub bios_len: usize,
    pub cart_touched: usize,
    pub cart_len: usize,
    pub executed: usize,
    pub discrepancies: u64,
    /// Opcodes with discrepancies, most frequent first.
    pub worst: Vec<(u16, u32)>,
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} bytes out of total {} read from bios",
            self.bios_touched, self.bios_len
        )?;
        writeln!(
            f,
            "{} bytes out of total {} read from cartridge",
            self.cart_touched, self.cart_len
        )?;
        write!(
            f,
            "{} instructions out of total {} executed",
            self.executed, OPCODE_TOTAL
        )?;
        if self.discrepancies != 0 {
            write!(f, "\n{} cycle discrepancies", self.discrepancies)?;
            for (opcode, n) in self.worst.iter().take(8) {
                write!(f, "\n  0x{opcode:03x}: {n}")?;
            }
        }
        Ok(())
    }
}
