//! Everything on the far side of the core's bus: memories, register bank,
//! auditor and display, plus the clock state the driver advances.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::audit::{Auditor, CycleTable};
use crate::bus::Bus;
use crate::clock::{on_prc_tick, on_seconds_interval, Oscillator};
use crate::config::MinxConfig;
use crate::consts::*;
use crate::cpu::CoreProbes;
use crate::memory_map::{decode, Region};
use crate::ram::Ram;
use crate::registers::irq::IrqAct1;
use crate::registers::prc::PrcTick;
use crate::registers::{
    is_timer_register, register_name, HardwareRegisters, RegisterWrite, WriteClass,
};
use crate::rom::{Rom, RomKind};
use crate::video::Video;

/// Counters for the non-fatal bus conditions, kept next to the log lines.
/// Core faults and cycle discrepancies are counted by the `Auditor`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub illegal_writes: u64,
    pub dropped_writes: u64,
    pub unknown_writes: u64,
    pub timer_reads: u64,
    pub bank_hits: u64,
    pub lcd_hazards: u64,
}

/// Rising-edge detector on a core line.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Edge {
    level: bool,
}

impl Edge {
    pub fn rose(&mut self, level: bool) -> bool {
        let rose = level && !self.level;
        self.level = level;
        rose
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Peripherals {
    ram: Ram,
    bios: Rom,
    cart: Rom,
    registers: HardwareRegisters,
    auditor: Auditor,
    video: Video,
    diagnostics: Diagnostics,
    osc: Oscillator,
    render_done: Edge,
    copy_complete: Edge,
    ticks: u64,
}

impl Peripherals {
    #[must_use]
    pub fn new(config: &MinxConfig) -> Self {
        Self {
            ram: Ram::new(),
            bios: Rom::empty(RomKind::Bios),
            cart: Rom::empty(RomKind::Cartridge),
            registers: HardwareRegisters::new(),
            auditor: Auditor::new(CycleTable::new(), config.stack_limit),
            video: Video::new(config.orientation),
            diagnostics: Diagnostics::default(),
            osc: Oscillator::new(config.core_clock_hz, config.rt_clock_hz),
            render_done: Edge::default(),
            copy_complete: Edge::default(),
            ticks: 0,
        }
    }

    /// Fresh power-on state that keeps the loaded images and cycle table.
    /// Coverage starts over: touched bytes along with executed opcodes.
    #[must_use]
    pub fn power_on(&self, config: &MinxConfig) -> Self {
        let mut slf = Self::new(config);
        slf.bios = self.bios.clone();
        slf.bios.clear_touched();
        slf.cart = self.cart.clone();
        slf.cart.clear_touched();
        slf.auditor.set_table(self.auditor.table().clone());
        slf
    }

    pub fn set_bios(&mut self, bios: Rom) {
        self.bios = bios;
    }

    pub fn set_cart(&mut self, cart: Rom) {
        self.cart = cart;
    }

    /// Restores the images a snapshot does not carry.
    pub fn copy_images_from(&mut self, source: &Peripherals) {
        self.bios.copy_from(&source.bios);
        self.cart.copy_from(&source.cart);
    }

    /// Serves a core read. `cb` is the core's code bank register.
    pub fn peek(&mut self, bus: &mut Bus, cb: u8) {
        let addr = bus.addr();
        let decoded = decode(addr, self.bios.window(), self.cart.window());
        let data = match decoded.region {
            Region::Bios => self.bios.peek(decoded.offset),
            Region::Ram => self.ram.peek(decoded.offset),
            Region::Registers => {
                let offset = decoded.offset as u8;
                if is_timer_register(offset) {
                    self.diagnostics.timer_reads += 1;
                    warn!(
                        "[{}] Reading hardware register 0x{:02x} which is a timer register and is not implemented",
                        self.ticks, offset
                    );
                }
                let data = self.registers.read(offset);
                trace!(
                    "[{}] < Peek {} (0x{:02x}) -> 0x{:02x}",
                    self.ticks,
                    register_name(offset).unwrap_or("???"),
                    offset,
                    data
                );
                data
            }
            Region::Cartridge => {
                if addr & 0x8000 != 0 && cb > 0 {
                    self.diagnostics.bank_hits += 1;
                    warn!(
                        "[{}] Code bank not implemented 0x{:06x}, CB 0x{:02x}",
                        self.ticks, addr, cb
                    );
                }
                self.cart.peek(decoded.offset)
            }
        };
        bus.set_data(data);
    }

    /// Serves a core write. ROM writes are dropped.
    pub fn poke(&mut self, bus: &Bus) {
        let addr = bus.addr();
        let decoded = decode(addr, self.bios.window(), self.cart.window());
        match decoded.region {
            Region::Bios | Region::Cartridge => {
                self.diagnostics.illegal_writes += 1;
                warn!(
                    "[{}] Program trying to write to {:?} at 0x{:06x}",
                    self.ticks, decoded.region, addr
                );
            }
            Region::Ram => self.ram.poke(decoded.offset, bus.data()),
            Region::Registers => {
                self.write_register(decoded.offset as u8, bus.data());
            }
        }
    }

    /// Register write through the semantics engine, with its diagnostics.
    pub fn write_register(&mut self, offset: u8, data: u8) -> RegisterWrite {
        let w = self.registers.write(offset, data);
        let name = register_name(offset).unwrap_or("???");
        match w.class {
            WriteClass::Stored | WriteClass::Acknowledged => trace!(
                "[{}] > Poke {} (0x{:02x}) = 0x{:02x}",
                self.ticks,
                name,
                offset,
                w.stored.unwrap_or(data)
            ),
            WriteClass::Rematched => debug!(
                "[{}] PRC_RATE = 0x{:02x}, rate match 0x{:02x}",
                self.ticks,
                data,
                self.registers.prc().rate_match()
            ),
            WriteClass::Unknown => {
                self.diagnostics.unknown_writes += 1;
                warn!(
                    "[{}] Writing hardware register Unknown (0x{:02x}) = 0x{:02x}",
                    self.ticks, offset, data
                );
            }
            WriteClass::ReadOnly => {
                self.diagnostics.dropped_writes += 1;
                warn!("[{}] Write to read-only {} dropped", self.ticks, name);
            }
            WriteClass::Dropped => {
                self.diagnostics.dropped_writes += 1;
                warn!(
                    "[{}] Write to unrecognized register 0x{:02x} = 0x{:02x} dropped",
                    self.ticks, offset, data
                );
            }
        }
        if let Some(cmd) = w.lcd {
            if cmd.is_hazard() {
                self.diagnostics.lcd_hazards += 1;
                warn!("[{}] LCD_CTRL: {}", self.ticks, cmd);
            } else {
                debug!("[{}] LCD_CTRL: {}", self.ticks, cmd);
            }
        }
        w
    }

    /// Side-effect free view of the bus, for hosts and debuggers.
    #[must_use]
    pub fn cpu_mem(&self, addr: u32) -> u8 {
        let decoded = decode(addr, self.bios.window(), self.cart.window());
        match decoded.region {
            Region::Bios => self.bios.get(decoded.offset),
            Region::Ram => self.ram.get(decoded.offset as u16),
            Region::Registers => self.registers.read(decoded.offset as u8),
            Region::Cartridge => self.cart.get(decoded.offset),
        }
    }

    /// Advances the timestamp by one half cycle. Returns the new oscillator
    /// level when it toggled at the current timestamp.
    pub fn half_cycle(&mut self) -> Option<bool> {
        let toggled = self.osc.due(self.ticks);
        self.ticks += 1;
        toggled
    }

    /// Per-step housekeeping of the register side: seconds counter and
    /// refresh controller.
    pub fn tick_registers(&mut self, config: &MinxConfig) -> Option<PrcTick> {
        let seconds = on_seconds_interval(self.ticks, config.seconds_tick_half_cycles);
        let prc = on_prc_tick(self.ticks, config.prc_tick_cycles);
        let tick = self.registers.tick(seconds, prc);
        match tick {
            Some(PrcTick::Hunt) => trace!(
                "[{}] PRC hunt, rate 0x{:02x}",
                self.ticks,
                self.registers.prc().rate()
            ),
            Some(PrcTick::Frame) => debug!("[{}] PRC frame", self.ticks),
            _ => (),
        }
        tick
    }

    /// Latches IRQ_ACT1 on rising edges of the core's render-done and
    /// copy-complete lines. Returns whether render-done rose.
    pub fn latch_core_edges(&mut self, probes: &CoreProbes) -> bool {
        let render_done = self.render_done.rose(probes.irq_render_done);
        if render_done {
            self.registers.raise_irq(IRQ_ACT1, IrqAct1::render_done.bits());
            debug!("[{}] Render done {}", self.ticks, self.ticks / 2);
        }
        if self.copy_complete.rose(probes.irq_copy_complete) {
            self.registers.raise_irq(IRQ_ACT1, IrqAct1::copy_complete.bits());
            debug!("[{}] Copy complete {}", self.ticks, self.ticks / 2);
        }
        render_done
    }

    /// Hands a frame to the extractor. Without core LCD memory the
    /// background is composed from the tile map in RAM.
    pub fn present(&mut self, lcd: Option<&[u8]>, contrast: Option<u8>) {
        let contrast = contrast.unwrap_or_else(|| self.registers.contrast());
        match lcd {
            Some(planar) => self.video.present(planar, contrast),
            None => {
                let planar = self.registers.prc().compose(&mut self.ram);
                self.video.present(&planar, contrast);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    #[must_use]
    pub fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }

    #[must_use]
    pub fn bios(&self) -> &Rom {
        &self.bios
    }

    #[must_use]
    pub fn cart(&self) -> &Rom {
        &self.cart
    }

    #[must_use]
    pub fn registers(&self) -> &HardwareRegisters {
        &self.registers
    }

    #[must_use]
    pub fn registers_mut(&mut self) -> &mut HardwareRegisters {
        &mut self.registers
    }

    #[must_use]
    pub fn auditor(&self) -> &Auditor {
        &self.auditor
    }

    #[must_use]
    pub fn auditor_mut(&mut self) -> &mut Auditor {
        &mut self.auditor
    }

    #[must_use]
    pub fn video(&self) -> &Video {
        &self.video
    }

    #[must_use]
    pub fn video_mut(&mut self) -> &mut Video {
        &mut self.video
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[must_use]
    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }
}

impl Default for Peripherals {
    fn default() -> Self {
        Peripherals::new(&MinxConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! peek {
        ($p: ident, $addr: expr) => {{
            let mut bus = Bus::read($addr);
            $p.peek(&mut bus, 0);
            bus.data()
        }};
    }

    macro_rules! poke {
        ($p: ident, $addr: expr, $data: expr) => {
            $p.poke(&Bus::write($addr, $data))
        };
    }

    fn with_images() -> Peripherals {
        let mut p = Peripherals::default();
        let bios: Vec<u8> = (0..0x800).map(|i| i as u8).collect();
        p.set_bios(Rom::bios_from_slice(&bios).unwrap());
        let cart: Vec<u8> = (0..0x10000).map(|i| (i >> 8) as u8).collect();
        p.set_cart(Rom::cartridge_from_slice(&cart).unwrap());
        p
    }

    #[test]
    fn routes_by_region() {
        let mut p = with_images();
        assert_eq!(peek!(p, 0x0012), 0x12);
        assert_eq!(peek!(p, 0x0812), 0x12);

        poke!(p, 0x1234, 0x77);
        assert_eq!(peek!(p, 0x1234), 0x77);

        poke!(p, 0x2000 + u32::from(IRQ_ENA1), 0x3C);
        assert_eq!(peek!(p, 0x2023), 0x3C);

        assert_eq!(peek!(p, 0x2100), 0x21);
        assert_eq!(peek!(p, 0x12100), 0x21);
        assert!(p.cart().is_touched(0x2100));
        assert!(p.bios().is_touched(0x12));
    }

    #[test]
    fn rom_writes_are_dropped() {
        let mut p = with_images();
        poke!(p, 0x0010, 0xEE);
        poke!(p, 0x3000, 0xEE);
        assert_eq!(p.diagnostics().illegal_writes, 2);
        assert_eq!(p.cpu_mem(0x0010), 0x10);
        assert_eq!(p.cpu_mem(0x3000), 0x30);
    }

    #[test]
    fn empty_images_read_zero() {
        let mut p = Peripherals::default();
        assert_eq!(peek!(p, 0x0123), 0);
        assert_eq!(peek!(p, 0x1F_FFFF), 0);
    }

    #[test]
    fn register_diagnostics() {
        let mut p = Peripherals::default();
        poke!(p, 0x2090, 1);
        poke!(p, 0x2000 + u32::from(KEY_PAD), 0);
        poke!(p, 0x2044, 1);
        poke!(p, 0x20FE, 0xF3);
        let _ = peek!(p, 0x2036);
        let d = p.diagnostics();
        assert_eq!(d.dropped_writes, 2);
        assert_eq!(d.unknown_writes, 1);
        assert_eq!(d.lcd_hazards, 1);
        assert_eq!(d.timer_reads, 1);
    }

    #[test]
    fn bank_reads_are_flagged_but_served() {
        let mut p = with_images();
        let mut bus = Bus::read(0x8123);
        p.peek(&mut bus, 1);
        assert_eq!(bus.data(), 0x81);
        assert_eq!(p.diagnostics().bank_hits, 1);
        let mut bus = Bus::read(0x8123);
        p.peek(&mut bus, 0);
        assert_eq!(p.diagnostics().bank_hits, 1);
    }

    #[test]
    fn core_edges_latch_irq() {
        let mut p = Peripherals::default();
        let high = CoreProbes {
            irq_render_done: true,
            irq_copy_complete: true,
            ..CoreProbes::default()
        };
        assert!(p.latch_core_edges(&high));
        assert_eq!(p.registers().read(IRQ_ACT1), 0xC0);
        p.write_register(IRQ_ACT1, 0xC0);
        assert!(!p.latch_core_edges(&high));
        assert_eq!(p.registers().read(IRQ_ACT1), 0x00);
        p.latch_core_edges(&CoreProbes::default());
        assert!(p.latch_core_edges(&high));
    }

    #[test]
    fn power_on_keeps_images() {
        let mut p = with_images();
        poke!(p, 0x1000, 0x99);
        let _ = peek!(p, 0x0005);
        let _ = peek!(p, 0x2105);
        let fresh = p.power_on(&MinxConfig::default());
        assert_eq!(fresh.cpu_mem(0x1000), 0);
        assert_eq!(fresh.cpu_mem(0x0005), 0x05);
        assert_eq!(fresh.cart().len(), 0x10000);
        assert_eq!(fresh.bios().touched_count(), 0);
        assert_eq!(fresh.cart().touched_count(), 0);
        assert!(p.bios().is_touched(0x0005));
    }
}
