use log::{error, info, trace, warn};

use crate::audit::{CoreFault, CoverageReport, CycleTable};
use crate::bus::{Bus, BusStatus};
use crate::config::{FrameSource, MinxConfig};
use crate::cpu::CpuCore;
use crate::error::{MinxError, Result};
use crate::peripherals::{Diagnostics, Peripherals};
use crate::registers::keypad::Keys;
use crate::registers::prc::PrcTick;
use crate::registers::RegisterWrite;
use crate::rom::Rom;

/// Step driver: owns the core and every peripheral, and advances them one
/// clock cycle at a time.
pub struct Minx<C: CpuCore> {
    core: C,
    peripherals: Peripherals,
    config: MinxConfig,
    bus: Bus,
    running: bool,
    halted_sp: Option<u16>,
}

impl<C: CpuCore> Minx<C> {
    #[must_use]
    pub fn new(core: C, config: MinxConfig) -> Self {
        let mut slf = Self {
            core,
            peripherals: Peripherals::new(&config),
            config,
            bus: Bus::default(),
            running: true,
            halted_sp: None,
        };
        slf.initialize();
        slf
    }

    fn initialize(&mut self) {
        self.core.set_reset(true);
        self.core.set_clk(false);
        self.core.set_rt_clk(false);
        self.forward_keys();
        self.core.eval();
    }

    /// Loads the BIOS image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is empty.
    pub fn load_bios_from_slice(&mut self, data: &[u8]) -> Result<()> {
        trace!("Load bios");
        self.peripherals.set_bios(Rom::bios_from_slice(data)?);
        Ok(())
    }

    /// Loads a cartridge image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image does not fit the cartridge window.
    pub fn load_cart_from_slice(&mut self, data: &[u8]) -> Result<()> {
        trace!("Load cart");
        self.peripherals.set_cart(Rom::cartridge_from_slice(data)?);
        Ok(())
    }

    pub fn set_cycle_table(&mut self, table: CycleTable) {
        info!("Cycle table: {} known opcodes", table.known());
        self.peripherals.auditor_mut().set_table(table);
    }

    /// Advances one full clock cycle.
    ///
    /// # Errors
    ///
    /// Returns `MinxError::StackOverflow` once the core's stack pointer has
    /// left RAM; the driver stays halted until `reset`.
    pub fn step(&mut self) -> Result<()> {
        if let Some(sp) = self.halted_sp {
            return Err(MinxError::StackOverflow {
                sp,
                timestamp: self.peripherals.ticks(),
            });
        }

        self.half_cycle(true);
        self.half_cycle(false);

        let pins = self.core.pins();
        let probes = self.core.probes();
        let ticks = self.peripherals.ticks();

        if self.peripherals.latch_core_edges(&probes)
            && self.config.frame_source == FrameSource::CoreRenderDone
        {
            self.capture_frame();
        }

        if self.peripherals.tick_registers(&self.config) == Some(PrcTick::Frame)
            && self.config.frame_source == FrameSource::RefreshController
        {
            self.capture_frame();
        }

        for fault in self.peripherals.auditor_mut().check_faults(&pins, &probes) {
            if let CoreFault::StackOverflow { sp } = fault {
                error!("[{}] ** {}, timestamp: {} **", ticks, fault, ticks);
                self.halted_sp = Some(sp);
                return Err(MinxError::StackOverflow { sp, timestamp: ticks });
            }
            warn!("[{}] ** {}, timestamp: {} **", ticks, fault, ticks);
        }

        if let Some(d) = self.peripherals.auditor_mut().observe_boundary(&pins, &probes, ticks) {
            error!("[{}] ** {} **", ticks, d);
        }

        if ticks >= self.config.reset_half_cycles {
            self.core.set_reset(false);
        }

        if self
            .peripherals
            .auditor_mut()
            .enter_interrupt(&pins, ticks, self.config.irq_guard_half_cycles)
        {
            trace!("[{}] Interrupt entry", ticks);
        }

        match pins.bus_status {
            // Only sampled outside the program-load phase; data_in holds
            // through the rest of the transfer.
            BusStatus::MemRead if !pins.pl => {
                self.bus = Bus::read(pins.address);
                self.peripherals.peek(&mut self.bus, probes.cb);
                trace!("[{}] < Peek {:?}", ticks, self.bus);
                self.core.set_data_in(self.bus.data());
                self.core.eval();
            }
            BusStatus::MemWrite if pins.write => {
                self.bus = Bus::write(pins.address, pins.data_out);
                trace!("[{}] > Poke {:?}", ticks, self.bus);
                self.peripherals.poke(&self.bus);
            }
            _ => (),
        }

        self.peripherals.auditor_mut().count_cycle(&pins, &probes);
        Ok(())
    }

    fn half_cycle(&mut self, level: bool) {
        self.core.set_clk(level);
        self.core.eval();
        if let Some(rt) = self.peripherals.half_cycle() {
            self.core.set_rt_clk(rt);
            self.core.eval();
        }
    }

    fn capture_frame(&mut self) {
        let lcd = self.core.lcd_memory();
        let contrast = self.core.lcd_contrast();
        self.peripherals.present(lcd, contrast);
    }

    /// Runs `steps` clock cycles.
    ///
    /// # Errors
    ///
    /// Stops at the first stack overflow.
    pub fn run_steps(&mut self, steps: u32) -> Result<()> {
        for _ in 0..steps {
            self.step()?;
        }
        Ok(())
    }

    /// Runs one frame's step budget while the simulation is running. Returns
    /// whether a frame was presented.
    ///
    /// # Errors
    ///
    /// Stops at the first stack overflow.
    pub fn run_frame(&mut self) -> Result<bool> {
        let frames = self.peripherals.video().frames();
        for _ in 0..self.config.steps_per_frame {
            if !self.running {
                break;
            }
            self.step()?;
        }
        Ok(self.peripherals.video().frames() != frames)
    }

    pub fn set_running(&mut self, running: bool) {
        trace!("Running: {}", running);
        self.running = running;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted_sp.is_some()
    }

    pub fn set_keys(&mut self, keys: Keys) {
        trace!("Keys: {:08b}", keys.bits());
        self.peripherals.registers_mut().set_keys(keys);
        self.forward_keys();
    }

    #[must_use]
    pub fn keys(&self) -> Keys {
        self.peripherals.registers().keys()
    }

    fn forward_keys(&mut self) {
        if self.config.forward_keys_to_core {
            let keys = self.peripherals.registers().keys() - Keys::power;
            self.core.set_keys_active(keys.bits());
        }
    }

    /// Register read as the core would see it.
    #[must_use]
    pub fn peek_register(&self, offset: u8) -> u8 {
        self.peripherals.registers().read(offset)
    }

    /// Register write through the semantics engine, for scripted hosts.
    pub fn poke_register(&mut self, offset: u8, data: u8) -> RegisterWrite {
        self.peripherals.write_register(offset, data)
    }

    /// Latches interrupt sources in an IRQ_ACT register.
    pub fn raise_irq(&mut self, offset: u8, mask: u8) -> bool {
        self.peripherals.registers_mut().raise_irq(offset, mask)
    }

    /// Side-effect free view of the bus.
    #[must_use]
    pub fn cpu_mem(&self, addr: u32) -> u8 {
        self.peripherals.cpu_mem(addr)
    }

    #[must_use]
    pub fn screen(&self) -> &[u8] {
        self.peripherals.video().screen()
    }

    pub fn redraw_requested(&mut self) -> bool {
        self.peripherals.video_mut().redraw_requested()
    }

    #[must_use]
    pub fn coverage(&self) -> CoverageReport {
        let p = &self.peripherals;
        p.auditor().coverage(p.bios(), p.cart())
    }

    pub fn log_coverage(&self) {
        for line in self.coverage().to_string().lines() {
            info!("{}", line);
        }
    }

    /// Back to power-on: peripherals and coverage reinitialized, images and
    /// cycle table kept, core put back into reset.
    pub fn reset(&mut self) {
        self.peripherals = self.peripherals.power_on(&self.config);
        self.bus = Bus::default();
        self.halted_sp = None;
        self.initialize();
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.peripherals.ticks()
    }

    #[must_use]
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    #[must_use]
    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    #[must_use]
    pub fn config(&self) -> &MinxConfig {
        &self.config
    }

    #[must_use]
    pub fn peripherals(&self) -> &Peripherals {
        &self.peripherals
    }

    pub(crate) fn replace_peripherals(&mut self, mut peripherals: Peripherals) {
        peripherals.copy_images_from(&self.peripherals);
        self.peripherals = peripherals;
    }

    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        self.peripherals.diagnostics()
    }
}
