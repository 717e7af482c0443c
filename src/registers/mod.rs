//! Hardware register bank, `0x2000..=0x20FF`.
//!
//! Writes are computed without formatting anything: `write` returns a
//! `RegisterWrite` describing what happened and the caller decides what to log.

pub mod irq;
pub mod keypad;
pub mod lcd;
pub mod prc;
pub mod seconds;

use hashbrown::HashMap;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use irq::acknowledge;
use keypad::{KeyPad, Keys};
use lcd::{LcdCommand, LcdController};
use prc::{PrcTick, RefreshController};
use seconds::SecondsCounter;

lazy_static! {
    static ref REGISTER_NAMES: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();
        m.insert(SYS_CTRL1, "SYS_CTRL1");
        m.insert(SYS_CTRL2, "SYS_CTRL2");
        m.insert(SYS_CTRL3, "SYS_CTRL3");
        m.insert(SEC_CTRL, "SEC_CTRL");
        m.insert(SEC_CNT_LO, "SEC_CNT_LO");
        m.insert(SEC_CNT_MID, "SEC_CNT_MID");
        m.insert(SEC_CNT_HI, "SEC_CNT_HI");
        m.insert(SYS_BATT, "SYS_BATT");
        m.insert(TMR1_OSC, "TMR1_OSC");
        m.insert(IRQ_PRI1, "IRQ_PRI1");
        m.insert(IRQ_PRI1 + 1, "IRQ_PRI2");
        m.insert(IRQ_PRI3, "IRQ_PRI3");
        m.insert(IRQ_ENA1, "IRQ_ENA1");
        m.insert(IRQ_ENA1 + 1, "IRQ_ENA2");
        m.insert(IRQ_ENA1 + 2, "IRQ_ENA3");
        m.insert(IRQ_ENA4, "IRQ_ENA4");
        m.insert(IRQ_ACT1, "IRQ_ACT1");
        m.insert(IRQ_ACT2, "IRQ_ACT2");
        m.insert(IRQ_ACT3, "IRQ_ACT3");
        m.insert(IRQ_ACT4, "IRQ_ACT4");
        m.insert(TMR256_CTRL, "TMR256_CTRL");
        m.insert(KEY_PAD, "KEY_PAD");
        m.insert(CART_BUS, "CART_BUS");
        m.insert(IO_DIR, "IO_DIR");
        m.insert(IO_DATA, "IO_DATA");
        m.insert(AUD_CTRL, "AUD_CTRL");
        m.insert(AUD_VOL, "AUD_VOL");
        m.insert(PRC_MODE, "PRC_MODE");
        m.insert(PRC_RATE, "PRC_RATE");
        m.insert(PRC_MAP_LO, "PRC_MAP_LO");
        m.insert(PRC_MAP_MID, "PRC_MAP_MID");
        m.insert(PRC_MAP_HI, "PRC_MAP_HI");
        m.insert(PRC_SCROLL_Y, "PRC_SCROLL_Y");
        m.insert(PRC_SCROLL_X, "PRC_SCROLL_X");
        m.insert(PRC_SPR_LO, "PRC_SPR_LO");
        m.insert(PRC_SPR_MID, "PRC_SPR_MID");
        m.insert(PRC_SPR_HI, "PRC_SPR_HI");
        m.insert(LCD_CTRL, "LCD_CTRL");
        m.insert(LCD_DATA, "LCD_DATA");
        m
    };
}

#[must_use]
pub fn register_name(offset: u8) -> Option<&'static str> {
    REGISTER_NAMES.get(&offset).copied()
}

#[inline]
#[must_use]
pub fn is_timer_register(offset: u8) -> bool {
    TIMER_REGISTERS.contains(&offset)
}

#[inline]
#[must_use]
pub fn is_unknown_register(offset: u8) -> bool {
    UNKNOWN_REGISTERS.contains(&offset)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteClass {
    Stored,
    /// Write-one-to-clear on an IRQ_ACT register.
    Acknowledged,
    /// PRC_RATE write that changed the coarse bits.
    Rematched,
    ReadOnly,
    /// Present on the hardware, function unknown. Stored verbatim.
    Unknown,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub offset: u8,
    pub data: u8,
    /// Byte left in the bank, `None` when the write had no effect.
    pub stored: Option<u8>,
    pub class: WriteClass,
    pub lcd: Option<LcdCommand>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareRegisters {
    data: Vec<u8>,
    seconds: SecondsCounter,
    prc: RefreshController,
    lcd: LcdController,
    keypad: KeyPad,
}

impl HardwareRegisters {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: vec![0; REG_SIZE],
            seconds: SecondsCounter::new(),
            prc: RefreshController::new(),
            lcd: LcdController::new(),
            keypad: KeyPad::new(),
        }
    }

    /// Register read as the core sees it.
    #[must_use]
    pub fn read(&self, offset: u8) -> u8 {
        match offset {
            SEC_CTRL => self.seconds.control(),
            SEC_CNT_LO => self.seconds.byte(0),
            SEC_CNT_MID => self.seconds.byte(1),
            SEC_CNT_HI => self.seconds.byte(2),
            KEY_PAD => self.keypad.latch(),
            PRC_MODE => self.prc.mode(),
            PRC_RATE => self.prc.rate(),
            _ => self.data[offset as usize],
        }
    }

    pub fn write(&mut self, offset: u8, data: u8) -> RegisterWrite {
        let mut lcd = None;
        let (stored, class) = match offset {
            SEC_CTRL => (Some(self.seconds.set_control(data)), WriteClass::Stored),
            SEC_CNT_LO | SEC_CNT_MID | SEC_CNT_HI | KEY_PAD | CART_BUS => {
                (None, WriteClass::ReadOnly)
            }
            IRQ_ACT1..=IRQ_ACT4 => (
                Some(acknowledge(self.data[offset as usize], data)),
                WriteClass::Acknowledged,
            ),
            PRC_MODE => (Some(self.prc.set_mode(data)), WriteClass::Stored),
            PRC_RATE => {
                let class = if self.prc.write_rate(data) {
                    WriteClass::Rematched
                } else {
                    WriteClass::Stored
                };
                (Some(self.prc.rate()), class)
            }
            PRC_MAP_LO | PRC_MAP_MID | PRC_MAP_HI => {
                self.prc.set_map_byte(offset - PRC_MAP_LO, data);
                (Some(data), WriteClass::Stored)
            }
            LCD_CTRL => {
                lcd = Some(self.lcd.command(data));
                (Some(data), WriteClass::Stored)
            }
            _ if register_name(offset).is_some() => (Some(data), WriteClass::Stored),
            _ if is_unknown_register(offset) => (Some(data), WriteClass::Unknown),
            _ => (None, WriteClass::Dropped),
        };
        if let Some(v) = stored {
            self.data[offset as usize] = v;
        }
        RegisterWrite {
            offset,
            data,
            stored,
            class,
            lcd,
        }
    }

    /// Latches interrupt sources. Only the IRQ_ACT registers accept this.
    pub fn raise_irq(&mut self, offset: u8, mask: u8) -> bool {
        if (IRQ_ACT1..=IRQ_ACT4).contains(&offset) {
            self.data[offset as usize] = irq::raise(self.data[offset as usize], mask);
            true
        } else {
            false
        }
    }

    /// Per core cycle housekeeping.
    pub fn tick(&mut self, on_seconds_interval: bool, on_prc_tick: bool) -> Option<PrcTick> {
        self.seconds.tick(on_seconds_interval);
        on_prc_tick.then(|| self.prc.tick())
    }

    #[inline]
    #[must_use]
    pub fn keys(&self) -> Keys {
        self.keypad.pressed()
    }

    pub fn set_keys(&mut self, keys: Keys) {
        self.keypad.set(keys);
    }

    #[inline]
    #[must_use]
    pub fn key_latch(&self) -> u8 {
        self.keypad.latch()
    }

    #[inline]
    #[must_use]
    pub fn contrast(&self) -> u8 {
        self.lcd.contrast()
    }

    #[inline]
    #[must_use]
    pub fn seconds(&self) -> &SecondsCounter {
        &self.seconds
    }

    #[inline]
    #[must_use]
    pub fn prc(&self) -> &RefreshController {
        &self.prc
    }

    #[inline]
    #[must_use]
    pub fn lcd(&self) -> &LcdController {
        &self.lcd
    }
}

impl Default for HardwareRegisters {
    fn default() -> Self {
        HardwareRegisters::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! write_reg {
        ($regs: ident, $offset: expr, $data: expr) => {
            $regs.write($offset, $data)
        };
        ($regs: ident, $offset: expr, $data: expr, $class: expr) => {{
            let w = $regs.write($offset, $data);
            assert_eq!(w.class, $class, "0x{:02x}", $offset);
            w
        }};
    }

    #[test]
    fn irq_act_is_write_one_to_clear() {
        let mut regs = HardwareRegisters::new();
        for offset in IRQ_ACT1..=IRQ_ACT4 {
            assert!(regs.raise_irq(offset, 0xC3));
            let w = write_reg!(regs, offset, 0x41, WriteClass::Acknowledged);
            assert_eq!(w.stored, Some(0x82));
            assert_eq!(regs.read(offset), 0x82);
            write_reg!(regs, offset, 0x41);
            assert_eq!(regs.read(offset), 0x82);
        }
        assert!(!regs.raise_irq(IRQ_ENA1, 0xFF));
        assert_eq!(regs.read(IRQ_ENA1), 0);
    }

    #[test]
    fn priority_and_enable_are_verbatim() {
        let mut regs = HardwareRegisters::new();
        for offset in IRQ_PRI1..=IRQ_ENA4 {
            write_reg!(regs, offset, 0xA5, WriteClass::Stored);
            assert_eq!(regs.read(offset), 0xA5);
        }
    }

    #[test]
    fn seconds_registers() {
        let mut regs = HardwareRegisters::new();
        let w = write_reg!(regs, SEC_CTRL, 0xFF, WriteClass::Stored);
        assert_eq!(w.stored, Some(0x03));
        assert_eq!(regs.read(SEC_CTRL), 0x03);

        write_reg!(regs, SEC_CTRL, SEC_CTRL_ENABLE);
        for _ in 0..0x102 {
            regs.tick(true, false);
        }
        assert_eq!(regs.read(SEC_CNT_LO), 0x02);
        assert_eq!(regs.read(SEC_CNT_MID), 0x01);
        assert_eq!(regs.read(SEC_CNT_HI), 0x00);

        let w = write_reg!(regs, SEC_CNT_LO, 0x55, WriteClass::ReadOnly);
        assert_eq!(w.stored, None);
        assert_eq!(regs.read(SEC_CNT_LO), 0x02);
    }

    #[test]
    fn key_pad_is_not_writable() {
        let mut regs = HardwareRegisters::new();
        assert_eq!(regs.read(KEY_PAD), 0xFF);
        write_reg!(regs, KEY_PAD, 0x00, WriteClass::ReadOnly);
        assert_eq!(regs.read(KEY_PAD), 0xFF);
        regs.set_keys(Keys::b | Keys::right);
        assert_eq!(regs.read(KEY_PAD), 0b1011_1101);
    }

    #[test]
    fn cart_bus_is_not_writable() {
        let mut regs = HardwareRegisters::new();
        let w = write_reg!(regs, CART_BUS, 0xA5, WriteClass::ReadOnly);
        assert_eq!(w.stored, None);
        assert_eq!(regs.read(CART_BUS), 0x00);
        assert_eq!(register_name(CART_BUS), Some("CART_BUS"));
    }

    #[test]
    fn prc_registers() {
        let mut regs = HardwareRegisters::new();
        let w = write_reg!(regs, PRC_MODE, 0xFF, WriteClass::Stored);
        assert_eq!(w.stored, Some(0x3F));
        assert_eq!(regs.read(PRC_MODE), 0x3F);

        write_reg!(regs, PRC_RATE, 0x00, WriteClass::Stored);
        write_reg!(regs, PRC_RATE, 0x0A, WriteClass::Rematched);
        assert_eq!(regs.prc().rate_match(), 0x30);
        assert_eq!(regs.read(PRC_RATE), 0x0A);
        write_reg!(regs, PRC_RATE, 0x0B, WriteClass::Stored);
        assert_eq!(regs.prc().rate_match(), 0x30);

        write_reg!(regs, PRC_MAP_LO, 0x11);
        write_reg!(regs, PRC_MAP_MID, 0x22);
        write_reg!(regs, PRC_MAP_HI, 0x33);
        assert_eq!(regs.prc().map(), 0x33_2211);
        assert_eq!(regs.read(PRC_MAP_MID), 0x22);
    }

    #[test]
    fn lcd_control_decodes() {
        let mut regs = HardwareRegisters::new();
        let w = write_reg!(regs, LCD_CTRL, 0xAF);
        assert_eq!(w.lcd, Some(LcdCommand::Display(true)));
        assert_eq!(regs.read(LCD_CTRL), 0xAF);
        write_reg!(regs, LCD_CTRL, 0x81);
        let w = write_reg!(regs, LCD_CTRL, 0x1C);
        assert_eq!(w.lcd, Some(LcdCommand::ContrastValue(0x1C)));
        assert_eq!(regs.contrast(), 0x1C);

        let w = write_reg!(regs, LCD_DATA, 0x5A, WriteClass::Stored);
        assert_eq!(w.lcd, None);
        assert_eq!(regs.read(LCD_DATA), 0x5A);
    }

    #[test]
    fn unknown_and_unnamed_offsets() {
        let mut regs = HardwareRegisters::new();
        for offset in UNKNOWN_REGISTERS {
            write_reg!(regs, offset, 0x77, WriteClass::Unknown);
            assert_eq!(regs.read(offset), 0x77);
        }
        let w = write_reg!(regs, 0x90, 0x77, WriteClass::Dropped);
        assert_eq!(w.stored, None);
        assert_eq!(regs.read(0x90), 0x00);
    }

    #[test]
    fn reads_are_stable() {
        let mut regs = HardwareRegisters::new();
        for offset in 0..=0xFFu8 {
            write_reg!(regs, offset, offset ^ 0x5A);
        }
        for offset in 0..=0xFFu8 {
            assert_eq!(regs.read(offset), regs.read(offset));
        }
    }

    #[test]
    fn names() {
        assert_eq!(register_name(0x27), Some("IRQ_ACT1"));
        assert_eq!(register_name(0x21), Some("IRQ_PRI2"));
        assert_eq!(register_name(0xFE), Some("LCD_CTRL"));
        assert_eq!(register_name(0x44), None);
        assert!(is_timer_register(0x36));
        assert!(!is_timer_register(0x40));
    }
}
