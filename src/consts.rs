// Address windows, as seen on the 21 bit address bus.
pub const BIOS_ADDR: u32 = 0x0000;
pub const RAM_ADDR: u32 = 0x1000;
pub const REG_ADDR: u32 = 0x2000;
pub const CART_ADDR: u32 = 0x2100;
pub const ADDR_END: u32 = 0x20_0000;

pub const BIOS_ADDR_B: u32 = RAM_ADDR - 1;
pub const RAM_ADDR_B: u32 = REG_ADDR - 1;
pub const REG_ADDR_B: u32 = CART_ADDR - 1;

pub const ADDR_MASK: u32 = 0x1F_FFFF;
pub const RAM_MASK: u32 = 0x0FFF;
pub const REG_MASK: u32 = 0x1FFF;
pub const CART_MASK: u32 = 0x1F_FFFF;

pub const RAM_SIZE: usize = 0x1000;
pub const REG_SIZE: usize = 0x100;
pub const CART_MAX: usize = 0x20_0000;

// Hardware registers, offsets inside the register window.
pub const SYS_CTRL1: u8 = 0x00;
pub const SYS_CTRL2: u8 = 0x01;
pub const SYS_CTRL3: u8 = 0x02;
pub const SEC_CTRL: u8 = 0x08;
pub const SEC_CNT_LO: u8 = 0x09;
pub const SEC_CNT_MID: u8 = 0x0A;
pub const SEC_CNT_HI: u8 = 0x0B;
pub const SYS_BATT: u8 = 0x10;
pub const TMR1_OSC: u8 = 0x19;
pub const IRQ_PRI1: u8 = 0x20;
pub const IRQ_PRI3: u8 = 0x22;
pub const IRQ_ENA1: u8 = 0x23;
pub const IRQ_ENA4: u8 = 0x26;
pub const IRQ_ACT1: u8 = 0x27;
pub const IRQ_ACT2: u8 = 0x28;
pub const IRQ_ACT3: u8 = 0x29;
pub const IRQ_ACT4: u8 = 0x2A;
pub const TMR256_CTRL: u8 = 0x40;
pub const KEY_PAD: u8 = 0x52;
pub const CART_BUS: u8 = 0x53;
pub const IO_DIR: u8 = 0x60;
pub const IO_DATA: u8 = 0x61;
pub const AUD_CTRL: u8 = 0x70;
pub const AUD_VOL: u8 = 0x71;
pub const PRC_MODE: u8 = 0x80;
pub const PRC_RATE: u8 = 0x81;
pub const PRC_MAP_LO: u8 = 0x82;
pub const PRC_MAP_MID: u8 = 0x83;
pub const PRC_MAP_HI: u8 = 0x84;
pub const PRC_SCROLL_Y: u8 = 0x85;
pub const PRC_SCROLL_X: u8 = 0x86;
pub const PRC_SPR_LO: u8 = 0x87;
pub const PRC_SPR_MID: u8 = 0x88;
pub const PRC_SPR_HI: u8 = 0x89;
pub const LCD_CTRL: u8 = 0xFE;
pub const LCD_DATA: u8 = 0xFF;

// Registers the hardware has but whose function is not known. Stored verbatim.
pub const UNKNOWN_REGISTERS: [u8; 9] = [0x44, 0x45, 0x46, 0x47, 0x50, 0x51, 0x54, 0x55, 0x62];

// Timer registers whose readback is not emulated.
pub const TIMER_REGISTERS: [u8; 7] = [0x36, 0x37, 0x3E, 0x3F, 0x41, 0x4E, 0x4F];

pub const IRQ_ACT1_RENDER_DONE: u8 = 0b0100_0000;
pub const IRQ_ACT1_COPY_COMPLETE: u8 = 0b1000_0000;

pub const SEC_CTRL_ENABLE: u8 = 0b01;
pub const SEC_CTRL_RESET: u8 = 0b10;
pub const SEC_CNT_MASK: u32 = 0xFF_FFFF;

pub const PRC_MODE_MASK: u8 = 0x3F;
pub const PRC_MODE_ACTIVE: u8 = 0b0000_0010;
pub const PRC_RATE_COARSE: u8 = 0x0E;
pub const PRC_RATE_FINE: u8 = 0xF0;
pub const PRC_RATE_STEP: u8 = 0x10;
pub const PRC_CNT_RESET: u8 = 0x01;
pub const PRC_CNT_TERMINAL: u8 = 0x42;

pub const PRC_MAP_BASE: u16 = 0x1360;
pub const PRC_VRAM_BASE: u16 = 0x1000;
pub const PRC_MAP_COLUMNS: u16 = 12;

// Clocks, in half cycles unless stated otherwise.
pub const CORE_CLOCK_HZ: u32 = 4_000_000;
pub const RT_CLOCK_HZ: u32 = 32_768;
pub const SECONDS_TICK_HALF_CYCLES: u64 = 4_000_000;
pub const PRC_TICK_CYCLES: u64 = 855;
pub const RESET_HALF_CYCLES: u64 = 8;
pub const IRQ_GUARD_HALF_CYCLES: u64 = 258;
pub const STEPS_PER_FRAME: u32 = 150_000;
pub const STACK_LIMIT: u16 = 0x2000;

// Opcode space: 256 plain opcodes plus the CE and CF prefixed pages.
pub const OPCODE_SLOTS: usize = 0x300;
pub const OPCODE_TOTAL: usize = 608;
pub const OPCODE_PREFIX_CE: u8 = 0xCE;
pub const OPCODE_PREFIX_CF: u8 = 0xCF;
pub const OPCODE_HALT: u16 = 0x1AE;

// LCD panel.
pub const LCD_WIDTH: usize = 96;
pub const LCD_HEIGHT: usize = 64;
pub const LCD_PAGES: usize = 8;
pub const LCD_STRIDE: usize = 132;
pub const LCD_CONTRAST_MAX: u8 = 0x20;
pub const LCD_CONTRAST_MASK: u8 = 0x3F;
