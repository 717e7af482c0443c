use serde::{Deserialize, Serialize};

use crate::consts::ADDR_MASK;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BusStatus {
    #[default]
    Idle,
    IrqRead,
    MemWrite,
    MemRead,
}

impl BusStatus {
    /// Decodes the two status lines driven by the core.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => BusStatus::Idle,
            0b01 => BusStatus::IrqRead,
            0b10 => BusStatus::MemWrite,
            _ => BusStatus::MemRead,
        }
    }

    #[must_use]
    pub fn bits(self) -> u8 {
        match self {
            BusStatus::Idle => 0b00,
            BusStatus::IrqRead => 0b01,
            BusStatus::MemWrite => 0b10,
            BusStatus::MemRead => 0b11,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Read,
    Write,
}

/// One transaction latched from the core's bus lines.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bus {
    addr: u32,
    data: u8,
    direction: Direction,
}

impl Bus {
    #[must_use]
    pub fn new(addr: u32, direction: Direction, data: u8) -> Self {
        Self {
            addr: addr & ADDR_MASK,
            data,
            direction,
        }
    }

    #[must_use]
    pub fn read(addr: u32) -> Self {
        Self::new(addr, Direction::Read, 0)
    }

    #[must_use]
    pub fn write(addr: u32, data: u8) -> Self {
        Self::new(addr, Direction::Write, data)
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> u8 {
        self.data
    }

    #[inline]
    #[must_use]
    pub fn addr(&self) -> u32 {
        self.addr
    }

    #[inline]
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    #[must_use]
    pub fn is_write(&self) -> bool {
        self.direction == Direction::Write
    }

    #[inline]
    pub fn set_data(&mut self, data: u8) {
        self.data = data;
    }
}

impl Default for Bus {
    fn default() -> Self {
        Bus::read(0)
    }
}

impl core::fmt::Debug for Bus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{{ addr:{:06x} data:{:02x} dir:{:?} }}",
            self.addr, self.data, self.direction
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines_decode() {
        assert_eq!(BusStatus::from_bits(0), BusStatus::Idle);
        assert_eq!(BusStatus::from_bits(1), BusStatus::IrqRead);
        assert_eq!(BusStatus::from_bits(2), BusStatus::MemWrite);
        assert_eq!(BusStatus::from_bits(3), BusStatus::MemRead);
        assert_eq!(BusStatus::from_bits(0b111), BusStatus::MemRead);
        assert_eq!(BusStatus::MemWrite.bits(), 2);
    }

    #[test]
    fn address_is_truncated_to_bus_width() {
        let bus = Bus::write(0xFF_2081, 0x5A);
        assert_eq!(bus.addr(), 0x1F_2081);
        assert!(bus.is_write());
        assert_eq!(bus.data(), 0x5A);
        assert_eq!(format!("{:?}", bus), "{ addr:1f2081 data:5a dir:Write }");
    }
}
