//! Address decoding for the 21 bit bus.
//!
//! The map is an ordered table of windows; decoding walks it and never
//! fails, everything from `CART_ADDR` up to the end of the bus belongs to
//! the cartridge.

use serde::{Deserialize, Serialize};

use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Bios,
    Ram,
    Registers,
    Cartridge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    pub first: u32,
    pub last: u32,
    pub region: Region,
}

impl MapEntry {
    #[must_use]
    pub const fn contains(&self, addr: u32) -> bool {
        addr >= self.first && addr <= self.last
    }
}

pub const MEMORY_MAP: [MapEntry; 4] = [
    MapEntry { first: BIOS_ADDR, last: BIOS_ADDR_B, region: Region::Bios },
    MapEntry { first: RAM_ADDR, last: RAM_ADDR_B, region: Region::Ram },
    MapEntry { first: REG_ADDR, last: REG_ADDR_B, region: Region::Registers },
    MapEntry { first: CART_ADDR, last: ADDR_END - 1, region: Region::Cartridge },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub region: Region,
    pub offset: usize,
}

/// Window mask for a backing buffer. Buffers are kept at power-of-two sizes
/// so the mask mirrors them over their window.
#[inline]
fn size_mask(len: usize) -> u32 {
    if len == 0 {
        0
    } else {
        (len - 1) as u32
    }
}

#[must_use]
pub fn region_of(addr: u32) -> Region {
    let addr = addr & ADDR_MASK;
    MEMORY_MAP
        .iter()
        .find(|entry| entry.contains(addr))
        .map_or(Region::Cartridge, |entry| entry.region)
}

/// Resolves `addr` to a region and the offset inside its backing buffer.
#[must_use]
pub fn decode(addr: u32, bios_len: usize, cart_len: usize) -> Decoded {
    let addr = addr & ADDR_MASK;
    let region = region_of(addr);
    let offset = match region {
        Region::Bios => addr & size_mask(bios_len),
        Region::Ram => addr & RAM_MASK,
        Region::Registers => (addr & REG_MASK) & 0xFF,
        Region::Cartridge => (addr & CART_MASK) & size_mask(cart_len),
    };
    Decoded {
        region,
        offset: offset as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_is_ordered_and_contiguous() {
        assert_eq!(MEMORY_MAP[0].first, 0);
        for pair in MEMORY_MAP.windows(2) {
            assert_eq!(pair[0].last + 1, pair[1].first);
        }
        assert_eq!(MEMORY_MAP[3].last, ADDR_MASK);
    }

    #[test]
    fn windows_resolve() {
        assert_eq!(region_of(0x0000), Region::Bios);
        assert_eq!(region_of(0x0FFF), Region::Bios);
        assert_eq!(region_of(0x1000), Region::Ram);
        assert_eq!(region_of(0x1FFF), Region::Ram);
        assert_eq!(region_of(0x2000), Region::Registers);
        assert_eq!(region_of(0x20FF), Region::Registers);
        assert_eq!(region_of(0x2100), Region::Cartridge);
        assert_eq!(region_of(0x1F_FFFF), Region::Cartridge);
    }

    #[test]
    fn offsets_mirror_through_masks() {
        let d = decode(0x0A10, 0x1000, 0);
        assert_eq!(d, Decoded { region: Region::Bios, offset: 0x0A10 });

        let d = decode(0x0A10, 0x800, 0);
        assert_eq!(d.offset, 0x210);

        let d = decode(0x1234, 0x1000, 0);
        assert_eq!(d, Decoded { region: Region::Ram, offset: 0x234 });

        let d = decode(0x2052, 0x1000, 0);
        assert_eq!(d, Decoded { region: Region::Registers, offset: 0x52 });

        let d = decode(0x2100, 0x1000, 0x8000);
        assert_eq!(d, Decoded { region: Region::Cartridge, offset: 0x2100 });

        let d = decode(0x1A_2100, 0x1000, 0x8000);
        assert_eq!(d.offset, 0x2100);
    }

    #[test]
    fn decoding_is_total() {
        for addr in (0..ADDR_END).step_by(0x3FF) {
            let d = decode(addr, 0x1000, 0x20_0000);
            match d.region {
                Region::Bios => assert!(d.offset < 0x1000),
                Region::Ram => assert!(d.offset < RAM_SIZE),
                Region::Registers => assert!(d.offset < REG_SIZE),
                Region::Cartridge => assert!(d.offset < CART_MAX),
            }
        }
        assert_eq!(decode(0x0123, 0, 0).offset, 0);
    }
}
