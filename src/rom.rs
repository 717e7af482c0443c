use log::{info, trace};
use serde::{Deserialize, Serialize};

use crate::consts::CART_MAX;
use crate::error::{MinxError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RomKind {
    Bios,
    Cartridge,
}

/// Read-only image. The backing buffer is padded with zeroes to a power of
/// two so the decoder can mirror it with a mask; `touched` records every
/// offset the core has read.
#[derive(Clone, Serialize, Deserialize)]
pub struct Rom {
    kind: RomKind,
    #[serde(skip)]
    data: Vec<u8>,
    len: usize,
    touched: Vec<u64>,
}

impl Rom {
    #[must_use]
    pub fn empty(kind: RomKind) -> Self {
        Self {
            kind,
            data: vec![0; 1],
            len: 0,
            touched: vec![0; 1],
        }
    }

    pub fn bios_from_slice(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(MinxError::EmptyBios);
        }
        Ok(Self::from_image(RomKind::Bios, data))
    }

    pub fn cartridge_from_slice(data: &[u8]) -> Result<Self> {
        if data.len() > CART_MAX {
            return Err(MinxError::CartridgeTooLarge { len: data.len() });
        }
        Ok(Self::from_image(RomKind::Cartridge, data))
    }

    fn from_image(kind: RomKind, image: &[u8]) -> Self {
        let window = image.len().max(1).next_power_of_two();
        let mut data = vec![0; window];
        data[..image.len()].copy_from_slice(image);
        let rom = Self {
            kind,
            data,
            len: image.len(),
            touched: vec![0; window.div_ceil(64)],
        };
        info!(
            "{:?} loaded: {} bytes, window 0x{:x}, md5 {:x}",
            kind,
            rom.len,
            window,
            md5::compute(image)
        );
        rom
    }

    /// Size of the mirrored window, always a power of two.
    #[inline]
    #[must_use]
    pub fn window(&self) -> usize {
        self.data.len()
    }

    /// Size of the loaded image.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> RomKind {
        self.kind
    }

    /// Side-effect free read.
    #[inline]
    #[must_use]
    pub fn get(&self, offset: usize) -> u8 {
        self.data[offset & (self.data.len() - 1)]
    }

    /// Bus read, marks the offset as touched.
    pub fn peek(&mut self, offset: usize) -> u8 {
        let offset = offset & (self.data.len() - 1);
        self.touched[offset / 64] |= 1 << (offset % 64);
        let data = self.data[offset];
        trace!("< Peek {:?} 0x{:06x} -> 0x{:02x}", self.kind, offset, data);
        data
    }

    #[must_use]
    pub fn is_touched(&self, offset: usize) -> bool {
        let offset = offset & (self.data.len() - 1);
        self.touched[offset / 64] & (1 << (offset % 64)) != 0
    }

    /// Number of distinct image bytes read so far.
    #[must_use]
    pub fn touched_count(&self) -> usize {
        (0..self.len).filter(|&i| self.is_touched(i)).count()
    }

    pub fn clear_touched(&mut self) {
        self.touched.fill(0);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Re-attaches the image after a snapshot restore, which does not carry it.
    pub fn copy_from(&mut self, source: &Rom) {
        self.data.clone_from(&source.data);
        self.len = source.len;
        if self.touched.len() != source.touched.len() {
            self.touched = vec![0; source.touched.len()];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bios_must_not_be_empty() {
        assert!(matches!(Rom::bios_from_slice(&[]), Err(MinxError::EmptyBios)));
    }

    #[test]
    fn oversized_cartridge_is_rejected() {
        let data = vec![0; CART_MAX + 1];
        assert!(matches!(
            Rom::cartridge_from_slice(&data),
            Err(MinxError::CartridgeTooLarge { len }) if len == CART_MAX + 1
        ));
    }

    #[test]
    fn image_is_padded_and_mirrored() {
        let rom = Rom::bios_from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(rom.window(), 4);
        assert_eq!(rom.len(), 3);
        assert_eq!(rom.get(3), 0);
        assert_eq!(rom.get(5), 2);
        assert_eq!(rom.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn reads_mark_coverage() {
        let mut rom = Rom::cartridge_from_slice(&[0xAA; 0x100]).unwrap();
        assert_eq!(rom.touched_count(), 0);
        assert_eq!(rom.peek(0x10), 0xAA);
        assert_eq!(rom.peek(0x110), 0xAA);
        assert_eq!(rom.peek(0x11), 0xAA);
        assert_eq!(rom.touched_count(), 2);
        assert!(rom.is_touched(0x10));
        rom.clear_touched();
        assert_eq!(rom.touched_count(), 0);
    }

    #[test]
    fn empty_cartridge_reads_zero() {
        let mut rom = Rom::empty(RomKind::Cartridge);
        assert_eq!(rom.peek(0x12345), 0);
        assert_eq!(rom.touched_count(), 0);
        assert!(rom.is_empty());
    }
}
