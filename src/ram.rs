use log::trace;
use serde::{Deserialize, Serialize};

use crate::consts::{RAM_MASK, RAM_SIZE};

#[derive(Clone, Serialize, Deserialize)]
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    #[must_use]
    pub fn new() -> Ram {
        Ram {
            data: vec![0; RAM_SIZE],
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, addr: u16) -> u8 {
        self.data[(addr as u32 & RAM_MASK) as usize]
    }

    #[inline]
    pub fn set(&mut self, addr: u16, data: u8) {
        self.data[(addr as u32 & RAM_MASK) as usize] = data;
    }

    pub fn peek(&self, offset: usize) -> u8 {
        let data = self.data[offset & RAM_MASK as usize];
        trace!("< Peek RAM 0x{:03x} -> 0x{:02x}", offset, data);
        data
    }

    pub fn poke(&mut self, offset: usize, data: u8) {
        trace!("> Poke RAM 0x{:03x} = 0x{:02x}", offset, data);
        self.data[offset & RAM_MASK as usize] = data;
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Default for Ram {
    fn default() -> Self {
        Ram::new()
    }
}
