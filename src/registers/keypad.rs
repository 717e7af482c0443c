use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Keys: u8 {
        const a     = 0b0000_0001;
        const b     = 0b0000_0010;
        const c     = 0b0000_0100;
        const up    = 0b0000_1000;
        const down  = 0b0001_0000;
        const left  = 0b0010_0000;
        const right = 0b0100_0000;
        const power = 0b1000_0000;
    }
}

/// KEY_PAD latch. Stored as pressed keys, read back active-low.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPad {
    pressed: Keys,
}

impl KeyPad {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pressed: Keys::empty(),
        }
    }

    #[inline]
    #[must_use]
    pub fn latch(&self) -> u8 {
        !self.pressed.bits()
    }

    #[inline]
    #[must_use]
    pub fn pressed(&self) -> Keys {
        self.pressed
    }

    pub fn set(&mut self, keys: Keys) {
        self.pressed = keys;
    }
}

impl Default for KeyPad {
    fn default() -> Self {
        KeyPad::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_is_active_low() {
        let mut pad = KeyPad::new();
        assert_eq!(pad.latch(), 0xFF);
        pad.set(Keys::a | Keys::up);
        assert_eq!(pad.latch(), 0b1111_0110);
        pad.set(Keys::up);
        assert_eq!(pad.latch(), 0b1111_0111);
        pad.set(Keys::empty());
        assert_eq!(pad.latch(), 0xFF);
    }
}
