pub mod audit;
pub mod bus;
pub mod clock;
pub mod config;
pub mod consts;
pub mod cpu;
pub mod error;
pub mod memory_map;
mod minx;
pub mod peripherals;
pub mod ram;
pub mod registers;
pub mod rom;
pub mod video;

pub use audit::{CoverageReport, CycleEntry, CycleTable};
pub use config::{FrameSource, MinxConfig};
pub use cpu::{CpuCore, ScriptedCore};
pub use error::{MinxError, Result};
pub use minx::Minx;
pub use registers::keypad::Keys;
pub use video::Orientation;

use peripherals::Peripherals;

/// Writes a snapshot of the peripheral state into `data`. ROM images and the
/// core are not part of it. Returns the number of bytes used.
///
/// # Errors
///
/// Returns an error if `data` is too small.
pub fn serialize<C: CpuCore>(minx: &Minx<C>, data: &mut [u8]) -> Result<usize> {
    let used = postcard::to_slice(minx.peripherals(), data)?;
    Ok(used.len())
}

/// Restores a snapshot taken with `serialize` into `minx`, keeping its ROM
/// images.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be decoded.
pub fn deserialize<C: CpuCore>(data: &[u8], minx: &mut Minx<C>) -> Result<()> {
    let peripherals = postcard::from_bytes::<Peripherals>(data)?;
    minx.replace_peripherals(peripherals);
    Ok(())
}

/// Size of a snapshot of `minx`.
///
/// # Errors
///
/// Returns an error if the state cannot be encoded.
pub fn serialize_size<C: CpuCore>(minx: &Minx<C>) -> Result<usize> {
    Ok(postcard::experimental::serialized_size(minx.peripherals())?)
}

#[must_use]
pub const fn info() -> (&'static str, &'static str) {
    ("Minx", env!("CARGO_PKG_VERSION"))
}
