//! Register access abstractions
//!
//! The flash engine never touches memory directly. Every register and memory
//! cell is reached through a [`RegisterFile`], which lets the same engine run
//! against real hardware ([`Mmio`]) or an emulated controller in tests.

mod mmio;
mod traits;

pub use mmio::Mmio;
pub use traits::*;
