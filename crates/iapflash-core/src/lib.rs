//! iapflash-core - In-application programming engine for STM8 flash
//!
//! This crate drives the flash/data EEPROM controller found on STM8S-class
//! microcontrollers: unlocking and locking the memory arrays, byte, word and
//! block programming, option bytes and completion polling. It is designed to
//! be `no_std` compatible so the same engine runs on target and on a host
//! against an emulated controller.
//!
//! All hardware access goes through a [`RegisterFile`] that is handed to the
//! [`FlashController`] when it is created. Device differences (memory sizes,
//! block size, status masks, erase trigger) come from a [`DeviceProfile`].
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`) and the RON
//!   device database
//! - `alloc` - Enable heap allocation
//!
//! # Example
//!
//! ```ignore
//! use iapflash_core::{profile, FlashController, MemoryRegion, RegisterFile};
//!
//! fn store_byte<R: RegisterFile>(bus: R) -> iapflash_core::Result<()> {
//!     let mut flash = FlashController::new(bus, profile::STM8S103);
//!     flash.unlock(MemoryRegion::Data);
//!     flash.program_byte(0x4000, 0x42)?;
//!     flash.wait_for_last_operation(MemoryRegion::Data).into_result()?;
//!     flash.lock(MemoryRegion::Data);
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod error;
pub mod flash;
pub mod profile;
pub mod regs;

pub use bus::{Mmio, RegisterFile};
pub use error::{Error, Result};
pub use flash::{
    CodePlacement, ExecutionRange, FlashController, FlashStatus, LowPowerMode, MemoryRegion,
    ProgrammingMode, ProgrammingTime, RamRoutines, OPTION_BYTE_ERROR,
};
pub use profile::{DeviceProfile, EraseTrigger, MemoryRange};
