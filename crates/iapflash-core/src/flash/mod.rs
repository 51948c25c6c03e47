//! Flash and data EEPROM programming
//!
//! [`FlashController`] owns the register file and implements the byte, word
//! and option byte paths plus controller configuration. Block erase and block
//! program live in [`RamRoutines`], which is only handed out together with a
//! description of where the calling code executes from.
//!
//! Typical sequence:
//!
//! ```text
//! unlock(region) -> program / erase -> wait_for_last_operation(region) -> lock(region)
//! ```

mod block;
mod controller;
mod memory;
mod option;
mod status;
mod types;

pub use block::{CodePlacement, ExecutionRange, RamRoutines};
pub use controller::FlashController;
pub use option::OPTION_BYTE_ERROR;
pub use status::FlashStatus;
pub use types::{LowPowerMode, MemoryRegion, ProgrammingMode, ProgrammingTime};
