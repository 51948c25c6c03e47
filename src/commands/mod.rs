//! CLI command implementations
//!
//! Every command operates on an opened [`Session`](crate::device::Session).
//! Commands that program or erase follow the controller's required sequence:
//! unlock the region, issue the operation, wait for completion and lock the
//! region again, also when the operation fails.

pub mod block;
pub mod byte;
mod info;
mod list;
pub mod option;
pub mod read;

pub use info::show_info;
pub use list::list_devices;

use iapflash_core::{FlashController, MemoryRegion, RegisterFile};

use crate::cli::RegionArg;
use crate::error::Result;

impl From<RegionArg> for MemoryRegion {
    fn from(arg: RegionArg) -> Self {
        match arg {
            RegionArg::Program => MemoryRegion::Program,
            RegionArg::Data => MemoryRegion::Data,
        }
    }
}

/// Run `f` with `region` unlocked, locking it again afterwards
pub fn with_unlocked<R, T, F>(
    flash: &mut FlashController<R>,
    region: MemoryRegion,
    f: F,
) -> Result<T>
where
    R: RegisterFile,
    F: FnOnce(&mut FlashController<R>) -> Result<T>,
{
    flash.unlock(region);
    if !flash.is_unlocked(region) {
        log::warn!("{} did not unlock", region);
    }
    let result = f(flash);
    flash.lock(region);
    result
}

/// Format a byte count for display
pub fn format_size(bytes: u32) -> String {
    if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
