//! Device profiles
//!
//! A [`DeviceProfile`] describes everything the engine needs to know about a
//! particular device: where its memories live, how large a block is, which
//! status bits signal completion and how a block erase is triggered. Profiles
//! are selected once at startup, either from the built-in presets or from a
//! device database file.

mod presets;

#[cfg(feature = "std")]
mod database;

pub use presets::*;

#[cfg(feature = "std")]
pub use database::*;

use crate::error::{Error, Result};
use crate::flash::MemoryRegion;
use crate::regs::Iapsr;

/// Default poll budget for [`crate::FlashController::wait_for_last_operation`]
pub const DEFAULT_OPERATION_TIMEOUT: u16 = 0xFFFF;

/// Address of the read-out protection option byte (no complement)
pub const DEFAULT_ROP_ADDRESS: u16 = 0x4800;

/// A contiguous range of the device address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    /// First address of the range
    pub start: u32,
    /// Size of the range in bytes
    pub size: u32,
}

impl MemoryRange {
    /// Create a new range
    pub const fn new(start: u32, size: u32) -> Self {
        Self { start, size }
    }

    /// One past the last address of the range
    pub const fn end(&self) -> u32 {
        self.start + self.size
    }

    /// Check whether `addr` lies in this range
    pub const fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr < self.end()
    }

    /// Check whether `len` bytes starting at `addr` lie in this range
    pub const fn contains_span(&self, addr: u32, len: u32) -> bool {
        len == 0 || (self.contains(addr) && addr as u64 + len as u64 <= self.end() as u64)
    }

    /// Check whether the half-open range `start..end` overlaps this range
    pub const fn overlaps(&self, start: u32, end: u32) -> bool {
        start < self.end() && self.start < end
    }
}

/// How a block erase is started once erase mode is armed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum EraseTrigger {
    /// A single 32-bit store of zero at the block start
    #[default]
    WordStore,
    /// Four sequential byte writes of zero at the block start
    ByteWrites,
}

/// Static description of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Program (flash) memory
    pub program: MemoryRange,
    /// Data EEPROM
    pub data: MemoryRange,
    /// Option byte area
    pub option_bytes: MemoryRange,
    /// RAM, where block routines are expected to execute from
    pub ram: MemoryRange,
    /// Read-out protection byte address (stored without complement)
    pub rop_address: u16,
    /// Block size in bytes
    pub block_size: u16,
    /// Data memory completion is signalled by HVOFF instead of EOP
    pub dual_voltage_erase: bool,
    /// Block erase trigger form
    pub erase_trigger: EraseTrigger,
    /// Poll iterations before an operation is reported as timed out
    pub operation_timeout: u16,
}

impl DeviceProfile {
    /// Address range of a memory region
    pub const fn region(&self, region: MemoryRegion) -> MemoryRange {
        match region {
            MemoryRegion::Program => self.program,
            MemoryRegion::Data => self.data,
        }
    }

    /// Region containing `addr`, if any
    pub fn region_of(&self, addr: u32) -> Option<MemoryRegion> {
        if self.program.contains(addr) {
            Some(MemoryRegion::Program)
        } else if self.data.contains(addr) {
            Some(MemoryRegion::Data)
        } else {
            None
        }
    }

    /// Number of blocks in a region
    pub const fn block_count(&self, region: MemoryRegion) -> u16 {
        (self.region(region).size / self.block_size as u32) as u16
    }

    /// Start address of a block
    pub fn block_address(&self, region: MemoryRegion, block: u16) -> Result<u32> {
        if block >= self.block_count(region) {
            return Err(Error::BlockOutOfRange { region, block });
        }
        Ok(self.region(region).start + block as u32 * self.block_size as u32)
    }

    /// Validate that `len` bytes at `addr` lie entirely in program or data memory
    pub fn check_span(&self, addr: u32, len: u32) -> Result<MemoryRegion> {
        match self.region_of(addr) {
            Some(region) if self.region(region).contains_span(addr, len) => Ok(region),
            _ => Err(Error::AddressOutOfRange { addr }),
        }
    }

    /// Validate an option byte address
    pub fn check_option_byte(&self, addr: u16) -> Result<()> {
        if self.option_bytes.contains(addr as u32) {
            Ok(())
        } else {
            Err(Error::InvalidOptionByteAddress { addr })
        }
    }

    /// IAPSR bits that end a wait on `region`
    pub fn wait_mask(&self, region: MemoryRegion) -> Iapsr {
        match region {
            MemoryRegion::Data if self.dual_voltage_erase => Iapsr::HVOFF | Iapsr::WR_PG_DIS,
            _ => Iapsr::EOP | Iapsr::WR_PG_DIS,
        }
    }

    /// Check the profile for internal consistency
    pub fn validate(&self) -> core::result::Result<(), &'static str> {
        if self.block_size == 0 || !self.block_size.is_power_of_two() {
            return Err("block size must be a non-zero power of two");
        }
        for range in [self.program, self.data, self.option_bytes, self.ram] {
            if range.start.checked_add(range.size).is_none() {
                return Err("memory range end overflows the address space");
            }
        }
        if self.option_bytes.end() > 0x1_0000 {
            return Err("option byte area must lie below 0x10000");
        }
        let block = self.block_size as u32;
        for range in [self.program, self.data] {
            if range.size == 0 {
                return Err("memory regions must not be empty");
            }
            if range.start % block != 0 || range.size % block != 0 {
                return Err("memory regions must be a whole number of aligned blocks");
            }
            if range.size / block > u16::MAX as u32 {
                return Err("memory region has too many blocks");
            }
        }
        if self.program.overlaps(self.data.start, self.data.end()) {
            return Err("program and data memory overlap");
        }
        let opt = self.option_bytes;
        if self.program.overlaps(opt.start, opt.end()) || self.data.overlaps(opt.start, opt.end()) {
            return Err("program or data memory overlaps the option byte area");
        }
        if !self.option_bytes.contains(self.rop_address as u32) {
            return Err("read-out protection byte must lie in the option byte area");
        }
        if self.operation_timeout == 0 {
            return Err("operation timeout must be non-zero");
        }
        Ok(())
    }
}
