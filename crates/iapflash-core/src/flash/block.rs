//! Block erase and block program
//!
//! While a block operation runs, the memory array being modified cannot be
//! read, so the code driving it has to execute from somewhere else (RAM on
//! real devices). [`RamRoutines`] groups the block operations and their wait
//! routine and carries a [`CodePlacement`] stating where that code executes.
//! Each operation checks the placement against its target region before the
//! controller is armed.
//!
//! On bare-metal targets the routines are additionally emitted into the
//! `.ram_code` link section, which the linker script is expected to copy to
//! RAM at startup.
//! The bus accessors, mode arming and status decoding they call are
//! `#[inline(always)]` so no flash-resident code runs while the array is busy.

use core::ops::Range;

use crate::bus::RegisterFile;
use crate::error::{Error, Result};
use crate::profile::{EraseTrigger, MemoryRange};
use crate::regs::Cr2;

use super::controller::FlashController;
use super::status::FlashStatus;
use super::types::{MemoryRegion, ProgrammingMode};

/// Where the block routines execute from
pub trait CodePlacement {
    /// Half-open device address range of the executing code
    fn code_range(&self) -> Range<u32>;
}

/// A fixed execution address range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionRange {
    /// First address
    pub start: u32,
    /// One past the last address
    pub end: u32,
}

impl ExecutionRange {
    /// Create a range from `start` to `end` (exclusive)
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

impl From<MemoryRange> for ExecutionRange {
    fn from(range: MemoryRange) -> Self {
        Self::new(range.start, range.end())
    }
}

impl CodePlacement for ExecutionRange {
    fn code_range(&self) -> Range<u32> {
        self.start..self.end
    }
}

impl CodePlacement for MemoryRange {
    fn code_range(&self) -> Range<u32> {
        self.start..self.end()
    }
}

impl CodePlacement for Range<u32> {
    fn code_range(&self) -> Range<u32> {
        self.clone()
    }
}

/// Block erase/program routines bound to a controller and a code placement
pub struct RamRoutines<'a, R, P> {
    flash: &'a mut FlashController<R>,
    placement: P,
}

impl<'a, R: RegisterFile, P: CodePlacement> RamRoutines<'a, R, P> {
    pub(crate) fn new(flash: &'a mut FlashController<R>, placement: P) -> Self {
        Self { flash, placement }
    }

    /// Code placement these routines were created with
    pub fn placement(&self) -> &P {
        &self.placement
    }

    fn check_placement(&self, region: MemoryRegion) -> Result<()> {
        let code = self.placement.code_range();
        if self
            .flash
            .profile
            .region(region)
            .overlaps(code.start, code.end)
        {
            log::warn!(
                "Block routines at 0x{:06X}..0x{:06X} overlap {}",
                code.start,
                code.end,
                region
            );
            return Err(Error::PlacementViolation { region });
        }
        Ok(())
    }

    /// Erase one block
    ///
    /// The region must be unlocked. Does not wait; call
    /// [`Self::wait_for_last_operation`] afterwards.
    #[cfg_attr(target_os = "none", link_section = ".ram_code")]
    #[inline(never)]
    pub fn erase_block(&mut self, region: MemoryRegion, block: u16) -> Result<()> {
        let addr = self.flash.profile.block_address(region, block)?;
        self.check_placement(region)?;
        log::debug!("Erasing {} block {} at 0x{:06X}", region, block, addr);

        self.flash.arm(Cr2::ERASE);
        match self.flash.profile.erase_trigger {
            EraseTrigger::WordStore => self.flash.bus.write32(addr, 0),
            EraseTrigger::ByteWrites => {
                for i in 0..4 {
                    self.flash.bus.write8(addr + i, 0x00);
                }
            }
        }
        Ok(())
    }

    /// Program one block from `buffer`
    ///
    /// `buffer` must be exactly one block long; nothing is written otherwise.
    /// The region must be unlocked. Does not wait; call
    /// [`Self::wait_for_last_operation`] afterwards.
    #[cfg_attr(target_os = "none", link_section = ".ram_code")]
    #[inline(never)]
    pub fn program_block(
        &mut self,
        region: MemoryRegion,
        block: u16,
        mode: ProgrammingMode,
        buffer: &[u8],
    ) -> Result<()> {
        let block_size = self.flash.profile.block_size as usize;
        if buffer.len() != block_size {
            return Err(Error::InvalidBufferLength {
                expected: block_size,
                actual: buffer.len(),
            });
        }
        let addr = self.flash.profile.block_address(region, block)?;
        self.check_placement(region)?;
        log::debug!(
            "Programming {} block {} at 0x{:06X} ({:?})",
            region,
            block,
            addr,
            mode
        );

        self.flash.arm(mode.cr2_bit());
        for (i, byte) in buffer.iter().enumerate() {
            self.flash.bus.write8(addr + i as u32, *byte);
        }
        Ok(())
    }

    /// Wait for the last block operation on `region` to finish
    #[cfg_attr(target_os = "none", link_section = ".ram_code")]
    #[inline(never)]
    pub fn wait_for_last_operation(&mut self, region: MemoryRegion) -> FlashStatus {
        self.flash.wait_for_last_operation(region)
    }
}
