//! Option byte access
//!
//! Option bytes live in their own area starting at the read-out protection
//! byte. Apart from ROP, every option byte is stored twice: the value at
//! `addr` and its complement at `addr + 1`. The hardware only honours an
//! option whose pair is consistent.

use crate::bus::RegisterFile;
use crate::error::{Error, Result};
use crate::regs::Cr2;

use super::controller::FlashController;
use super::status::FlashStatus;
use super::types::MemoryRegion;

/// Packed option byte value used by callers that cannot carry an error
///
/// See [`Error::option_byte_sentinel`].
pub const OPTION_BYTE_ERROR: u16 = 0x5555;

impl<R: RegisterFile> FlashController<R> {
    fn check_option_address(&self, addr: u16) -> Result<bool> {
        self.profile.check_option_byte(addr)?;
        if addr == self.profile.rop_address {
            return Ok(true);
        }
        // The complement must fit in the option area too
        match addr.checked_add(1) {
            Some(next) if self.profile.option_bytes.contains(next as u32) => Ok(false),
            _ => Err(Error::InvalidOptionByteAddress { addr }),
        }
    }

    /// Program an option byte and its complement
    ///
    /// Data memory must be unlocked. Waits for completion and returns the
    /// resulting status.
    pub fn program_option_byte(&mut self, addr: u16, value: u8) -> Result<FlashStatus> {
        let is_rop = self.check_option_address(addr)?;
        log::debug!("Programming option byte 0x{:04X} = 0x{:02X}", addr, value);

        self.arm(Cr2::OPT);
        self.bus.write8(addr as u32, value);
        if !is_rop {
            self.bus.write8(addr as u32 + 1, !value);
        }
        let status = self.wait_for_last_operation(MemoryRegion::Program);
        self.disarm(Cr2::OPT);

        Ok(status)
    }

    /// Erase an option byte and its complement
    ///
    /// Data memory must be unlocked. The ROP byte has no complement, so only
    /// `addr` is written there.
    pub fn erase_option_byte(&mut self, addr: u16) -> Result<FlashStatus> {
        let is_rop = self.check_option_address(addr)?;
        log::debug!("Erasing option byte 0x{:04X}", addr);

        self.arm(Cr2::OPT);
        self.bus.write8(addr as u32, 0x00);
        if !is_rop {
            self.bus.write8(addr as u32 + 1, 0xFF);
        }
        let status = self.wait_for_last_operation(MemoryRegion::Program);
        self.disarm(Cr2::OPT);

        Ok(status)
    }

    /// Read an option byte
    ///
    /// Returns `(value << 8) | complement` for paired option bytes and the
    /// raw value for the ROP byte. An inconsistent pair is reported as
    /// [`Error::OptionByteCorrupted`].
    pub fn read_option_byte(&mut self, addr: u16) -> Result<u16> {
        let is_rop = self.check_option_address(addr)?;

        let value = self.bus.read8(addr as u32);
        if is_rop {
            return Ok(value as u16);
        }

        let complement = self.bus.read8(addr as u32 + 1);
        if value != !complement {
            log::warn!(
                "Option byte 0x{:04X} corrupted: 0x{:02X} / 0x{:02X}",
                addr,
                value,
                complement
            );
            return Err(Error::OptionByteCorrupted {
                addr,
                value,
                complement,
            });
        }

        Ok(((value as u16) << 8) | complement as u16)
    }
}
