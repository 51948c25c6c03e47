//! Byte and word access to program and data memory

use crate::bus::RegisterFile;
use crate::error::Result;
use crate::regs::Cr2;

use super::controller::FlashController;

impl<R: RegisterFile> FlashController<R> {
    /// Erase one byte
    ///
    /// The region must be unlocked. Completion is reported by
    /// [`Self::wait_for_last_operation`].
    pub fn erase_byte(&mut self, addr: u32) -> Result<()> {
        self.profile.check_span(addr, 1)?;
        log::trace!("Erasing byte at 0x{:06X}", addr);
        self.bus.write8(addr, 0x00);
        Ok(())
    }

    /// Program one byte
    ///
    /// The region must be unlocked. Completion is reported by
    /// [`Self::wait_for_last_operation`].
    pub fn program_byte(&mut self, addr: u32, value: u8) -> Result<()> {
        self.profile.check_span(addr, 1)?;
        log::trace!("Programming 0x{:02X} at 0x{:06X}", value, addr);
        self.bus.write8(addr, value);
        Ok(())
    }

    /// Read one byte
    pub fn read_byte(&mut self, addr: u32) -> Result<u8> {
        self.profile.check_span(addr, 1)?;
        Ok(self.bus.read8(addr))
    }

    /// Read `buf.len()` bytes starting at `addr`
    ///
    /// The whole span must lie in a single memory region.
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.profile.check_span(addr, buf.len() as u32)?;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.bus.read8(addr + i as u32);
        }
        Ok(())
    }

    /// Program a 32-bit word
    ///
    /// Arms word programming, then writes the four bytes in ascending address
    /// order starting with the least significant byte. The hardware programs
    /// the word once the fourth byte is written.
    pub fn program_word(&mut self, addr: u32, value: u32) -> Result<()> {
        self.profile.check_span(addr, 4)?;
        log::trace!("Programming word 0x{:08X} at 0x{:06X}", value, addr);

        self.arm(Cr2::WPRG);
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            self.bus.write8(addr + i as u32, *byte);
        }
        Ok(())
    }
}
