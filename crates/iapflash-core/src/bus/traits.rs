//! Register file trait definitions

/// Byte-addressed access to the controller's registers and memory arrays
///
/// Registers, program memory, data EEPROM and option bytes share one address
/// space on STM8 devices, so a single trait covers all of them. Reads take
/// `&mut self` because reading some registers has side effects (IAPSR clears
/// its EOP and WR_PG_DIS flags when read).
///
/// Implementations are expected to perform exactly the accesses requested,
/// in order. The flash controller relies on that for key sequences and for
/// the armed write windows.
pub trait RegisterFile {
    /// Read one byte at `addr`
    fn read8(&mut self, addr: u32) -> u8;

    /// Write one byte at `addr`
    fn write8(&mut self, addr: u32, value: u8);

    /// Store a 32-bit value starting at `addr`
    ///
    /// The default implementation issues four byte writes in bus order
    /// (most significant byte first, STM8 is big-endian). Implementations
    /// that can perform a real word store should override this.
    fn write32(&mut self, addr: u32, value: u32) {
        for (i, byte) in value.to_be_bytes().iter().enumerate() {
            self.write8(addr + i as u32, *byte);
        }
    }

    /// Read-modify-write one byte
    #[inline(always)]
    fn modify8<F>(&mut self, addr: u32, f: F)
    where
        F: FnOnce(u8) -> u8,
        Self: Sized,
    {
        let value = self.read8(addr);
        self.write8(addr, f(value));
    }
}

impl<R: RegisterFile> RegisterFile for &mut R {
    #[inline(always)]
    fn read8(&mut self, addr: u32) -> u8 {
        (**self).read8(addr)
    }

    #[inline(always)]
    fn write8(&mut self, addr: u32, value: u8) {
        (**self).write8(addr, value)
    }

    #[inline(always)]
    fn write32(&mut self, addr: u32, value: u32) {
        (**self).write32(addr, value)
    }
}
