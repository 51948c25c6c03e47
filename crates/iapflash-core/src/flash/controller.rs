//! Flash controller: unlock/lock, configuration and status

use crate::bus::RegisterFile;
use crate::profile::DeviceProfile;
use crate::regs::{
    Cr1, Cr2, Iapsr, BOOT_PAGE_SIZE, CR1_RESET, CR2_RESET, FLASH_CR1, FLASH_CR2, FLASH_FPR,
    FLASH_IAPSR, FLASH_NCR2, NCR2_RESET,
};

use super::block::{CodePlacement, RamRoutines};
use super::status::{poll_status, FlashStatus};
use super::types::{LowPowerMode, MemoryRegion, ProgrammingTime};

/// Driver for the STM8 flash controller
///
/// Holds no state besides the register file and the device profile; every
/// query reads the hardware.
pub struct FlashController<R> {
    pub(crate) bus: R,
    pub(crate) profile: DeviceProfile,
}

impl<R: RegisterFile> FlashController<R> {
    /// Create a controller for the device described by `profile`
    pub fn new(bus: R, profile: DeviceProfile) -> Self {
        Self { bus, profile }
    }

    /// Device profile in use
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    /// Shared access to the register file
    pub fn bus(&self) -> &R {
        &self.bus
    }

    /// Exclusive access to the register file
    pub fn bus_mut(&mut self) -> &mut R {
        &mut self.bus
    }

    /// Release the register file
    pub fn into_inner(self) -> R {
        self.bus
    }

    // ------------------------------------------------------------------
    // Unlock / lock
    // ------------------------------------------------------------------

    /// Write the unlock key sequence for `region`
    ///
    /// The hardware gives no feedback here; check [`Self::is_unlocked`] if
    /// needed. A wrong sequence keeps the region locked until reset.
    pub fn unlock(&mut self, region: MemoryRegion) {
        log::debug!("Unlocking {}", region);
        let reg = region.key_register();
        for key in region.keys() {
            self.bus.write8(reg, key);
        }
    }

    /// Clear the unlock bit of `region`
    pub fn lock(&mut self, region: MemoryRegion) {
        log::debug!("Locking {}", region);
        let mask = region.lock_mask();
        self.bus.modify8(FLASH_IAPSR, |v| v & mask);
    }

    /// Check whether `region` is unlocked
    pub fn is_unlocked(&mut self, region: MemoryRegion) -> bool {
        self.flag_status(region.unlock_flag())
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Return the controller to its reset configuration and lock both regions
    pub fn deinit(&mut self) {
        log::debug!("Resetting flash controller configuration");
        self.bus.write8(FLASH_CR1, CR1_RESET);
        self.bus.write8(FLASH_CR2, CR2_RESET);
        self.bus.write8(FLASH_NCR2, NCR2_RESET);
        self.lock(MemoryRegion::Data);
        self.lock(MemoryRegion::Program);
        // Reading IAPSR clears EOP and WR_PG_DIS
        let _ = self.bus.read8(FLASH_IAPSR);
    }

    /// Enable or disable the end-of-operation interrupt
    pub fn set_interrupt(&mut self, enabled: bool) {
        self.bus.modify8(FLASH_CR1, |v| {
            let mut cr1 = Cr1::from_bits_retain(v);
            cr1.set(Cr1::IE, enabled);
            cr1.bits()
        });
    }

    /// Select the flash power state in halt and active-halt
    pub fn set_low_power_mode(&mut self, mode: LowPowerMode) {
        self.bus
            .modify8(FLASH_CR1, |v| (v & !Cr1::LP_MASK.bits()) | mode.bits());
    }

    /// Current low power mode
    pub fn low_power_mode(&mut self) -> LowPowerMode {
        LowPowerMode::from_cr1(self.bus.read8(FLASH_CR1))
    }

    /// Select the byte programming time
    pub fn set_programming_time(&mut self, time: ProgrammingTime) {
        self.bus
            .modify8(FLASH_CR1, |v| (v & !Cr1::FIX.bits()) | time.bits());
    }

    /// Current byte programming time
    pub fn programming_time(&mut self) -> ProgrammingTime {
        ProgrammingTime::from_cr1(self.bus.read8(FLASH_CR1))
    }

    /// Size of the user boot code area in bytes
    pub fn boot_size(&mut self) -> u32 {
        let fpr = self.bus.read8(FLASH_FPR) as u32;
        let mut size = fpr * BOOT_PAGE_SIZE;
        // FPR saturates at 0xFF, which covers one more page
        if fpr == 0xFF {
            size += BOOT_PAGE_SIZE;
        }
        size
    }

    /// Check whether any bit of `flag` is set in IAPSR
    ///
    /// On hardware this read clears EOP and WR_PG_DIS.
    pub fn flag_status(&mut self, flag: Iapsr) -> bool {
        Iapsr::from_bits_retain(self.bus.read8(FLASH_IAPSR)).intersects(flag)
    }

    /// Wait for the last program or erase operation on `region` to finish
    pub fn wait_for_last_operation(&mut self, region: MemoryRegion) -> FlashStatus {
        let mask = self.profile.wait_mask(region);
        poll_status(&mut self.bus, mask, self.profile.operation_timeout)
    }

    // ------------------------------------------------------------------
    // Block routines
    // ------------------------------------------------------------------

    /// Borrow the block erase/program routines
    ///
    /// `placement` describes the address range the calling code runs from.
    /// Every block operation refuses to touch a region overlapping it.
    pub fn ram_routines<P: CodePlacement>(&mut self, placement: P) -> RamRoutines<'_, R, P> {
        RamRoutines::new(self, placement)
    }

    // ------------------------------------------------------------------
    // Mode arming
    // ------------------------------------------------------------------

    /// Set a mode bit in CR2 and clear its complement in NCR2
    #[inline(always)]
    pub(crate) fn arm(&mut self, mode: Cr2) {
        log::trace!("Arming CR2 0x{:02X}", mode.bits());
        self.bus.modify8(FLASH_CR2, |v| v | mode.bits());
        self.bus.modify8(FLASH_NCR2, |v| v & !mode.bits());
    }

    /// Clear a mode bit in CR2 and set its complement in NCR2
    #[inline(always)]
    pub(crate) fn disarm(&mut self, mode: Cr2) {
        log::trace!("Disarming CR2 0x{:02X}", mode.bits());
        self.bus.modify8(FLASH_CR2, |v| v & !mode.bits());
        self.bus.modify8(FLASH_NCR2, |v| v | mode.bits());
    }
}

impl<R> core::fmt::Debug for FlashController<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FlashController")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}
