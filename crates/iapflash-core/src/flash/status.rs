//! Operation status and completion polling

use crate::bus::RegisterFile;
use crate::error::{Error, Result};
use crate::regs::{Iapsr, FLASH_IAPSR};

/// Outcome of waiting for a flash operation
///
/// The discriminants are the IAPSR bits each status is derived from.
/// `Timeout` has no hardware bit of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FlashStatus {
    /// Write attempted on a locked or protected page
    WriteProtectionError = 0x01,
    /// No completion observed within the poll budget
    Timeout = 0x02,
    /// Operation completed
    EndOfOperation = 0x04,
    /// High voltage switched off, i.e. a dual-voltage data operation completed
    HighVoltageOff = 0x40,
}

impl FlashStatus {
    /// Derive a status from masked IAPSR bits
    ///
    /// Returns `None` when no bit is set. A write protection error takes
    /// precedence over completion bits seen in the same read.
    #[inline(always)]
    pub fn from_masked(bits: Iapsr) -> Option<Self> {
        if bits.contains(Iapsr::WR_PG_DIS) {
            Some(Self::WriteProtectionError)
        } else if bits.contains(Iapsr::EOP) {
            Some(Self::EndOfOperation)
        } else if bits.contains(Iapsr::HVOFF) {
            Some(Self::HighVoltageOff)
        } else {
            None
        }
    }

    /// Returns true if the operation completed
    pub fn is_success(self) -> bool {
        matches!(self, Self::EndOfOperation | Self::HighVoltageOff)
    }

    /// Convert to a `Result`
    pub fn into_result(self) -> Result<()> {
        match self {
            Self::EndOfOperation | Self::HighVoltageOff => Ok(()),
            Self::WriteProtectionError => Err(Error::WriteProtected),
            Self::Timeout => Err(Error::Timeout),
        }
    }
}

/// Poll IAPSR until a bit in `mask` is set, at most `budget` reads
#[cfg_attr(target_os = "none", link_section = ".ram_code")]
#[inline(never)]
pub(crate) fn poll_status<R: RegisterFile>(bus: &mut R, mask: Iapsr, budget: u16) -> FlashStatus {
    for _ in 0..budget {
        let bits = Iapsr::from_bits_truncate(bus.read8(FLASH_IAPSR)) & mask;
        if let Some(status) = FlashStatus::from_masked(bits) {
            if status == FlashStatus::WriteProtectionError {
                log::warn!("Flash operation hit a write protected page");
            }
            return status;
        }
    }

    log::warn!(
        "Flash operation timed out after {} polls (mask 0x{:02X})",
        budget,
        mask.bits()
    );
    FlashStatus::Timeout
}
